//! HTML pages for the browser UI.
//!
//! Pages are inline templates: static pages are raw-string consts, dynamic
//! pages are `format!` over small row fragments with the stylesheet kept in a
//! separate const so the format strings stay free of literal braces. Every
//! catalog- or classifier-sourced string passes through [`escape_html`].

use crate::catalog::ProductLocation;
use crate::schemas::{BasePrediction, PredictResponse};
use crate::sim::SimulatedDetection;

/// Confidence bar color: green from 0.8 up, yellow from 0.5, red below.
pub fn confidence_color(confidence: f32) -> &'static str {
    if confidence >= 0.8 {
        "#16a34a"
    } else if confidence >= 0.5 {
        "#eab308"
    } else {
        "#dc2626"
    }
}

/// Minimal HTML escaping for text content and attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Upload page with drag & drop and nav.
pub fn index_page() -> &'static str {
    INDEX_PAGE
}

/// Upload page for the simulated multi-object detection demo.
pub fn detect_page() -> &'static str {
    DETECT_PAGE
}

/// Static API reference.
pub fn docs_page() -> &'static str {
    DOCS_PAGE
}

/// Catalog table, one row per product in store order.
pub fn products_page(products: &[ProductLocation]) -> String {
    let mut rows = String::new();
    for product in products {
        let stock_text = if product.in_stock {
            "In stock"
        } else {
            "Out of stock"
        };
        rows.push_str(&format!(
            "            <tr>\n              <td>{}</td>\n              <td>{}</td>\n              <td>{}</td>\n              <td>{}</td>\n              <td>${:.2}</td>\n              <td>{}</td>\n            </tr>\n",
            escape_html(&product.product_name),
            escape_html(&product.category),
            escape_html(&product.aisle),
            escape_html(&product.section),
            product.price,
            stock_text
        ));
    }

    format!(
        r#"<html>
  <head>
    <title>Product Catalog</title>
    <style>{css}</style>
  </head>
  <body>
    <div class="container">
      <h1>Product Catalog</h1>
      <table>
        <thead>
          <tr>
            <th>Product</th>
            <th>Category</th>
            <th>Aisle</th>
            <th>Section</th>
            <th>Price</th>
            <th>Stock</th>
          </tr>
        </thead>
        <tbody>
{rows}        </tbody>
      </table>

      <div class="links">
        <a href="/">&larr; Back to single-product finder</a>
        <a href="/detect">Multi-object detection demo</a>
      </div>
    </div>
  </body>
</html>
"#,
        css = PRODUCTS_CSS,
        rows = rows
    )
}

/// Result card for a single-product prediction: pill, confidence bar, image
/// preview, and location rows when the product was found.
pub fn predict_result_page(response: &PredictResponse, preview_url: Option<&str>) -> String {
    let label = escape_html(&response.predicted_label);
    let pct = format!("{:.1}", response.confidence * 100.0);
    let bar_color = confidence_color(response.confidence);
    let status_text = if response.found_in_database {
        "Found in database ✅"
    } else {
        "Not in database ❌"
    };

    let preview_block = match preview_url {
        Some(url) => format!(
            r#"<div class="preview"><div class="preview-label">Uploaded image</div><img src="{}" alt="Uploaded image" /></div>"#,
            escape_html(url)
        ),
        None => String::new(),
    };

    let details_block = match (&response.location, &response.meta) {
        (Some(location), Some(meta)) => {
            let stock_text = if meta.in_stock {
                "In stock"
            } else {
                "Out of stock"
            };
            format!(
                r#"<div class="row"><span class="label">Aisle:</span> <span class="value">{aisle}</span></div>
          <div class="row"><span class="label">Section:</span> <span class="value">{section}</span></div>
          <div class="row"><span class="label">Category:</span> <span class="value">{category}</span></div>
          <div class="row"><span class="label">Price:</span> <span class="value">${price:.2}</span></div>
          <div class="row"><span class="label">Stock:</span> <span class="value">{stock}</span></div>"#,
                aisle = escape_html(&location.aisle),
                section = escape_html(&location.section),
                category = escape_html(&meta.category),
                price = meta.price,
                stock = stock_text
            )
        }
        _ => r#"<div class="status">No aisle/section data available for this product.</div>"#
            .to_string(),
    };

    format!(
        r#"<html>
  <head>
    <title>Result – Grocery Aisle Product Finder</title>
    <style>{css}</style>
  </head>
  <body>
    <div class="container">
      <div class="pill">Prediction: {label}</div>
      <h1>Product location result</h1>

      <div class="row">
        <span class="label">Confidence:</span>
        <span class="value">{pct}%</span>
      </div>

      <div class="confidence-container">
        <div class="confidence-label">Confidence level</div>
        <div class="confidence-bar-bg">
          <div class="confidence-bar-fill" style="width: {pct}%; background: {bar_color};"></div>
        </div>
      </div>

      {preview_block}

      {details_block}

      <div class="status"><strong>{status_text}</strong></div>

      <div class="back">
        <a href="/" class="button">Search another product</a>
      </div>
    </div>
  </body>
</html>
"#,
        css = RESULT_CSS,
        label = label,
        pct = pct,
        bar_color = bar_color,
        preview_block = preview_block,
        details_block = details_block,
        status_text = status_text
    )
}

/// Side-by-side original and annotated images plus a detections table.
pub fn detect_result_page(
    base: &BasePrediction,
    detections: &[SimulatedDetection],
    original_url: &str,
    annotated_url: &str,
) -> String {
    let mut rows = String::new();
    for detection in detections {
        let [x1, y1, x2, y2] = detection.bbox;
        rows.push_str(&format!(
            "            <tr>\n              <td>{}</td>\n              <td>{:.2}</td>\n              <td>({}, {}) – ({}, {})</td>\n            </tr>\n",
            escape_html(&detection.label),
            detection.confidence,
            x1,
            y1,
            x2,
            y2
        ));
    }

    format!(
        r#"<html>
  <head>
    <title>Multi-object Detection Result</title>
    <style>{css}</style>
  </head>
  <body>
    <div class="container">
      <h1>Multi-object Detection Result (Simulated)</h1>
      <div class="meta">
        Base prediction: <strong>{label}</strong> ({pct}% confidence)
      </div>

      <div class="layout">
        <div class="column">
          <div class="img-label">Original uploaded image</div>
          <div class="img-block">
            <img src="{original_url}" alt="Original image" />
          </div>
        </div>
        <div class="column">
          <div class="img-label">Annotated image with simulated detections</div>
          <div class="img-block">
            <img src="{annotated_url}" alt="Annotated detections" />
          </div>
        </div>
      </div>

      <table>
        <thead>
          <tr>
            <th>Label</th>
            <th>Confidence</th>
            <th>Bounding Box (x1, y1 – x2, y2)</th>
          </tr>
        </thead>
        <tbody>
{rows}        </tbody>
      </table>

      <a href="/detect" class="button">Run another detection</a>
    </div>
  </body>
</html>
"#,
        css = DETECT_RESULT_CSS,
        label = escape_html(&base.label),
        pct = format!("{:.1}", base.confidence * 100.0),
        original_url = escape_html(original_url),
        annotated_url = escape_html(annotated_url),
        rows = rows
    )
}

const INDEX_PAGE: &str = r#"<html>
  <head>
    <title>Grocery Aisle Product Finder</title>
    <style>
      body {
        font-family: system-ui, -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
        background: #f4f4f7;
        display: flex;
        justify-content: center;
        align-items: flex-start;
        padding-top: 60px;
      }
      .container {
        background: #ffffff;
        padding: 24px 28px;
        border-radius: 12px;
        box-shadow: 0 8px 20px rgba(15, 23, 42, 0.12);
        width: 420px;
      }
      .nav {
        display: flex;
        gap: 12px;
        font-size: 0.8rem;
        margin-bottom: 12px;
      }
      .nav a {
        color: #2563eb;
        text-decoration: none;
      }
      .nav a:hover {
        text-decoration: underline;
      }
      h1 {
        margin-top: 0;
        font-size: 1.5rem;
      }
      p {
        color: #4b5563;
        font-size: 0.9rem;
      }
      form {
        margin-top: 16px;
        display: flex;
        flex-direction: column;
        gap: 12px;
      }
      .dropzone {
        border: 2px dashed #cbd5f5;
        border-radius: 10px;
        padding: 18px;
        text-align: center;
        font-size: 0.9rem;
        color: #6b7280;
        cursor: pointer;
        background: #f9fafb;
      }
      .dropzone.dragover {
        background: #eff6ff;
        border-color: #2563eb;
        color: #1d4ed8;
      }
      .file-status {
        margin-top: 6px;
        font-size: 0.8rem;
        color: #6b7280;
      }
      button {
        border: none;
        padding: 10px 14px;
        border-radius: 8px;
        background: #2563eb;
        color: white;
        font-weight: 600;
        cursor: pointer;
      }
      button:hover {
        background: #1d4ed8;
      }
      .note {
        margin-top: 12px;
        font-size: 0.8rem;
        color: #6b7280;
      }
      .api-note {
        margin-top: 16px;
        font-size: 0.8rem;
        color: #9ca3af;
      }
      code {
        background: #f3f4f6;
        padding: 2px 4px;
        border-radius: 4px;
        font-size: 0.8rem;
      }
      a {
        color: #2563eb;
        text-decoration: none;
      }
      a:hover {
        text-decoration: underline;
      }
    </style>
  </head>
  <body>
    <div class="container">
      <div class="nav">
        <a href="/">Home</a>
        <a href="/products">Products</a>
        <a href="/detect">Detect</a>
        <a href="/docs">API Docs</a>
      </div>

      <h1>Grocery Aisle Product Finder 🛒</h1>
      <p>Upload a product image and see which aisle &amp; section it belongs to.</p>

      <form id="upload-form" action="/predict" enctype="multipart/form-data" method="post">
        <input id="file-input" name="file" type="file" accept="image/*" required hidden>
        <div id="dropzone" class="dropzone">
          Drag &amp; drop an image here, or click to browse.
        </div>
        <div id="file-status" class="file-status"></div>
        <button type="submit">Find product location</button>
      </form>

      <div class="note">
        Try a photo of a <strong>banana</strong>, <strong>apple</strong>,
        <strong>cereal</strong>, or <strong>milk</strong> for a nicer-looking result.
      </div>

      <div class="api-note">
        API users: send a POST with <code>multipart/form-data</code> to
        <code>/api/predict</code> with field <code>file</code> to get raw JSON.
      </div>

      <div class="api-note">
        Browse the <a href="/products">product catalog</a> or try the
        <a href="/detect">multi-object detection demo</a>.
      </div>
    </div>
    <script>
      (function () {
        const dropzone = document.getElementById('dropzone');
        const fileInput = document.getElementById('file-input');
        const status = document.getElementById('file-status');

        if (!dropzone || !fileInput) return;

        function updateStatus() {
          if (fileInput.files && fileInput.files.length > 0) {
            const name = fileInput.files[0].name;
            status.textContent = `Selected: ${name}`;
          } else {
            status.textContent = '';
          }
        }

        dropzone.addEventListener('click', () => fileInput.click());

        dropzone.addEventListener('dragover', (e) => {
          e.preventDefault();
          dropzone.classList.add('dragover');
        });

        ['dragleave', 'dragend'].forEach((type) => {
          dropzone.addEventListener(type, (e) => {
            e.preventDefault();
            dropzone.classList.remove('dragover');
          });
        });

        dropzone.addEventListener('drop', (e) => {
          e.preventDefault();
          dropzone.classList.remove('dragover');
          if (e.dataTransfer && e.dataTransfer.files && e.dataTransfer.files.length > 0) {
            fileInput.files = e.dataTransfer.files;
            updateStatus();
          }
        });

        fileInput.addEventListener('change', updateStatus);
      })();
    </script>
  </body>
</html>
"#;

const DETECT_PAGE: &str = r#"<html>
  <head>
    <title>Multi-object Detection Demo</title>
    <style>
      body {
        font-family: system-ui, -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
        background: #f4f4f7;
        display: flex;
        justify-content: center;
        align-items: flex-start;
        padding-top: 60px;
      }
      .container {
        background: #ffffff;
        padding: 24px 28px;
        border-radius: 12px;
        box-shadow: 0 8px 20px rgba(15, 23, 42, 0.12);
        width: 460px;
      }
      .nav {
        display: flex;
        gap: 12px;
        font-size: 0.8rem;
        margin-bottom: 12px;
      }
      .nav a {
        color: #2563eb;
        text-decoration: none;
      }
      .nav a:hover {
        text-decoration: underline;
      }
      h1 {
        margin-top: 0;
        font-size: 1.4rem;
      }
      p {
        color: #4b5563;
        font-size: 0.9rem;
      }
      form {
        margin-top: 16px;
        display: flex;
        flex-direction: column;
        gap: 12px;
      }
      .dropzone {
        border: 2px dashed #cbd5f5;
        border-radius: 10px;
        padding: 18px;
        text-align: center;
        font-size: 0.9rem;
        color: #6b7280;
        cursor: pointer;
        background: #f9fafb;
      }
      .dropzone.dragover {
        background: #eff6ff;
        border-color: #2563eb;
        color: #1d4ed8;
      }
      button {
        border: none;
        padding: 10px 14px;
        border-radius: 8px;
        background: #2563eb;
        color: white;
        font-weight: 600;
        cursor: pointer;
      }
      button:hover {
        background: #1d4ed8;
      }
      .note {
        margin-top: 12px;
        font-size: 0.8rem;
        color: #6b7280;
      }
      a.back-link {
        display: inline-block;
        margin-top: 12px;
        font-size: 0.8rem;
        color: #2563eb;
        text-decoration: none;
      }
      a.back-link:hover {
        text-decoration: underline;
      }
    </style>
  </head>
  <body>
    <div class="container">
      <div class="nav">
        <a href="/">Home</a>
        <a href="/products">Products</a>
        <a href="/detect">Detect</a>
        <a href="/docs">API Docs</a>
      </div>

      <h1>Multi-object Detection (Simulated) 🧪</h1>
      <p>
        Upload a product image to see a simulated multi-object detection result
        with multiple boxes and labels.
      </p>

      <form id="detect-form" action="/detect" enctype="multipart/form-data" method="post">
        <input id="detect-file-input" name="file" type="file" accept="image/*" required hidden>
        <div id="detect-dropzone" class="dropzone">
          Drag &amp; drop an image here, or click to browse.
        </div>
        <button type="submit">Run detection</button>
      </form>

      <div class="note">
        This is a demo: detections are simulated based on the classifier's prediction.
      </div>

      <a href="/" class="back-link">&larr; Back to single-product finder</a>
    </div>

    <script>
      (function () {
        const dropzone = document.getElementById('detect-dropzone');
        const fileInput = document.getElementById('detect-file-input');

        if (!dropzone || !fileInput) return;

        dropzone.addEventListener('click', () => fileInput.click());

        dropzone.addEventListener('dragover', (e) => {
          e.preventDefault();
          dropzone.classList.add('dragover');
        });

        ['dragleave', 'dragend'].forEach((type) => {
          dropzone.addEventListener(type, (e) => {
            e.preventDefault();
            dropzone.classList.remove('dragover');
          });
        });

        dropzone.addEventListener('drop', (e) => {
          e.preventDefault();
          dropzone.classList.remove('dragover');
          if (e.dataTransfer && e.dataTransfer.files && e.dataTransfer.files.length > 0) {
            fileInput.files = e.dataTransfer.files;
          }
        });
      })();
    </script>
  </body>
</html>
"#;

const DOCS_PAGE: &str = r#"<html>
  <head>
    <title>API Reference – Grocery Aisle Product Finder</title>
    <style>
      body {
        font-family: system-ui, -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
        background: #f4f4f7;
        display: flex;
        justify-content: center;
        align-items: flex-start;
        padding-top: 40px;
      }
      .container {
        background: #ffffff;
        padding: 24px 28px;
        border-radius: 12px;
        box-shadow: 0 8px 20px rgba(15, 23, 42, 0.12);
        width: 720px;
      }
      .nav {
        display: flex;
        gap: 12px;
        font-size: 0.8rem;
        margin-bottom: 12px;
      }
      .nav a {
        color: #2563eb;
        text-decoration: none;
      }
      .nav a:hover {
        text-decoration: underline;
      }
      h1 {
        margin-top: 0;
        font-size: 1.4rem;
      }
      h2 {
        font-size: 1.0rem;
        margin-top: 20px;
        margin-bottom: 4px;
      }
      p {
        color: #4b5563;
        font-size: 0.9rem;
        margin: 4px 0;
      }
      code {
        background: #f3f4f6;
        padding: 2px 4px;
        border-radius: 4px;
        font-size: 0.8rem;
      }
      pre {
        background: #f3f4f6;
        padding: 10px;
        border-radius: 8px;
        font-size: 0.8rem;
        overflow-x: auto;
      }
      .method {
        display: inline-block;
        padding: 2px 6px;
        border-radius: 6px;
        background: #eff6ff;
        color: #1d4ed8;
        font-size: 0.75rem;
        font-weight: 600;
        margin-right: 6px;
      }
    </style>
  </head>
  <body>
    <div class="container">
      <div class="nav">
        <a href="/">Home</a>
        <a href="/products">Products</a>
        <a href="/detect">Detect</a>
        <a href="/docs">API Docs</a>
      </div>

      <h1>API Reference</h1>
      <p>
        Upload endpoints accept <code>multipart/form-data</code> with a single
        file field named <code>file</code>. The file's Content-Type must start
        with <code>image/</code>.
      </p>

      <h2><span class="method">POST</span><code>/api/predict</code></h2>
      <p>Classify one product photo and look up its shelf location.</p>
      <pre>curl -s -F "file=@banana.jpg;type=image/jpeg" http://127.0.0.1:8000/api/predict</pre>
      <p>
        Returns <code>predicted_label</code>, <code>confidence</code>,
        <code>found_in_database</code>, plus <code>location</code>
        (aisle, section) and <code>meta</code> (category, price, in_stock)
        when the product is in the catalog. Misses carry a
        <code>message</code> and null <code>location</code>/<code>meta</code>.
      </p>

      <h2><span class="method">POST</span><code>/api/detect</code></h2>
      <p>
        Simulated multi-object detection: returns the base prediction plus up
        to three fabricated detections with <code>label</code>,
        <code>confidence</code>, and a pixel <code>bbox</code>
        <code>[x1, y1, x2, y2]</code>.
      </p>
      <pre>curl -s -F "file=@banana.jpg;type=image/jpeg" http://127.0.0.1:8000/api/detect</pre>

      <h2><span class="method">POST</span><code>/products/basic</code></h2>
      <p>
        Classification only, no catalog lookup. Returns
        <code>detected_product</code> (name, confidence), a null
        <code>location</code>, and a human-readable <code>message</code>.
      </p>

      <h2><span class="method">POST</span><code>/predict</code> and <code>/detect</code></h2>
      <p>HTML versions of the endpoints above, used by the upload forms.</p>

      <h2><span class="method">GET</span><code>/health</code></h2>
      <p>Liveness probe; returns <code>{"status":"ok"}</code>.</p>

      <h2>Errors</h2>
      <p>
        Non-image uploads and undecodable files are rejected with status 400
        and a JSON body such as
        <code>{"error":"please upload an image file"}</code>. Oversized
        uploads get 413; unknown paths 404; wrong methods 405.
      </p>
    </div>
  </body>
</html>
"#;

const PRODUCTS_CSS: &str = r#"
      body {
        font-family: system-ui, -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
        background: #f4f4f7;
        display: flex;
        justify-content: center;
        align-items: flex-start;
        padding-top: 40px;
      }
      .container {
        background: #ffffff;
        padding: 24px 28px;
        border-radius: 12px;
        box-shadow: 0 8px 20px rgba(15, 23, 42, 0.12);
        width: 800px;
      }
      h1 {
        margin-top: 0;
        font-size: 1.4rem;
      }
      table {
        width: 100%;
        border-collapse: collapse;
        margin-top: 12px;
        font-size: 0.9rem;
      }
      th, td {
        border-bottom: 1px solid #e5e7eb;
        padding: 6px 4px;
        text-align: left;
      }
      th {
        font-weight: 600;
        color: #4b5563;
      }
      .links {
        margin-top: 14px;
        font-size: 0.8rem;
      }
      .links a {
        color: #2563eb;
        text-decoration: none;
        margin-right: 12px;
      }
      .links a:hover {
        text-decoration: underline;
      }
"#;

const RESULT_CSS: &str = r#"
      body {
        font-family: system-ui, -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
        background: #f4f4f7;
        display: flex;
        justify-content: center;
        align-items: flex-start;
        padding-top: 60px;
      }
      .container {
        background: #ffffff;
        padding: 24px 28px;
        border-radius: 12px;
        box-shadow: 0 8px 20px rgba(15, 23, 42, 0.12);
        width: 460px;
      }
      h1 {
        margin-top: 0;
        font-size: 1.4rem;
      }
      .pill {
        display: inline-block;
        padding: 4px 8px;
        border-radius: 999px;
        font-size: 0.75rem;
        background: #eff6ff;
        color: #1d4ed8;
        margin-bottom: 8px;
      }
      .row {
        margin: 6px 0;
        font-size: 0.9rem;
      }
      .label {
        color: #6b7280;
      }
      .value {
        font-weight: 600;
      }
      .status {
        margin-top: 12px;
        font-size: 0.9rem;
      }
      .back {
        margin-top: 18px;
      }
      a.button {
        display: inline-block;
        padding: 8px 12px;
        border-radius: 8px;
        background: #2563eb;
        color: white;
        text-decoration: none;
        font-size: 0.9rem;
        font-weight: 600;
      }
      a.button:hover {
        background: #1d4ed8;
      }
      .preview {
        margin-top: 12px;
        margin-bottom: 16px;
      }
      .preview-label {
        font-size: 0.8rem;
        color: #6b7280;
        margin-bottom: 4px;
      }
      .preview img {
        max-width: 100%;
        border-radius: 8px;
        box-shadow: 0 4px 12px rgba(15, 23, 42, 0.25);
      }
      .confidence-container {
        margin-top: 10px;
        margin-bottom: 12px;
      }
      .confidence-label {
        font-size: 0.8rem;
        color: #6b7280;
        margin-bottom: 4px;
      }
      .confidence-bar-bg {
        width: 100%;
        height: 10px;
        border-radius: 999px;
        background: #e5e7eb;
        overflow: hidden;
      }
      .confidence-bar-fill {
        height: 100%;
        border-radius: 999px;
        transition: width 0.3s ease;
      }
"#;

const DETECT_RESULT_CSS: &str = r#"
      body {
        font-family: system-ui, -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
        background: #f4f4f7;
        display: flex;
        justify-content: center;
        align-items: flex-start;
        padding-top: 40px;
      }
      .container {
        background: #ffffff;
        padding: 24px 28px;
        border-radius: 12px;
        box-shadow: 0 8px 20px rgba(15, 23, 42, 0.12);
        width: 900px;
      }
      h1 {
        margin-top: 0;
        font-size: 1.4rem;
      }
      .layout {
        display: flex;
        gap: 20px;
        margin-top: 16px;
      }
      .column {
        flex: 1;
      }
      .img-block img {
        max-width: 100%;
        border-radius: 8px;
        box-shadow: 0 4px 12px rgba(15, 23, 42, 0.25);
      }
      .img-label {
        font-size: 0.8rem;
        color: #6b7280;
        margin-bottom: 4px;
      }
      table {
        width: 100%;
        border-collapse: collapse;
        margin-top: 12px;
        font-size: 0.85rem;
      }
      th, td {
        border-bottom: 1px solid #e5e7eb;
        padding: 6px 4px;
        text-align: left;
      }
      th {
        font-weight: 600;
        color: #4b5563;
      }
      .meta {
        font-size: 0.85rem;
        color: #6b7280;
        margin-top: 8px;
      }
      a.button {
        display: inline-block;
        margin-top: 16px;
        padding: 8px 12px;
        border-radius: 8px;
        background: #2563eb;
        color: white;
        text-decoration: none;
        font-size: 0.9rem;
        font-weight: 600;
      }
      a.button:hover {
        background: #1d4ed8;
      }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, in_stock: bool) -> ProductLocation {
        ProductLocation {
            product_name: name.to_string(),
            category: "Fruit".to_string(),
            aisle: "7".to_string(),
            section: "A1".to_string(),
            price: 0.25,
            in_stock,
        }
    }

    #[test]
    fn escape_html_covers_specials() {
        assert_eq!(
            escape_html(r#"<b>"a" & 'b'</b>"#),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("banana"), "banana");
    }

    #[test]
    fn confidence_color_thresholds() {
        assert_eq!(confidence_color(0.95), "#16a34a");
        assert_eq!(confidence_color(0.8), "#16a34a");
        assert_eq!(confidence_color(0.79), "#eab308");
        assert_eq!(confidence_color(0.5), "#eab308");
        assert_eq!(confidence_color(0.49), "#dc2626");
    }

    #[test]
    fn products_page_renders_rows_and_escapes() {
        let page = products_page(&[
            product("banana", true),
            product("x<script>", false),
        ]);
        assert!(page.contains("<td>banana</td>"));
        assert!(page.contains("$0.25"));
        assert!(page.contains("In stock"));
        assert!(page.contains("Out of stock"));
        assert!(page.contains("x&lt;script&gt;"));
        assert!(!page.contains("x<script>"));
    }

    #[test]
    fn predict_result_found_renders_location_rows() {
        let response = PredictResponse::found("banana", 0.95, &product("banana", true));
        let page = predict_result_page(&response, Some("data:image/jpeg;base64,AAAA"));

        assert!(page.contains("Prediction: banana"));
        assert!(page.contains("95.0%"));
        assert!(page.contains("#16a34a"));
        assert!(page.contains("Aisle:"));
        assert!(page.contains("Found in database"));
        assert!(page.contains("data:image/jpeg;base64,AAAA"));
    }

    #[test]
    fn predict_result_miss_renders_fallback() {
        let response = PredictResponse::not_found("neither", 0.41);
        let page = predict_result_page(&response, None);

        assert!(page.contains("Not in database"));
        assert!(page.contains("No aisle/section data available"));
        assert!(page.contains("#dc2626"));
        assert!(!page.contains("Aisle:"));
    }

    #[test]
    fn detect_result_renders_table_and_images() {
        let base = BasePrediction {
            label: "banana".to_string(),
            confidence: 0.95,
        };
        let detections = vec![SimulatedDetection {
            label: "apple".to_string(),
            confidence: 0.66,
            bbox: [1, 2, 3, 4],
        }];
        let page = detect_result_page(&base, &detections, "data:o", "data:a");

        assert!(page.contains("Base prediction: <strong>banana</strong>"));
        assert!(page.contains("(1, 2) – (3, 4)"));
        assert!(page.contains("0.66"));
        assert!(page.contains(r#"src="data:o""#));
        assert!(page.contains(r#"src="data:a""#));
    }

    #[test]
    fn static_pages_carry_nav() {
        for page in [index_page(), detect_page(), docs_page()] {
            assert!(page.contains(r#"<a href="/products">Products</a>"#));
            assert!(page.contains(r#"<a href="/docs">API Docs</a>"#));
        }
    }
}
