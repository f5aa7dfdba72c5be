//! Embedded HTTP server for the product finder.
//!
//! Runs on a background thread with a plain `TcpListener` and a hand-rolled
//! HTTP/1.1 request parser, which keeps the binary free of an async runtime.
//! The listener polls in non-blocking mode so shutdown requests are observed
//! within one poll interval.
//!
//! Routes:
//! - `GET /` and `GET /detect` serve the upload pages, `GET /docs` the API
//!   reference, `GET /products` the catalog table, `GET /health` a liveness
//!   check.
//! - `POST /predict` and `POST /api/predict` classify an upload and look up
//!   its shelf location (HTML and JSON respectively).
//! - `POST /detect` and `POST /api/detect` add simulated object detections,
//!   the HTML variant with an annotated copy of the image.
//! - `POST /products/basic` returns the bare detection without a catalog
//!   lookup.

pub mod multipart;

use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ab_glyph::FontVec;
use anyhow::{anyhow, Context, Result};

use crate::annotate;
use crate::catalog::{self, ProductStore, SqliteProductStore};
use crate::classify::{registry_from_settings, BackendRegistry};
use crate::config::{ClassifierSettings, FinderConfig};
use crate::pages;
use crate::reqlog::RequestLog;
use crate::schemas::{BasePrediction, DetectResponse, LocateResponse, PredictResponse};
use crate::sim::simulate_detections;

/// Upper bound on the request line plus headers.
const MAX_HEAD_BYTES: usize = 16 * 1024;
/// How long the accept loop sleeps when no connection is pending.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Per-connection read timeout so a stalled client cannot pin the server.
const READ_TIMEOUT: Duration = Duration::from_secs(5);
/// Floor on how much of an oversized body is drained before the 413 is
/// written. Leaving unread bytes behind makes the close reset the
/// connection, which can destroy the error response before the client
/// reads it.
const MIN_REJECT_DRAIN_BYTES: usize = 1024 * 1024;

/// Routes the server responds to. Anything else is a 404; a known path with
/// the wrong method is a 405.
const KNOWN_PATHS: &[&str] = &[
    "/",
    "/products",
    "/products/basic",
    "/detect",
    "/docs",
    "/health",
    "/predict",
    "/api/predict",
    "/api/detect",
];

/// Everything the server needs to start. [`Default`] gives an ephemeral
/// in-memory configuration suitable for tests.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub max_upload_bytes: usize,
    pub db_path: String,
    pub catalog_csv: PathBuf,
    pub request_log: PathBuf,
    pub font_path: Option<PathBuf>,
    pub classifier: ClassifierSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8000".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            db_path: ":memory:".to_string(),
            catalog_csv: PathBuf::from("data/products.csv"),
            request_log: PathBuf::from("data/requests.log"),
            font_path: None,
            classifier: ClassifierSettings::default(),
        }
    }
}

impl From<&FinderConfig> for ServerConfig {
    fn from(config: &FinderConfig) -> Self {
        Self {
            addr: config.http_addr.clone(),
            max_upload_bytes: config.max_upload_bytes,
            db_path: config.db_path.clone(),
            catalog_csv: config.catalog_csv.clone(),
            request_log: config.request_log.clone(),
            font_path: config.font_path.clone(),
            classifier: config.classifier.clone(),
        }
    }
}

/// Handle to a running server. Dropping it leaves the thread running;
/// call [`ServerHandle::stop`] for an orderly shutdown.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// The address the listener actually bound, with any ephemeral port
    /// resolved.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal the server thread to stop and wait for it to exit.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("HTTP server thread panicked"))?;
        }
        Ok(())
    }
}

/// The product finder HTTP server.
pub struct FinderServer {
    config: ServerConfig,
}

impl FinderServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bind the listener and start serving on a background thread.
    ///
    /// Binding happens on the caller's thread so address errors surface
    /// immediately; catalog seeding and classifier warm-up run on the server
    /// thread.
    pub fn spawn(self) -> Result<ServerHandle> {
        let configured: SocketAddr = self
            .config
            .addr
            .parse()
            .with_context(|| format!("invalid listen address '{}'", self.config.addr))?;
        let listener = TcpListener::bind(configured)
            .with_context(|| format!("failed to bind {}", configured))?;
        let addr = listener
            .local_addr()
            .context("failed to read bound address")?;
        if configured.ip().is_loopback() && !addr.ip().is_loopback() {
            return Err(anyhow!(
                "configured loopback address {} but bound {}",
                configured,
                addr
            ));
        }
        listener
            .set_nonblocking(true)
            .context("failed to set listener non-blocking")?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);
        let config = self.config;
        let join = thread::spawn(move || {
            if let Err(err) = run_server(listener, config, thread_shutdown) {
                log::error!("HTTP server terminated: {err:#}");
            }
        });

        Ok(ServerHandle {
            addr,
            shutdown,
            join: Some(join),
        })
    }
}

/// Shared per-server resources, built once on the server thread.
struct ServerState {
    store: SqliteProductStore,
    registry: BackendRegistry,
    font: Option<FontVec>,
    request_log: RequestLog,
    max_upload_bytes: usize,
}

impl ServerState {
    fn new(config: &ServerConfig) -> Result<Self> {
        let mut store = SqliteProductStore::open(&config.db_path)?;
        let seeded = catalog::seed_if_empty(&mut store, &config.catalog_csv)?;
        if seeded > 0 {
            log::info!(
                "seeded {} products from {}",
                seeded,
                config.catalog_csv.display()
            );
        }
        let registry = registry_from_settings(&config.classifier)?;
        registry.warm_up_all()?;
        let font = annotate::load_font(config.font_path.as_deref());
        Ok(Self {
            store,
            registry,
            font,
            request_log: RequestLog::new(config.request_log.clone()),
            max_upload_bytes: config.max_upload_bytes,
        })
    }
}

fn run_server(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    let state = ServerState::new(&config)?;
    log::info!(
        "product finder listening on {} (classifier: {})",
        listener
            .local_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| config.addr.clone()),
        state.registry.default_name().unwrap_or("none")
    );

    loop {
        if shutdown.load(Ordering::SeqCst) {
            return Ok(());
        }
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(err) = handle_connection(stream, &state) {
                    log::warn!("request from {} failed: {err:#}", peer);
                }
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(err) => return Err(err).context("accept failed"),
        }
    }
}

fn handle_connection(mut stream: TcpStream, state: &ServerState) -> Result<()> {
    stream
        .set_read_timeout(Some(READ_TIMEOUT))
        .context("failed to set read timeout")?;

    let (head, leftover) = read_head(&mut stream)?;
    let request = parse_head(&head)?;

    let content_length = content_length(&request)?;
    if content_length > state.max_upload_bytes {
        let drain_cap = state
            .max_upload_bytes
            .saturating_mul(2)
            .max(MIN_REJECT_DRAIN_BYTES);
        drain_body(&mut stream, leftover.len(), content_length, drain_cap);
        let response = Response::json(413, r#"{"error":"upload too large"}"#);
        return write_response(&mut stream, &response);
    }
    let body = read_body(&mut stream, leftover, content_length)?;

    let response = match route_request(&request, &body, state) {
        Ok(response) => response,
        Err(err) => {
            log::error!("{} {} failed: {err:#}", request.method, request.path);
            Response::json(500, r#"{"error":"internal server error"}"#)
        }
    };
    write_response(&mut stream, &response)
}

#[derive(Debug)]
struct Request {
    method: String,
    path: String,
    headers: HashMap<String, String>,
}

impl Request {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Read from the stream until the blank line ending the request head.
/// Returns the head and any body bytes that arrived in the same chunks.
fn read_head(stream: &mut TcpStream) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let read = stream.read(&mut chunk).context("failed to read request")?;
        if read == 0 {
            return Err(anyhow!("connection closed before request head completed"));
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(end) = multipart::find(&buffer, b"\r\n\r\n") {
            let leftover = buffer.split_off(end + 4);
            return Ok((buffer, leftover));
        }
        if buffer.len() > MAX_HEAD_BYTES {
            return Err(anyhow!("request head exceeds {} bytes", MAX_HEAD_BYTES));
        }
    }
}

fn parse_head(head: &[u8]) -> Result<Request> {
    let text = String::from_utf8_lossy(head);
    let mut lines = text.split("\r\n");
    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| anyhow!("malformed request line"))?
        .to_string();
    let target = parts
        .next()
        .ok_or_else(|| anyhow!("malformed request line"))?;
    let path = target.split('?').next().unwrap_or(target).to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    Ok(Request {
        method,
        path,
        headers,
    })
}

fn content_length(request: &Request) -> Result<usize> {
    match request.header("content-length") {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| anyhow!("invalid Content-Length '{}'", raw)),
        None => Ok(0),
    }
}

/// Read and discard up to `cap` bytes of a body being rejected. Bodies far
/// past the cap are abandoned; read errors end the drain, since by this
/// point the only goal is getting the error response delivered.
fn drain_body(stream: &mut TcpStream, already_read: usize, content_length: usize, cap: usize) {
    let mut remaining = content_length.saturating_sub(already_read).min(cap);
    let mut chunk = [0u8; 64 * 1024];
    while remaining > 0 {
        let want = remaining.min(chunk.len());
        match stream.read(&mut chunk[..want]) {
            Ok(0) | Err(_) => break,
            Ok(read) => remaining -= read,
        }
    }
}

fn read_body(stream: &mut TcpStream, leftover: Vec<u8>, content_length: usize) -> Result<Vec<u8>> {
    let mut body = leftover;
    if body.len() > content_length {
        body.truncate(content_length);
    }
    if body.len() < content_length {
        let mut remaining = vec![0u8; content_length - body.len()];
        stream
            .read_exact(&mut remaining)
            .context("failed to read request body")?;
        body.extend_from_slice(&remaining);
    }
    Ok(body)
}

#[derive(Debug)]
struct Response {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl Response {
    fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.into().into_bytes(),
        }
    }

    fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.into().into_bytes(),
        }
    }
}

/// Whether a handler renders its result as a browser page or API JSON.
#[derive(Clone, Copy, Debug, PartialEq)]
enum RenderFormat {
    Html,
    Json,
}

fn route_request(request: &Request, body: &[u8], state: &ServerState) -> Result<Response> {
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/") => Ok(Response::html(pages::index_page())),
        ("GET", "/detect") => Ok(Response::html(pages::detect_page())),
        ("GET", "/docs") => Ok(Response::html(pages::docs_page())),
        ("GET", "/health") => Ok(Response::json(200, r#"{"status":"ok"}"#)),
        ("GET", "/products") => {
            let products = state.store.all_products()?;
            Ok(Response::html(pages::products_page(&products)))
        }
        ("POST", "/predict") => handle_predict(request, body, state, RenderFormat::Html),
        ("POST", "/api/predict") => handle_predict(request, body, state, RenderFormat::Json),
        ("POST", "/detect") => handle_detect(request, body, state, RenderFormat::Html),
        ("POST", "/api/detect") => handle_detect(request, body, state, RenderFormat::Json),
        ("POST", "/products/basic") => handle_locate_basic(request, body, state),
        _ => Ok(unmatched_response(&request.path)),
    }
}

fn unmatched_response(path: &str) -> Response {
    if KNOWN_PATHS.contains(&path) {
        Response::json(405, r#"{"error":"method not allowed"}"#)
    } else {
        Response::json(404, r#"{"error":"not found"}"#)
    }
}

/// An uploaded image file pulled out of a multipart body.
#[derive(Debug)]
struct Upload {
    bytes: Vec<u8>,
    content_type: String,
    filename: Option<String>,
}

/// Pull the `file` field out of a multipart upload. Any shortfall, from a
/// missing boundary to a non-image content type, maps to the same 400 so
/// clients get one stable error message.
fn extract_image_upload(request: &Request, body: &[u8]) -> std::result::Result<Upload, Response> {
    let reject = || Response::json(400, r#"{"error":"please upload an image file"}"#);

    let content_type = request.header("content-type").ok_or_else(reject)?;
    let boundary = multipart::boundary_from_content_type(content_type).map_err(|_| reject())?;
    let parts = multipart::parse_multipart(body, &boundary).map_err(|_| reject())?;
    let part = multipart::find_file_field(&parts, "file").ok_or_else(reject)?;

    let declared = part.content_type.as_deref().unwrap_or("");
    let mime = declared
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    if !mime.starts_with("image/") || part.data.is_empty() {
        return Err(reject());
    }

    let upload = Upload {
        bytes: part.data.clone(),
        content_type: mime,
        filename: part.filename.clone(),
    };
    log::debug!(
        "accepted upload {} ({} bytes, {})",
        upload.filename.as_deref().unwrap_or("unnamed"),
        upload.bytes.len(),
        upload.content_type
    );
    Ok(upload)
}

fn handle_predict(
    request: &Request,
    body: &[u8],
    state: &ServerState,
    format: RenderFormat,
) -> Result<Response> {
    let upload = match extract_image_upload(request, body) {
        Ok(upload) => upload,
        Err(response) => return Ok(response),
    };
    let frame = match annotate::decode_image(&upload.bytes) {
        Ok(frame) => frame,
        Err(err) => {
            log::debug!("upload decode failed: {err:#}");
            return Ok(Response::json(400, r#"{"error":"could not read image"}"#));
        }
    };

    let (width, height) = frame.dimensions();
    let classification = state
        .registry
        .classify_with_default(frame.as_raw(), width, height)?;
    let label = classification.coarse_label();
    let confidence = classification.confidence();

    let response = match state.store.lookup(label.as_str())? {
        Some(product) => PredictResponse::found(label.as_str(), confidence, &product),
        None => PredictResponse::not_found(label.as_str(), confidence),
    };
    state.request_log.record(&response);

    match format {
        RenderFormat::Json => Ok(Response::json(200, serde_json::to_string(&response)?)),
        RenderFormat::Html => {
            let preview = annotate::to_data_url(&upload.content_type, &upload.bytes);
            Ok(Response::html(pages::predict_result_page(
                &response,
                Some(&preview),
            )))
        }
    }
}

fn handle_detect(
    request: &Request,
    body: &[u8],
    state: &ServerState,
    format: RenderFormat,
) -> Result<Response> {
    let upload = match extract_image_upload(request, body) {
        Ok(upload) => upload,
        Err(response) => return Ok(response),
    };
    let frame = match annotate::decode_image(&upload.bytes) {
        Ok(frame) => frame,
        Err(err) => {
            log::debug!("upload decode failed: {err:#}");
            return Ok(Response::json(400, r#"{"error":"could not open image"}"#));
        }
    };

    let (width, height) = frame.dimensions();
    let classification = state
        .registry
        .classify_with_default(frame.as_raw(), width, height)?;
    let base = BasePrediction {
        label: classification.coarse_label().as_str().to_string(),
        confidence: classification.confidence(),
    };
    let detections = simulate_detections(width, height, &base.label, &mut rand::thread_rng());

    match format {
        RenderFormat::Json => {
            let response = DetectResponse {
                base_prediction: base,
                detections,
            };
            Ok(Response::json(200, serde_json::to_string(&response)?))
        }
        RenderFormat::Html => {
            let annotated = annotate::draw_detections(&frame, &detections, state.font.as_ref());
            let original_url = annotate::to_data_url("image/jpeg", &annotate::encode_jpeg(&frame)?);
            let annotated_url =
                annotate::to_data_url("image/jpeg", &annotate::encode_jpeg(&annotated)?);
            Ok(Response::html(pages::detect_result_page(
                &base,
                &detections,
                &original_url,
                &annotated_url,
            )))
        }
    }
}

fn handle_locate_basic(request: &Request, body: &[u8], state: &ServerState) -> Result<Response> {
    let upload = match extract_image_upload(request, body) {
        Ok(upload) => upload,
        Err(response) => return Ok(response),
    };
    let frame = match annotate::decode_image(&upload.bytes) {
        Ok(frame) => frame,
        Err(err) => {
            log::debug!("upload decode failed: {err:#}");
            return Ok(Response::json(400, r#"{"error":"could not read image"}"#));
        }
    };

    let (width, height) = frame.dimensions();
    let classification = state
        .registry
        .classify_with_default(frame.as_raw(), width, height)?;
    let response = LocateResponse::from_label(
        classification.coarse_label().as_str(),
        classification.confidence(),
    );
    Ok(Response::json(200, serde_json::to_string(&response)?))
}

fn write_response(stream: &mut TcpStream, response: &Response) -> Result<()> {
    let status_line = match response.status {
        200 => "HTTP/1.1 200 OK",
        400 => "HTTP/1.1 400 Bad Request",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        413 => "HTTP/1.1 413 Payload Too Large",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let header = format!(
        "{status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {len}\r\nCache-Control: no-store\r\n\r\n",
        status_line = status_line,
        content_type = response.content_type,
        len = response.body.len()
    );
    stream
        .write_all(header.as_bytes())
        .context("failed to write response head")?;
    stream
        .write_all(&response.body)
        .context("failed to write response body")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, path: &str, headers: &[(&str, &str)]) -> Request {
        let mut map = HashMap::new();
        for (name, value) in headers {
            map.insert(name.to_string(), value.to_string());
        }
        Request {
            method: method.to_string(),
            path: path.to_string(),
            headers: map,
        }
    }

    #[test]
    fn parse_head_strips_query_and_lowercases_headers() {
        let head = b"POST /predict?debug=1 HTTP/1.1\r\nContent-Type: Multipart/Form-Data; boundary=x\r\nContent-Length: 42\r\n\r\n";
        let request = parse_head(head).expect("parse");
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/predict");
        assert_eq!(
            request.header("content-type"),
            Some("Multipart/Form-Data; boundary=x")
        );
        assert_eq!(request.header("content-length"), Some("42"));
    }

    #[test]
    fn parse_head_rejects_garbage() {
        assert!(parse_head(b"\r\n\r\n").is_err());
        assert!(parse_head(b"GET\r\n\r\n").is_err());
    }

    #[test]
    fn content_length_defaults_to_zero() {
        let none = request("GET", "/", &[]);
        assert_eq!(content_length(&none).expect("length"), 0);

        let some = request("POST", "/predict", &[("content-length", "128")]);
        assert_eq!(content_length(&some).expect("length"), 128);

        let bad = request("POST", "/predict", &[("content-length", "lots")]);
        assert!(content_length(&bad).is_err());
    }

    #[test]
    fn unmatched_paths_distinguish_404_and_405() {
        assert_eq!(unmatched_response("/predict").status, 405);
        assert_eq!(unmatched_response("/health").status, 405);
        assert_eq!(unmatched_response("/nope").status, 404);
    }

    #[test]
    fn extract_image_upload_accepts_image_part() {
        let body = b"--B\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.jpg\"\r\nContent-Type: image/jpeg; charset=binary\r\n\r\n\xFF\xD8data\r\n--B--\r\n";
        let request = request(
            "POST",
            "/api/predict",
            &[("content-type", "multipart/form-data; boundary=B")],
        );
        let upload = extract_image_upload(&request, body).expect("upload");
        assert_eq!(upload.content_type, "image/jpeg");
        assert_eq!(upload.bytes, b"\xFF\xD8data");
        assert_eq!(upload.filename.as_deref(), Some("a.jpg"));
    }

    #[test]
    fn extract_image_upload_rejects_non_image() {
        let body = b"--B\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n--B--\r\n";
        let request = request(
            "POST",
            "/api/predict",
            &[("content-type", "multipart/form-data; boundary=B")],
        );
        let rejected = extract_image_upload(&request, body).expect_err("rejected");
        assert_eq!(rejected.status, 400);
        assert_eq!(
            String::from_utf8(rejected.body).expect("utf8"),
            r#"{"error":"please upload an image file"}"#
        );
    }

    #[test]
    fn extract_image_upload_requires_multipart() {
        let body = b"\xFF\xD8raw jpeg bytes";
        let request = request("POST", "/api/predict", &[("content-type", "image/jpeg")]);
        assert!(extract_image_upload(&request, body).is_err());
    }
}
