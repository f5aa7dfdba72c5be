//! Image decoding and detection-box annotation.
//!
//! Draws hollow boxes plus a filled label strip for each simulated detection,
//! then re-encodes the frame as JPEG for embedding in HTML as a data URL. Font
//! loading is best-effort: when no usable TTF is found the boxes are still
//! drawn, only the text labels are skipped.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::sim::SimulatedDetection;

/// Box and label-strip color.
pub const BOX_COLOR: Rgb<u8> = Rgb([37, 99, 235]);

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const BOX_THICKNESS: u32 = 3;
const LABEL_STRIP_HEIGHT: u32 = 16;
const LABEL_STRIP_WIDTH: u32 = 110;
const LABEL_FONT_SIZE: f32 = 14.0;
const JPEG_QUALITY: u8 = 75;

/// Fallback font locations probed when no font path is configured.
const SYSTEM_FONT_PATHS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
];

/// Decode an uploaded image into an RGB frame.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    let decoded = image::load_from_memory(bytes).context("failed to decode image bytes")?;
    Ok(decoded.into_rgb8())
}

/// Load a label font, preferring the configured path. Returns `None` when no
/// candidate loads so callers can fall back to label-free boxes.
pub fn load_font(configured: Option<&Path>) -> Option<FontVec> {
    let candidates = configured
        .into_iter()
        .map(Path::to_path_buf)
        .chain(SYSTEM_FONT_PATHS.iter().map(Into::into));

    for candidate in candidates {
        match std::fs::read(&candidate) {
            Ok(data) => match FontVec::try_from_vec(data) {
                Ok(font) => {
                    log::debug!("loaded label font from {}", candidate.display());
                    return Some(font);
                }
                Err(e) => {
                    log::warn!("font {} did not parse: {}", candidate.display(), e);
                }
            },
            Err(_) => continue,
        }
    }

    log::warn!("no label font found; annotated images will omit label text");
    None
}

/// Draw every detection onto a copy of the frame: a hollow box, and when a
/// font is available, a filled strip above the box with `"{label} {NN}%"`
/// text. The input frame is left untouched so callers can show both versions
/// side by side.
pub fn draw_detections(
    image: &RgbImage,
    detections: &[SimulatedDetection],
    font: Option<&FontVec>,
) -> RgbImage {
    let mut annotated = image.clone();
    for detection in detections {
        draw_box(&mut annotated, &detection.bbox);
        if let Some(font) = font {
            draw_label(&mut annotated, font, detection);
        }
    }
    annotated
}

fn draw_box(image: &mut RgbImage, bbox: &[u32; 4]) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let x1 = bbox[0].min(width - 1);
    let y1 = bbox[1].min(height - 1);
    let x2 = bbox[2].min(width - 1).max(x1);
    let y2 = bbox[3].min(height - 1).max(y1);

    for inset in 0..BOX_THICKNESS {
        let left = (x1 + inset).min(x2);
        let top = (y1 + inset).min(y2);
        let right = x2.saturating_sub(inset).max(left);
        let bottom = y2.saturating_sub(inset).max(top);

        for x in left..=right {
            image.put_pixel(x, top, BOX_COLOR);
            image.put_pixel(x, bottom, BOX_COLOR);
        }
        for y in top..=bottom {
            image.put_pixel(left, y, BOX_COLOR);
            image.put_pixel(right, y, BOX_COLOR);
        }
    }
}

fn draw_label(image: &mut RgbImage, font: &FontVec, detection: &SimulatedDetection) {
    let x1 = detection.bbox[0] as i32;
    let y1 = detection.bbox[1] as i32;
    let strip_top = y1 - LABEL_STRIP_HEIGHT as i32;

    let strip = Rect::at(x1, strip_top).of_size(LABEL_STRIP_WIDTH, LABEL_STRIP_HEIGHT);
    draw_filled_rect_mut(image, strip, BOX_COLOR);

    let text = format!(
        "{} {}%",
        detection.label,
        (detection.confidence * 100.0) as i32
    );
    draw_text_mut(
        image,
        TEXT_COLOR,
        x1 + 4,
        strip_top + 2,
        PxScale::from(LABEL_FONT_SIZE),
        font,
        &text,
    );
}

/// Encode the frame as JPEG.
pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder
        .encode_image(image)
        .context("failed to encode JPEG")?;
    Ok(out)
}

/// Wrap raw bytes in a data URL suitable for an `<img src>` attribute.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        general_purpose::STANDARD.encode(bytes)
    )
}
