//! Minimal multipart/form-data parsing for file uploads.
//!
//! Handles the subset browsers and curl produce: CRLF line endings, a
//! `boundary=` parameter on the Content-Type, per-part Content-Disposition
//! with optional quoted name/filename, and binary part bodies. Malformed
//! input yields errors, never panics.

use anyhow::{anyhow, Context, Result};

/// One decoded part of a multipart body.
#[derive(Clone, Debug)]
pub struct MultipartPart {
    pub name: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Extract the boundary string from a `multipart/form-data` Content-Type.
pub fn boundary_from_content_type(content_type: &str) -> Result<String> {
    let lower = content_type.to_ascii_lowercase();
    if !lower.trim_start().starts_with("multipart/form-data") {
        return Err(anyhow!("content type is not multipart/form-data"));
    }
    let index = lower
        .find("boundary=")
        .ok_or_else(|| anyhow!("multipart content type missing boundary"))?;
    let raw = &content_type[index + "boundary=".len()..];
    let boundary = raw.split(';').next().unwrap_or(raw).trim().trim_matches('"');
    if boundary.is_empty() {
        return Err(anyhow!("multipart boundary is empty"));
    }
    Ok(boundary.to_string())
}

/// Split a multipart body into its parts.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<Vec<MultipartPart>> {
    let opening = format!("--{}", boundary);
    let closing = format!("\r\n--{}", boundary);
    let opening = opening.as_bytes();
    let closing = closing.as_bytes();

    let mut cursor = find(body, opening)
        .ok_or_else(|| anyhow!("multipart body missing opening boundary"))?
        + opening.len();
    let mut parts = Vec::new();

    loop {
        let rest = &body[cursor..];
        if rest.starts_with(b"--") {
            break;
        }
        if !rest.starts_with(b"\r\n") {
            return Err(anyhow!("malformed multipart body: expected CRLF after boundary"));
        }
        cursor += 2;

        let end = find(&body[cursor..], closing)
            .ok_or_else(|| anyhow!("multipart part not terminated by boundary"))?
            + cursor;
        parts.push(parse_part(&body[cursor..end])?);
        cursor = end + closing.len();
    }

    Ok(parts)
}

/// Find the form field carrying the uploaded file.
pub fn find_file_field<'a>(parts: &'a [MultipartPart], name: &str) -> Option<&'a MultipartPart> {
    parts.iter().find(|part| part.name.as_deref() == Some(name))
}

fn parse_part(bytes: &[u8]) -> Result<MultipartPart> {
    let header_end = find(bytes, b"\r\n\r\n")
        .ok_or_else(|| anyhow!("multipart part missing header terminator"))?;
    let header_text = std::str::from_utf8(&bytes[..header_end])
        .context("multipart part headers were not UTF-8")?;
    let data = bytes[header_end + 4..].to_vec();

    let mut name = None;
    let mut filename = None;
    let mut content_type = None;
    for line in header_text.split("\r\n") {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "content-disposition" => {
                name = disposition_param(value, "name");
                filename = disposition_param(value, "filename");
            }
            "content-type" => content_type = Some(value.to_string()),
            _ => {}
        }
    }

    Ok(MultipartPart {
        name,
        filename,
        content_type,
        data,
    })
}

fn disposition_param(value: &str, param: &str) -> Option<String> {
    for segment in value.split(';') {
        let segment = segment.trim();
        if let Some((key, val)) = segment.split_once('=') {
            if key.trim().eq_ignore_ascii_case(param) {
                return Some(val.trim().trim_matches('"').to_string());
            }
        }
    }
    None
}

/// First occurrence of `needle` in `haystack`.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_body(boundary: &str, parts: &[(&str, Option<&str>, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, content_type, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", name);
            if let Some(filename) = filename {
                disposition.push_str(&format!("; filename=\"{}\"", filename));
            }
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(b"\r\n");
            if let Some(content_type) = content_type {
                body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
        body
    }

    #[test]
    fn boundary_parsing() {
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary=xyz").expect("boundary"),
            "xyz"
        );
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary=\"a b\"").expect("boundary"),
            "a b"
        );
        assert_eq!(
            boundary_from_content_type("Multipart/Form-Data; charset=utf-8; boundary=q; x=1")
                .expect("boundary"),
            "q"
        );
        assert!(boundary_from_content_type("application/json").is_err());
        assert!(boundary_from_content_type("multipart/form-data").is_err());
        assert!(boundary_from_content_type("multipart/form-data; boundary=").is_err());
    }

    #[test]
    fn parses_file_part_with_binary_data() {
        // Binary payload containing CRLF sequences must survive intact.
        let data: &[u8] = b"\xFF\xD8\r\n\r\n\x00rest";
        let body = build_body(
            "BOUND",
            &[("file", Some("photo.jpg"), Some("image/jpeg"), data)],
        );

        let parts = parse_multipart(&body, "BOUND").expect("parse");
        assert_eq!(parts.len(), 1);
        let part = &parts[0];
        assert_eq!(part.name.as_deref(), Some("file"));
        assert_eq!(part.filename.as_deref(), Some("photo.jpg"));
        assert_eq!(part.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(part.data, data);
    }

    #[test]
    fn parses_multiple_parts_and_finds_file() {
        let body = build_body(
            "BOUND",
            &[
                ("note", None, None, b"hello"),
                ("file", Some("a.png"), Some("image/png"), b"\x89PNG"),
            ],
        );

        let parts = parse_multipart(&body, "BOUND").expect("parse");
        assert_eq!(parts.len(), 2);
        let file = find_file_field(&parts, "file").expect("file field");
        assert_eq!(file.data, b"\x89PNG");
        assert!(find_file_field(&parts, "missing").is_none());
    }

    #[test]
    fn rejects_bodies_without_boundary() {
        assert!(parse_multipart(b"no boundary here", "BOUND").is_err());
    }

    #[test]
    fn rejects_unterminated_part() {
        let body = b"--BOUND\r\nContent-Disposition: form-data; name=\"file\"\r\n\r\ndata";
        assert!(parse_multipart(body, "BOUND").is_err());
    }

    #[test]
    fn empty_body_with_only_close_delimiter() {
        let parts = parse_multipart(b"--BOUND--\r\n", "BOUND").expect("parse");
        assert!(parts.is_empty());
    }
}
