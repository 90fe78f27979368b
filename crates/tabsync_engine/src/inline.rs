use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

const FALLBACK_MIME: &str = "image/x-icon";

/// Encode fetched icon bytes as a self-contained `data:` URL.
///
/// Mime type: `image/*` Content-Type header -> magic bytes -> `image/x-icon`.
pub fn to_data_url(bytes: &[u8], content_type: Option<&str>) -> String {
    let mime = content_type
        .and_then(image_mime_from_header)
        .or_else(|| sniff_image_mime(bytes))
        .unwrap_or(FALLBACK_MIME);
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

pub fn is_data_url(reference: &str) -> bool {
    reference
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
}

fn image_mime_from_header(content_type: &str) -> Option<&str> {
    let mime = content_type.split(';').next()?.trim();
    let is_image = mime
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"));
    is_image.then_some(mime)
}

/// Identify common icon formats from their leading bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
        return Some("image/x-icon");
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
        return Some("image/svg+xml");
    }
    None
}
