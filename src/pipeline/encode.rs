//! Image encoding: raw asset bytes → `data:` URI.
//!
//! Bytes are wrapped untouched. No decoding or re-compression happens, so the
//! embedded image is bit-identical to the file in the vault. Output follows
//! RFC 2397: `data:<mime>;base64,<payload>` with the standard alphabet,
//! padding kept, no line wrapping.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// MIME type used when an extension is missing or unrecognised.
pub const FALLBACK_MIME: &str = "image/png";

/// Map a file extension to an image MIME type, case-insensitively.
///
/// Unknown extensions fall back to [`FALLBACK_MIME`]; the image is still
/// embedded.
pub fn mime_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => FALLBACK_MIME,
    }
}

/// Standard Base64 of an opaque byte sequence. Empty input gives `""`.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Build the complete data URI for an asset.
pub fn data_uri(bytes: &[u8], extension: &str) -> String {
    let mime = mime_for(extension);
    let payload = encode_base64(bytes);
    debug!("Encoded {} bytes as {} → {} chars base64", bytes.len(), mime, payload.len());
    format!("data:{mime};base64,{payload}")
}
