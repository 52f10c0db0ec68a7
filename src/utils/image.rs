use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Decodes a `data:<mime>;base64,<payload>` image reference into raw bytes
/// plus a file extension for the mime type.
pub fn decode_image_ref(image_ref: &str) -> Result<(Vec<u8>, &'static str)> {
    let rest = image_ref
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("Unsupported image reference, expected a data: URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("Malformed data URL, missing payload"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| anyhow!("Malformed data URL, expected base64 encoding"))?;

    let bytes = STANDARD
        .decode(payload)
        .context("Failed to decode base64 image payload")?;

    Ok((bytes, extension_for_mime(mime)))
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}
