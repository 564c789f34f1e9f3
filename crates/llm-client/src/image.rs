//! Turns an image reference into a URL a remote vision endpoint can use.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

use crate::LlmError;

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}

/// `http(s)://` and `data:` URLs pass through; `file://` URLs and plain paths are read from disk
/// and inlined as a base64 `data:` URL.
pub async fn resolve_image_url(image_ref: &str) -> Result<String, LlmError> {
    if image_ref.starts_with("http://")
        || image_ref.starts_with("https://")
        || image_ref.starts_with("data:")
    {
        return Ok(image_ref.to_string());
    }

    let path = Path::new(image_ref.strip_prefix("file://").unwrap_or(image_ref));
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| LlmError::Image(format!("{}: {}", path.display(), e)))?;
    if bytes.is_empty() {
        return Err(LlmError::Image(format!("{}: empty file", path.display())));
    }

    Ok(format!("data:{};base64,{}", mime_for(path), STANDARD.encode(bytes)))
}
