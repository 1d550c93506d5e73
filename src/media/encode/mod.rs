use crate::errors::{RelayError, RelayResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

/// Read a stored attachment and encode it with the standard base64
/// alphabet, padded, without line wrapping.
pub async fn encode_file(path: &Path) -> RelayResult<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| RelayError::io(&format!("reading image file {}", path.display()), e))?;
    Ok(encode_bytes(&bytes))
}

pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Infer a supported image media type from a file extension.
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
