//! Uploaded image bytes → inline `data:` URI for the vision API.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::debug;

const DEFAULT_EXTENSION: &str = "png";

/// Encode raw image bytes as `data:image/<ext>;base64,<payload>`.
///
/// The subtype comes from the filename extension, lowercased; files without
/// one are labelled png. The bytes are passed through untouched.
pub fn encode_image(bytes: &[u8], filename: Option<&str>) -> String {
    let ext = filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let encoded = STANDARD.encode(bytes);
    debug!(
        "Encoded image {}: {} bytes -> {} bytes base64",
        filename.unwrap_or("<unnamed>"),
        bytes.len(),
        encoded.len()
    );

    format!("data:image/{ext};base64,{encoded}")
}

pub fn is_image_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
}
