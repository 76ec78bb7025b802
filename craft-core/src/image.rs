//! Image references as self-describing data URIs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;
use thiserror::Error;

/// Errors from reading or decoding image references.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a base64 data URI")]
    NotDataUri,
}

/// A parsed `data:<mime>;base64,<payload>` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub media_type: &'a str,
    pub data: &'a str,
}

impl<'a> DataUri<'a> {
    pub fn parse(uri: &'a str) -> Result<Self, ImageError> {
        let rest = uri.strip_prefix("data:").ok_or(ImageError::NotDataUri)?;
        let (header, data) = rest.split_once(',').ok_or(ImageError::NotDataUri)?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or(ImageError::NotDataUri)?;
        if data.is_empty() {
            return Err(ImageError::NotDataUri);
        }
        Ok(Self {
            media_type: if media_type.is_empty() {
                "application/octet-stream"
            } else {
                media_type
            },
            data,
        })
    }
}

/// Guess a media type from a file extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Encode raw bytes as a data URI.
pub fn encode_bytes(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{media_type};base64,{}", STANDARD.encode(bytes))
}

/// Read an image file and encode it as a data URI.
pub fn encode_file(path: impl AsRef<Path>) -> Result<String, ImageError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ImageError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(encode_bytes(media_type_for(path), &bytes))
}
