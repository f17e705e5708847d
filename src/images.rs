//! Local image file helpers: base64 load and save.
//!
//! All tool inputs and outputs move through base64-encoded strings; these
//! helpers bridge them to the filesystem. Paths are resolved against the
//! process working directory and no sandboxing is applied.

use crate::error::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::path::{Path, PathBuf};

/// Read a file and return its contents as a standard base64 string.
///
/// # Errors
/// Returns `Error::Io` if the path does not exist or is unreadable.
pub async fn load_base64(path: &str) -> Result<String> {
    let full = std::path::absolute(path)?;
    let data = tokio::fs::read(&full).await?;
    Ok(BASE64.encode(&data))
}

/// Decode a base64 payload and write it to `target`, if one was given.
///
/// Extension handling: a non-empty extension on `target` is kept as-is;
/// otherwise one is derived from the MIME type (`image/jpeg` -> `.jpg`,
/// anything else -> `.png`) and appended unless the target already ends
/// with it. Returns the resolved absolute path of the written file, or
/// `None` when no target was supplied.
///
/// # Errors
/// - `Error::Validation` if the payload is not valid base64
/// - `Error::Io` if the write fails
pub async fn save_base64(
    data: &str,
    mime_type: &str,
    target: Option<&str>,
) -> Result<Option<PathBuf>> {
    let Some(target) = target else {
        return Ok(None);
    };

    let resolved = std::path::absolute(resolve_target(target, mime_type))?;

    let bytes = BASE64
        .decode(data)
        .map_err(|e| Error::validation(format!("Invalid base64 image data: {}", e)))?;

    tokio::fs::write(&resolved, &bytes).await?;
    Ok(Some(resolved))
}

/// Apply the extension rules to a target path, without touching the filesystem.
fn resolve_target(target: &str, mime_type: &str) -> String {
    let has_extension = Path::new(target)
        .extension()
        .is_some_and(|ext| !ext.is_empty());
    if has_extension {
        return target.to_string();
    }

    let derived = derived_extension(mime_type);
    if target.ends_with(derived) {
        target.to_string()
    } else {
        format!("{}{}", target, derived)
    }
}

/// Extension derived from a MIME type when the target path has none.
fn derived_extension(mime_type: &str) -> &'static str {
    if mime_type == "image/jpeg" { ".jpg" } else { ".png" }
}
