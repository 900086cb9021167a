//! Translation between folder-style paths and flat object keys.
//!
//! Everything here is pure: no I/O, no clock reads except in
//! [`derive_upload_key`], which stamps the current epoch millis.

use chrono::Utc;

/// Key delimiter used to encode hierarchy.
pub const DELIMITER: &str = "/";

/// Raised when a fixed key is requested with a missing segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required path segment `{0}`")]
pub struct MissingSegment(pub &'static str);

/// Build the folder prefix for an optional folder/subfolder pair.
///
/// Each present, non-empty segment is suffixed with `/`. Both absent yields
/// the empty string (the bucket root). Segment content is not validated.
pub fn derive_folder_path(folder: Option<&str>, subfolder: Option<&str>) -> String {
    let mut path = String::new();
    for segment in [folder, subfolder].into_iter().flatten() {
        if !segment.is_empty() {
            path.push_str(segment);
            path.push_str(DELIMITER);
        }
    }
    path
}

/// Key for a freshly uploaded file: `{folder_path}{epoch_millis}-{name}`.
pub fn derive_upload_key(folder_path: &str, original_name: &str) -> String {
    derive_upload_key_at(folder_path, Utc::now().timestamp_millis(), original_name)
}

pub fn derive_upload_key_at(folder_path: &str, epoch_millis: i64, original_name: &str) -> String {
    format!("{}{}-{}", folder_path, epoch_millis, original_name)
}

/// Key addressed by three mandatory segments: `{folder}/{subfolder}/{filename}`.
pub fn derive_fixed_key(
    folder: &str,
    subfolder: &str,
    filename: &str,
) -> Result<String, MissingSegment> {
    for (name, value) in [
        ("folder", folder),
        ("subfolder", subfolder),
        ("filename", filename),
    ] {
        if value.is_empty() {
            return Err(MissingSegment(name));
        }
    }
    Ok([folder, subfolder, filename].join(DELIMITER))
}

/// The empty "directory marker" object sits at the folder path itself.
pub fn derive_folder_marker_key(folder_path: &str) -> String {
    folder_path.to_string()
}

/// Virtual-hosted AWS URL for a key.
pub fn derive_public_url(container: &str, region: &str, key: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com/{}", container, region, key)
}

/// Path-style URL for S3-compatible endpoints (MinIO and friends).
pub fn derive_path_style_url(endpoint: &str, container: &str, key: &str) -> String {
    format!("{}/{}/{}", endpoint.trim_end_matches('/'), container, key)
}

/// Display name of a common prefix relative to the queried prefix.
///
/// `docs/2024/` listed under `docs/` is named `2024`.
pub fn folder_display_name(common_prefix: &str, queried_prefix: &str) -> String {
    let relative = common_prefix
        .strip_prefix(queried_prefix)
        .unwrap_or(common_prefix);
    relative
        .strip_suffix(DELIMITER)
        .unwrap_or(relative)
        .to_string()
}
