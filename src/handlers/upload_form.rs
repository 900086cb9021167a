//! Multipart upload bodies, read fully into memory.
//!
//! The form carries one file part named `file` and, for folder uploads, the
//! text parts `folder` and `subfolder`. Parts may arrive in any order.
//! A `file` part without a filename is a plain text field and is ignored.

use crate::{errors::AppError, models::upload::UploadRequest};
use axum::extract::{Multipart, multipart::MultipartRejection};
use bytes::Bytes;

const FILE_FIELD: &str = "file";
const DEFAULT_FILE_NAME: &str = "upload";

/// Drain `multipart` into an optional `UploadRequest`.
///
/// Returns `Ok(None)` when the request is not a multipart form or the form
/// holds no `file` part; unknown parts are skipped.
pub async fn read_upload_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Option<UploadRequest>, AppError> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "request carries no multipart form");
            return Ok(None);
        }
    };
    let mut file: Option<(Bytes, String, String)> = None;
    let mut folder = None;
    let mut subfolder = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) if field.file_name().is_some() => {
                let original_name = field
                    .file_name()
                    .filter(|name| !name.is_empty())
                    .unwrap_or(DEFAULT_FILE_NAME)
                    .to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                file = Some((bytes, original_name, mime_type));
            }
            Some("folder") => folder = Some(field.text().await?),
            Some("subfolder") => subfolder = Some(field.text().await?),
            other => tracing::debug!(field = ?other, "ignoring multipart field"),
        }
    }

    Ok(file.map(|(file_bytes, original_name, mime_type)| UploadRequest {
        folder,
        subfolder,
        file_bytes,
        original_name,
        mime_type,
    }))
}
