//! HTTP handlers for the flat gateway, where objects sit at the bucket root.
//! Storage concerns are delegated to `TransferService`.

use crate::{
    errors::AppError,
    handlers::upload_form::read_upload_form,
    models::{
        object::DownloadedObject,
        responses::{DeleteResponse, ListResponse, UploadResponse},
    },
    services::transfer_service::TransferService,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};

/// `POST /api/s3/upload` -> store the `file` part under a timestamped key.
pub async fn upload_file(
    State(service): State<TransferService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = read_upload_form(multipart).await?;
    Ok(Json(service.upload_flat(upload).await?))
}

/// `GET /api/s3/files` -> every object in the bucket.
pub async fn list_files(
    State(service): State<TransferService>,
) -> Result<Json<ListResponse>, AppError> {
    Ok(Json(service.list_flat().await?))
}

/// `GET /api/s3/files/{key}` -> the object body, fully buffered.
pub async fn get_file(
    State(service): State<TransferService>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let object = service.get_flat(&key).await?;
    Ok(object_response(object))
}

/// `DELETE /api/s3/files/{key}`
pub async fn delete_file(
    State(service): State<TransferService>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    Ok(Json(service.delete_flat(&key).await?))
}

/// Build a 200 response carrying the object bytes and metadata headers.
pub(crate) fn object_response(object: DownloadedObject) -> Response {
    tracing::debug!(key = %object.key, size = object.bytes.len(), "sending object");
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    set_object_headers(response.headers_mut(), &object);
    *response.body_mut() = Body::from(object.bytes);
    response
}

fn set_object_headers(headers: &mut HeaderMap, object: &DownloadedObject) {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&object.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from(object.bytes.len()),
    );

    if let Some(etag) = object.etag.as_ref() {
        let quoted = if etag.starts_with('"') {
            etag.clone()
        } else {
            format!("\"{}\"", etag)
        };
        if let Ok(value) = HeaderValue::from_str(&quoted) {
            headers.insert(header::ETAG, value);
        }
    }

    if let Some(last_modified) = object.last_modified {
        let http_date = last_modified
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        if let Ok(value) = HeaderValue::from_str(&http_date) {
            headers.insert(header::LAST_MODIFIED, value);
        }
    }
}
