//! HTTP handlers for the folder-scoped gateway.
//!
//! - POST   /api/s3/folder/upload                               -> upload into folder/subfolder
//! - GET    /api/s3/folder/list?folder=&subfolder=              -> one-level listing
//! - GET    /api/s3/folder/file/{folder}/{subfolder}/{filename} -> download
//! - DELETE /api/s3/folder/file/{folder}/{subfolder}/{filename} -> delete
//! - POST   /api/s3/folder/folder                               -> create folder marker

use crate::{
    errors::AppError,
    handlers::{object_handlers::object_response, upload_form::read_upload_form},
    models::responses::{CreateFolderResponse, DeleteResponse, ListResponse, UploadResponse},
    services::transfer_service::TransferService,
};
use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Path, Query, Request, State, multipart::MultipartRejection},
    http::header,
    response::Response,
};
use bytes::Bytes;
use serde::Deserialize;

/// Folder coordinates as sent in a query string or request body.
#[derive(Debug, Default, Deserialize)]
pub struct FolderQuery {
    pub folder: Option<String>,
    pub subfolder: Option<String>,
}

/// Path segments addressing one file inside a folder.
#[derive(Debug, Deserialize)]
pub struct FilePath {
    pub folder: String,
    pub subfolder: String,
    pub filename: String,
}

pub async fn upload_to_folder(
    State(service): State<TransferService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = read_upload_form(multipart).await?;
    Ok(Json(service.upload_to_folder(upload).await?))
}

pub async fn list_folder(
    State(service): State<TransferService>,
    Query(q): Query<FolderQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let listing = service
        .list_folder(q.folder.as_deref(), q.subfolder.as_deref())
        .await?;
    Ok(Json(listing))
}

pub async fn get_from_folder(
    State(service): State<TransferService>,
    Path(p): Path<FilePath>,
) -> Result<Response, AppError> {
    let object = service
        .get_from_folder(&p.folder, &p.subfolder, &p.filename)
        .await?;
    Ok(object_response(object))
}

pub async fn delete_from_folder(
    State(service): State<TransferService>,
    Path(p): Path<FilePath>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = service
        .delete_from_folder(&p.folder, &p.subfolder, &p.filename)
        .await?;
    Ok(Json(deleted))
}

/// Body is JSON or a urlencoded form; an empty body names no folder and is
/// rejected downstream.
pub async fn create_folder(
    State(service): State<TransferService>,
    request: Request,
) -> Result<Json<CreateFolderResponse>, AppError> {
    let q = read_folder_body(request).await?;
    let created = service
        .create_folder(q.folder.as_deref(), q.subfolder.as_deref())
        .await?;
    Ok(Json(created))
}

async fn read_folder_body(request: Request) -> Result<FolderQuery, AppError> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let Form(q) = Form::<FolderQuery>::from_request(request, &())
            .await
            .map_err(|rejection| AppError::new(rejection.status(), rejection.body_text()))?;
        return Ok(q);
    }

    let body = Bytes::from_request(request, &())
        .await
        .map_err(|rejection| AppError::new(rejection.status(), rejection.body_text()))?;
    if body.is_empty() {
        return Ok(FolderQuery::default());
    }
    serde_json::from_slice(&body).map_err(|err| AppError::bad_request(err.to_string()))
}
