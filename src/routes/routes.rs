//! Defines routes for the flat and folder-scoped gateways.
//!
//! ## Structure
//! - **Flat gateway** (`/api/s3`)
//!   - `POST   /upload`       -> upload multipart `file` to the bucket root
//!   - `GET    /files`        -> list every object
//!   - `GET    /files/{key}`  -> download object
//!   - `DELETE /files/{key}`  -> delete object
//!
//! - **Folder gateway** (`/api/s3/folder`)
//!   - `POST   /upload`                               -> upload `file` + `folder`/`subfolder`
//!   - `GET    /list`                                 -> one-level listing
//!   - `GET    /file/{folder}/{subfolder}/{filename}` -> download object
//!   - `DELETE /file/{folder}/{subfolder}/{filename}` -> delete object
//!   - `POST   /folder`                               -> create folder marker
//!
//! `{key}` matches a single path segment, so the flat routes only reach
//! root-level objects.

use crate::{
    errors::panic_response,
    handlers::{
        folder_handlers::{
            create_folder, delete_from_folder, get_from_folder, list_folder, upload_to_folder,
        },
        health_handlers::{healthz, readyz},
        object_handlers::{delete_file, get_file, list_files, upload_file},
    },
    services::transfer_service::TransferService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

/// Build and return the router for every gateway route.
///
/// The router carries shared state (`TransferService`) to all handlers.
/// Body limits are disabled here; the folder upload ceiling is enforced by
/// the service so oversized files get a structured `400`.
pub fn routes() -> Router<TransferService> {
    let flat = Router::new()
        .route("/upload", post(upload_file))
        .route("/files", get(list_files))
        .route("/files/{key}", get(get_file).delete(delete_file));

    let folder = Router::new()
        .route("/upload", post(upload_to_folder))
        .route("/list", get(list_folder))
        .route(
            "/file/{folder}/{subfolder}/{filename}",
            get(get_from_folder).delete(delete_from_folder),
        )
        .route("/folder", post(create_folder));

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/s3/folder", folder)
        .nest("/api/s3", flat)
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
}
