//! src/services/transfer_service.rs
//!
//! TransferService: per-operation policy for the flat and folder-scoped
//! gateways. Validates input, derives keys through `key_codec`, calls the
//! bucket through an `ObjectBackend`, and maps backend outcomes into
//! `TransferError`. Validation failures are always reported before any
//! backend call; nothing is retried.

use crate::{
    config::AppConfig,
    models::{
        folder::FolderEntry,
        object::{DownloadedObject, ObjectRecord},
        responses::{CreateFolderResponse, DeleteResponse, ListResponse, UploadResponse},
        upload::UploadRequest,
    },
    services::{
        backend::{BackendError, ObjectBackend},
        key_codec::{self, DELIMITER},
    },
};
use bytes::BytesMut;
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const ROOT_LABEL: &str = "root";
const NO_SUBFOLDER_LABEL: &str = "none";

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("No file uploaded")]
    NoFile,
    #[error("File size exceeds {}MB limit", .limit / (1024 * 1024))]
    FileTooLarge { size: usize, limit: usize },
    #[error("Missing required parameters: {0}")]
    InvalidPath(String),
    #[error("File not found")]
    NotFound { key: String },
    #[error("{0}")]
    Backend(String),
}

impl From<BackendError> for TransferError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound { key } => TransferError::NotFound { key },
            BackendError::Service(message) => TransferError::Backend(message),
        }
    }
}

impl From<key_codec::MissingSegment> for TransferError {
    fn from(err: key_codec::MissingSegment) -> Self {
        TransferError::InvalidPath(err.0.to_string())
    }
}

pub type TransferResult<T> = Result<T, TransferError>;

/// How public object URLs are spelled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UrlScheme {
    /// `https://{bucket}.s3.{region}.amazonaws.com/{key}`
    VirtualHosted { container: String, region: String },
    /// `{endpoint}/{bucket}/{key}`
    PathStyle { endpoint: String, container: String },
}

impl UrlScheme {
    pub fn from_config(config: &AppConfig) -> Self {
        match &config.endpoint_url {
            Some(endpoint) => UrlScheme::PathStyle {
                endpoint: endpoint.clone(),
                container: config.bucket.clone(),
            },
            None => UrlScheme::VirtualHosted {
                container: config.bucket.clone(),
                region: config.region.clone(),
            },
        }
    }

    pub fn url_for(&self, key: &str) -> String {
        match self {
            UrlScheme::VirtualHosted { container, region } => {
                key_codec::derive_public_url(container, region, key)
            }
            UrlScheme::PathStyle {
                endpoint,
                container,
            } => key_codec::derive_path_style_url(endpoint, container, key),
        }
    }
}

/// Shared, immutable handle passed to every handler.
#[derive(Clone)]
pub struct TransferService {
    /// The bucket, behind the narrow capability interface.
    pub backend: Arc<dyn ObjectBackend>,

    urls: UrlScheme,
    max_folder_upload_bytes: usize,
}

impl TransferService {
    pub fn new(
        backend: Arc<dyn ObjectBackend>,
        urls: UrlScheme,
        max_folder_upload_bytes: usize,
    ) -> Self {
        Self {
            backend,
            urls,
            max_folder_upload_bytes,
        }
    }

    /// Upload to the bucket root. No size ceiling applies here.
    pub async fn upload_flat(
        &self,
        upload: Option<UploadRequest>,
    ) -> TransferResult<UploadResponse> {
        let upload = upload.ok_or(TransferError::NoFile)?;
        let key = key_codec::derive_upload_key("", &upload.original_name);
        self.put_upload(&key, upload).await?;

        Ok(UploadResponse {
            message: "File uploaded successfully".into(),
            file_url: self.urls.url_for(&key),
            key,
            folder: None,
            subfolder: None,
        })
    }

    /// Upload under `{folder}/{subfolder}/`, enforcing the size ceiling.
    pub async fn upload_to_folder(
        &self,
        upload: Option<UploadRequest>,
    ) -> TransferResult<UploadResponse> {
        let upload = upload.ok_or(TransferError::NoFile)?;
        if upload.size() > self.max_folder_upload_bytes {
            warn!(
                size = upload.size(),
                limit = self.max_folder_upload_bytes,
                "rejecting oversized folder upload"
            );
            return Err(TransferError::FileTooLarge {
                size: upload.size(),
                limit: self.max_folder_upload_bytes,
            });
        }

        let folder = non_empty(upload.folder.as_deref());
        let subfolder = non_empty(upload.subfolder.as_deref());
        let folder_path = key_codec::derive_folder_path(folder, subfolder);
        let key = key_codec::derive_upload_key(&folder_path, &upload.original_name);

        let folder_label = folder.unwrap_or(ROOT_LABEL).to_string();
        let subfolder_label = subfolder.unwrap_or(NO_SUBFOLDER_LABEL).to_string();
        self.put_upload(&key, upload).await?;

        Ok(UploadResponse {
            message: "File uploaded successfully".into(),
            file_url: self.urls.url_for(&key),
            key,
            folder: Some(folder_label),
            subfolder: Some(subfolder_label),
        })
    }

    async fn put_upload(&self, key: &str, upload: UploadRequest) -> TransferResult<()> {
        let size = upload.size();
        let mime = if upload.mime_type.is_empty() {
            DEFAULT_CONTENT_TYPE
        } else {
            upload.mime_type.as_str()
        };
        debug!(key, size, mime, "uploading object");

        self.backend
            .put(key, upload.file_bytes.clone(), mime)
            .await
            .map_err(|err| log_backend_failure("upload", key, err))?;

        info!(key, size, "object uploaded");
        Ok(())
    }

    /// List every object in the bucket, without folder grouping.
    pub async fn list_flat(&self) -> TransferResult<ListResponse> {
        self.list("", None).await
    }

    /// One-level listing of `{folder}/{subfolder}/`: files directly inside
    /// it plus its immediate child folders.
    pub async fn list_folder(
        &self,
        folder: Option<&str>,
        subfolder: Option<&str>,
    ) -> TransferResult<ListResponse> {
        let prefix = key_codec::derive_folder_path(folder, subfolder);
        self.list(&prefix, Some(DELIMITER)).await
    }

    async fn list(&self, prefix: &str, delimiter: Option<&str>) -> TransferResult<ListResponse> {
        debug!(prefix, ?delimiter, "listing objects");
        let page = self
            .backend
            .list_by_prefix(prefix, delimiter)
            .await
            .map_err(|err| log_backend_failure("list", prefix, err))?;

        let files = page
            .objects
            .into_iter()
            .map(|obj| ObjectRecord {
                url: self.urls.url_for(&obj.key),
                key: obj.key,
                size: obj.size,
                last_modified: obj.last_modified,
                etag: obj.etag,
            })
            .collect::<Vec<_>>();

        let folders = page
            .common_prefixes
            .into_iter()
            .map(|common| FolderEntry {
                name: key_codec::folder_display_name(&common, prefix),
                path: common,
            })
            .collect::<Vec<_>>();

        debug!(
            prefix,
            files = files.len(),
            folders = folders.len(),
            "listing complete"
        );
        Ok(ListResponse {
            current_path: if prefix.is_empty() {
                ROOT_LABEL.to_string()
            } else {
                prefix.to_string()
            },
            files,
            folders,
        })
    }

    /// Download an object addressed by its raw key.
    pub async fn get_flat(&self, key: &str) -> TransferResult<DownloadedObject> {
        if key.is_empty() {
            return Err(TransferError::InvalidPath("key".into()));
        }
        self.download(key).await
    }

    /// Download `{folder}/{subfolder}/{filename}`.
    pub async fn get_from_folder(
        &self,
        folder: &str,
        subfolder: &str,
        filename: &str,
    ) -> TransferResult<DownloadedObject> {
        let key = key_codec::derive_fixed_key(folder, subfolder, filename)?;
        self.download(&key).await
    }

    /// Fetch and fully drain the object body into one buffer.
    async fn download(&self, key: &str) -> TransferResult<DownloadedObject> {
        debug!(key, "fetching object");
        let stored = self
            .backend
            .get(key)
            .await
            .map_err(|err| log_backend_failure("download", key, err))?;

        let mut buffer = BytesMut::with_capacity(
            stored
                .size
                .and_then(|s| usize::try_from(s).ok())
                .unwrap_or_default(),
        );
        let mut body = stored.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|err| {
                error!(key, error = %err, "object body stream failed");
                TransferError::Backend(err.to_string())
            })?;
            buffer.extend_from_slice(&chunk);
        }

        info!(key, size = buffer.len(), "object downloaded");
        Ok(DownloadedObject {
            key: key.to_string(),
            bytes: buffer.freeze(),
            content_type: stored
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.into()),
            etag: stored.etag,
            last_modified: stored.last_modified,
        })
    }

    /// Delete an object addressed by its raw key.
    pub async fn delete_flat(&self, key: &str) -> TransferResult<DeleteResponse> {
        if key.is_empty() {
            return Err(TransferError::InvalidPath("key".into()));
        }
        self.remove(key.to_string()).await
    }

    /// Delete `{folder}/{subfolder}/{filename}`.
    pub async fn delete_from_folder(
        &self,
        folder: &str,
        subfolder: &str,
        filename: &str,
    ) -> TransferResult<DeleteResponse> {
        let key = key_codec::derive_fixed_key(folder, subfolder, filename)?;
        self.remove(key).await
    }

    async fn remove(&self, key: String) -> TransferResult<DeleteResponse> {
        debug!(key = %key, "deleting object");
        self.backend
            .delete(&key)
            .await
            .map_err(|err| log_backend_failure("delete", &key, err))?;

        info!(key = %key, "object deleted");
        Ok(DeleteResponse {
            message: "File deleted successfully".into(),
            deleted_key: key,
        })
    }

    /// Materialize an empty marker object at `{folder}/{subfolder}/`.
    pub async fn create_folder(
        &self,
        folder: Option<&str>,
        subfolder: Option<&str>,
    ) -> TransferResult<CreateFolderResponse> {
        let folder_path = key_codec::derive_folder_path(folder, subfolder);
        if folder_path.is_empty() {
            return Err(TransferError::InvalidPath("folder".into()));
        }
        let marker = key_codec::derive_folder_marker_key(&folder_path);

        self.backend
            .put(&marker, bytes::Bytes::new(), DEFAULT_CONTENT_TYPE)
            .await
            .map_err(|err| log_backend_failure("create folder", &marker, err))?;

        info!(path = %folder_path, "folder marker created");
        Ok(CreateFolderResponse {
            message: "Folder created successfully".into(),
            path: folder_path,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn log_backend_failure(op: &str, key: &str, err: BackendError) -> TransferError {
    match &err {
        BackendError::NotFound { .. } => warn!(op, key, "object not found"),
        BackendError::Service(message) => error!(op, key, error = %message, "backend failure"),
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::object::StoredObject,
        services::{
            backend::{BackendResult, ListPage},
            memory_backend::MemoryBackend,
        },
    };
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and forwards them to an in-memory bucket.
    #[derive(Default)]
    struct CountingBackend {
        inner: MemoryBackend,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ObjectBackend for CountingBackend {
        async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> BackendResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.put(key, bytes, content_type).await
        }
        async fn get(&self, key: &str) -> BackendResult<StoredObject> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }
        async fn list_by_prefix(
            &self,
            prefix: &str,
            delimiter: Option<&str>,
        ) -> BackendResult<ListPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list_by_prefix(prefix, delimiter).await
        }
        async fn delete(&self, key: &str) -> BackendResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(key).await
        }
        async fn probe(&self) -> BackendResult<()> {
            Ok(())
        }
    }

    /// Fails every call with a service error.
    struct BrokenBackend;

    #[async_trait]
    impl ObjectBackend for BrokenBackend {
        async fn put(&self, _: &str, _: Bytes, _: &str) -> BackendResult<()> {
            Err(BackendError::Service("AccessDenied".into()))
        }
        async fn get(&self, _: &str) -> BackendResult<StoredObject> {
            Err(BackendError::Service("AccessDenied".into()))
        }
        async fn list_by_prefix(&self, _: &str, _: Option<&str>) -> BackendResult<ListPage> {
            Err(BackendError::Service("AccessDenied".into()))
        }
        async fn delete(&self, _: &str) -> BackendResult<()> {
            Err(BackendError::Service("AccessDenied".into()))
        }
        async fn probe(&self) -> BackendResult<()> {
            Err(BackendError::Service("AccessDenied".into()))
        }
    }

    fn urls() -> UrlScheme {
        UrlScheme::VirtualHosted {
            container: "media".into(),
            region: "ap-south-1".into(),
        }
    }

    fn service_with(backend: Arc<dyn ObjectBackend>) -> TransferService {
        TransferService::new(backend, urls(), 10 * 1024 * 1024)
    }

    fn upload(folder: Option<&str>, subfolder: Option<&str>, len: usize) -> UploadRequest {
        UploadRequest {
            folder: folder.map(str::to_string),
            subfolder: subfolder.map(str::to_string),
            file_bytes: Bytes::from(vec![7u8; len]),
            original_name: "report.pdf".into(),
            mime_type: "application/pdf".into(),
        }
    }

    #[tokio::test]
    async fn folder_upload_then_download_round_trips_bytes_and_type() {
        let service = service_with(Arc::new(MemoryBackend::new()));

        let resp = service
            .upload_to_folder(Some(upload(Some("docs"), Some("2024"), 1024)))
            .await
            .unwrap();
        assert!(resp.key.starts_with("docs/2024/"));
        assert!(resp.key.ends_with("-report.pdf"));
        assert_eq!(
            resp.file_url,
            format!("https://media.s3.ap-south-1.amazonaws.com/{}", resp.key)
        );
        assert_eq!(resp.folder.as_deref(), Some("docs"));
        assert_eq!(resp.subfolder.as_deref(), Some("2024"));

        let filename = resp.key.trim_start_matches("docs/2024/");
        let object = service
            .get_from_folder("docs", "2024", filename)
            .await
            .unwrap();
        assert_eq!(object.bytes.len(), 1024);
        assert!(object.bytes.iter().all(|b| *b == 7));
        assert_eq!(object.content_type, "application/pdf");
        assert!(object.etag.is_some());
    }

    #[tokio::test]
    async fn folder_upload_labels_default_when_absent() {
        let service = service_with(Arc::new(MemoryBackend::new()));
        let resp = service
            .upload_to_folder(Some(upload(None, Some(""), 3)))
            .await
            .unwrap();
        assert_eq!(resp.folder.as_deref(), Some("root"));
        assert_eq!(resp.subfolder.as_deref(), Some("none"));
        assert!(!resp.key.contains('/'));
    }

    #[tokio::test]
    async fn oversized_folder_upload_never_reaches_backend() {
        let backend = Arc::new(CountingBackend::default());
        let service = service_with(backend.clone());

        let err = service
            .upload_to_folder(Some(upload(Some("docs"), None, 10 * 1024 * 1024 + 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::FileTooLarge { .. }));
        assert_eq!(err.to_string(), "File size exceeds 10MB limit");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn flat_upload_has_no_ceiling() {
        let service = TransferService::new(Arc::new(MemoryBackend::new()), urls(), 16);
        let resp = service
            .upload_flat(Some(upload(Some("ignored"), None, 64)))
            .await
            .unwrap();
        assert!(!resp.key.contains('/'));
        assert!(resp.folder.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_rejected_before_backend() {
        let backend = Arc::new(CountingBackend::default());
        let service = service_with(backend.clone());

        assert!(matches!(
            service.upload_flat(None).await,
            Err(TransferError::NoFile)
        ));
        assert!(matches!(
            service.upload_to_folder(None).await,
            Err(TransferError::NoFile)
        ));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_segments_are_invalid_paths() {
        let backend = Arc::new(CountingBackend::default());
        let service = service_with(backend.clone());

        assert!(matches!(
            service.get_from_folder("docs", "", "a.txt").await,
            Err(TransferError::InvalidPath(_))
        ));
        assert!(matches!(
            service.delete_from_folder("", "2024", "a.txt").await,
            Err(TransferError::InvalidPath(_))
        ));
        assert!(matches!(
            service.create_folder(None, None).await,
            Err(TransferError::InvalidPath(_))
        ));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn absent_keys_are_not_found() {
        let service = service_with(Arc::new(MemoryBackend::new()));
        assert!(matches!(
            service.get_flat("ghost.txt").await,
            Err(TransferError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete_flat("ghost.txt").await,
            Err(TransferError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete_from_folder("a", "b", "c").await,
            Err(TransferError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn empty_listing_is_not_an_error() {
        let service = service_with(Arc::new(MemoryBackend::new()));
        let resp = service.list_folder(None, None).await.unwrap();
        assert_eq!(resp.current_path, "root");
        assert!(resp.files.is_empty());
        assert!(resp.folders.is_empty());
    }

    #[tokio::test]
    async fn folder_listing_names_child_prefixes() {
        let backend = Arc::new(MemoryBackend::new());
        for key in ["docs/a.txt", "docs/2024/b.txt", "docs/2025/c/d.txt", "misc/e.txt"] {
            backend
                .put(key, Bytes::from_static(b"1"), "text/plain")
                .await
                .unwrap();
        }
        let service = service_with(backend);

        let resp = service.list_folder(Some("docs"), None).await.unwrap();
        assert_eq!(resp.current_path, "docs/");
        assert_eq!(resp.files.len(), 1);
        assert_eq!(resp.files[0].key, "docs/a.txt");
        assert_eq!(
            resp.files[0].url,
            "https://media.s3.ap-south-1.amazonaws.com/docs/a.txt"
        );
        let names: Vec<(&str, &str)> = resp
            .folders
            .iter()
            .map(|f| (f.name.as_str(), f.path.as_str()))
            .collect();
        assert_eq!(names, vec![("2024", "docs/2024/"), ("2025", "docs/2025/")]);

        let flat = service.list_flat().await.unwrap();
        assert_eq!(flat.files.len(), 4);
        assert!(flat.folders.is_empty());
    }

    #[tokio::test]
    async fn create_folder_writes_empty_marker() {
        let backend = Arc::new(MemoryBackend::new());
        let service = service_with(backend.clone());

        let resp = service
            .create_folder(Some("docs"), Some("2024"))
            .await
            .unwrap();
        assert_eq!(resp.path, "docs/2024/");

        let marker = service.get_flat("docs/2024/").await.unwrap();
        assert!(marker.bytes.is_empty());

        let listing = service.list_folder(Some("docs"), None).await.unwrap();
        assert_eq!(listing.folders.len(), 1);
        assert_eq!(listing.folders[0].name, "2024");
    }

    #[tokio::test]
    async fn backend_failures_surface_their_message() {
        let service = service_with(Arc::new(BrokenBackend));
        let err = service
            .upload_flat(Some(upload(None, None, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Backend(ref m) if m == "AccessDenied"));
        assert!(matches!(
            service.list_flat().await,
            Err(TransferError::Backend(_))
        ));
        assert!(matches!(
            service.get_flat("a").await,
            Err(TransferError::Backend(_))
        ));
    }

    #[test]
    fn path_style_urls_use_endpoint() {
        let scheme = UrlScheme::PathStyle {
            endpoint: "http://localhost:9000".into(),
            container: "media".into(),
        };
        assert_eq!(scheme.url_for("a/b.txt"), "http://localhost:9000/media/a/b.txt");
    }
}
