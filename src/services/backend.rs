//! The object-store capability consumed by the gateway.
//!
//! Implementations are bound to one bucket at construction time and
//! translate their native error identifiers into [`BackendError`] exactly
//! once, so callers never inspect backend-specific error names.

use crate::models::object::{ObjectSummary, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("object `{key}` not found")]
    NotFound { key: String },
    #[error("{0}")]
    Service(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Result of a prefix listing.
#[derive(Debug, Default)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    pub common_prefixes: Vec<String>,
}

/// Bucket-scoped put/get/list/delete.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Write `bytes` at `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> BackendResult<()>;

    /// Open `key` for reading.
    async fn get(&self, key: &str) -> BackendResult<StoredObject>;

    /// List keys starting with `prefix`. With a delimiter, keys holding the
    /// delimiter after the prefix are folded into common prefixes.
    async fn list_by_prefix(&self, prefix: &str, delimiter: Option<&str>)
    -> BackendResult<ListPage>;

    /// Remove `key`. Reports `NotFound` when nothing was stored there.
    async fn delete(&self, key: &str) -> BackendResult<()>;

    /// Cheap reachability check for readiness probes.
    async fn probe(&self) -> BackendResult<()>;
}
