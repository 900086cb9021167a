//! MemoryBackend: a process-local bucket held in a sorted map.
//!
//! Follows S3 ListObjectsV2 semantics for prefix and delimiter grouping and
//! computes MD5 ETags the way S3 does for single-part uploads. Contents are
//! lost when the process exits.

use crate::{
    models::object::{ObjectSummary, StoredObject},
    services::backend::{BackendError, BackendResult, ListPage, ObjectBackend},
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::{collections::BTreeMap, collections::BTreeSet, io, sync::Arc};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Clone, Debug)]
struct Entry {
    bytes: Bytes,
    content_type: String,
    etag: String,
    last_modified: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    objects: Arc<RwLock<BTreeMap<String, Entry>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> BackendResult<()> {
        if key.is_empty() {
            return Err(BackendError::Service("object key must not be empty".into()));
        }
        let etag = format!("{:x}", md5::compute(&bytes));
        let entry = Entry {
            bytes,
            content_type: content_type.to_string(),
            etag,
            last_modified: Utc::now(),
        };
        self.objects.write().await.insert(key.to_string(), entry);
        debug!(key, "stored object in memory");
        Ok(())
    }

    async fn get(&self, key: &str) -> BackendResult<StoredObject> {
        let entry = self
            .objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                key: key.to_string(),
            })?;

        let size = entry.bytes.len() as i64;
        let body = futures::stream::iter([Ok::<_, io::Error>(entry.bytes)]);
        Ok(StoredObject {
            body: Box::pin(body),
            content_type: Some(entry.content_type),
            size: Some(size),
            etag: Some(entry.etag),
            last_modified: Some(entry.last_modified),
        })
    }

    async fn list_by_prefix(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> BackendResult<ListPage> {
        let objects = self.objects.read().await;

        let mut contents = Vec::new();
        let mut common_prefixes = BTreeSet::new();
        for (key, entry) in objects.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            if let Some(delim) = delimiter {
                if let Some(common) = compute_common_prefix(key, prefix, delim) {
                    common_prefixes.insert(common);
                    continue;
                }
            }
            contents.push(ObjectSummary {
                key: key.clone(),
                size: entry.bytes.len() as i64,
                last_modified: entry.last_modified,
                etag: Some(entry.etag.clone()),
            });
        }

        Ok(ListPage {
            objects: contents,
            common_prefixes: common_prefixes.into_iter().collect(),
        })
    }

    async fn delete(&self, key: &str) -> BackendResult<()> {
        match self.objects.write().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(BackendError::NotFound {
                key: key.to_string(),
            }),
        }
    }

    async fn probe(&self) -> BackendResult<()> {
        Ok(())
    }
}

/// Compute the "common prefix" a key folds into under a delimiter listing.
///
/// Returns `None` when the key has no delimiter after the requested prefix,
/// meaning it is a direct child and belongs in the contents.
fn compute_common_prefix(key: &str, requested_prefix: &str, delimiter: &str) -> Option<String> {
    let after_prefix = key.strip_prefix(requested_prefix)?;
    let pos = after_prefix.find(delimiter)?;
    let mut combined = String::from(requested_prefix);
    combined.push_str(&after_prefix[..pos + delimiter.len()]);
    Some(combined)
}
