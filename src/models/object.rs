//! Represents objects (files) as reported by the backend.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use std::{io, pin::Pin};

/// A boxed stream of body chunks handed out by a backend `get`.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// One entry of a raw backend listing, before URLs are attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: i64,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
}

/// An object as presented to clients in list responses.
///
/// Built from a backend listing entry plus the public URL derived from the
/// bucket configuration and the key.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    /// Object key (slash-delimited path within the bucket).
    pub key: String,

    /// Size in bytes.
    pub size: i64,

    /// Timestamp when object was last modified.
    pub last_modified: DateTime<Utc>,

    /// Entity tag as reported by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Public URL of the object.
    pub url: String,
}

/// An object body plus metadata, as returned by a backend `get`.
pub struct StoredObject {
    pub body: ByteStream,
    pub content_type: Option<String>,
    pub size: Option<i64>,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// A fully drained object, ready to be written to an HTTP response.
#[derive(Clone, Debug)]
pub struct DownloadedObject {
    pub key: String,
    pub bytes: Bytes,
    pub content_type: String,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}
