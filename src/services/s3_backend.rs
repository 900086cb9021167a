//! S3Backend: `ObjectBackend` over the AWS SDK.
//!
//! The client is built once at startup from the process configuration and
//! shared by every request; the SDK owns connection pooling and timeouts.

use crate::{
    config::AppConfig,
    models::object::{ObjectSummary, StoredObject},
    services::backend::{BackendError, BackendResult, ListPage, ObjectBackend},
};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Builder as S3ConfigBuilder, Region},
    error::{DisplayErrorContext, SdkError},
    primitives::{ByteStream, DateTime as SmithyDateTime},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct S3Backend {
    client: Client,
    bucket: String,
}

impl S3Backend {
    /// Build a client for `config.bucket` using the default credential chain.
    ///
    /// Path-style addressing is always forced; a configured endpoint URL
    /// redirects the client to an S3-compatible store.
    pub async fn from_config(config: &AppConfig) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = S3ConfigBuilder::from(&shared).force_path_style(true);
        if let Some(endpoint) = &config.endpoint_url {
            debug!("Using custom endpoint: {}", endpoint);
            builder = builder.endpoint_url(endpoint);
        }

        info!(bucket = %config.bucket, region = %config.region, "S3 client initialized");
        Self::new(Client::from_conf(builder.build()), config.bucket.clone())
    }

    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> BackendResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(service_error)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> BackendResult<StoredObject> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    BackendError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    service_error(err)
                }
            })?;

        let content_type = output.content_type().map(str::to_string);
        let size = output.content_length();
        let etag = output.e_tag().map(str::to_string);
        let last_modified = output.last_modified().and_then(to_chrono);
        let reader = output.body.into_async_read();

        Ok(StoredObject {
            body: Box::pin(ReaderStream::new(reader)),
            content_type,
            size,
            etag,
            last_modified,
        })
    }

    async fn list_by_prefix(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> BackendResult<ListPage> {
        let mut page = ListPage::default();
        let mut continuation: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_delimiter(delimiter.map(str::to_string))
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(service_error)?;

            page.objects.extend(output.contents().iter().filter_map(|obj| {
                Some(ObjectSummary {
                    key: obj.key()?.to_string(),
                    size: obj.size().unwrap_or(0),
                    last_modified: obj
                        .last_modified()
                        .and_then(to_chrono)
                        .unwrap_or_default(),
                    etag: obj.e_tag().map(str::to_string),
                })
            }));
            page.common_prefixes.extend(
                output
                    .common_prefixes()
                    .iter()
                    .filter_map(|cp| cp.prefix().map(str::to_string)),
            );

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    debug!(prefix, "following list continuation token");
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(page)
    }

    async fn delete(&self, key: &str) -> BackendResult<()> {
        // DeleteObject succeeds for absent keys, so existence is checked first.
        self.client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    BackendError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    service_error(err)
                }
            })?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(service_error)?;
        Ok(())
    }

    async fn probe(&self) -> BackendResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(service_error)?;
        Ok(())
    }
}

fn service_error<E, R>(err: SdkError<E, R>) -> BackendError
where
    E: std::error::Error + 'static,
    R: Debug,
{
    BackendError::Service(DisplayErrorContext(&err).to_string())
}

fn to_chrono(ts: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}
