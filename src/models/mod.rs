//! Request-scoped data models for the gateway.
//!
//! Nothing here is persisted by the gateway; the bucket is the sole owner of
//! object bytes. Response records serialize as camelCase JSON via `serde`.

pub mod folder;
pub mod object;
pub mod responses;
pub mod upload;
