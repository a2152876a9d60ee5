//! Object storage gateway — the only component that talks to the storage service.
//!
//! `AppState` holds an `Arc<dyn ObjectGateway>`; production wires `S3Gateway`,
//! tests wire the in-memory gateway from `storage::testing`.

pub mod policy;
pub mod s3;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub use policy::PolicyCondition;

/// Validity window for both upload and download authorizations.
pub const AUTHORIZATION_TTL: Duration = Duration::from_secs(300);

/// Used when the storage service reports no content type for an object.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage gateway failure: {0}")]
    Gateway(String),

    #[error("Failed to sign request: {0}")]
    Signing(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// What the storage service reports about a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub size: i64,
    pub content_type: String,
}

/// A signed browser POST: the client submits `fields` plus the file to `url`.
#[derive(Debug, Clone, Serialize)]
pub struct UploadAuthorization {
    pub url: String,
    pub fields: BTreeMap<String, String>,
    pub expires_at: DateTime<Utc>,
    /// The constraints baked into the signed policy. Already encoded in `fields["policy"]`.
    #[serde(skip)]
    pub conditions: Vec<PolicyCondition>,
}

/// Capabilities the upload lifecycle needs from object storage.
#[async_trait]
pub trait ObjectGateway: Send + Sync {
    /// Mints a time-limited POST authorization pinned to `key`, restricted to the top-level
    /// MIME category of `content_type` and to sizes in `1..=max_bytes`.
    async fn authorize_upload(
        &self,
        key: &str,
        content_type: &str,
        max_bytes: u64,
    ) -> StorageResult<UploadAuthorization>;

    /// Fails with `StorageError::NotFound` when nothing is stored at `key`.
    async fn head_object(&self, key: &str) -> StorageResult<ObjectMetadata>;

    /// Mints a time-limited GET URL. Does not check that the object exists.
    async fn authorize_download(&self, key: &str) -> StorageResult<String>;
}
