//! Upload lifecycle: authorize → (client uploads directly to storage) → confirm → list/download.
//!
//! Only the confirm step writes to the registry. An authorized upload the client never
//! performs leaves no trace here.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeStatus};
use crate::resumes::registry::ResumeRegistry;
use crate::resumes::validation::{
    file_extension, filename_from_key, generate_key, validate_content_type, validate_size,
    MAX_UPLOAD_BYTES,
};
use crate::storage::{ObjectGateway, UploadAuthorization};

#[derive(Debug, Deserialize)]
pub struct UploadUrlRequest {
    pub filename: String,
    pub content_type: String,
    /// Any JSON number; range and integrality are checked by `validate_size`.
    pub size: serde_json::Number,
}

/// The generated key alongside the provider's POST authorization.
#[derive(Debug, Serialize)]
pub struct UploadUrlResponse {
    pub key: String,
    #[serde(flatten)]
    pub authorization: UploadAuthorization,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmUploadRequest {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadUrlResponse {
    pub url: String,
}

pub async fn request_upload(
    gateway: &dyn ObjectGateway,
    key_prefix: &str,
    request: &UploadUrlRequest,
) -> Result<UploadUrlResponse, AppError> {
    validate_content_type(&request.content_type)?;
    let size = validate_size(&request.size)?;

    if !request.filename.contains('.') {
        warn!(
            "Filename '{}' has no extension; using '{}' as the key extension",
            request.filename,
            file_extension(&request.filename)
        );
    }
    let key = generate_key(key_prefix, &request.filename);

    let authorization = gateway
        .authorize_upload(&key, &request.content_type, MAX_UPLOAD_BYTES)
        .await?;

    debug!("Policy conditions for {key}: {:?}", authorization.conditions);
    info!(
        "Issued upload authorization for {key} ({}, {} bytes declared)",
        request.content_type, size
    );

    Ok(UploadUrlResponse { key, authorization })
}

/// Registers the object at `key` once storage reports it present.
///
/// Any storage failure, not only a missing object, is reported as a validation error.
pub async fn confirm_upload(
    gateway: &dyn ObjectGateway,
    registry: &ResumeRegistry,
    request: &ConfirmUploadRequest,
) -> Result<ResumeRow, AppError> {
    let key = &request.key;
    let metadata = gateway.head_object(key).await.map_err(|e| {
        warn!("Confirm rejected for {key}: {e}");
        AppError::Validation(format!("Object {key} not in storage"))
    })?;

    let row = ResumeRow {
        id: Uuid::new_v4(),
        filename: filename_from_key(key).to_string(),
        key: key.clone(),
        size: metadata.size,
        content_type: metadata.content_type,
        status: ResumeStatus::Ready,
        created_at: Utc::now(),
    };
    registry.insert(row.clone()).await?;

    info!(
        "Confirmed resume {} at {key} ({} bytes); {} tracked",
        row.id,
        row.size,
        registry.len().await
    );
    Ok(row)
}

pub async fn list_resumes(registry: &ResumeRegistry) -> Vec<ResumeRow> {
    registry.list_all().await
}

/// Ids are opaque to callers: one that is not even a UUID is simply unknown.
///
/// The URL is not checked against storage; a deleted object yields a URL that fails on use.
pub async fn download_url(
    gateway: &dyn ObjectGateway,
    registry: &ResumeRegistry,
    resume_id: &str,
) -> Result<DownloadUrlResponse, AppError> {
    let not_found = || AppError::NotFound(format!("Resume {resume_id} not found"));
    let id = Uuid::parse_str(resume_id).map_err(|_| not_found())?;
    let row = registry.get(id).await.ok_or_else(not_found)?;

    let url = gateway.authorize_download(&row.key).await?;
    Ok(DownloadUrlResponse { url })
}
