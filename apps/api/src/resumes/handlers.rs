use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::resumes::upload::{
    confirm_upload, download_url, list_resumes, request_upload, ConfirmUploadRequest,
    DownloadUrlResponse, UploadUrlRequest, UploadUrlResponse,
};
use crate::state::AppState;

/// POST /resumes/upload-url
pub async fn handle_upload_url(
    State(state): State<AppState>,
    Json(req): Json<UploadUrlRequest>,
) -> Result<(StatusCode, Json<UploadUrlResponse>), AppError> {
    let response =
        request_upload(state.gateway.as_ref(), &state.config.upload_key_prefix, &req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /resumes/confirm
pub async fn handle_confirm(
    State(state): State<AppState>,
    Json(req): Json<ConfirmUploadRequest>,
) -> Result<Json<ResumeRow>, AppError> {
    let row = confirm_upload(state.gateway.as_ref(), &state.registry, &req).await?;
    Ok(Json(row))
}

/// GET /resumes
pub async fn handle_list(State(state): State<AppState>) -> Json<Vec<ResumeRow>> {
    Json(list_resumes(&state.registry).await)
}

/// GET /resumes/:resume_id/download-url
pub async fn handle_download_url(
    State(state): State<AppState>,
    Path(resume_id): Path<String>,
) -> Result<Json<DownloadUrlResponse>, AppError> {
    let response = download_url(state.gateway.as_ref(), &state.registry, &resume_id).await?;
    Ok(Json(response))
}
