pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::resumes::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/resumes", get(handlers::handle_list))
        .route("/resumes/upload-url", post(handlers::handle_upload_url))
        .route("/resumes/confirm", post(handlers::handle_confirm))
        .route(
            "/resumes/:resume_id/download-url",
            get(handlers::handle_download_url),
        )
        .with_state(state)
}
