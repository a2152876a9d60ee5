use std::sync::Arc;

use crate::config::Config;
use crate::resumes::registry::ResumeRegistry;
use crate::storage::ObjectGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Built once at startup. `S3Gateway` in production.
    pub gateway: Arc<dyn ObjectGateway>,
    /// The only mutable state in the process.
    pub registry: Arc<ResumeRegistry>,
    pub config: Config,
}
