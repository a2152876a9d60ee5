mod config;
mod errors;
mod models;
mod resumes;
mod routes;
mod state;
mod storage;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::resumes::registry::ResumeRegistry;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::s3::S3Gateway;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AI Job Tracker API v{}", env!("CARGO_PKG_VERSION"));

    // One S3 client for the life of the process
    let gateway = S3Gateway::connect(&config).await;
    info!(
        "S3 gateway initialized (bucket: {}, region: {})",
        config.s3_bucket, config.aws_region
    );

    let cors = build_cors(&config.cors_origins)?;
    info!("CORS origins: {:?}", config.cors_origins);

    let state = AppState {
        gateway: Arc::new(gateway),
        registry: Arc::new(ResumeRegistry::new()),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Browser uploads send credentials, so origins are listed explicitly and methods/headers
/// are mirrored rather than wildcarded.
fn build_cors(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}
