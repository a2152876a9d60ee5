use anyhow::{Context, Result};

const DEFAULT_BUCKET: &str = "ai-job-tracker-uploads";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_KEY_PREFIX: &str = "dev/resumes";

/// Application configuration loaded from environment variables.
/// Read once at startup; there is no reload.
#[derive(Debug, Clone)]
pub struct Config {
    pub s3_bucket: String,
    pub aws_region: String,
    /// Custom endpoint (MinIO, localstack). `None` means AWS proper.
    pub s3_endpoint: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub upload_key_prefix: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            s3_bucket: env_or("S3_BUCKET", DEFAULT_BUCKET),
            aws_region: optional_env("AWS_DEFAULT_REGION")
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            s3_endpoint: optional_env("S3_ENDPOINT"),
            aws_access_key_id: optional_env("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY"),
            cors_origins: parse_origins(&env_or("CORS_ORIGINS", DEFAULT_CORS_ORIGINS)),
            upload_key_prefix: env_or("UPLOAD_KEY_PREFIX", DEFAULT_KEY_PREFIX)
                .trim_end_matches('/')
                .to_string(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Static credentials, only when both halves are present.
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.aws_access_key_id, &self.aws_secret_access_key) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Treats unset and blank the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Splits a comma-separated origin list, trimming entries and dropping empties.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

/// Fixed configuration with static example credentials, no environment involved.
#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        s3_bucket: "test-bucket".to_string(),
        aws_region: "us-east-1".to_string(),
        s3_endpoint: None,
        aws_access_key_id: Some("AKIDEXAMPLE".to_string()),
        aws_secret_access_key: Some("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string()),
        cors_origins: vec![DEFAULT_CORS_ORIGINS.to_string()],
        upload_key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        port: 8000,
        rust_log: "info".to_string(),
    }
}
