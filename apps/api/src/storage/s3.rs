use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::head_object::{HeadObjectError, HeadObjectOutput};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use chrono::Utc;
use tracing::{error, info};

use crate::config::Config;
use crate::storage::policy::{PostPolicy, SigningCredentials};
use crate::storage::{
    ObjectGateway, ObjectMetadata, StorageError, StorageResult, UploadAuthorization,
    AUTHORIZATION_TTL, DEFAULT_CONTENT_TYPE,
};

/// Gateway backed by AWS S3 (or any S3-compatible endpoint such as MinIO).
///
/// Built once at startup; the SDK client and credentials provider are shared handles.
#[derive(Clone)]
pub struct S3Gateway {
    client: Client,
    credentials: Option<SharedCredentialsProvider>,
    bucket: String,
    region: String,
    endpoint: Option<String>,
}

impl S3Gateway {
    /// Static credentials win when configured; otherwise the default AWS provider chain.
    pub async fn connect(config: &Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));

        if let Some((access_key_id, secret_access_key)) = config.static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "tracker-static",
            ));
        }
        if let Some(endpoint) = &config.s3_endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.s3_endpoint.is_some())
            .build();

        Self {
            client: Client::from_conf(s3_config),
            credentials: sdk_config.credentials_provider(),
            bucket: config.s3_bucket.clone(),
            region: config.aws_region.clone(),
            endpoint: config.s3_endpoint.clone(),
        }
    }

    async fn signing_credentials(&self) -> StorageResult<SigningCredentials> {
        let provider = self
            .credentials
            .as_ref()
            .ok_or_else(|| StorageError::Gateway("no AWS credentials configured".to_string()))?;
        let credentials = provider
            .provide_credentials()
            .await
            .map_err(|e| StorageError::Gateway(format!("credentials unavailable: {e}")))?;

        Ok(SigningCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().map(String::from),
        })
    }
}

/// Form POST target. Custom endpoints are addressed path-style, AWS virtual-hosted.
pub fn post_url(bucket: &str, region: &str, endpoint: Option<&str>) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{bucket}", endpoint.trim_end_matches('/')),
        None => format!("https://{bucket}.s3.{region}.amazonaws.com"),
    }
}

/// Absent content type falls back to `application/octet-stream`, absent length to 0.
fn metadata_from(output: &HeadObjectOutput) -> ObjectMetadata {
    ObjectMetadata {
        size: output.content_length().unwrap_or(0),
        content_type: output
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string(),
    }
}

/// Only the service's `NotFound` means the object is missing; anything else is a gateway
/// failure, including transport errors that never produced a service error.
fn head_error(key: &str, service_err: Option<&HeadObjectError>, detail: String) -> StorageError {
    match service_err {
        Some(HeadObjectError::NotFound(_)) => StorageError::NotFound(key.to_string()),
        _ => StorageError::Gateway(detail),
    }
}

#[async_trait]
impl ObjectGateway for S3Gateway {
    async fn authorize_upload(
        &self,
        key: &str,
        content_type: &str,
        max_bytes: u64,
    ) -> StorageResult<UploadAuthorization> {
        let credentials = self.signing_credentials().await?;
        let now = Utc::now();
        let expires_at = now + chrono::Duration::seconds(AUTHORIZATION_TTL.as_secs() as i64);

        let signed = PostPolicy::new(&self.bucket, key, content_type, max_bytes, expires_at)
            .sign(&credentials, &self.region, now)?;

        info!("Signed upload policy for s3://{}/{}", self.bucket, key);

        Ok(UploadAuthorization {
            url: post_url(&self.bucket, &self.region, self.endpoint.as_deref()),
            fields: signed.fields,
            expires_at,
            conditions: signed.conditions,
        })
    }

    async fn head_object(&self, key: &str) -> StorageResult<ObjectMetadata> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_err = match &e {
                    SdkError::ServiceError(service_err) => Some(service_err.err()),
                    _ => None,
                };
                let err = head_error(key, service_err, DisplayErrorContext(&e).to_string());
                if let StorageError::Gateway(detail) = &err {
                    error!("HEAD s3://{}/{} failed: {}", self.bucket, key, detail);
                }
                err
            })?;

        Ok(metadata_from(&output))
    }

    async fn authorize_download(&self, key: &str) -> StorageResult<String> {
        let presigning = PresigningConfig::expires_in(AUTHORIZATION_TTL)
            .map_err(|e| StorageError::Signing(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Gateway(DisplayErrorContext(&e).to_string()))?;

        Ok(request.uri().to_string())
    }
}
