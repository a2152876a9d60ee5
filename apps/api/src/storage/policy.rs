//! Browser POST policies for direct-to-S3 uploads, signed with AWS Signature Version 4.
//!
//! The AWS SDK presigns query-string requests only, so the form-POST variant is built here:
//! a JSON policy document listing every constraint, base64-encoded, then HMAC-signed with
//! the SigV4 key derived for the `s3` service.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

use crate::storage::{StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
/// Status S3 answers a successful form POST with.
const SUCCESS_ACTION_STATUS: &str = "201";

/// One entry in the policy's `conditions` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyCondition {
    /// `{"field": "value"}` — the form field must equal `value`.
    Exact(String, String),
    /// `["starts-with", "$field", "prefix"]`
    StartsWith(String, String),
    /// `["content-length-range", min, max]`
    ContentLengthRange(u64, u64),
}

impl PolicyCondition {
    fn exact(field: &str, value: &str) -> Self {
        PolicyCondition::Exact(field.to_string(), value.to_string())
    }

    pub fn to_json(&self) -> Value {
        match self {
            PolicyCondition::Exact(field, value) => {
                let mut object = serde_json::Map::new();
                object.insert(field.clone(), Value::String(value.clone()));
                Value::Object(object)
            }
            PolicyCondition::StartsWith(field, prefix) => {
                json!(["starts-with", format!("${field}"), prefix])
            }
            PolicyCondition::ContentLengthRange(min, max) => {
                json!(["content-length-range", min, max])
            }
        }
    }
}

/// Key material used to sign a policy.
#[derive(Debug, Clone)]
pub struct SigningCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostPolicy {
    pub key: String,
    pub content_type: String,
    pub expiration: DateTime<Utc>,
    pub conditions: Vec<PolicyCondition>,
}

/// Output of `PostPolicy::sign`: the form fields to send and the constraints they carry.
#[derive(Debug, Clone)]
pub struct SignedPost {
    pub fields: BTreeMap<String, String>,
    pub conditions: Vec<PolicyCondition>,
}

/// `"image/png"` → `"image"`. A value without `/` is its own category.
pub fn content_type_category(content_type: &str) -> &str {
    content_type.split('/').next().unwrap_or(content_type)
}

impl PostPolicy {
    /// Builds the upload constraints: fixed bucket and key, content type within the declared
    /// top-level category, size between 1 byte and `max_bytes`.
    pub fn new(
        bucket: &str,
        key: &str,
        content_type: &str,
        max_bytes: u64,
        expiration: DateTime<Utc>,
    ) -> Self {
        let conditions = vec![
            PolicyCondition::exact("bucket", bucket),
            PolicyCondition::exact("key", key),
            PolicyCondition::exact("success_action_status", SUCCESS_ACTION_STATUS),
            PolicyCondition::ContentLengthRange(1, max_bytes),
            PolicyCondition::StartsWith(
                "Content-Type".to_string(),
                content_type_category(content_type).to_string(),
            ),
        ];
        Self {
            key: key.to_string(),
            content_type: content_type.to_string(),
            expiration,
            conditions,
        }
    }

    pub fn document(&self) -> Value {
        json!({
            "expiration": self.expiration.to_rfc3339_opts(SecondsFormat::Millis, true),
            "conditions": self.conditions.iter().map(PolicyCondition::to_json).collect::<Vec<_>>(),
        })
    }

    /// Adds the SigV4 conditions for `credentials`, encodes the document and signs it.
    pub fn sign(
        mut self,
        credentials: &SigningCredentials,
        region: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<SignedPost> {
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let credential = format!(
            "{}/{date_stamp}/{region}/{SERVICE}/aws4_request",
            credentials.access_key_id
        );

        let mut fields = BTreeMap::new();
        fields.insert("key".to_string(), self.key.clone());
        fields.insert("Content-Type".to_string(), self.content_type.clone());
        fields.insert(
            "success_action_status".to_string(),
            SUCCESS_ACTION_STATUS.to_string(),
        );

        let mut amz_fields = vec![
            ("x-amz-algorithm", SIGNING_ALGORITHM.to_string()),
            ("x-amz-credential", credential),
            ("x-amz-date", amz_date),
        ];
        if let Some(token) = &credentials.session_token {
            amz_fields.push(("x-amz-security-token", token.clone()));
        }
        for (name, value) in amz_fields {
            self.conditions.push(PolicyCondition::exact(name, &value));
            fields.insert(name.to_string(), value);
        }

        let encoded = BASE64.encode(self.document().to_string());
        let key = signing_key(&credentials.secret_access_key, &date_stamp, region, SERVICE)?;
        let signature = hex::encode(hmac_sha256(&key, encoded.as_bytes())?);

        fields.insert("policy".to_string(), encoded);
        fields.insert("x-amz-signature".to_string(), signature);

        Ok(SignedPost {
            fields,
            conditions: self.conditions,
        })
    }
}

/// Derives the SigV4 signing key: HMAC chain over date, region, service and `aws4_request`.
pub fn signing_key(
    secret: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> StorageResult<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> StorageResult<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| StorageError::Signing(e.to_string()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MAX: u64 = 10_485_760;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap()
    }

    fn credentials(token: Option<&str>) -> SigningCredentials {
        SigningCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
            session_token: token.map(String::from),
        }
    }

    fn policy(content_type: &str) -> PostPolicy {
        let expiration = fixed_now() + chrono::Duration::seconds(300);
        PostPolicy::new("uploads", "dev/resumes/a.pdf", content_type, MAX, expiration)
    }

    #[test]
    fn test_hmac_rfc4231_case_2() {
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_signing_key_matches_aws_example() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20150830",
            "us-east-1",
            "iam",
        )
        .unwrap();
        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn test_content_type_category() {
        assert_eq!(content_type_category("application/pdf"), "application");
        assert_eq!(content_type_category("image/png"), "image");
        assert_eq!(content_type_category("weird"), "weird");
    }

    #[test]
    fn test_policy_restricts_size_and_type_category() {
        let policy = policy("application/pdf");
        assert!(policy
            .conditions
            .contains(&PolicyCondition::ContentLengthRange(1, MAX)));
        assert!(policy.conditions.contains(&PolicyCondition::StartsWith(
            "Content-Type".to_string(),
            "application".to_string()
        )));
        assert!(policy.conditions.contains(&PolicyCondition::Exact(
            "key".to_string(),
            "dev/resumes/a.pdf".to_string()
        )));
    }

    #[test]
    fn test_document_shape() {
        let doc = policy("image/png").document();
        assert_eq!(doc["expiration"], "2024-03-01T12:35:45.000Z");
        let conditions = doc["conditions"].as_array().unwrap();
        assert!(conditions.contains(&json!({"bucket": "uploads"})));
        assert!(conditions.contains(&json!(["content-length-range", 1, MAX])));
        assert!(conditions.contains(&json!(["starts-with", "$Content-Type", "image"])));
    }

    #[test]
    fn test_sign_emits_form_fields() {
        let signed = policy("application/pdf")
            .sign(&credentials(None), "us-east-1", fixed_now())
            .unwrap();

        assert_eq!(signed.fields["key"], "dev/resumes/a.pdf");
        assert_eq!(signed.fields["Content-Type"], "application/pdf");
        assert_eq!(signed.fields["success_action_status"], "201");
        assert_eq!(signed.fields["x-amz-algorithm"], SIGNING_ALGORITHM);
        assert_eq!(
            signed.fields["x-amz-credential"],
            "AKIDEXAMPLE/20240301/us-east-1/s3/aws4_request"
        );
        assert_eq!(signed.fields["x-amz-date"], "20240301T123045Z");
        assert!(!signed.fields.contains_key("x-amz-security-token"));

        let signature = &signed.fields["x-amz-signature"];
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_encoded_policy_carries_signing_conditions() {
        let signed = policy("application/pdf")
            .sign(&credentials(None), "us-east-1", fixed_now())
            .unwrap();
        let decoded = BASE64.decode(&signed.fields["policy"]).unwrap();
        let doc: Value = serde_json::from_slice(&decoded).unwrap();
        let conditions = doc["conditions"].as_array().unwrap();
        assert!(conditions.contains(&json!({"x-amz-date": "20240301T123045Z"})));
        assert!(conditions.contains(&json!({"x-amz-algorithm": SIGNING_ALGORITHM})));
    }

    #[test]
    fn test_signature_is_hmac_of_encoded_policy() {
        let signed = policy("application/pdf")
            .sign(&credentials(None), "eu-west-1", fixed_now())
            .unwrap();
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20240301",
            "eu-west-1",
            "s3",
        )
        .unwrap();
        let expected = hex::encode(hmac_sha256(&key, signed.fields["policy"].as_bytes()).unwrap());
        assert_eq!(signed.fields["x-amz-signature"], expected);
    }

    #[test]
    fn test_session_token_is_signed_and_sent() {
        let signed = policy("image/jpeg")
            .sign(&credentials(Some("session-token")), "us-east-1", fixed_now())
            .unwrap();
        assert_eq!(signed.fields["x-amz-security-token"], "session-token");
        assert!(signed.conditions.contains(&PolicyCondition::Exact(
            "x-amz-security-token".to_string(),
            "session-token".to_string()
        )));
    }
}
