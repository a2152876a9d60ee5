use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResumeStatus {
    Processing,
    Ready,
    Failed,
}

/// One confirmed upload. Created only by the confirm step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResumeRow {
    pub id: Uuid,
    pub filename: String,
    pub key: String,
    pub size: i64,
    pub content_type: String,
    pub status: ResumeStatus,
    pub created_at: DateTime<Utc>,
}
