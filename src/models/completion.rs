use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Completion {
    pub id: i64,
    pub child_id: i64,
    pub activity_id: i64,
    pub photo_path: String,
    pub photo_sha256: String,
    pub validated: bool,
    pub validation_reasoning: String,
    pub tokens_awarded: i32,
    pub completed_at: DateTime<Utc>,
}

/// A completion joined with its activity title, as listed on a child profile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompletionSummary {
    pub id: i64,
    pub activity_id: i64,
    pub activity_title: String,
    pub completed_at: DateTime<Utc>,
    pub tokens_awarded: i32,
    pub validated: bool,
}

#[derive(Debug, Clone)]
pub struct NewCompletion {
    pub child_id: i64,
    pub activity_id: i64,
    pub photo_path: String,
    pub photo_sha256: String,
    pub validated: bool,
    pub validation_reasoning: String,
    /// Added to the child's balance in the same transaction as the insert.
    pub tokens_awarded: i32,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPhotoQuery {
    pub child_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoValidationResponse {
    pub valid: bool,
    pub reasoning: String,
    pub tokens_awarded: i32,
    pub completion_id: i64,
}
