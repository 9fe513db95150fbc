use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub id: i64,
    pub user_id: i64,
    pub mood_event_id: Option<i64>,
    pub sentiment: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeedbackRequest {
    pub mood_event_id: Option<i64>,

    /// Free-form sentiment tag, e.g. positive/neutral/negative.
    #[validate(length(min = 1, max = 32, message = "Sentiment must be 1-32 characters"))]
    pub sentiment: String,

    #[validate(length(max = 1000, message = "Note too long"))]
    pub note: Option<String>,
}
