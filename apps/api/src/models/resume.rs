use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// The single saved CV snapshot for a user; overwritten on every save.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub user_id: String,
    pub content: Value,
    pub updated_at: DateTime<Utc>,
}
