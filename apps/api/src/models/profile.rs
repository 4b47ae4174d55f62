use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-user credit balance. `id` is the Clerk user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub credits: i32,
    pub is_premium: bool,
}

#[cfg(test)]
impl Profile {
    pub fn empty(id: &str) -> Self {
        Self {
            id: id.to_string(),
            credits: 0,
            is_premium: false,
        }
    }
}
