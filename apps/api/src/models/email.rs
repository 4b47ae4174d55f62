use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DomainPattern {
    pub domain: String,
    /// Template over `{first}`, `{last}`, `{f}`, `{l}`, e.g. `{first}.{last}`.
    pub pattern: String,
}

/// A resolved or guessed address for one person at one domain.
/// Names are stored in their normalized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FoundEmail {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub domain: String,
    pub score: Option<i32>,
    pub status: String,
}

pub const STATUS_GUESSED: &str = "guessed";
