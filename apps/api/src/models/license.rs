use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UsedLicense {
    pub license_key: String,
    pub user_id: String,
    pub product_permalink: String,
}

/// A payment-webhook delivery that has already been credited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProcessedSale {
    pub sale_id: String,
    pub user_id: String,
    pub permalink: String,
}
