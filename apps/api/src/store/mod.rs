//! Repository traits over the relational store.
//!
//! Handlers and services only see these traits; `PgStore` is the production
//! implementation and `MemoryStore` backs the unit tests.

use async_trait::async_trait;
use serde_json::Value;

use crate::models::email::{DomainPattern, FoundEmail};
use crate::models::license::{ProcessedSale, UsedLicense};
use crate::models::profile::Profile;
use crate::models::resume::ResumeRow;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Direct row read. `Ok(None)` when the profile does not exist yet.
    async fn read_credits(&self, user_id: &str) -> StoreResult<Option<i32>>;
    /// Materializes a zero-balance profile if none exists.
    async fn get_or_create_profile(&self, user_id: &str) -> StoreResult<Profile>;
    /// Atomic conditional decrement. `Ok(None)` when the balance is too low.
    async fn decrement_credits(&self, user_id: &str, amount: i32) -> StoreResult<Option<i32>>;
    /// Atomic upsert-increment; returns the new balance.
    async fn increment_credits(&self, user_id: &str, amount: i32, premium: bool)
        -> StoreResult<i32>;
}

#[async_trait]
pub trait EmailCacheStore: Send + Sync {
    async fn get_pattern(&self, domain: &str) -> StoreResult<Option<DomainPattern>>;
    /// Write-once: an existing pattern for the domain is kept.
    async fn save_pattern(&self, pattern: &DomainPattern) -> StoreResult<()>;
    async fn get_found_email(
        &self,
        first_name: &str,
        last_name: &str,
        domain: &str,
    ) -> StoreResult<Option<FoundEmail>>;
    async fn save_found_email(&self, record: &FoundEmail) -> StoreResult<()>;
}

#[async_trait]
pub trait LicenseStore: Send + Sync {
    async fn find_license(&self, license_key: &str) -> StoreResult<Option<UsedLicense>>;
    /// Returns `false` when the key was already recorded.
    async fn record_license(&self, license: &UsedLicense) -> StoreResult<bool>;
    /// Undoes `record_license` when crediting the redemption failed.
    async fn release_license(&self, license_key: &str) -> StoreResult<()>;
    /// Returns `false` when the sale was already processed.
    async fn record_sale(&self, sale: &ProcessedSale) -> StoreResult<bool>;
    /// Undoes `record_sale` when crediting the sale failed.
    async fn release_sale(&self, sale_id: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn get_resume(&self, user_id: &str) -> StoreResult<Option<ResumeRow>>;
    async fn save_resume(&self, user_id: &str, content: &Value) -> StoreResult<ResumeRow>;
}
