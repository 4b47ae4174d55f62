//! Credit ledger: per-user integer balances guarding metered operations.
//!
//! Deductions are checked against the cached balance first, then applied with
//! a single conditional decrement in Postgres, so a balance can never go
//! negative even when two requests race for the last credit. Grants are a
//! single upsert-increment.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::credits::cache::BalanceCache;
use crate::models::profile::Profile;
use crate::store::ProfileStore;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient_funds_local")]
    InsufficientFundsLocal,

    #[error("insufficient_funds_server")]
    InsufficientFundsServer,

    #[error("Credit amount must be positive, got {0}")]
    InvalidAmount(i32),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LedgerError {
    /// Stable machine-readable code returned to clients.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InsufficientFundsLocal => "insufficient_funds_local",
            LedgerError::InsufficientFundsServer => "insufficient_funds_server",
            LedgerError::InvalidAmount(_) => "invalid_amount",
            LedgerError::Database(_) => "database_error",
        }
    }
}

/// Outcome of a successful deduction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deduction {
    /// `None` when the admin bypass skipped the deduction.
    pub new_balance: Option<i32>,
    pub bypassed: bool,
}

#[derive(Clone)]
pub struct CreditLedger {
    store: Arc<dyn ProfileStore>,
    cache: Arc<dyn BalanceCache>,
    admin_email: Option<String>,
}

impl CreditLedger {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        cache: Arc<dyn BalanceCache>,
        admin_email: Option<String>,
    ) -> Self {
        Self {
            store,
            cache,
            admin_email,
        }
    }

    pub fn is_admin(&self, actor_email: Option<&str>) -> bool {
        match (self.admin_email.as_deref(), actor_email) {
            (Some(admin), Some(actor)) => admin.eq_ignore_ascii_case(actor.trim()),
            _ => false,
        }
    }

    /// Reads the balance, creating a zero-balance profile when the direct
    /// read fails or finds nothing.
    pub async fn fetch_balance(&self, user_id: &str) -> Result<i32, LedgerError> {
        let balance = match self.store.read_credits(user_id).await {
            Ok(Some(credits)) => credits,
            Ok(None) => self.store.get_or_create_profile(user_id).await?.credits,
            Err(e) => {
                warn!("Direct balance read failed for {user_id}, using get_or_create: {e}");
                self.store.get_or_create_profile(user_id).await?.credits
            }
        };
        self.cache.put(user_id, balance).await;
        Ok(balance)
    }

    /// Full profile (balance and premium flag), created lazily.
    pub async fn profile(&self, user_id: &str) -> Result<Profile, LedgerError> {
        let profile = self.store.get_or_create_profile(user_id).await?;
        self.cache.put(user_id, profile.credits).await;
        Ok(profile)
    }

    pub async fn deduct(
        &self,
        user_id: &str,
        amount: i32,
        actor_email: Option<&str>,
    ) -> Result<Deduction, LedgerError> {
        if self.is_admin(actor_email) {
            info!("Admin bypass: skipping deduction of {amount} credits for {user_id}");
            return Ok(Deduction {
                new_balance: None,
                bypassed: true,
            });
        }

        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let cached = match self.cache.get(user_id).await {
            Some(balance) => balance,
            None => self.fetch_balance(user_id).await?,
        };
        if cached < amount {
            return Err(LedgerError::InsufficientFundsLocal);
        }

        match self.store.decrement_credits(user_id, amount).await {
            Ok(Some(new_balance)) => {
                self.cache.put(user_id, new_balance).await;
                info!("Deducted {amount} credits from {user_id}, balance now {new_balance}");
                Ok(Deduction {
                    new_balance: Some(new_balance),
                    bypassed: false,
                })
            }
            Ok(None) => {
                // The cached value was stale.
                self.cache.invalidate(user_id).await;
                Err(LedgerError::InsufficientFundsServer)
            }
            Err(e) => {
                self.cache.invalidate(user_id).await;
                Err(LedgerError::Database(e))
            }
        }
    }

    /// Adds credits; `premium` also flips the profile to premium.
    pub async fn grant(
        &self,
        user_id: &str,
        amount: i32,
        premium: bool,
    ) -> Result<i32, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let new_balance = self
            .store
            .increment_credits(user_id, amount, premium)
            .await?;
        self.cache.put(user_id, new_balance).await;
        info!("Granted {amount} credits to {user_id}, balance now {new_balance}");
        Ok(new_balance)
    }
}
