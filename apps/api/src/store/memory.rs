//! In-memory store for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::models::email::{DomainPattern, FoundEmail};
use crate::models::license::{ProcessedSale, UsedLicense};
use crate::models::profile::Profile;
use crate::models::resume::ResumeRow;
use crate::store::{EmailCacheStore, LicenseStore, ProfileStore, ResumeStore, StoreResult};

#[derive(Default)]
pub struct MemoryStore {
    profiles: Mutex<HashMap<String, Profile>>,
    patterns: Mutex<HashMap<String, DomainPattern>>,
    emails: Mutex<HashMap<String, FoundEmail>>,
    licenses: Mutex<HashMap<String, UsedLicense>>,
    sales: Mutex<HashSet<String>>,
    resumes: Mutex<HashMap<String, ResumeRow>>,
    /// Makes the direct profile read fail, forcing the get-or-create path.
    pub fail_direct_reads: AtomicBool,
    /// Makes the atomic decrement fail with a database error.
    pub fail_decrements: AtomicBool,
    /// Makes the upsert-increment behind `grant` fail with a database error.
    pub fail_increments: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, id: &str, credits: i32, is_premium: bool) -> Self {
        self.profiles.lock().unwrap().insert(
            id.to_string(),
            Profile {
                id: id.to_string(),
                credits,
                is_premium,
            },
        );
        self
    }

    pub fn profile(&self, id: &str) -> Option<Profile> {
        self.profiles.lock().unwrap().get(id).cloned()
    }

    /// Overwrites the stored balance without touching any cache.
    pub fn set_credits(&self, id: &str, credits: i32) {
        self.profiles
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_insert_with(|| Profile::empty(id))
            .credits = credits;
    }

    pub fn found_email_count(&self) -> usize {
        self.emails.lock().unwrap().len()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn read_credits(&self, user_id: &str) -> StoreResult<Option<i32>> {
        if self.fail_direct_reads.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Protocol("direct read disabled".into()));
        }
        Ok(self.profiles.lock().unwrap().get(user_id).map(|p| p.credits))
    }

    async fn get_or_create_profile(&self, user_id: &str) -> StoreResult<Profile> {
        let mut profiles = self.profiles.lock().unwrap();
        Ok(profiles
            .entry(user_id.to_string())
            .or_insert_with(|| Profile::empty(user_id))
            .clone())
    }

    async fn decrement_credits(&self, user_id: &str, amount: i32) -> StoreResult<Option<i32>> {
        if self.fail_decrements.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Protocol("decrement failed".into()));
        }
        let mut profiles = self.profiles.lock().unwrap();
        match profiles.get_mut(user_id) {
            Some(p) if p.credits >= amount => {
                p.credits -= amount;
                Ok(Some(p.credits))
            }
            _ => Ok(None),
        }
    }

    async fn increment_credits(
        &self,
        user_id: &str,
        amount: i32,
        premium: bool,
    ) -> StoreResult<i32> {
        if self.fail_increments.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Protocol("increment failed".into()));
        }
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .entry(user_id.to_string())
            .or_insert_with(|| Profile::empty(user_id));
        profile.credits += amount;
        profile.is_premium |= premium;
        Ok(profile.credits)
    }
}

#[async_trait]
impl EmailCacheStore for MemoryStore {
    async fn get_pattern(&self, domain: &str) -> StoreResult<Option<DomainPattern>> {
        Ok(self.patterns.lock().unwrap().get(domain).cloned())
    }

    async fn save_pattern(&self, pattern: &DomainPattern) -> StoreResult<()> {
        self.patterns
            .lock()
            .unwrap()
            .entry(pattern.domain.clone())
            .or_insert_with(|| pattern.clone());
        Ok(())
    }

    async fn get_found_email(
        &self,
        first_name: &str,
        last_name: &str,
        domain: &str,
    ) -> StoreResult<Option<FoundEmail>> {
        Ok(self
            .emails
            .lock()
            .unwrap()
            .values()
            .find(|e| e.first_name == first_name && e.last_name == last_name && e.domain == domain)
            .cloned())
    }

    async fn save_found_email(&self, record: &FoundEmail) -> StoreResult<()> {
        self.emails
            .lock()
            .unwrap()
            .insert(record.email.clone(), record.clone());
        Ok(())
    }
}

#[async_trait]
impl LicenseStore for MemoryStore {
    async fn find_license(&self, license_key: &str) -> StoreResult<Option<UsedLicense>> {
        Ok(self.licenses.lock().unwrap().get(license_key).cloned())
    }

    async fn record_license(&self, license: &UsedLicense) -> StoreResult<bool> {
        let mut licenses = self.licenses.lock().unwrap();
        if licenses.contains_key(&license.license_key) {
            return Ok(false);
        }
        licenses.insert(license.license_key.clone(), license.clone());
        Ok(true)
    }

    async fn release_license(&self, license_key: &str) -> StoreResult<()> {
        self.licenses.lock().unwrap().remove(license_key);
        Ok(())
    }

    async fn record_sale(&self, sale: &ProcessedSale) -> StoreResult<bool> {
        Ok(self.sales.lock().unwrap().insert(sale.sale_id.clone()))
    }

    async fn release_sale(&self, sale_id: &str) -> StoreResult<()> {
        self.sales.lock().unwrap().remove(sale_id);
        Ok(())
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn get_resume(&self, user_id: &str) -> StoreResult<Option<ResumeRow>> {
        Ok(self.resumes.lock().unwrap().get(user_id).cloned())
    }

    async fn save_resume(&self, user_id: &str, content: &Value) -> StoreResult<ResumeRow> {
        let row = ResumeRow {
            user_id: user_id.to_string(),
            content: content.clone(),
            updated_at: Utc::now(),
        };
        self.resumes
            .lock()
            .unwrap()
            .insert(user_id.to_string(), row.clone());
        Ok(row)
    }
}
