use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use crate::models::email::{DomainPattern, FoundEmail};
use crate::models::license::{ProcessedSale, UsedLicense};
use crate::models::profile::Profile;
use crate::models::resume::ResumeRow;
use crate::store::{EmailCacheStore, LicenseStore, ProfileStore, ResumeStore, StoreResult};

/// Postgres-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn read_credits(&self, user_id: &str) -> StoreResult<Option<i32>> {
        sqlx::query_scalar("SELECT credits FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_or_create_profile(&self, user_id: &str) -> StoreResult<Profile> {
        sqlx::query_as::<_, Profile>(
            "SELECT id, credits, is_premium FROM get_or_create_profile($1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn decrement_credits(&self, user_id: &str, amount: i32) -> StoreResult<Option<i32>> {
        sqlx::query_scalar("SELECT decrement_credits($1, $2)")
            .bind(user_id)
            .bind(amount)
            .fetch_one(&self.pool)
            .await
    }

    async fn increment_credits(
        &self,
        user_id: &str,
        amount: i32,
        premium: bool,
    ) -> StoreResult<i32> {
        sqlx::query_scalar(
            r#"
            INSERT INTO profiles (id, credits, is_premium)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
               SET credits = profiles.credits + EXCLUDED.credits,
                   is_premium = profiles.is_premium OR EXCLUDED.is_premium,
                   updated_at = now()
            RETURNING credits
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(premium)
        .fetch_one(&self.pool)
        .await
    }
}

#[async_trait]
impl EmailCacheStore for PgStore {
    async fn get_pattern(&self, domain: &str) -> StoreResult<Option<DomainPattern>> {
        sqlx::query_as::<_, DomainPattern>(
            "SELECT domain, pattern FROM domain_patterns WHERE domain = $1",
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await
    }

    async fn save_pattern(&self, pattern: &DomainPattern) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO domain_patterns (domain, pattern) VALUES ($1, $2) ON CONFLICT (domain) DO NOTHING",
        )
        .bind(&pattern.domain)
        .bind(&pattern.pattern)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_found_email(
        &self,
        first_name: &str,
        last_name: &str,
        domain: &str,
    ) -> StoreResult<Option<FoundEmail>> {
        sqlx::query_as::<_, FoundEmail>(
            r#"
            SELECT email, first_name, last_name, domain, score, status
            FROM found_emails
            WHERE first_name = $1 AND last_name = $2 AND domain = $3
            ORDER BY score DESC NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(domain)
        .fetch_optional(&self.pool)
        .await
    }

    async fn save_found_email(&self, record: &FoundEmail) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO found_emails (email, first_name, last_name, domain, score, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO UPDATE
               SET score = EXCLUDED.score,
                   status = EXCLUDED.status
            "#,
        )
        .bind(&record.email)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.domain)
        .bind(record.score)
        .bind(&record.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl LicenseStore for PgStore {
    async fn find_license(&self, license_key: &str) -> StoreResult<Option<UsedLicense>> {
        sqlx::query_as::<_, UsedLicense>(
            "SELECT license_key, user_id, product_permalink FROM used_licenses WHERE license_key = $1",
        )
        .bind(license_key)
        .fetch_optional(&self.pool)
        .await
    }

    async fn record_license(&self, license: &UsedLicense) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO used_licenses (license_key, user_id, product_permalink)
            VALUES ($1, $2, $3)
            ON CONFLICT (license_key) DO NOTHING
            "#,
        )
        .bind(&license.license_key)
        .bind(&license.user_id)
        .bind(&license.product_permalink)
        .execute(&self.pool)
        .await?;

        debug!(
            "record_license {} affected {} rows",
            license.license_key,
            result.rows_affected()
        );
        Ok(result.rows_affected() == 1)
    }

    async fn release_license(&self, license_key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM used_licenses WHERE license_key = $1")
            .bind(license_key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_sale(&self, sale: &ProcessedSale) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO processed_sales (sale_id, user_id, permalink)
            VALUES ($1, $2, $3)
            ON CONFLICT (sale_id) DO NOTHING
            "#,
        )
        .bind(&sale.sale_id)
        .bind(&sale.user_id)
        .bind(&sale.permalink)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn release_sale(&self, sale_id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM processed_sales WHERE sale_id = $1")
            .bind(sale_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ResumeStore for PgStore {
    async fn get_resume(&self, user_id: &str) -> StoreResult<Option<ResumeRow>> {
        sqlx::query_as::<_, ResumeRow>(
            "SELECT user_id, content, updated_at FROM resumes WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn save_resume(&self, user_id: &str, content: &Value) -> StoreResult<ResumeRow> {
        sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes (user_id, content, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id) DO UPDATE
               SET content = EXCLUDED.content,
                   updated_at = now()
            RETURNING user_id, content, updated_at
            "#,
        )
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }
}
