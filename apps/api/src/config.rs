use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub anthropic_api_key: String,
    /// PEM-encoded public key used to verify Clerk session tokens.
    pub clerk_jwt_key: String,
    pub hunter_api_key: String,
    /// Actor email that bypasses credit deduction entirely.
    pub admin_email: Option<String>,
    /// When unset, transactional email is logged instead of sent.
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub app_url: String,
    /// Upload archiving is disabled when no bucket is configured.
    pub s3: Option<S3Config>,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3 = match optional_env("S3_BUCKET") {
            Some(bucket) => Some(S3Config {
                bucket,
                endpoint: require_env("S3_ENDPOINT")?,
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
            None => None,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            clerk_jwt_key: require_env("CLERK_JWT_KEY")?,
            hunter_api_key: require_env("HUNTER_API_KEY")?,
            admin_email: optional_env("ADMIN_EMAIL"),
            resend_api_key: optional_env("RESEND_API_KEY"),
            email_from: optional_env("EMAIL_FROM")
                .unwrap_or_else(|| "CV Match <hello@cvmatch.app>".to_string()),
            app_url: optional_env("APP_URL").unwrap_or_else(|| "http://localhost:5173".to_string()),
            s3,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Treats empty values the same as unset ones.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
