mod auth;
mod config;
mod credits;
mod cv;
mod db;
mod email_finder;
mod errors;
mod llm_client;
mod models;
mod notifications;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod testing;
mod webhooks;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::TokenVerifier;
use crate::config::{Config, S3Config};
use crate::credits::cache::RedisBalanceCache;
use crate::credits::ledger::CreditLedger;
use crate::cv::match_scoring::KeywordMatchScorer;
use crate::cv::upload::UploadArchive;
use crate::db::create_pool;
use crate::email_finder::hunter::HunterClient;
use crate::email_finder::resolver::EmailResolver;
use crate::llm_client::LlmClient;
use crate::notifications::sender::{EmailService, MockEmailService, ResendEmailService};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgStore;
use crate::webhooks::gumroad::GumroadClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Match API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(pool));

    // Redis balance cache
    let redis = redis::Client::open(config.redis_url.clone())?;
    let cache = RedisBalanceCache::connect(&redis)
        .await
        .context("Failed to connect to Redis")?;
    info!("Redis balance cache connected");

    let ledger = CreditLedger::new(store.clone(), Arc::new(cache), config.admin_email.clone());
    if config.admin_email.is_some() {
        info!("Admin credit bypass enabled");
    }

    // Third-party clients
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (default model: {})", llm_client::MODEL);

    let hunter = HunterClient::new(config.hunter_api_key.clone())?;
    let resolver = EmailResolver::new(store.clone(), Arc::new(hunter));

    let license_verifier = GumroadClient::new()?;

    let mailer: Arc<dyn EmailService> = match &config.resend_api_key {
        Some(key) => {
            info!("Transactional email via Resend");
            Arc::new(ResendEmailService::new(key.clone(), config.email_from.clone())?)
        }
        None => {
            warn!("RESEND_API_KEY not set, emails will only be logged");
            Arc::new(MockEmailService)
        }
    };

    // S3 / MinIO upload archive
    let uploads = match &config.s3 {
        Some(s3) => {
            let client = build_s3_client(s3).await;
            info!("CV uploads archived to bucket {}", s3.bucket);
            Some(UploadArchive::new(client, s3.bucket.clone()))
        }
        None => {
            info!("S3_BUCKET not set, CV uploads are not archived");
            None
        }
    };

    let auth = TokenVerifier::from_rsa_pem(&config.clerk_jwt_key)
        .context("CLERK_JWT_KEY is not a valid RSA public key")?;

    let state = AppState {
        ledger,
        resolver,
        licenses: store.clone(),
        license_verifier: Arc::new(license_verifier),
        resumes: store,
        mailer,
        llm,
        match_scorer: Arc::new(KeywordMatchScorer),
        uploads,
        auth,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(s3: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &s3.access_key_id,
        &s3.secret_access_key,
        None,
        None,
        "cvmatch-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&s3.endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
