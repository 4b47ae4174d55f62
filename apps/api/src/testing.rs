//! Shared fixtures for router-level tests.

use std::sync::Arc;

use axum::response::Response;
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;

use crate::auth::{Claims, TokenVerifier};
use crate::config::Config;
use crate::credits::cache::memory::MemoryBalanceCache;
use crate::credits::ledger::CreditLedger;
use crate::cv::match_scoring::KeywordMatchScorer;
use crate::email_finder::resolver::fake::FakeLookup;
use crate::email_finder::resolver::EmailResolver;
use crate::llm_client::LlmClient;
use crate::notifications::sender::recording::RecordingEmailService;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::memory::MemoryStore;
use crate::webhooks::gumroad::fake::FakeVerifier;

pub const TEST_JWT_SECRET: &[u8] = b"cvmatch-test-secret";
pub const ADMIN_EMAIL: &str = "owner@cvmatch.app";

/// Nothing listens here; tests that reach the model mount a wiremock server.
const UNREACHABLE_LLM: &str = "http://127.0.0.1:9";

pub fn mint_token(sub: &str, email: Option<&str>) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        email: email.map(str::to_string),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET),
    )
    .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        redis_url: "redis://unused".to_string(),
        anthropic_api_key: "test".to_string(),
        clerk_jwt_key: String::new(),
        hunter_api_key: "test".to_string(),
        admin_email: Some(ADMIN_EMAIL.to_string()),
        resend_api_key: None,
        email_from: "CV Match <hello@cvmatch.app>".to_string(),
        app_url: "https://app.test".to_string(),
        s3: None,
        port: 0,
        rust_log: "debug".to_string(),
    }
}

/// In-memory application. Every `router()` call shares the same backing
/// stores, so state carries over between requests.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryBalanceCache>,
    pub lookup: Arc<FakeLookup>,
    pub verifier: Arc<FakeVerifier>,
    pub mailer: Arc<RecordingEmailService>,
    pub llm_url: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            cache: Arc::new(MemoryBalanceCache::default()),
            lookup: Arc::new(FakeLookup::default()),
            verifier: Arc::new(FakeVerifier::default()),
            mailer: Arc::new(RecordingEmailService::default()),
            llm_url: UNREACHABLE_LLM.to_string(),
        }
    }

    pub fn with_verifier(verifier: FakeVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
            ..Self::new()
        }
    }

    pub fn with_lookup(lookup: FakeLookup) -> Self {
        Self {
            lookup: Arc::new(lookup),
            ..Self::new()
        }
    }

    pub fn with_llm(base_url: String) -> Self {
        Self {
            llm_url: base_url,
            ..Self::new()
        }
    }

    pub fn state(&self) -> AppState {
        let config = test_config();
        AppState {
            ledger: CreditLedger::new(
                self.store.clone(),
                self.cache.clone(),
                config.admin_email.clone(),
            ),
            resolver: EmailResolver::new(self.store.clone(), self.lookup.clone()),
            licenses: self.store.clone(),
            license_verifier: self.verifier.clone(),
            resumes: self.store.clone(),
            mailer: self.mailer.clone(),
            llm: LlmClient::with_base_url("test".to_string(), self.llm_url.clone()).unwrap(),
            match_scorer: Arc::new(KeywordMatchScorer),
            uploads: None,
            auth: TokenVerifier::from_secret(TEST_JWT_SECRET),
            config,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state())
    }
}

