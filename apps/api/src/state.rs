use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::credits::ledger::CreditLedger;
use crate::cv::match_scoring::MatchScorer;
use crate::cv::upload::UploadArchive;
use crate::email_finder::resolver::EmailResolver;
use crate::llm_client::LlmClient;
use crate::notifications::sender::EmailService;
use crate::store::{LicenseStore, ResumeStore};
use crate::webhooks::gumroad::LicenseVerifier;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub ledger: CreditLedger,
    pub resolver: EmailResolver,
    pub licenses: Arc<dyn LicenseStore>,
    /// Gumroad license API. Swapped for a scripted verifier in tests.
    pub license_verifier: Arc<dyn LicenseVerifier>,
    pub resumes: Arc<dyn ResumeStore>,
    pub mailer: Arc<dyn EmailService>,
    pub llm: LlmClient,
    /// Pluggable match scorer. Default: KeywordMatchScorer.
    pub match_scorer: Arc<dyn MatchScorer>,
    /// `None` when no S3 bucket is configured.
    pub uploads: Option<UploadArchive>,
    pub auth: TokenVerifier,
    pub config: Config,
}
