pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::credits::handlers as credits;
use crate::cv::handlers as cv;
use crate::email_finder::handlers as email_finder;
use crate::llm_client::handlers as ai;
use crate::notifications::handlers as notifications;
use crate::state::AppState;
use crate::webhooks::{license, payment};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Credits
        .route("/api/v1/credits", get(credits::handle_get_balance))
        .route("/api/v1/credits/deduct", post(credits::handle_deduct))
        .route("/api/v1/credits/grant", post(credits::handle_grant))
        // Payments
        .route("/api/v1/webhooks/gumroad", post(payment::handle_sale_ping))
        .route("/api/v1/licenses/redeem", post(license::handle_redeem))
        // Notifications
        .route(
            "/api/v1/notifications/email",
            post(notifications::handle_send_email),
        )
        // Email finder
        .route(
            "/api/v1/email-finder/domain",
            get(email_finder::handle_find_domain),
        )
        .route(
            "/api/v1/email-finder/pattern/:domain",
            get(email_finder::handle_get_pattern),
        )
        .route(
            "/api/v1/email-finder/generate",
            post(email_finder::handle_generate),
        )
        .route(
            "/api/v1/email-finder/find",
            post(email_finder::handle_find_email),
        )
        // AI gateway
        .route("/api/v1/ai/generate", post(ai::handle_generate))
        // CV pipeline
        .route(
            "/api/v1/cv/parse",
            post(cv::handle_parse).layer(DefaultBodyLimit::max(cv::MAX_UPLOAD_BYTES)),
        )
        .route("/api/v1/cv/match", post(cv::handle_match))
        .route("/api/v1/cv/optimize", post(cv::handle_optimize))
        .route(
            "/api/v1/resume",
            get(cv::handle_get_resume).put(cv::handle_save_resume),
        )
        .with_state(state)
}
