use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;

use crate::errors::AppError;
use crate::notifications::templates::RenderedEmail;

const RESEND_API_URL: &str = "https://api.resend.com";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Email API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<EmailError> for AppError {
    fn from(e: EmailError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), EmailError>;
}

/// Logs instead of sending. Used when no Resend key is configured.
#[derive(Default)]
pub struct MockEmailService;

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), EmailError> {
        tracing::info!("[MOCK EMAIL] to: {to}");
        tracing::info!("   Subject: {}", email.subject);
        tracing::debug!("   Body: {}", email.html);
        Ok(())
    }
}

pub struct ResendEmailService {
    client: Client,
    api_key: String,
    from: String,
    base_url: String,
}

impl ResendEmailService {
    pub fn new(api_key: String, from: String) -> Result<Self, EmailError> {
        Self::with_base_url(api_key, from, RESEND_API_URL.to_string())
    }

    pub fn with_base_url(
        api_key: String,
        from: String,
        base_url: String,
    ) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            from,
            base_url,
        })
    }
}

#[async_trait]
impl EmailService for ResendEmailService {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), EmailError> {
        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": email.subject,
                "html": email.html,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!("Email '{}' sent to {to}", email.subject);
        Ok(())
    }
}
