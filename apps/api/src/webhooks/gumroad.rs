//! Gumroad license verification.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::credits::products::Product;
use crate::errors::AppError;

const GUMROAD_API_URL: &str = "https://api.gumroad.com";

#[derive(Debug, Error)]
pub enum LicenseCheckError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("License API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<LicenseCheckError> for AppError {
    fn from(e: LicenseCheckError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

#[async_trait]
pub trait LicenseVerifier: Send + Sync {
    /// `Ok(true)` only for a live (not refunded, not charged back) purchase of `product`.
    async fn verify(&self, product: &Product, license_key: &str) -> Result<bool, LicenseCheckError>;
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default)]
    purchase: Option<Purchase>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Purchase {
    #[serde(default)]
    refunded: bool,
    #[serde(default)]
    chargebacked: bool,
    #[serde(default)]
    disputed: bool,
}

#[derive(Clone)]
pub struct GumroadClient {
    client: Client,
    base_url: String,
}

impl GumroadClient {
    pub fn new() -> Result<Self, LicenseCheckError> {
        Self::with_base_url(GUMROAD_API_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Result<Self, LicenseCheckError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            base_url,
        })
    }
}

#[async_trait]
impl LicenseVerifier for GumroadClient {
    async fn verify(&self, product: &Product, license_key: &str) -> Result<bool, LicenseCheckError> {
        let response = self
            .client
            .post(format!("{}/v2/licenses/verify", self.base_url))
            .form(&[
                ("product_permalink", product.short_code),
                ("license_key", license_key),
                ("increment_uses_count", "false"),
            ])
            .send()
            .await?;

        let status = response.status();
        // Gumroad answers 404 for keys that do not belong to the product.
        if status.as_u16() == 404 {
            return Ok(false);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LicenseCheckError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: VerifyResponse = response.json().await?;
        if !body.success {
            debug!(
                "License rejected for {}: {}",
                product.permalink,
                body.message.unwrap_or_default()
            );
            return Ok(false);
        }

        let purchase = body.purchase.unwrap_or_default();
        Ok(!(purchase.refunded || purchase.chargebacked || purchase.disputed))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::credits::products::find_product;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_valid_license() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/licenses/verify"))
            .and(body_string_contains("product_permalink=ezocca"))
            .and(body_string_contains("license_key=ABC-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "uses": 1,
                "purchase": { "refunded": false, "chargebacked": false }
            })))
            .mount(&server)
            .await;

        let client = GumroadClient::with_base_url(server.uri()).unwrap();
        let product = find_product("pack-booster").unwrap();
        assert!(client.verify(product, "ABC-123").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_license_is_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "message": "That license does not exist for the provided product."
            })))
            .mount(&server)
            .await;

        let client = GumroadClient::with_base_url(server.uri()).unwrap();
        let product = find_product("career-coach").unwrap();
        assert!(!client.verify(product, "NOPE").await.unwrap());
    }

    #[tokio::test]
    async fn test_refunded_purchase_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "purchase": { "refunded": true, "chargebacked": false }
            })))
            .mount(&server)
            .await;

        let client = GumroadClient::with_base_url(server.uri()).unwrap();
        let product = find_product("pack-booster").unwrap();
        assert!(!client.verify(product, "ABC").await.unwrap());
    }

    #[tokio::test]
    async fn test_server_error_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = GumroadClient::with_base_url(server.uri()).unwrap();
        let product = find_product("pack-booster").unwrap();
        assert!(matches!(
            client.verify(product, "ABC").await,
            Err(LicenseCheckError::Api { status: 500, .. })
        ));
    }
}
