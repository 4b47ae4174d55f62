//! Hunter.io client used when the local caches miss.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const HUNTER_API_URL: &str = "https://api.hunter.io";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Lookup API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Person-level result from the external lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailCandidate {
    pub email: String,
    pub score: Option<i32>,
    pub status: String,
}

#[async_trait]
pub trait EmailLookup: Send + Sync {
    async fn find_domain(&self, company: &str) -> Result<Option<String>, LookupError>;
    async fn find_pattern(&self, domain: &str) -> Result<Option<String>, LookupError>;
    async fn find_email(
        &self,
        first_name: &str,
        last_name: &str,
        domain: &str,
    ) -> Result<Option<EmailCandidate>, LookupError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct DomainSearchData {
    domain: Option<String>,
    pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailFinderData {
    email: Option<String>,
    score: Option<i32>,
    verification: Option<Verification>,
}

#[derive(Debug, Deserialize)]
struct Verification {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HunterErrors {
    errors: Vec<HunterErrorBody>,
}

#[derive(Debug, Deserialize)]
struct HunterErrorBody {
    details: String,
}

#[derive(Clone)]
pub struct HunterClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HunterClient {
    pub fn new(api_key: String) -> Result<Self, LookupError> {
        Self::with_base_url(api_key, HUNTER_API_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, LookupError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            api_key,
            base_url,
        })
    }

    /// GETs a Hunter endpoint. A 404 means "nothing known" and maps to `None`.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<T>, LookupError> {
        let response = self
            .client
            .get(format!("{}/v2/{endpoint}", self.base_url))
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            debug!("Hunter {endpoint} returned 404 for {params:?}");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<HunterErrors>(&body)
                .ok()
                .and_then(|e| e.errors.into_iter().next())
                .map(|e| e.details)
                .unwrap_or(body);
            return Err(LookupError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = response.json().await?;
        Ok(Some(envelope.data))
    }
}

#[async_trait]
impl EmailLookup for HunterClient {
    async fn find_domain(&self, company: &str) -> Result<Option<String>, LookupError> {
        let data: Option<DomainSearchData> = self
            .get("domain-search", &[("company", company), ("limit", "1")])
            .await?;
        Ok(data.and_then(|d| d.domain).filter(|d| !d.is_empty()))
    }

    async fn find_pattern(&self, domain: &str) -> Result<Option<String>, LookupError> {
        let data: Option<DomainSearchData> = self
            .get("domain-search", &[("domain", domain), ("limit", "1")])
            .await?;
        Ok(data.and_then(|d| d.pattern).filter(|p| !p.is_empty()))
    }

    async fn find_email(
        &self,
        first_name: &str,
        last_name: &str,
        domain: &str,
    ) -> Result<Option<EmailCandidate>, LookupError> {
        let data: Option<EmailFinderData> = self
            .get(
                "email-finder",
                &[
                    ("domain", domain),
                    ("first_name", first_name),
                    ("last_name", last_name),
                ],
            )
            .await?;

        Ok(data.and_then(|d| {
            let email = d.email?;
            Some(EmailCandidate {
                email: email.to_lowercase(),
                score: d.score,
                status: d
                    .verification
                    .and_then(|v| v.status)
                    .unwrap_or_else(|| "unknown".to_string()),
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> HunterClient {
        HunterClient::with_base_url("hk".to_string(), server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_find_pattern_reads_domain_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/domain-search"))
            .and(query_param("domain", "acme.com"))
            .and(query_param("api_key", "hk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "domain": "acme.com", "pattern": "{first}.{last}" }
            })))
            .mount(&server)
            .await;

        let pattern = client(&server).await.find_pattern("acme.com").await.unwrap();
        assert_eq!(pattern.as_deref(), Some("{first}.{last}"));
    }

    #[tokio::test]
    async fn test_find_domain_by_company() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/domain-search"))
            .and(query_param("company", "Acme Corp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "domain": "acme.com", "pattern": null }
            })))
            .mount(&server)
            .await;

        let domain = client(&server).await.find_domain("Acme Corp").await.unwrap();
        assert_eq!(domain.as_deref(), Some("acme.com"));
    }

    #[tokio::test]
    async fn test_find_email_maps_verification() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/email-finder"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "email": "Jane.Doe@acme.com",
                    "score": 94,
                    "verification": { "status": "valid" }
                }
            })))
            .mount(&server)
            .await;

        let found = client(&server)
            .await
            .find_email("jane", "doe", "acme.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.email, "jane.doe@acme.com");
        assert_eq!(found.score, Some(94));
        assert_eq!(found.status, "valid");
    }

    #[tokio::test]
    async fn test_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert_eq!(client(&server).await.find_pattern("nope.io").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_error_status_surfaces_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "errors": [{ "id": "too_many_requests", "code": 429, "details": "Rate limit reached" }]
            })))
            .mount(&server)
            .await;

        match client(&server).await.find_domain("Acme").await {
            Err(LookupError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit reached");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }
}
