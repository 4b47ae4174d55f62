//! Cache-through resolution of company domains, email patterns and addresses.

use std::sync::Arc;

use tracing::{info, warn};

use crate::email_finder::hunter::{EmailLookup, LookupError};
use crate::email_finder::names::{generate_email, normalize_name};
use crate::errors::AppError;
use crate::models::email::{DomainPattern, FoundEmail, STATUS_GUESSED};
use crate::store::EmailCacheStore;

impl From<LookupError> for AppError {
    fn from(e: LookupError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

/// Lowercases and strips scheme, `www.` and any path from a domain-ish input.
pub fn normalize_domain(input: &str) -> Option<String> {
    let lower = input.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() || !host.contains('.') || host.contains(char::is_whitespace) {
        None
    } else {
        Some(host.to_string())
    }
}

#[derive(Clone)]
pub struct EmailResolver {
    store: Arc<dyn EmailCacheStore>,
    lookup: Arc<dyn EmailLookup>,
}

impl EmailResolver {
    pub fn new(store: Arc<dyn EmailCacheStore>, lookup: Arc<dyn EmailLookup>) -> Self {
        Self { store, lookup }
    }

    /// Returns a company's email domain. Inputs that already look like a
    /// domain are returned as-is.
    pub async fn find_company_domain(&self, company: &str) -> Result<Option<String>, AppError> {
        let company = company.trim();
        if company.is_empty() {
            return Ok(None);
        }
        if !company.contains(char::is_whitespace) {
            if let Some(domain) = normalize_domain(company) {
                return Ok(Some(domain));
            }
        }
        let domain = self.lookup.find_domain(company).await?;
        Ok(domain.and_then(|d| normalize_domain(&d)))
    }

    /// Pattern for a domain: cache first, then the external lookup, written back.
    pub async fn get_pattern(&self, domain: &str) -> Result<Option<String>, AppError> {
        let Some(domain) = normalize_domain(domain) else {
            return Ok(None);
        };

        if let Some(cached) = self.store.get_pattern(&domain).await? {
            return Ok(Some(cached.pattern));
        }

        let Some(pattern) = self.lookup.find_pattern(&domain).await? else {
            return Ok(None);
        };

        self.store
            .save_pattern(&DomainPattern {
                domain: domain.clone(),
                pattern: pattern.clone(),
            })
            .await?;
        info!("Cached email pattern {pattern} for {domain}");
        Ok(Some(pattern))
    }

    pub async fn get_cached_email(
        &self,
        first: &str,
        last: &str,
        domain: &str,
    ) -> Result<Option<FoundEmail>, AppError> {
        let (Some(first), Some(last), Some(domain)) =
            (normalize_name(first), normalize_name(last), normalize_domain(domain))
        else {
            return Ok(None);
        };
        Ok(self.store.get_found_email(&first, &last, &domain).await?)
    }

    /// Person-level resolution: cache, then the external finder, then a
    /// guess from the domain pattern. Every new result is cached.
    pub async fn find_email(
        &self,
        first: &str,
        last: &str,
        domain: &str,
    ) -> Result<Option<FoundEmail>, AppError> {
        let (Some(norm_first), Some(norm_last), Some(domain)) =
            (normalize_name(first), normalize_name(last), normalize_domain(domain))
        else {
            return Ok(None);
        };

        if let Some(cached) = self
            .store
            .get_found_email(&norm_first, &norm_last, &domain)
            .await?
        {
            return Ok(Some(cached));
        }

        let candidate = match self
            .lookup
            .find_email(first.trim(), last.trim(), &domain)
            .await
        {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("Email finder lookup failed for {domain}, falling back to pattern: {e}");
                None
            }
        };

        let record = match candidate {
            Some(c) => FoundEmail {
                email: c.email,
                first_name: norm_first,
                last_name: norm_last,
                domain,
                score: c.score,
                status: c.status,
            },
            None => {
                let Some(pattern) = self.get_pattern(&domain).await? else {
                    return Ok(None);
                };
                let Some(email) = generate_email(first, last, &pattern, &domain) else {
                    return Ok(None);
                };
                FoundEmail {
                    email,
                    first_name: norm_first,
                    last_name: norm_last,
                    domain,
                    score: None,
                    status: STATUS_GUESSED.to_string(),
                }
            }
        };

        self.store.save_found_email(&record).await?;
        Ok(Some(record))
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeLookup;
    use super::*;
    use crate::email_finder::hunter::EmailCandidate;
    use crate::store::memory::MemoryStore;

    fn resolver(store: Arc<MemoryStore>, lookup: Arc<FakeLookup>) -> EmailResolver {
        EmailResolver::new(store, lookup)
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("https://www.Acme.com/about"), Some("acme.com".to_string()));
        assert_eq!(normalize_domain("acme.io"), Some("acme.io".to_string()));
        assert_eq!(normalize_domain("acme"), None);
        assert_eq!(normalize_domain(""), None);
    }

    #[tokio::test]
    async fn test_domain_like_company_skips_lookup() {
        let lookup = Arc::new(FakeLookup::default());
        let r = resolver(Arc::new(MemoryStore::new()), lookup.clone());
        assert_eq!(
            r.find_company_domain("Stripe.com").await.unwrap(),
            Some("stripe.com".to_string())
        );
        assert_eq!(lookup.call_count(), 0);
    }

    #[tokio::test]
    async fn test_company_name_uses_lookup() {
        let mut lookup = FakeLookup::default();
        lookup
            .domains
            .insert("Acme Corp".to_string(), "acme.com".to_string());
        let r = resolver(Arc::new(MemoryStore::new()), Arc::new(lookup));
        assert_eq!(
            r.find_company_domain("Acme Corp").await.unwrap(),
            Some("acme.com".to_string())
        );
        assert_eq!(r.find_company_domain("Unknown Inc").await.unwrap(), None);
        assert_eq!(r.find_company_domain("   ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pattern_is_cached_after_first_lookup() {
        let mut lookup = FakeLookup::default();
        lookup
            .patterns
            .insert("acme.com".to_string(), "{f}{last}".to_string());
        let lookup = Arc::new(lookup);
        let r = resolver(Arc::new(MemoryStore::new()), lookup.clone());

        assert_eq!(r.get_pattern("acme.com").await.unwrap().as_deref(), Some("{f}{last}"));
        assert_eq!(r.get_pattern("ACME.com").await.unwrap().as_deref(), Some("{f}{last}"));
        assert_eq!(lookup.call_count(), 1);
    }

    #[tokio::test]
    async fn test_find_email_uses_finder_then_cache() {
        let mut lookup = FakeLookup::default();
        lookup.emails.insert(
            ("José".to_string(), "García".to_string(), "acme.com".to_string()),
            EmailCandidate {
                email: "jgarcia@acme.com".to_string(),
                score: Some(91),
                status: "valid".to_string(),
            },
        );
        let lookup = Arc::new(lookup);
        let store = Arc::new(MemoryStore::new());
        let r = resolver(store.clone(), lookup.clone());

        let found = r.find_email("José", "García", "acme.com").await.unwrap().unwrap();
        assert_eq!(found.email, "jgarcia@acme.com");
        assert_eq!(found.first_name, "jose");
        assert_eq!(found.last_name, "garcia");

        let cached = r.get_cached_email("jose", "GARCIA", "acme.com").await.unwrap();
        assert_eq!(cached, Some(found.clone()));

        let again = r.find_email("José", "García", "acme.com").await.unwrap();
        assert_eq!(again, Some(found));
        assert_eq!(lookup.call_count(), 1);
    }

    #[tokio::test]
    async fn test_find_email_falls_back_to_pattern_guess() {
        let mut lookup = FakeLookup::default();
        lookup.fail_email_lookups = true;
        lookup
            .patterns
            .insert("acme.com".to_string(), "{first}.{last}".to_string());
        let store = Arc::new(MemoryStore::new());
        let r = resolver(store.clone(), Arc::new(lookup));

        let found = r.find_email("Anna", "Van Dijk", "acme.com").await.unwrap().unwrap();
        assert_eq!(found.email, "anna.van-dijk@acme.com");
        assert_eq!(found.status, STATUS_GUESSED);
        assert_eq!(found.score, None);
        assert_eq!(store.found_email_count(), 1);
    }

    #[tokio::test]
    async fn test_find_email_without_pattern_is_none() {
        let r = resolver(Arc::new(MemoryStore::new()), Arc::new(FakeLookup::default()));
        assert_eq!(r.find_email("Anna", "Berg", "nowhere.io").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_email_rejects_garbage_names_without_lookup() {
        let lookup = Arc::new(FakeLookup::default());
        let r = resolver(Arc::new(MemoryStore::new()), lookup.clone());
        assert_eq!(r.find_email("Doe, Jane", "X", "acme.com").await.unwrap(), None);
        assert_eq!(lookup.call_count(), 0);
    }
}
