use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::email_finder::names::{clean_name, generate_email, split_full_name};
use crate::email_finder::resolver::normalize_domain;
use crate::errors::AppError;
use crate::models::email::FoundEmail;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DomainQuery {
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DomainResponse {
    pub company: String,
    pub domain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PatternResponse {
    pub domain: String,
    pub pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub email: Option<String>,
}

/// A person is named either by `first_name` + `last_name` or by a raw
/// `full_name` (e.g. a LinkedIn headline), and their employer by `domain` or
/// `company`.
#[derive(Debug, Deserialize)]
pub struct FindRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FindResponse {
    pub domain: Option<String>,
    pub result: Option<FoundEmail>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// GET /api/v1/email-finder/domain?company=
pub async fn handle_find_domain(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<DomainQuery>,
) -> Result<Json<DomainResponse>, AppError> {
    let company = non_empty(&query.company)
        .ok_or_else(|| AppError::Validation("company is required".to_string()))?;
    let domain = state.resolver.find_company_domain(company).await?;
    Ok(Json(DomainResponse {
        company: company.to_string(),
        domain,
    }))
}

/// GET /api/v1/email-finder/pattern/:domain
pub async fn handle_get_pattern(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(domain): Path<String>,
) -> Result<Json<PatternResponse>, AppError> {
    let domain = normalize_domain(&domain)
        .ok_or_else(|| AppError::Validation(format!("Invalid domain: {domain}")))?;
    let pattern = state.resolver.get_pattern(&domain).await?;
    Ok(Json(PatternResponse { domain, pattern }))
}

/// POST /api/v1/email-finder/generate
///
/// Pure formatting; `email` is null when the names are rejected.
pub async fn handle_generate(
    _user: AuthUser,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let (Some(first), Some(last), Some(pattern), Some(domain)) = (
        non_empty(&req.first_name),
        non_empty(&req.last_name),
        non_empty(&req.pattern),
        non_empty(&req.domain),
    ) else {
        return Err(AppError::Validation(
            "first_name, last_name, pattern and domain are required".to_string(),
        ));
    };
    let domain = normalize_domain(domain)
        .ok_or_else(|| AppError::Validation(format!("Invalid domain: {domain}")))?;
    Ok(Json(GenerateResponse {
        email: generate_email(first, last, pattern, &domain),
    }))
}

/// POST /api/v1/email-finder/find
pub async fn handle_find_email(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<FindRequest>,
) -> Result<Json<FindResponse>, AppError> {
    let (first, last) = match (non_empty(&req.first_name), non_empty(&req.last_name)) {
        (Some(first), Some(last)) => (first.to_string(), last.to_string()),
        _ => {
            let full_name = non_empty(&req.full_name).ok_or_else(|| {
                AppError::Validation("first_name and last_name, or full_name, are required".to_string())
            })?;
            split_full_name(&clean_name(full_name)).ok_or_else(|| {
                AppError::Validation(format!("Could not split name: {full_name}"))
            })?
        }
    };

    let domain = match (non_empty(&req.domain), non_empty(&req.company)) {
        (Some(domain), _) => normalize_domain(domain),
        (None, Some(company)) => state.resolver.find_company_domain(company).await?,
        (None, None) => {
            return Err(AppError::Validation(
                "domain or company is required".to_string(),
            ))
        }
    };
    let Some(domain) = domain else {
        return Ok(Json(FindResponse {
            domain: None,
            result: None,
        }));
    };

    let result = state.resolver.find_email(&first, &last, &domain).await?;
    Ok(Json(FindResponse {
        domain: Some(domain),
        result,
    }))
}
