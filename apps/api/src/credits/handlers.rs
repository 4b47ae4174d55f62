use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthUser;
use crate::credits::ledger::LedgerError;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub credits: i32,
    pub is_premium: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeductRequest {
    #[serde(default = "default_amount")]
    pub amount: i32,
}

fn default_amount() -> i32 {
    1
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub user_id: String,
    pub amount: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantResponse {
    pub success: bool,
    pub new_balance: i32,
}

/// GET /api/v1/credits
pub async fn handle_get_balance(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<BalanceResponse>, AppError> {
    let profile = state.ledger.profile(&user.user_id).await?;
    Ok(Json(BalanceResponse {
        credits: profile.credits,
        is_premium: profile.is_premium,
    }))
}

/// POST /api/v1/credits/deduct
///
/// Insufficient funds answer 402 with `{success: false, error}` so the client
/// can tell a stale local balance from a server-side rejection.
pub async fn handle_deduct(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<DeductRequest>,
) -> Result<Response, AppError> {
    match state
        .ledger
        .deduct(&user.user_id, req.amount, user.email.as_deref())
        .await
    {
        Ok(deduction) => Ok(Json(DeductResponse {
            success: true,
            new_balance: deduction.new_balance,
            error: None,
        })
        .into_response()),
        Err(e @ (LedgerError::InsufficientFundsLocal | LedgerError::InsufficientFundsServer)) => {
            Ok((
                StatusCode::PAYMENT_REQUIRED,
                Json(DeductResponse {
                    success: false,
                    new_balance: None,
                    error: Some(e.code()),
                }),
            )
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /api/v1/credits/grant
///
/// Manual grants, admin only.
pub async fn handle_grant(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<GrantRequest>,
) -> Result<Json<GrantResponse>, AppError> {
    if !state.ledger.is_admin(user.email.as_deref()) {
        return Err(AppError::Forbidden);
    }
    if req.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id is required".to_string()));
    }

    let new_balance = state.ledger.grant(req.user_id.trim(), req.amount, false).await?;
    info!(
        "Manual grant of {} credits to {} by {}",
        req.amount, req.user_id, user.user_id
    );
    Ok(Json(GrantResponse {
        success: true,
        new_balance,
    }))
}
