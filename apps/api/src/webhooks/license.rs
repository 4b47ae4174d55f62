//! One-time license key redemption.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::credits::products::{Product, PRODUCTS};
use crate::errors::AppError;
use crate::models::license::UsedLicense;
use crate::state::AppState;
use crate::webhooks::gumroad::LicenseCheckError;

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    #[serde(default)]
    pub license_key: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    pub success: bool,
    pub credits_added: i32,
    pub new_balance: i32,
    pub product: &'static str,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// Finds the product the key belongs to. Errors only surface when no
/// product could be checked at all.
async fn identify_product(
    state: &AppState,
    license_key: &str,
) -> Result<Option<&'static Product>, AppError> {
    let mut last_error: Option<LicenseCheckError> = None;
    let mut checked = 0;

    for product in PRODUCTS {
        match state.license_verifier.verify(product, license_key).await {
            Ok(true) => return Ok(Some(product)),
            Ok(false) => checked += 1,
            Err(e) => {
                warn!("License check against {} failed: {e}", product.permalink);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if checked == 0 => Err(e.into()),
        _ => Ok(None),
    }
}

/// POST /api/v1/licenses/redeem
pub async fn handle_redeem(
    State(state): State<AppState>,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>, AppError> {
    let license_key = required(&req.license_key, "license_key")?;
    let user_id = required(&req.user_id, "user_id")?;

    if state.licenses.find_license(license_key).await?.is_some() {
        return Err(AppError::Validation(
            "This license key has already been used".to_string(),
        ));
    }

    let product = identify_product(&state, license_key)
        .await?
        .ok_or_else(|| AppError::Validation("Invalid or unrecognized license key".to_string()))?;

    let recorded = state
        .licenses
        .record_license(&UsedLicense {
            license_key: license_key.to_string(),
            user_id: user_id.to_string(),
            product_permalink: product.permalink.to_string(),
        })
        .await?;
    if !recorded {
        // Lost a race with a concurrent redemption of the same key.
        return Err(AppError::Validation(
            "This license key has already been used".to_string(),
        ));
    }

    let new_balance = match state.ledger.grant(user_id, product.credits, true).await {
        Ok(balance) => balance,
        Err(e) => {
            if let Err(release_err) = state.licenses.release_license(license_key).await {
                error!("Failed to release license {license_key} after grant failure: {release_err}");
            }
            return Err(e.into());
        }
    };
    info!(
        "License redeemed: {} credits ({}) to {user_id}",
        product.credits, product.permalink
    );

    Ok(Json(RedeemResponse {
        success: true,
        credits_added: product.credits,
        new_balance,
        product: product.permalink,
    }))
}
