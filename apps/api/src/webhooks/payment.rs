//! Gumroad sale ping → credits.
//!
//! received → validated → credited → acknowledged, or received → rejected.
//! Rejected events still answer 200 so Gumroad stops redelivering them; only
//! internal failures answer 500.

use axum::{extract::State, Form, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::credits::products::find_product;
use crate::errors::AppError;
use crate::models::license::ProcessedSale;
use crate::state::AppState;

/// Subset of the form fields Gumroad posts for a sale.
#[derive(Debug, Default, Deserialize)]
pub struct SalePing {
    #[serde(default)]
    pub custom_user_id: Option<String>,
    /// Gumroad forwards checkout URL parameters under this key.
    #[serde(default, rename = "url_params[custom_user_id]")]
    pub url_custom_user_id: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub sale_id: Option<String>,
}

impl SalePing {
    fn user_id(&self) -> Option<&str> {
        [&self.custom_user_id, &self.url_custom_user_id]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WebhookOutcome {
    #[serde(rename_all = "camelCase")]
    Credited {
        credits_added: i32,
        new_balance: i32,
    },
    Ignored {
        reason: &'static str,
    },
}

/// POST /api/v1/webhooks/gumroad
pub async fn handle_sale_ping(
    State(state): State<AppState>,
    Form(ping): Form<SalePing>,
) -> Result<Json<WebhookOutcome>, AppError> {
    let Some(user_id) = ping.user_id() else {
        warn!(
            "Gumroad ping without custom_user_id (buyer {:?}), ignoring",
            ping.email
        );
        return Ok(Json(WebhookOutcome::Ignored {
            reason: "missing_user_id",
        }));
    };

    let Some(product) = ping.permalink.as_deref().and_then(find_product) else {
        warn!(
            "Gumroad ping for unrecognized product {:?} (user {user_id}), ignoring",
            ping.permalink
        );
        return Ok(Json(WebhookOutcome::Ignored {
            reason: "unknown_product",
        }));
    };

    let sale_id = ping
        .sale_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if let Some(sale_id) = sale_id {
        let first_delivery = state
            .licenses
            .record_sale(&ProcessedSale {
                sale_id: sale_id.to_string(),
                user_id: user_id.to_string(),
                permalink: product.permalink.to_string(),
            })
            .await?;
        if !first_delivery {
            info!("Gumroad sale {sale_id} already credited, ignoring replay");
            return Ok(Json(WebhookOutcome::Ignored {
                reason: "duplicate_sale",
            }));
        }
    }

    let new_balance = match state.ledger.grant(user_id, product.credits, true).await {
        Ok(balance) => balance,
        Err(e) => {
            if let Some(sale_id) = sale_id {
                if let Err(release_err) = state.licenses.release_sale(sale_id).await {
                    error!("Failed to release sale {sale_id} after grant failure: {release_err}");
                }
            }
            return Err(e.into());
        }
    };

    info!(
        "Gumroad sale credited: {} credits ({}) to {user_id}, balance {new_balance}",
        product.credits, product.permalink
    );

    Ok(Json(WebhookOutcome::Credited {
        credits_added: product.credits,
        new_balance,
    }))
}
