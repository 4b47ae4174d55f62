use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::llm_client::{ModelRequest, Prompt, PromptPart};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub text: String,
}

fn is_blank(prompt: &Prompt) -> bool {
    match prompt {
        Prompt::Text(text) => text.trim().is_empty(),
        Prompt::Parts(parts) => parts.iter().all(|part| match part {
            PromptPart::Text { text } => text.trim().is_empty(),
            PromptPart::InlineData { data, .. } => data.is_empty(),
        }),
    }
}

/// POST /api/v1/ai/generate
///
/// Thin pass-through to the model: the raw reply text is returned as-is
/// (fences stripped for the `json` hint) and never retried.
///
/// Not metered here. Paid client features call `/api/v1/credits/deduct`
/// before using the gateway; `/cv/match` and `/cv/optimize` charge on the
/// server instead.
pub async fn handle_generate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ModelRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    if is_blank(&req.prompt) {
        return Err(AppError::Validation("prompt is required".to_string()));
    }
    let text = state.llm.call_model(&req).await?;
    info!(
        "AI gateway call for {} ({:?}, {} chars)",
        user.user_id,
        req.response_format,
        text.len()
    );
    Ok(Json(GenerateResponse { text }))
}
