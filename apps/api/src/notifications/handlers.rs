use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::notifications::templates::{render, EmailTemplate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
}

/// POST /api/v1/notifications/email
pub async fn handle_send_email(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>, AppError> {
    let to = req
        .to
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("to is required".to_string()))?;
    if !to.contains('@') {
        return Err(AppError::Validation(format!("Invalid recipient: {to}")));
    }
    let kind = req
        .kind
        .as_deref()
        .ok_or_else(|| AppError::Validation("type is required".to_string()))?;
    let template = EmailTemplate::parse(kind)
        .ok_or_else(|| AppError::Validation(format!("Unknown email type: {kind}")))?;

    let email = render(template, &req.data, &state.config.app_url);
    state.mailer.send(to, &email).await?;
    tracing::info!("{kind} email requested by {} for {to}", user.user_id);

    Ok(Json(SendEmailResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::testing::{body_json, mint_token, TestApp};

    fn send(body: Value) -> Request<Body> {
        Request::post("/api/v1/notifications/email")
            .header("authorization", format!("Bearer {}", mint_token("user_1", None)))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_sends_match_ready() {
        let app = TestApp::new();
        let response = app
            .router()
            .oneshot(send(json!({
                "to": "ada@example.com",
                "type": "match_ready",
                "data": { "job_title": "Data Engineer", "score": 77 }
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "success": true }));

        let sent = app.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ada@example.com");
        assert!(sent[0].1.html.contains("77/100"));
    }

    #[tokio::test]
    async fn test_unknown_type_is_rejected() {
        let app = TestApp::new();
        let response = app
            .router()
            .oneshot(send(json!({ "to": "ada@example.com", "type": "promo" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(app.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_recipient_is_rejected() {
        let app = TestApp::new();
        let response = app
            .router()
            .oneshot(send(json!({ "type": "welcome" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_requires_auth() {
        let app = TestApp::new();
        let response = app
            .router()
            .oneshot(
                Request::post("/api/v1/notifications/email")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({ "to": "a@b.c", "type": "welcome" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
