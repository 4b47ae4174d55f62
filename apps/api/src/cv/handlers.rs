use std::future::Future;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::auth::AuthUser;
use crate::cv::jd_parser::parse_jd;
use crate::cv::match_scoring::MatchReport;
use crate::cv::models::ParsedCv;
use crate::cv::optimizer::optimize_cv;
use crate::cv::parser::{parse_cv, CvFormat, CvUpload};
use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::state::AppState;

/// Credits charged per metered operation.
pub const OPERATION_COST: i32 = 1;

/// Upper bound for CV uploads.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub cv: ParsedCv,
    #[serde(default)]
    pub job_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub cv: ParsedCv,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub target_role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveResumeRequest {
    #[serde(default)]
    pub content: Value,
}

#[derive(Debug, Serialize)]
pub struct ResumeResponse {
    pub content: Value,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ResumeRow> for ResumeResponse {
    fn from(row: ResumeRow) -> Self {
        Self {
            content: row.content,
            updated_at: row.updated_at,
        }
    }
}

fn required_text<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// Charges [`OPERATION_COST`] credits, runs `work`, and gives the credits
/// back if the work fails.
async fn charged<T>(
    state: &AppState,
    user: &AuthUser,
    work: impl Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    let deduction = state
        .ledger
        .deduct(&user.user_id, OPERATION_COST, user.email.as_deref())
        .await?;

    match work.await {
        Ok(value) => Ok(value),
        Err(e) => {
            if !deduction.bypassed {
                match state.ledger.grant(&user.user_id, OPERATION_COST, false).await {
                    Ok(_) => info!("Refunded {OPERATION_COST} credit to {} after failure", user.user_id),
                    Err(refund_err) => {
                        error!("Refund to {} failed: {refund_err}", user.user_id)
                    }
                }
            }
            Err(e)
        }
    }
}

async fn read_upload(multipart: &mut Multipart) -> Result<CvUpload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("cv").to_string();
        let format = CvFormat::detect(field.content_type(), Some(&file_name)).ok_or_else(|| {
            AppError::Validation("Only PDF and plain-text CVs are supported".to_string())
        })?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        return Ok(CvUpload {
            file_name,
            format,
            data,
        });
    }
    Err(AppError::Validation("file is required".to_string()))
}

/// POST /api/v1/cv/parse (multipart `file`)
pub async fn handle_parse(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ParsedCv>, AppError> {
    let upload = read_upload(&mut multipart).await?;

    if let Some(archive) = &state.uploads {
        if let Err(e) = archive.archive(&user.user_id, &upload).await {
            warn!("Could not archive CV upload for {}: {e}", user.user_id);
        }
    }

    let cv = parse_cv(&upload, &state.llm).await?;
    info!(
        "Parsed CV '{}' for {}: {} roles, {} skills",
        upload.file_name,
        user.user_id,
        cv.experience.len(),
        cv.skills.len()
    );
    Ok(Json(cv))
}

/// POST /api/v1/cv/match
pub async fn handle_match(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchReport>, AppError> {
    let job_description = required_text(&req.job_description, "job_description")?;

    let report = charged(&state, &user, async {
        let parsed_jd = parse_jd(job_description, &state.llm).await?;
        state.match_scorer.score(&req.cv, &parsed_jd).await
    })
    .await?;

    info!("CV match for {}: {}/100", user.user_id, report.overall_score);
    Ok(Json(report))
}

/// POST /api/v1/cv/optimize
pub async fn handle_optimize(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<ParsedCv>, AppError> {
    let target_role = required_text(&req.target_role, "target_role")?;

    let optimized = charged(
        &state,
        &user,
        optimize_cv(&req.cv, target_role, req.job_description.as_deref(), &state.llm),
    )
    .await?;

    info!("Optimized CV for {} targeting '{target_role}'", user.user_id);
    Ok(Json(optimized))
}

/// GET /api/v1/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ResumeResponse>, AppError> {
    let row = state
        .resumes
        .get_resume(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No saved resume".to_string()))?;
    Ok(Json(row.into()))
}

/// PUT /api/v1/resume
pub async fn handle_save_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SaveResumeRequest>,
) -> Result<Json<ResumeResponse>, AppError> {
    if !req.content.is_object() {
        return Err(AppError::Validation(
            "content must be a JSON object".to_string(),
        ));
    }
    let row = state.resumes.save_resume(&user.user_id, &req.content).await?;
    Ok(Json(row.into()))
}
