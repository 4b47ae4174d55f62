//! Rewrites a CV for a target role.

use crate::cv::models::ParsedCv;
use crate::cv::prompts::{OPTIMIZE_PROMPT_TEMPLATE, OPTIMIZE_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::prompts::FIDELITY_INSTRUCTION;
use crate::llm_client::{LlmClient, Prompt};

pub fn build_optimize_prompt(
    cv: &ParsedCv,
    target_role: &str,
    job_description: Option<&str>,
) -> Result<String, AppError> {
    let cv_json = serde_json::to_string_pretty(cv)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("CV serialization failed: {e}")))?;
    let job_description = job_description
        .map(str::trim)
        .filter(|jd| !jd.is_empty())
        .map(|jd| format!("JOB DESCRIPTION:\n{jd}"))
        .unwrap_or_default();

    Ok(OPTIMIZE_PROMPT_TEMPLATE
        .replace("{target_role}", target_role.trim())
        .replace("{job_description}", &job_description)
        .replace("{fidelity}", FIDELITY_INSTRUCTION)
        .replace("{cv_json}", &cv_json))
}

/// The candidate's contact block is never the model's to change.
pub async fn optimize_cv(
    cv: &ParsedCv,
    target_role: &str,
    job_description: Option<&str>,
    llm: &LlmClient,
) -> Result<ParsedCv, AppError> {
    let prompt = build_optimize_prompt(cv, target_role, job_description)?;
    let mut optimized: ParsedCv = llm
        .call_json(Prompt::Text(prompt), OPTIMIZE_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("CV optimization failed: {e}")))?;

    let title = optimized.contact.title.take();
    optimized.contact = cv.contact.clone();
    if title.is_some() {
        optimized.contact.title = title;
    }
    Ok(optimized.with_required_fields())
}
