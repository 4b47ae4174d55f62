//! JD Parser: extracts requirements and a weighted keyword inventory from a raw job description.

use serde::{Deserialize, Serialize};

use crate::cv::prompts::{JD_PARSE_PROMPT_TEMPLATE, JD_PARSE_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::{LlmClient, Prompt};

/// A single requirement extracted from the JD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub text: String,
    #[serde(default)]
    pub is_required: bool,
}

/// A single keyword from the JD, weighted by position and frequency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub keyword: String,
    #[serde(default = "one")]
    pub frequency: u32,
    /// title=1.0, requirements=0.8, responsibilities=0.6, about=0.3
    #[serde(default = "default_position_weight")]
    pub position_weight: f32,
    /// frequency * position_weight
    #[serde(default)]
    pub weighted_score: f32,
}

fn one() -> u32 {
    1
}

fn default_position_weight() -> f32 {
    0.6
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedJD {
    pub job_title: Option<String>,
    pub seniority: Option<String>,
    pub hard_requirements: Vec<Requirement>,
    pub soft_signals: Vec<String>,
    pub keyword_inventory: Vec<KeywordEntry>,
}

impl ParsedJD {
    /// Recomputes `weighted_score` where the model left it out or got it wrong,
    /// and drops blank keywords.
    pub fn normalized(mut self) -> Self {
        self.keyword_inventory.retain(|k| !k.keyword.trim().is_empty());
        for entry in &mut self.keyword_inventory {
            entry.keyword = entry.keyword.trim().to_string();
            entry.position_weight = entry.position_weight.clamp(0.0, 1.0);
            entry.weighted_score = entry.frequency.max(1) as f32 * entry.position_weight;
        }
        self
    }
}

/// Parses a job description using the LLM and returns a structured `ParsedJD`.
pub async fn parse_jd(jd_text: &str, llm: &LlmClient) -> Result<ParsedJD, AppError> {
    let prompt = JD_PARSE_PROMPT_TEMPLATE.replace("{jd_text}", jd_text);
    let parsed: ParsedJD = llm
        .call_json(Prompt::Text(prompt), JD_PARSE_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("JD parsing failed: {e}")))?;
    Ok(parsed.normalized())
}
