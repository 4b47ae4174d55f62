//! Match Scoring: pluggable, trait-based scorer that measures a CV against a parsed JD.
//!
//! `AppState` holds an `Arc<dyn MatchScorer>`; the default `KeywordMatchScorer`
//! is pure Rust, deterministic and makes no model call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cv::jd_parser::ParsedJD;
use crate::cv::models::ParsedCv;
use crate::errors::AppError;

const SKILL_MATCH: f32 = 1.0;
const TEXT_MATCH: f32 = 0.6;
const STRONG_THRESHOLD: f32 = 0.8;
const PARTIAL_THRESHOLD: f32 = 0.4;

/// A JD keyword the CV covers, with where it was found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub keyword: String,
    pub evidence: String,
    pub strength: f32, // 0.0 - 1.0
}

/// A JD keyword not covered by the CV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    pub keyword: String,
    pub jd_frequency: u32,
    /// Closest related skill already on the CV, if any.
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub overall_score: u32,                 // 0 - 100
    pub strong_matches: Vec<KeywordMatch>,  // strength >= 0.8
    pub partial_matches: Vec<KeywordMatch>, // 0.4 - 0.79
    pub gaps: Vec<Gap>,                     // strength < 0.4
    pub recommendation: String,
}

#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(&self, cv: &ParsedCv, parsed_jd: &ParsedJD) -> Result<MatchReport, AppError>;
}

/// Keyword scorer.
///
/// 1. For each keyword in `ParsedJD.keyword_inventory`:
///    - listed skill (case-insensitive) → 1.0
///    - substring of the CV's text → 0.6
///    - otherwise → 0.0
/// 2. overall_score = Σ(strength × weighted_score) / Σ(weighted_score) × 100
/// 3. Classify: strong (≥0.8), partial (0.4–0.79), gap (<0.4)
pub struct KeywordMatchScorer;

#[async_trait]
impl MatchScorer for KeywordMatchScorer {
    async fn score(&self, cv: &ParsedCv, parsed_jd: &ParsedJD) -> Result<MatchReport, AppError> {
        Ok(compute_keyword_match(cv, parsed_jd))
    }
}

fn compute_keyword_match(cv: &ParsedCv, parsed_jd: &ParsedJD) -> MatchReport {
    let keywords = &parsed_jd.keyword_inventory;

    if keywords.is_empty() {
        return MatchReport {
            overall_score: 0,
            strong_matches: vec![],
            partial_matches: vec![],
            gaps: vec![],
            recommendation: "No keywords found in the job description, cannot score the match."
                .to_string(),
        };
    }

    let skills: Vec<String> = cv.skills.iter().map(|s| s.trim().to_lowercase()).collect();
    let text = cv.searchable_text();

    let mut strong_matches = Vec::new();
    let mut partial_matches = Vec::new();
    let mut gaps = Vec::new();

    let mut total_weighted = 0.0_f32;
    let mut total_score = 0.0_f32;

    for kw_entry in keywords {
        let keyword_lower = kw_entry.keyword.to_lowercase();
        total_weighted += kw_entry.weighted_score;

        let (strength, evidence) = if skills.iter().any(|s| *s == keyword_lower) {
            (SKILL_MATCH, "skills".to_string())
        } else if text.contains(&keyword_lower) {
            (TEXT_MATCH, locate_in_experience(cv, &keyword_lower))
        } else {
            (0.0, String::new())
        };

        total_score += strength * kw_entry.weighted_score;

        let keyword_match = KeywordMatch {
            keyword: kw_entry.keyword.clone(),
            evidence,
            strength,
        };

        if strength >= STRONG_THRESHOLD {
            strong_matches.push(keyword_match);
        } else if strength >= PARTIAL_THRESHOLD {
            partial_matches.push(keyword_match);
        } else {
            gaps.push(Gap {
                keyword: kw_entry.keyword.clone(),
                jd_frequency: kw_entry.frequency,
                suggestion: find_related_skill(cv, &keyword_lower),
            });
        }
    }

    let overall_score = if total_weighted > 0.0 {
        ((total_score / total_weighted) * 100.0).round().clamp(0.0, 100.0) as u32
    } else {
        0
    };

    let recommendation = build_recommendation(overall_score, &gaps);

    MatchReport {
        overall_score,
        strong_matches,
        partial_matches,
        gaps,
        recommendation,
    }
}

/// Names the role that mentions the keyword, falling back to the CV as a whole.
fn locate_in_experience(cv: &ParsedCv, keyword: &str) -> String {
    cv.experience
        .iter()
        .find(|e| e.description.to_lowercase().contains(keyword) || e.role.to_lowercase().contains(keyword))
        .map(|e| format!("{} at {}", e.role, e.company))
        .unwrap_or_else(|| "cv text".to_string())
}

fn find_related_skill(cv: &ParsedCv, keyword: &str) -> Option<String> {
    cv.skills
        .iter()
        .find(|skill| {
            let skill = skill.to_lowercase();
            !skill.is_empty() && (skill.contains(keyword) || keyword.contains(&skill))
        })
        .cloned()
}

/// Builds a human-readable recommendation string from score and gaps.
fn build_recommendation(score: u32, gaps: &[Gap]) -> String {
    let top_gaps: Vec<&str> = gaps.iter().take(3).map(|g| g.keyword.as_str()).collect();

    if score >= 80 {
        "Strong match. Your CV directly covers the key requirements.".to_string()
    } else if score >= 60 {
        format!(
            "Moderate match ({score}/100). Consider highlighting: {}.",
            top_gaps.join(", ")
        )
    } else {
        format!(
            "Low match ({score}/100). Significant gaps: {}. Optimize your CV for this role before applying.",
            top_gaps.join(", ")
        )
    }
}
