//! Turns an uploaded CV file into a [`ParsedCv`].
//!
//! PDFs are text-extracted locally first; scanned or otherwise unextractable
//! PDFs are handed to the model as an inline document instead.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::cv::models::ParsedCv;
use crate::cv::prompts::{CV_PARSE_PROMPT, CV_PARSE_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::{LlmClient, Prompt, PromptPart};

/// Below this many characters, extracted PDF text is treated as a failed extraction.
const MIN_EXTRACTED_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvFormat {
    Pdf,
    Text,
}

impl CvFormat {
    /// Detects the format from the declared content type, then the file extension.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
        let file_name = file_name.unwrap_or_default().to_ascii_lowercase();
        if content_type == "application/pdf" || file_name.ends_with(".pdf") {
            Some(CvFormat::Pdf)
        } else if content_type.starts_with("text/")
            || file_name.ends_with(".txt")
            || file_name.ends_with(".md")
        {
            Some(CvFormat::Text)
        } else {
            None
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            CvFormat::Pdf => "application/pdf",
            CvFormat::Text => "text/plain",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CvUpload {
    pub file_name: String,
    pub format: CvFormat,
    pub data: Bytes,
}

async fn extract_pdf_text(data: Bytes) -> Option<String> {
    let result = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data)).await;
    match result {
        Ok(Ok(text)) if text.trim().chars().count() >= MIN_EXTRACTED_CHARS => Some(text),
        Ok(Ok(_)) => {
            debug!("PDF has no extractable text layer");
            None
        }
        Ok(Err(e)) => {
            warn!("PDF text extraction failed: {e}");
            None
        }
        Err(e) => {
            warn!("PDF text extraction aborted: {e}");
            None
        }
    }
}

async fn build_prompt(upload: &CvUpload) -> Result<Prompt, AppError> {
    match upload.format {
        CvFormat::Text => {
            let text = std::str::from_utf8(&upload.data)
                .map_err(|_| AppError::Validation("Text CV must be UTF-8".to_string()))?;
            if text.trim().is_empty() {
                return Err(AppError::Validation("Uploaded CV is empty".to_string()));
            }
            Ok(Prompt::Text(format!("{CV_PARSE_PROMPT}{text}")))
        }
        CvFormat::Pdf => match extract_pdf_text(upload.data.clone()).await {
            Some(text) => Ok(Prompt::Text(format!("{CV_PARSE_PROMPT}{text}"))),
            None => Ok(Prompt::Parts(vec![
                PromptPart::Text {
                    text: CV_PARSE_PROMPT.to_string(),
                },
                PromptPart::InlineData {
                    mime_type: CvFormat::Pdf.content_type().to_string(),
                    data: BASE64.encode(&upload.data),
                },
            ])),
        },
    }
}

pub async fn parse_cv(upload: &CvUpload, llm: &LlmClient) -> Result<ParsedCv, AppError> {
    if upload.data.is_empty() {
        return Err(AppError::Validation("Uploaded CV is empty".to_string()));
    }
    let prompt = build_prompt(upload).await?;
    let parsed: ParsedCv = llm
        .call_json(prompt, CV_PARSE_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("CV parsing failed: {e}")))?;
    Ok(parsed.with_required_fields())
}
