//! LLM Client: the AI gateway. Every model call in the service goes through here.
//!
//! A request names a model (checked against an allow-list), a prompt that is
//! either plain text or a list of parts carrying inline base64 files, and a
//! response-format hint. Calls are made exactly once: there is no retry and
//! no repair of malformed JSON, callers see the parse error.
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

pub mod handlers;
pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Default model when a request does not name one.
pub const MODEL: &str = "claude-sonnet-4-5";
/// Models callers may select.
pub const ALLOWED_MODELS: &[&str] = &["claude-sonnet-4-5", "claude-haiku-4-5", "claude-opus-4-1"];
const MAX_TOKENS: u32 = 8192;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Invalid inline data: {0}")]
    InvalidInlineData(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// One piece of a multi-part prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptPart {
    Text { text: String },
    /// `data` is base64-encoded file content.
    InlineData { mime_type: String, data: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    Text(String),
    Parts(Vec<PromptPart>),
}

/// Gateway payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub prompt: Prompt,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl ModelRequest {
    pub fn json(prompt: Prompt, system: &str) -> Self {
        Self {
            model: None,
            prompt,
            system: Some(system.to_string()),
            response_format: ResponseFormat::Json,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Concatenates all text blocks.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, ANTHROPIC_API_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()?,
            api_key,
            base_url,
        })
    }

    /// Sends one request and returns the raw model text.
    pub async fn call_model(&self, request: &ModelRequest) -> Result<String, LlmError> {
        let model = resolve_model(request.model.as_deref())?;
        let content = build_content(&request.prompt)?;

        let mut system = request.system.clone().unwrap_or_default();
        if request.response_format == ResponseFormat::Json {
            if !system.is_empty() {
                system.push_str("\n\n");
            }
            system.push_str(prompts::JSON_ONLY_SYSTEM);
        }

        let mut body = json!({
            "model": model,
            "max_tokens": MAX_TOKENS,
            "messages": [{ "role": "user", "content": content }],
        });
        if !system.is_empty() {
            body["system"] = Value::String(system);
        }

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;
        debug!(
            "LLM call succeeded: model={model}, input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        let text = llm_response.text().ok_or(LlmError::EmptyContent)?;
        Ok(match request.response_format {
            ResponseFormat::Json => strip_json_fences(&text).to_string(),
            ResponseFormat::Text => text,
        })
    }

    /// Calls the model with the JSON hint and deserializes the reply.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: Prompt,
        system: &str,
    ) -> Result<T, LlmError> {
        let text = self.call_model(&ModelRequest::json(prompt, system)).await?;
        serde_json::from_str(&text).map_err(LlmError::Parse)
    }
}

fn resolve_model(requested: Option<&str>) -> Result<&'static str, LlmError> {
    match requested.map(str::trim).filter(|m| !m.is_empty()) {
        None => Ok(MODEL),
        Some(m) => ALLOWED_MODELS
            .iter()
            .copied()
            .find(|allowed| *allowed == m)
            .ok_or_else(|| LlmError::UnsupportedModel(m.to_string())),
    }
}

/// Maps a prompt onto Anthropic content blocks.
fn build_content(prompt: &Prompt) -> Result<Value, LlmError> {
    let parts = match prompt {
        Prompt::Text(text) => return Ok(Value::String(text.clone())),
        Prompt::Parts(parts) => parts,
    };

    let blocks = parts
        .iter()
        .map(|part| match part {
            PromptPart::Text { text } => Ok(json!({ "type": "text", "text": text })),
            PromptPart::InlineData { mime_type, data } => inline_block(mime_type, data),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(blocks))
}

fn inline_block(mime_type: &str, data: &str) -> Result<Value, LlmError> {
    let mime = mime_type.trim().to_ascii_lowercase();
    if mime == "application/pdf" {
        Ok(json!({
            "type": "document",
            "source": { "type": "base64", "media_type": mime, "data": data }
        }))
    } else if mime.starts_with("image/") {
        Ok(json!({
            "type": "image",
            "source": { "type": "base64", "media_type": mime, "data": data }
        }))
    } else if mime.starts_with("text/") {
        let bytes = BASE64
            .decode(data)
            .map_err(|e| LlmError::InvalidInlineData(e.to_string()))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| LlmError::InvalidInlineData("text is not valid UTF-8".to_string()))?;
        Ok(json!({ "type": "text", "text": text }))
    } else {
        Err(LlmError::InvalidInlineData(format!(
            "unsupported mime type '{mime_type}'"
        )))
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn anthropic_reply(text: &str) -> Value {
        json!({
            "content": [{ "type": "text", "text": text }],
            "usage": { "input_tokens": 10, "output_tokens": 5 }
        })
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_resolve_model_defaults_and_allow_list() {
        assert_eq!(resolve_model(None).unwrap(), MODEL);
        assert_eq!(resolve_model(Some("  ")).unwrap(), MODEL);
        assert_eq!(resolve_model(Some("claude-haiku-4-5")).unwrap(), "claude-haiku-4-5");
        assert!(matches!(
            resolve_model(Some("gpt-4o")),
            Err(LlmError::UnsupportedModel(_))
        ));
    }

    #[test]
    fn test_prompt_deserializes_from_string_or_parts() {
        let plain: Prompt = serde_json::from_str(r#""hello""#).unwrap();
        assert_eq!(plain, Prompt::Text("hello".to_string()));

        let parts: Prompt = serde_json::from_str(
            r#"[{"type":"text","text":"Parse this"},{"type":"inline_data","mime_type":"application/pdf","data":"JVBERi0="}]"#,
        )
        .unwrap();
        match parts {
            Prompt::Parts(p) => assert_eq!(p.len(), 2),
            other => panic!("expected parts, got {other:?}"),
        }
    }

    #[test]
    fn test_build_content_maps_inline_files() {
        let prompt = Prompt::Parts(vec![
            PromptPart::InlineData {
                mime_type: "application/pdf".to_string(),
                data: "JVBERi0=".to_string(),
            },
            PromptPart::InlineData {
                mime_type: "text/plain".to_string(),
                data: BASE64.encode("Jane Doe"),
            },
            PromptPart::Text {
                text: "Extract the CV".to_string(),
            },
        ]);
        let content = build_content(&prompt).unwrap();
        assert_eq!(content[0]["type"], "document");
        assert_eq!(content[0]["source"]["media_type"], "application/pdf");
        assert_eq!(content[1]["type"], "text");
        assert_eq!(content[1]["text"], "Jane Doe");
        assert_eq!(content[2]["text"], "Extract the CV");
    }

    #[test]
    fn test_build_content_rejects_unknown_mime() {
        let prompt = Prompt::Parts(vec![PromptPart::InlineData {
            mime_type: "application/zip".to_string(),
            data: "AAAA".to_string(),
        }]);
        assert!(matches!(
            build_content(&prompt),
            Err(LlmError::InvalidInlineData(_))
        ));
    }

    #[tokio::test]
    async fn test_call_model_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_reply("Hi there")))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::with_base_url("test-key".to_string(), server.uri()).unwrap();
        let request = ModelRequest {
            model: None,
            prompt: Prompt::Text("Say hi".to_string()),
            system: None,
            response_format: ResponseFormat::Text,
        };
        assert_eq!(client.call_model(&request).await.unwrap(), "Hi there");
    }

    #[tokio::test]
    async fn test_call_json_strips_fences_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(anthropic_reply("```json\n{\"score\": 42}\n```")),
            )
            .mount(&server)
            .await;

        let client = LlmClient::with_base_url("k".to_string(), server.uri()).unwrap();
        let value: Value = client
            .call_json(Prompt::Text("score".to_string()), "You score things.")
            .await
            .unwrap();
        assert_eq!(value["score"], 42);
    }

    #[tokio::test]
    async fn test_malformed_json_surfaces_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_reply("not json")))
            .mount(&server)
            .await;

        let client = LlmClient::with_base_url("k".to_string(), server.uri()).unwrap();
        let result: Result<Value, _> = client
            .call_json(Prompt::Text("x".to_string()), "sys")
            .await;
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    #[tokio::test]
    async fn test_api_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_json(json!({
                "type": "error",
                "error": { "type": "overloaded_error", "message": "Overloaded" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::with_base_url("k".to_string(), server.uri()).unwrap();
        let request = ModelRequest::json(Prompt::Text("x".to_string()), "sys");
        match client.call_model(&request).await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 529);
                assert_eq!(message, "Overloaded");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }
}
