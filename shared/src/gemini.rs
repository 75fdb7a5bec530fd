//! Gemini text-generation client.
//!
//! The adapter turns every failure into a [`ProviderError`] variant, so callers
//! never inspect raw provider error text themselves.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::analysis::AnalysisConfig;

/// Parameters for a single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model_id: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
}

/// Classified provider failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The API key was rejected.
    AuthInvalid,
    /// The provider throttled the request.
    RateLimited,
    /// The prompt or response was blocked by safety filters.
    SafetyBlocked,
    /// Anything else, with the provider's raw message.
    Other(String),
}

impl ProviderError {
    /// Classify raw provider error text. First match wins, in declaration order.
    pub fn classify(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.contains("API_KEY_INVALID") {
            ProviderError::AuthInvalid
        } else if raw.contains("RATE_LIMIT_EXCEEDED") {
            ProviderError::RateLimited
        } else if raw.contains("SAFETY") {
            ProviderError::SafetyBlocked
        } else {
            ProviderError::Other(raw)
        }
    }
}

/// A text-generation backend.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate text for the prompt, returning the model output verbatim.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError>;
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Gemini `generateContent` client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client using the base URL and timeout from the analysis config.
    pub fn new(api_key: String, config: &AnalysisConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model_id)
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
                top_p: request.top_p,
            },
        };

        debug!("Calling Gemini model {}", request.model_id);

        let response = self
            .client
            .post(self.endpoint(&request.model_id))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Other(request_error_message(e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Other(request_error_message(e)))?;

        if !status.is_success() {
            return Err(classify_http_error(status, &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::Other(format!("Invalid Gemini response: {}", e)))?;

        extract_text(parsed)
    }
}

/// Strip the URL (which carries the API key) before surfacing reqwest errors.
fn request_error_message(error: reqwest::Error) -> String {
    if error.is_timeout() {
        "Gemini request timed out".to_string()
    } else {
        error.without_url().to_string()
    }
}

fn classify_http_error(status: StatusCode, body: &str) -> ProviderError {
    match ProviderError::classify(format!("{} {}", status.as_u16(), body)) {
        ProviderError::Other(_) if status == StatusCode::TOO_MANY_REQUESTS => {
            ProviderError::RateLimited
        }
        classified => classified,
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, ProviderError> {
    let blocked = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
        .is_some_and(|reason| reason == "SAFETY");

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(if blocked {
            ProviderError::SafetyBlocked
        } else {
            ProviderError::Other("Gemini response contained no candidates".to_string())
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        if blocked || candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(ProviderError::SafetyBlocked);
        }
        return Err(ProviderError::Other(format!(
            "Gemini response contained no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_classify_priority() {
        assert_eq!(
            ProviderError::classify("API_KEY_INVALID and SAFETY"),
            ProviderError::AuthInvalid
        );
        assert_eq!(
            ProviderError::classify("SAFETY RATE_LIMIT_EXCEEDED"),
            ProviderError::RateLimited
        );
        assert_eq!(
            ProviderError::classify("finish reason SAFETY"),
            ProviderError::SafetyBlocked
        );
        assert_eq!(
            ProviderError::classify("500 internal"),
            ProviderError::Other("500 internal".to_string())
        );
    }

    #[test]
    fn test_http_error_with_reason() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        assert_eq!(
            classify_http_error(StatusCode::BAD_REQUEST, body),
            ProviderError::AuthInvalid
        );
    }

    #[test]
    fn test_http_429_without_reason_is_rate_limited() {
        let body = r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            classify_http_error(StatusCode::TOO_MANY_REQUESTS, body),
            ProviderError::RateLimited
        );
    }

    #[test]
    fn test_http_error_other_keeps_raw_text() {
        assert_eq!(
            classify_http_error(StatusCode::INTERNAL_SERVER_ERROR, "backend unavailable"),
            ProviderError::Other("500 backend unavailable".to_string())
        );
    }

    #[test]
    fn test_extract_text_concatenates_parts() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"Great "},{"text":"week!"}]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(extract_text(response).unwrap(), "Great week!");
    }

    #[test]
    fn test_extract_text_blocked_prompt() {
        let response = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        assert_eq!(extract_text(response), Err(ProviderError::SafetyBlocked));
    }

    #[test]
    fn test_extract_text_safety_finish_reason() {
        let response = parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#);
        assert_eq!(extract_text(response), Err(ProviderError::SafetyBlocked));
    }

    #[test]
    fn test_extract_text_empty() {
        let response = parse(r#"{"candidates":[]}"#);
        assert!(matches!(extract_text(response), Err(ProviderError::Other(_))));
    }

    #[test]
    fn test_request_serialization() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                max_output_tokens: 500,
                top_p: 0.95,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 500);
        assert!(json["generationConfig"]["topP"].is_number());
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new("key".to_string(), &AnalysisConfig::default()).unwrap();
        assert_eq!(
            client.endpoint("gemini-1.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
