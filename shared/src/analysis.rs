//! Mood analysis: window selection, one provider round trip, outcome mapping.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::gemini::{GenerationProvider, GenerationRequest, ProviderError};
use crate::models::MoodEntry;
use crate::prompt::{build_prompt, select_window};

/// Message returned when the window holds no entries.
pub const NO_DATA_MESSAGE: &str = "No moods to analyze yet. Start tracking your moods!";

const AUTH_INVALID_MESSAGE: &str = "Invalid Gemini API key. Check your .env file.";
const RATE_LIMITED_MESSAGE: &str = "Too many requests. Wait a minute and try again.";
const SAFETY_BLOCKED_MESSAGE: &str = "Content blocked by safety filters. Try different mood notes.";

/// Model and generation settings, fixed when the service is built.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub model_id: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model_id: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: 500,
            top_p: 0.95,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Machine-readable reason an analysis did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoData,
    AuthInvalid,
    RateLimited,
    SafetyBlocked,
    ProviderError,
}

/// Outcome of a single analysis request.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Success {
        analysis_text: String,
        entries_analyzed: usize,
        model_id: String,
    },
    NoData {
        message: String,
    },
    ProviderError {
        kind: FailureKind,
        message: String,
    },
}

impl AnalysisResult {
    fn no_data() -> Self {
        AnalysisResult::NoData {
            message: NO_DATA_MESSAGE.to_string(),
        }
    }

    /// Map a classified provider failure to its user-facing message.
    fn from_provider_error(error: ProviderError) -> Self {
        let (kind, message) = match error {
            ProviderError::AuthInvalid => (FailureKind::AuthInvalid, AUTH_INVALID_MESSAGE.to_string()),
            ProviderError::RateLimited => (FailureKind::RateLimited, RATE_LIMITED_MESSAGE.to_string()),
            ProviderError::SafetyBlocked => {
                (FailureKind::SafetyBlocked, SAFETY_BLOCKED_MESSAGE.to_string())
            }
            ProviderError::Other(raw) => {
                (FailureKind::ProviderError, format!("AI analysis failed: {}", raw))
            }
        };
        AnalysisResult::ProviderError { kind, message }
    }

    /// Kind and message for the non-success outcomes.
    #[cfg(test)]
    pub(crate) fn failure(&self) -> Option<(FailureKind, &str)> {
        match self {
            AnalysisResult::Success { .. } => None,
            AnalysisResult::NoData { message } => Some((FailureKind::NoData, message.as_str())),
            AnalysisResult::ProviderError { kind, message } => Some((*kind, message.as_str())),
        }
    }
}

/// Produces wellness reflections over recent mood entries.
pub struct MoodAnalysisService<P> {
    provider: P,
    config: AnalysisConfig,
}

impl<P: GenerationProvider> MoodAnalysisService<P> {
    pub fn new(provider: P, config: AnalysisConfig) -> Self {
        Self { provider, config }
    }

    /// Analyze entries against the current time.
    pub async fn analyze(&self, entries: &[MoodEntry]) -> AnalysisResult {
        self.analyze_at(entries, Utc::now()).await
    }

    /// Analyze entries against an explicit reference time.
    pub async fn analyze_at(&self, entries: &[MoodEntry], now: DateTime<Utc>) -> AnalysisResult {
        let lines = select_window(entries, now);

        info!(
            "Analyzing moods: {} entries supplied, {} in window",
            entries.len(),
            lines.len()
        );

        if lines.is_empty() {
            return AnalysisResult::no_data();
        }

        let request = GenerationRequest {
            prompt: build_prompt(&lines),
            model_id: self.config.model_id.clone(),
            temperature: self.config.temperature,
            max_output_tokens: self.config.max_output_tokens,
            top_p: self.config.top_p,
        };

        match self.provider.generate(&request).await {
            Ok(analysis_text) => AnalysisResult::Success {
                analysis_text,
                entries_analyzed: lines.len(),
                model_id: request.model_id,
            },
            Err(error) => {
                warn!("Mood analysis provider call failed: {:?}", error);
                AnalysisResult::from_provider_error(error)
            }
        }
    }
}
