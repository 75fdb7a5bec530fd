//! Shared library for Mood Journal Lambda functions.
//!
//! This crate provides the mood analysis pipeline along with the storage, configuration,
//! and HTTP utilities used by the Lambda functions.

pub mod analysis;
pub mod config;
pub mod db;
pub mod error;
pub mod gemini;
pub mod http;
pub mod models;
pub mod prompt;
pub mod secrets;
pub mod store;

pub use analysis::{AnalysisConfig, AnalysisResult, FailureKind, MoodAnalysisService};
pub use config::Config;
pub use error::{Error, Result};
pub use gemini::{GeminiClient, GenerationProvider, GenerationRequest, ProviderError};
pub use models::{CreateMoodRequest, Mood, MoodEntry, MoodResponse, UpdateMoodRequest};
pub use secrets::{get_api_key, get_database_credentials, get_secret, DatabaseCredentials};
pub use store::MoodStore;
