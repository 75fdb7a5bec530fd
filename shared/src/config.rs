//! Configuration management for Lambda functions.

use std::env;

use crate::analysis::AnalysisConfig;
use crate::{Error, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database host
    pub db_host: String,
    /// Database port
    pub db_port: u16,
    /// Database name
    pub db_name: String,
    /// ARN of the secret containing database credentials
    pub db_secret_arn: String,
    /// Gemini API key, when provided directly
    pub gemini_api_key: Option<String>,
    /// ARN of the secret holding the Gemini API key
    pub gemini_secret_arn: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let db_port = match env::var("DATABASE_PORT") {
            Ok(port) => port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid DATABASE_PORT: {}", port)))?,
            Err(_) => 5432,
        };

        Ok(Self {
            db_host: required("DATABASE_HOST")?,
            db_port,
            db_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "mood_journal".to_string()),
            db_secret_arn: required("DATABASE_URL_SECRET_ARN")?,
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_secret_arn: non_empty("GEMINI_API_KEY_SECRET_ARN"),
        })
    }
}

impl AnalysisConfig {
    /// Load analysis settings, falling back to the defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(model) = non_empty("GEMINI_MODEL") {
            config.model_id = model;
        }
        if let Some(base_url) = non_empty("GEMINI_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = non_empty("GEMINI_TIMEOUT_SECS") {
            config.timeout_secs = timeout
                .parse()
                .map_err(|_| Error::Config(format!("Invalid GEMINI_TIMEOUT_SECS: {}", timeout)))?;
        }

        Ok(config)
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("{} not set", name)))
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
