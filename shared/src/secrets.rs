//! AWS Secrets Manager integration.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;

use crate::{Config, Error, Result};

/// Cached secrets with lazy initialization.
static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Database credentials from Secrets Manager.
#[derive(Debug, Deserialize)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
}

/// JSON shape accepted for the Gemini key secret.
#[derive(Debug, Deserialize)]
struct ApiKeySecret {
    #[serde(alias = "GEMINI_API_KEY")]
    api_key: String,
}

/// Get a secret value from Secrets Manager with caching.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    // Check cache first
    {
        let cache = get_cache().read().await;
        if let Some(value) = cache.get(secret_arn) {
            return Ok(value.clone());
        }
    }

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
        .to_string();

    {
        let mut cache = get_cache().write().await;
        cache.insert(secret_arn.to_string(), secret_string.clone());
    }

    Ok(secret_string)
}

/// Get database credentials from Secrets Manager.
pub async fn get_database_credentials(
    client: &SecretsClient,
    secret_arn: &str,
) -> Result<DatabaseCredentials> {
    let secret_string = get_secret(client, secret_arn).await?;

    serde_json::from_str(&secret_string)
        .map_err(|e| Error::Aws(format!("Failed to parse database credentials: {}", e)))
}

/// Resolve the Gemini API key, preferring the plain environment value over Secrets Manager.
pub async fn get_api_key(client: &SecretsClient, config: &Config) -> Result<String> {
    if let Some(key) = &config.gemini_api_key {
        return Ok(key.clone());
    }

    let secret_arn = config.gemini_secret_arn.as_deref().ok_or_else(|| {
        Error::Config("GEMINI_API_KEY or GEMINI_API_KEY_SECRET_ARN must be set".to_string())
    })?;

    let secret_string = get_secret(client, secret_arn).await?;
    parse_api_key(&secret_string)
}

/// Accepts either a bare key or a JSON object with an `api_key` field.
fn parse_api_key(secret_string: &str) -> Result<String> {
    let trimmed = secret_string.trim();
    let key = if trimmed.starts_with('{') {
        serde_json::from_str::<ApiKeySecret>(trimmed)
            .map_err(|e| Error::Aws(format!("Failed to parse API key secret: {}", e)))?
            .api_key
    } else {
        trimmed.to_string()
    };

    if key.is_empty() {
        return Err(Error::Config("Gemini API key secret is empty".to_string()));
    }

    Ok(key)
}

/// Clear the secrets cache (useful for testing or credential rotation).
pub async fn clear_cache() {
    let mut cache = get_cache().write().await;
    cache.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credentials() {
        let json = r#"{"username":"admin","password":"secret123","host":"db.example.com","port":5432,"dbname":"mydb"}"#;
        let creds: DatabaseCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password, "secret123");
        assert_eq!(creds.host, Some("db.example.com".to_string()));
    }

    #[test]
    fn test_parse_api_key_plain() {
        assert_eq!(parse_api_key("  AIzaKey123\n").unwrap(), "AIzaKey123");
    }

    #[test]
    fn test_parse_api_key_json() {
        assert_eq!(parse_api_key(r#"{"api_key":"AIzaKey123"}"#).unwrap(), "AIzaKey123");
        assert_eq!(
            parse_api_key(r#"{"GEMINI_API_KEY":"AIzaOther"}"#).unwrap(),
            "AIzaOther"
        );
    }

    #[test]
    fn test_parse_api_key_rejects_empty() {
        assert!(matches!(parse_api_key("   "), Err(Error::Config(_))));
        assert!(matches!(parse_api_key(r#"{"token":"x"}"#), Err(Error::Aws(_))));
    }

    #[tokio::test]
    async fn test_cache_roundtrip() {
        {
            let mut cache = get_cache().write().await;
            cache.insert("arn:test:cached".to_string(), "value".to_string());
        }
        assert_eq!(
            get_cache().read().await.get("arn:test:cached").cloned(),
            Some("value".to_string())
        );
        clear_cache().await;
        assert!(get_cache().read().await.get("arn:test:cached").is_none());
    }
}
