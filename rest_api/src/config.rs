// rest_api/src/config.rs

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default REST API port when none is configured.
pub const DEFAULT_REST_API_PORT: u16 = 8082;

/// Default local inference endpoint (Ollama generate API).
pub const DEFAULT_CLASSIFIER_URL: &str = "http://localhost:11434/api/generate";

/// Default local model used for triage classification.
pub const DEFAULT_CLASSIFIER_MODEL: &str = "alibayram/medgemma";

const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 60;

/// Configuration for the REST API server itself.
#[derive(Debug, Clone)]
pub struct RestApiConfig {
    pub host: String,
    pub port: u16,
}

/// Loads the REST API configuration from the environment, falling back to
/// defaults when a variable is absent.
pub fn load_rest_api_config() -> Result<RestApiConfig> {
    let host = env::var("TRIAGE_REST_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = match env::var("TRIAGE_REST_PORT") {
        Ok(raw) => raw
            .parse::<u16>()
            .with_context(|| format!("invalid TRIAGE_REST_PORT value '{}'", raw))?,
        Err(_) => DEFAULT_REST_API_PORT,
    };
    Ok(RestApiConfig { host, port })
}

/// Configuration for the external classifier call. The timeout lives here,
/// on the outer call, and never inside the queue.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub url: String,
    pub model: String,
    pub timeout: Duration,
}

pub fn load_classifier_config() -> Result<ClassifierConfig> {
    let url = env::var("TRIAGE_CLASSIFIER_URL")
        .unwrap_or_else(|_| DEFAULT_CLASSIFIER_URL.to_string());
    let model = env::var("TRIAGE_CLASSIFIER_MODEL")
        .unwrap_or_else(|_| DEFAULT_CLASSIFIER_MODEL.to_string());
    let timeout_secs = match env::var("TRIAGE_CLASSIFIER_TIMEOUT_SECS") {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("invalid TRIAGE_CLASSIFIER_TIMEOUT_SECS value '{}'", raw))?,
        Err(_) => DEFAULT_CLASSIFIER_TIMEOUT_SECS,
    };
    Ok(ClassifierConfig {
        url,
        model,
        timeout: Duration::from_secs(timeout_secs),
    })
}
