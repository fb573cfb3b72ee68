//! Forecast backend configuration.

use std::time::Duration;

use crate::types::{ForecastError, ForecastResult};

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const MODEL_ENV: &str = "GEMINI_MODEL";
pub const BASE_URL_ENV: &str = "GEMINI_BASE_URL";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for the Gemini forecast backend.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ForecastConfig {
    /// Resolve configuration from explicit values and the process environment.
    ///
    /// Explicit values win over environment variables.
    pub fn resolve(
        api_key: Option<&str>,
        model: Option<&str>,
        timeout: Duration,
    ) -> ForecastResult<Self> {
        Self::resolve_with(api_key, model, timeout, |name| std::env::var(name).ok())
    }

    /// Same as [`ForecastConfig::resolve`] with a custom variable lookup.
    pub fn resolve_with(
        api_key: Option<&str>,
        model: Option<&str>,
        timeout: Duration,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ForecastResult<Self> {
        let api_key = api_key
            .map(str::to_string)
            .or_else(|| lookup(API_KEY_ENV))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ForecastError::MissingApiKey)?;

        let model = model
            .map(str::to_string)
            .or_else(|| lookup(MODEL_ENV))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = lookup(BASE_URL_ENV)
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        if timeout.is_zero() {
            return Err(ForecastError::Config(
                "forecast timeout must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            model,
            base_url,
            timeout,
        })
    }
}
