//! Gemini `generateContent` backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;
use crate::forecaster::Forecaster;
use crate::types::{ForecastError, ForecastRequest, ForecastResult};

/// Generates forecasts by prompting a Gemini model over REST.
pub struct GeminiForecaster {
    model: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    timeout_ms: u64,
}

impl GeminiForecaster {
    pub fn new(config: ForecastConfig) -> ForecastResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ForecastError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            model: config.model,
            api_key: config.api_key,
            base_url: config.base_url,
            client,
            timeout_ms: config.timeout.as_millis() as u64,
        })
    }

    fn endpoint(&self) -> String {
        let model = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        format!("{}/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl Forecaster for GeminiForecaster {
    fn id(&self) -> &str {
        "gemini"
    }

    async fn forecast(&self, request: &ForecastRequest) -> ForecastResult<String> {
        let prompt = request.prompt();
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        tracing::debug!(
            model = %self.model,
            city = %request.city,
            days = request.days(),
            "Requesting forecast"
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ForecastError::Timeout(self.timeout_ms)
                } else if e.is_connect() {
                    ForecastError::Request(format!(
                        "could not reach Gemini at {}: {e}",
                        self.base_url
                    ))
                } else {
                    ForecastError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ForecastError::Auth(
                "Gemini rejected the API key. Check GOOGLE_API_KEY".to_string(),
            ));
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            ForecastError::InvalidResponse(format!("failed to parse Gemini response JSON: {e}"))
        })?;

        if !status.is_success() {
            return Err(ForecastError::Request(format!(
                "Gemini API returned {status}: {payload}"
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_value(payload)
            .map_err(|e| ForecastError::InvalidResponse(e.to_string()))?;

        first_candidate_text(parsed)
    }
}

/// Concatenate the text parts of the first candidate.
fn first_candidate_text(response: GenerateContentResponse) -> ForecastResult<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ForecastError::NoCandidates)?;

    Ok(candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default())
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn config(model: &str) -> ForecastConfig {
        ForecastConfig {
            api_key: "test-key".to_string(),
            model: model.to_string(),
            base_url: "http://localhost:9/v1beta".to_string(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_endpoint_prefixes_model() {
        let forecaster = GeminiForecaster::new(config("gemini-2.0-flash")).unwrap();
        assert_eq!(
            forecaster.endpoint(),
            "http://localhost:9/v1beta/models/gemini-2.0-flash:generateContent"
        );

        let forecaster = GeminiForecaster::new(config("models/custom")).unwrap();
        assert_eq!(
            forecaster.endpoint(),
            "http://localhost:9/v1beta/models/custom:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hello" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "contents": [{ "parts": [{ "text": "hello" }] }] })
        );
    }

    #[test]
    fn test_first_candidate_parts_concatenated() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "2025-05-02: 18°C, " }, { "text": "sunny" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(
            first_candidate_text(response).unwrap(),
            "2025-05-02: 18°C, sunny"
        );
    }

    #[test]
    fn test_no_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert!(matches!(
            first_candidate_text(response),
            Err(ForecastError::NoCandidates)
        ));

        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            first_candidate_text(response),
            Err(ForecastError::NoCandidates)
        ));
    }
}
