//! Core data types for forecast requests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Wire format for calendar dates (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A forecast for one place over an inclusive range of days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub city: String,
    pub country: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ForecastRequest {
    /// Build a request, rejecting ranges that end before they start.
    pub fn new(
        city: impl Into<String>,
        country: impl Into<String>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ForecastResult<Self> {
        if to < from {
            return Err(ForecastError::InvalidRange { from, to });
        }
        Ok(Self {
            city: city.into(),
            country: country.into(),
            from,
            to,
        })
    }

    /// Resolve optional wire dates into a request.
    ///
    /// A missing `from` falls back to `today`, a missing `to` falls back to
    /// the resolved `from`.
    pub fn with_defaults(
        city: impl Into<String>,
        country: impl Into<String>,
        from: Option<&str>,
        to: Option<&str>,
        today: NaiveDate,
    ) -> ForecastResult<Self> {
        let from = from.map(parse_date).transpose()?.unwrap_or(today);
        let to = to.map(parse_date).transpose()?.unwrap_or(from);
        Self::new(city, country, from, to)
    }

    /// Number of days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// The prompt sent to the generative model.
    pub fn prompt(&self) -> String {
        format!(
            "Provide a concise weather forecast for {}, {} from {} to {} in Celsius. \
             Include date, temperature, and a brief description.",
            self.city,
            self.country,
            self.from.format(DATE_FORMAT),
            self.to.format(DATE_FORMAT),
        )
    }
}

/// Parse a strict `YYYY-MM-DD` date.
///
/// chrono alone accepts unpadded fields such as `2025-5-2`; the wire format
/// requires exactly ten characters.
pub fn parse_date(value: &str) -> ForecastResult<NaiveDate> {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !shape_ok {
        return Err(ForecastError::InvalidDate {
            value: value.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        });
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| ForecastError::InvalidDate {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Errors that can occur while producing a forecast.
#[derive(thiserror::Error, Debug)]
pub enum ForecastError {
    #[error("GOOGLE_API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("Invalid date range: {to} is before {from}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    #[error("Request error: {0}")]
    Request(String),

    #[error("Forecast request timed out after {0} ms")]
    Timeout(u64),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No candidates returned from the model")]
    NoCandidates,
}

/// Convenience result type.
pub type ForecastResult<T> = Result<T, ForecastError>;
