//! weather-forecast: forecast requests, date handling, and the Gemini backend.

pub mod config;
pub mod forecaster;
pub mod gemini;
pub mod types;

pub use config::ForecastConfig;
pub use forecaster::Forecaster;
pub use gemini::GeminiForecaster;
pub use types::*;
