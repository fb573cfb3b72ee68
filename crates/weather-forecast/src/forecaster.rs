//! The forecast-generation seam.

use async_trait::async_trait;

use crate::types::{ForecastRequest, ForecastResult};

/// Turns a forecast request into human-readable forecast text.
#[async_trait]
pub trait Forecaster: Send + Sync {
    /// Short backend identifier used in logs.
    fn id(&self) -> &str;

    async fn forecast(&self, request: &ForecastRequest) -> ForecastResult<String>;
}
