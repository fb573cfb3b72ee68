//! The `weather` tool.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;

use weather_forecast::{ForecastError, ForecastRequest, Forecaster};

use super::arguments::ValidatedArgs;
use super::registry::ToolHandler;
use super::schema::{ParamFormat, ParameterSpec, ToolDescriptor};

pub const TOOL_NAME: &str = "weather";

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        TOOL_NAME,
        "Get the weather forecast for a given city and country over a date range",
    )
    .param(
        ParameterSpec::string("city")
            .required()
            .description("Name of the city"),
    )
    .param(
        ParameterSpec::string("country")
            .required()
            .description("Name of the country"),
    )
    .param(
        ParameterSpec::string("fromDate")
            .description("Start date in YYYY-MM-DD format (defaults to today)")
            .format(ParamFormat::Date),
    )
    .param(
        ParameterSpec::string("toDate")
            .description("End date in YYYY-MM-DD format (defaults to same as fromDate)")
            .format(ParamFormat::Date),
    )
}

/// Fills in the date defaults and asks the forecaster, bounded by `timeout`.
pub struct WeatherHandler {
    forecaster: Arc<dyn Forecaster>,
    timeout: Duration,
}

impl WeatherHandler {
    pub fn new(forecaster: Arc<dyn Forecaster>, timeout: Duration) -> Self {
        Self {
            forecaster,
            timeout,
        }
    }
}

#[async_trait]
impl ToolHandler for WeatherHandler {
    async fn call(&self, args: ValidatedArgs) -> anyhow::Result<String> {
        let city = args.get_str("city").context("city is required")?;
        let country = args.get_str("country").context("country is required")?;

        let request = ForecastRequest::with_defaults(
            city,
            country,
            args.get_str("fromDate"),
            args.get_str("toDate"),
            Utc::now().date_naive(),
        )?;

        tracing::info!(
            backend = self.forecaster.id(),
            "Forecast for {}, {} from {} to {} ({} days)",
            request.city,
            request.country,
            request.from,
            request.to,
            request.days()
        );

        let text = tokio::time::timeout(self.timeout, self.forecaster.forecast(&request))
            .await
            .map_err(|_| ForecastError::Timeout(self.timeout.as_millis() as u64))??;

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::arguments::CallRequest;
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use weather_forecast::ForecastResult;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<ForecastRequest>>,
    }

    #[async_trait]
    impl Forecaster for Recording {
        fn id(&self) -> &str {
            "recording"
        }

        async fn forecast(&self, request: &ForecastRequest) -> ForecastResult<String> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(format!("Sunny in {}", request.city))
        }
    }

    struct Stalled;

    #[async_trait]
    impl Forecaster for Stalled {
        fn id(&self) -> &str {
            "stalled"
        }

        async fn forecast(&self, _request: &ForecastRequest) -> ForecastResult<String> {
            std::future::pending().await
        }
    }

    fn validated(request: CallRequest) -> ValidatedArgs {
        descriptor().validate(&request.arguments).unwrap()
    }

    #[test]
    fn test_descriptor_shape() {
        let d = descriptor();
        assert_eq!(d.name, "weather");
        assert_eq!(
            d.required_names().into_iter().collect::<Vec<_>>(),
            vec!["city", "country"]
        );
        assert_eq!(
            d.optional_names().into_iter().collect::<Vec<_>>(),
            vec!["fromDate", "toDate"]
        );
    }

    #[tokio::test]
    async fn test_full_range_passed_through() {
        let backend = Arc::new(Recording::default());
        let handler = WeatherHandler::new(backend.clone(), Duration::from_secs(5));

        let result = handler
            .call(validated(
                CallRequest::new("weather")
                    .arg("city", "Warsaw")
                    .arg("country", "Poland")
                    .arg("fromDate", "2025-05-02")
                    .arg("toDate", "2025-05-15"),
            ))
            .await
            .unwrap();

        assert_eq!(result, "Sunny in Warsaw");
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].from, NaiveDate::from_ymd_opt(2025, 5, 2).unwrap());
        assert_eq!(seen[0].to, NaiveDate::from_ymd_opt(2025, 5, 15).unwrap());
        assert_eq!(seen[0].days(), 14);
    }

    #[tokio::test]
    async fn test_to_date_defaults_to_from_date() {
        let backend = Arc::new(Recording::default());
        let handler = WeatherHandler::new(backend.clone(), Duration::from_secs(5));

        handler
            .call(validated(
                CallRequest::new("weather")
                    .arg("city", "Lisbon")
                    .arg("country", "Portugal")
                    .arg("fromDate", "2025-06-01"),
            ))
            .await
            .unwrap();

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].from, seen[0].to);
        assert_eq!(seen[0].days(), 1);
    }

    #[tokio::test]
    async fn test_reversed_range_is_a_handler_failure() {
        let handler = WeatherHandler::new(Arc::new(Recording::default()), Duration::from_secs(5));
        let err = handler
            .call(validated(
                CallRequest::new("weather")
                    .arg("city", "Warsaw")
                    .arg("country", "Poland")
                    .arg("fromDate", "2025-05-15")
                    .arg("toDate", "2025-05-02"),
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ForecastError>(),
            Some(ForecastError::InvalidRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_stalled_backend_times_out() {
        let handler = WeatherHandler::new(Arc::new(Stalled), Duration::from_millis(20));
        let err = handler
            .call(validated(
                CallRequest::new("weather")
                    .arg("city", "Warsaw")
                    .arg("country", "Poland"),
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ForecastError>(),
            Some(ForecastError::Timeout(20))
        ));
    }
}
