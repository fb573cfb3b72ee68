//! MCP tools: schemas, registry, dispatch, and the weather tool.

pub mod arguments;
pub mod dispatcher;
pub mod registry;
pub mod schema;
pub mod weather;

use std::sync::Arc;
use std::time::Duration;

use weather_forecast::Forecaster;

use crate::types::{McpResult, ToolDefinition};

pub use arguments::{ArgValue, Arguments, CallRequest, ValidatedArgs};
pub use dispatcher::Dispatcher;
pub use registry::{RegisteredTool, ToolHandler, ToolRegistry};
pub use schema::{ParamFormat, ParamType, ParameterSpec, ToolDescriptor};

/// The registry a server starts with.
pub fn default_registry(
    forecaster: Arc<dyn Forecaster>,
    timeout: Duration,
) -> McpResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(
        weather::descriptor(),
        Arc::new(weather::WeatherHandler::new(forecaster, timeout)),
    )?;
    Ok(registry)
}

/// Wire definitions of the built-in tools, without a backend.
pub fn builtin_definitions() -> Vec<ToolDefinition> {
    vec![weather::descriptor().to_definition()]
}
