//! MCP capability and initialization types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Protocol version this crate prefers and proposes as a client.
pub const MCP_VERSION: &str = "2024-11-05";
/// Every protocol version either peer accepts during the handshake.
pub const SUPPORTED_VERSIONS: &[&str] = &[MCP_VERSION, "2025-03-26"];

pub const SERVER_NAME: &str = "Weather Forecast 🚀";
pub const SERVER_VERSION: &str = "1.0.0";
pub const CLIENT_NAME: &str = "weather-client";
pub const CLIENT_VERSION: &str = "v1.0.0";

pub fn is_supported_version(version: &str) -> bool {
    SUPPORTED_VERSIONS.contains(&version)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

impl Implementation {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn server() -> Self {
        Self::new(SERVER_NAME, SERVER_VERSION)
    }

    pub fn client() -> Self {
        Self::new(CLIENT_NAME, CLIENT_VERSION)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roots: Option<RootsCapability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingCapability {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootsCapability {
    #[serde(default)]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    #[serde(default)]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub capabilities: ClientCapabilities,
    pub client_info: Implementation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: Implementation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl ServerCapabilities {
    pub fn default_capabilities() -> Self {
        Self {
            experimental: None,
            tools: Some(ToolsCapability {
                list_changed: false,
            }),
        }
    }

    pub fn supports_tools(&self) -> bool {
        self.tools.is_some()
    }
}

impl InitializeParams {
    pub fn new(protocol_version: impl Into<String>) -> Self {
        Self {
            protocol_version: protocol_version.into(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation::client(),
        }
    }
}

impl InitializeResult {
    /// Server reply for an accepted handshake at `protocol_version`.
    pub fn for_version(protocol_version: &str) -> Self {
        Self {
            protocol_version: protocol_version.to_string(),
            capabilities: ServerCapabilities::default_capabilities(),
            server_info: Implementation::server(),
            instructions: Some(
                "Weather forecast server. Call the `weather` tool with a city, a country \
                 and an optional YYYY-MM-DD date range."
                    .to_string(),
            ),
        }
    }

    pub fn default_result() -> Self {
        Self::for_version(MCP_VERSION)
    }
}
