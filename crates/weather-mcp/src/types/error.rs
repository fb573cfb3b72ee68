//! Error types and JSON-RPC error codes for the MCP client and server.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::message::{JsonRpcError, JsonRpcErrorObject, RequestId, JSONRPC_VERSION};
use crate::protocol::ConnectionState;

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// MCP-specific error codes.
pub mod mcp_error_codes {
    pub const TOOL_NOT_FOUND: i32 = -32803;
    pub const PROTOCOL_VIOLATION: i32 = -32810;
    pub const VERSION_UNSUPPORTED: i32 = -32811;
    pub const NOT_READY: i32 = -32812;
    pub const DUPLICATE_TOOL: i32 = -32813;
    pub const HANDLER_ERROR: i32 = -32850;
    pub const TIMEOUT: i32 = -32851;
}

/// Why an argument was rejected by schema validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentProblem {
    Missing,
    WrongType,
    BadFormat,
}

impl std::fmt::Display for ArgumentProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgumentProblem::Missing => write!(f, "missing"),
            ArgumentProblem::WrongType => write!(f, "wrong type"),
            ArgumentProblem::BadFormat => write!(f, "bad format"),
        }
    }
}

/// All errors that can occur in the MCP client and server.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Unsupported protocol version {requested} (supported: {supported})")]
    VersionUnsupported { requested: String, supported: String },

    #[error("Connection not ready (state: {0})")]
    NotReady(ConnectionState),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),

    #[error("Invalid argument '{parameter}' ({problem}): {detail}")]
    InvalidArgument {
        parameter: String,
        problem: ArgumentProblem,
        detail: String,
    },

    #[error("Handler error: {0}")]
    HandlerError(String),

    #[error("Request '{method}' timed out after {timeout_ms} ms")]
    Timeout { method: String, timeout_ms: u64 },

    #[error("Server error [{code}]: {message}")]
    ServerError { code: i32, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn invalid_argument(
        parameter: impl Into<String>,
        problem: ArgumentProblem,
        detail: impl Into<String>,
    ) -> Self {
        McpError::InvalidArgument {
            parameter: parameter.into(),
            problem,
            detail: detail.into(),
        }
    }

    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::ParseError(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::InternalError(_) => INTERNAL_ERROR,
            McpError::ProtocolViolation(_) => PROTOCOL_VIOLATION,
            McpError::VersionUnsupported { .. } => VERSION_UNSUPPORTED,
            McpError::NotReady(_) => NOT_READY,
            McpError::UnknownTool(_) => TOOL_NOT_FOUND,
            McpError::DuplicateTool(_) => DUPLICATE_TOOL,
            McpError::InvalidArgument { .. } => INVALID_PARAMS,
            McpError::HandlerError(_) => HANDLER_ERROR,
            McpError::Timeout { .. } => TIMEOUT,
            McpError::ServerError { code, .. } => *code,
            McpError::Transport(_) | McpError::Io(_) => INTERNAL_ERROR,
            McpError::Json(_) => PARSE_ERROR,
        }
    }

    /// Structured details carried in the JSON-RPC `data` field.
    pub fn data(&self) -> Option<Value> {
        match self {
            McpError::ProtocolViolation(detail) | McpError::HandlerError(detail) => {
                Some(json!({ "detail": detail }))
            }
            McpError::VersionUnsupported {
                requested,
                supported,
            } => Some(json!({ "requested": requested, "supported": supported })),
            McpError::NotReady(state) => Some(json!({ "state": state })),
            McpError::UnknownTool(name) => Some(json!({ "tool": name })),
            McpError::InvalidArgument {
                parameter,
                problem,
                detail,
            } => Some(json!({
                "parameter": parameter,
                "problem": problem,
                "detail": detail,
            })),
            _ => None,
        }
    }

    /// Whether this error ends the connection it occurred on.
    pub fn is_fatal_to_connection(&self) -> bool {
        matches!(self, McpError::VersionUnsupported { .. })
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code: self.code(),
                message: self.to_string(),
                data: self.data(),
            },
        }
    }

    /// Rebuild a typed error from a peer's JSON-RPC error object.
    ///
    /// Codes without structured data fall back to [`McpError::ServerError`].
    pub fn from_error_object(error: JsonRpcErrorObject) -> Self {
        use error_codes::*;
        use mcp_error_codes::*;

        let data = error.data.clone().unwrap_or(Value::Null);
        let field = |name: &str| data.get(name).and_then(Value::as_str).map(str::to_string);

        let typed = match error.code {
            INVALID_PARAMS => match (
                field("parameter"),
                data.get("problem")
                    .cloned()
                    .and_then(|p| serde_json::from_value::<ArgumentProblem>(p).ok()),
            ) {
                (Some(parameter), Some(problem)) => Some(McpError::InvalidArgument {
                    parameter,
                    problem,
                    detail: field("detail").unwrap_or_default(),
                }),
                _ => Some(McpError::InvalidParams(error.message.clone())),
            },
            TOOL_NOT_FOUND => field("tool").map(McpError::UnknownTool),
            PROTOCOL_VIOLATION => field("detail").map(McpError::ProtocolViolation),
            HANDLER_ERROR => field("detail").map(McpError::HandlerError),
            VERSION_UNSUPPORTED => match (field("requested"), field("supported")) {
                (Some(requested), Some(supported)) => Some(McpError::VersionUnsupported {
                    requested,
                    supported,
                }),
                _ => None,
            },
            NOT_READY => data
                .get("state")
                .cloned()
                .and_then(|s| serde_json::from_value::<ConnectionState>(s).ok())
                .map(McpError::NotReady),
            METHOD_NOT_FOUND => Some(McpError::MethodNotFound(error.message.clone())),
            _ => None,
        };

        typed.unwrap_or(McpError::ServerError {
            code: error.code,
            message: error.message,
        })
    }
}

pub type McpResult<T> = Result<T, McpError>;
