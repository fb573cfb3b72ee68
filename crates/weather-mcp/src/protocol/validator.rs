//! JSON-RPC envelope validation.

use serde_json::Value;

use crate::types::{JsonRpcRequest, McpError, McpResult, JSONRPC_VERSION};

/// Validate that a JSON-RPC request is well-formed.
pub fn validate_request(request: &JsonRpcRequest) -> McpResult<()> {
    validate_envelope(&request.jsonrpc, &request.method, request.params.as_ref())
}

/// Shared checks for requests and notifications.
pub fn validate_envelope(jsonrpc: &str, method: &str, params: Option<&Value>) -> McpResult<()> {
    if jsonrpc != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{jsonrpc}\""
        )));
    }

    if method.is_empty() {
        return Err(McpError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    // MCP params are always named.
    match params {
        None | Some(Value::Object(_)) | Some(Value::Null) => Ok(()),
        Some(other) => Err(McpError::InvalidRequest(format!(
            "params must be an object, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequestId;
    use serde_json::json;

    fn request(jsonrpc: &str, method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: jsonrpc.to_string(),
            id: RequestId::Number(1),
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn test_well_formed() {
        assert!(validate_request(&request("2.0", "ping", None)).is_ok());
        assert!(validate_request(&request("2.0", "tools/call", Some(json!({})))).is_ok());
    }

    #[test]
    fn test_rejections() {
        let err = validate_request(&request("1.0", "ping", None)).unwrap_err();
        assert_eq!(err.code(), -32600);
        assert!(validate_request(&request("2.0", "", None)).is_err());
        assert!(validate_request(&request("2.0", "tools/call", Some(json!([1, 2])))).is_err());
    }
}
