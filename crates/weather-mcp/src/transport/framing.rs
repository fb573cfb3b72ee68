//! Message framing for newline-delimited JSON.

use serde::Serialize;
use serde_json::Value;

use crate::types::{JsonRpcMessage, McpError, McpResult, RequestId};

/// Parse a single line of text as a JSON-RPC message.
///
/// Text that is not JSON is a parse error; JSON that is not a JSON-RPC
/// message is an invalid request.
pub fn parse_message(line: &str) -> McpResult<JsonRpcMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(McpError::ParseError("Empty message".to_string()));
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| McpError::ParseError(e.to_string()))?;
    serde_json::from_value(value).map_err(|_| {
        McpError::InvalidRequest("not a JSON-RPC 2.0 request, response or notification".into())
    })
}

/// Best-effort id of an unparseable message, for the error reply.
pub fn salvage_id(line: &str) -> RequestId {
    serde_json::from_str::<Value>(line.trim())
        .ok()
        .and_then(|v| v.get("id").cloned())
        .and_then(|id| serde_json::from_value(id).ok())
        .unwrap_or(RequestId::Null)
}

/// Serialize a message to a JSON line (with trailing newline).
pub fn frame_message<T: Serialize + ?Sized>(value: &T) -> McpResult<String> {
    let mut json = serde_json::to_string(value).map_err(McpError::Json)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_kinds() {
        assert!(matches!(
            parse_message(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#),
            Ok(JsonRpcMessage::Request(_))
        ));
        assert!(matches!(
            parse_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#),
            Ok(JsonRpcMessage::Notification(_))
        ));
        assert!(matches!(parse_message("{not json"), Err(McpError::ParseError(_))));
        assert!(matches!(parse_message("   "), Err(McpError::ParseError(_))));
        assert!(matches!(
            parse_message(r#"{"id":4,"hello":"world"}"#),
            Err(McpError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_salvage_id() {
        assert_eq!(salvage_id(r#"{"id":4,"hello":"world"}"#), RequestId::Number(4));
        assert_eq!(salvage_id("{not json"), RequestId::Null);
    }

    #[test]
    fn test_frame_is_one_line() {
        let framed = frame_message(&json!({ "text": "a\nb" })).unwrap();
        assert!(framed.ends_with('\n'));
        assert_eq!(framed.matches('\n').count(), 1);
    }
}
