//! MCP response types for tools.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One block of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    /// Any block kind this crate does not interpret.
    #[serde(other)]
    Other,
}

impl ToolContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolContent::Text { text } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn text(text: String) -> Self {
        Self {
            content: vec![ToolContent::Text { text }],
            is_error: false,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            content: vec![ToolContent::Text { text: message }],
            is_error: true,
        }
    }

    /// Text blocks in order, skipping every other kind.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(ToolContent::as_text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolListResult {
    pub tools: Vec<ToolDefinition>,
    #[serde(default, rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_content_kinds_are_kept_as_other() {
        let result: ToolCallResult = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "Sunny, 21°C" },
                { "type": "audio", "data": "AAAA", "mimeType": "audio/wav" },
                { "type": "text", "text": "Rain later" }
            ]
        }))
        .unwrap();

        assert!(!result.is_error);
        assert_eq!(result.content[1], ToolContent::Other);
        assert_eq!(
            result.texts().collect::<Vec<_>>(),
            vec!["Sunny, 21°C", "Rain later"]
        );
    }

    #[test]
    fn test_error_result_wire_shape() {
        let value = serde_json::to_value(ToolCallResult::error("upstream down".into())).unwrap();
        assert_eq!(
            value,
            json!({
                "content": [{ "type": "text", "text": "upstream down" }],
                "isError": true
            })
        );
    }
}
