//! Main request dispatcher. Receives JSON-RPC messages, routes to handlers.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::tools::{CallRequest, Dispatcher, ToolRegistry};
use crate::types::*;

use super::negotiation::NegotiatedCapabilities;
use super::state::ConnectionState;
use super::validator::{validate_envelope, validate_request};

/// Server side of one connection.
pub struct ProtocolHandler {
    dispatcher: Dispatcher,
    capabilities: Arc<Mutex<NegotiatedCapabilities>>,
}

impl ProtocolHandler {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry),
            capabilities: Arc::new(Mutex::new(NegotiatedCapabilities::connected())),
        }
    }

    pub async fn state(&self) -> ConnectionState {
        self.capabilities.lock().await.state()
    }

    /// The transport should stop reading once this is true.
    pub async fn is_closed(&self) -> bool {
        self.state().await == ConnectionState::Closed
    }

    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            _ => {
                tracing::warn!("Received unexpected message type from client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        if let Err(e) = validate_request(&request) {
            return error_value(&e, request.id);
        }

        let id = request.id.clone();
        match self.dispatch_request(request).await {
            Ok(value) => serde_json::to_value(JsonRpcResponse::new(id, value)).unwrap_or_default(),
            Err(e) => {
                if e.is_fatal_to_connection() {
                    tracing::warn!("Closing connection: {e}");
                }
                error_value(&e, id)
            }
        }
    }

    async fn dispatch_request(&self, request: JsonRpcRequest) -> McpResult<Value> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "ping" => self.handle_ping().await,
            "shutdown" => self.handle_shutdown().await,

            "tools/list" => self.handle_tools_list().await,
            "tools/call" => self.handle_tools_call(request.params).await,

            _ => Err(McpError::MethodNotFound(request.method)),
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        if let Err(e) = validate_envelope(
            &notification.jsonrpc,
            &notification.method,
            notification.params.as_ref(),
        ) {
            tracing::warn!("Dropping malformed notification: {e}");
            return;
        }

        match notification.method.as_str() {
            "notifications/initialized" | "initialized" => {
                self.capabilities.lock().await.mark_initialized();
            }
            "notifications/cancelled" => {
                match parse_params::<CancelRequestParams>(notification.params, "cancel") {
                    Ok(cancel) => tracing::info!(
                        "Client cancelled request {} ({})",
                        cancel.request_id,
                        cancel.reason.as_deref().unwrap_or("no reason given")
                    ),
                    Err(e) => tracing::warn!("Ignoring cancellation: {e}"),
                }
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init_params: InitializeParams = parse_params(params, "Initialize")?;

        let mut caps = self.capabilities.lock().await;
        let result = caps.negotiate(init_params)?;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_ping(&self) -> McpResult<Value> {
        let state = self.state().await;
        if state == ConnectionState::Closed {
            return Err(McpError::NotReady(state));
        }
        Ok(Value::Object(serde_json::Map::new()))
    }

    async fn handle_shutdown(&self) -> McpResult<Value> {
        tracing::info!("Shutdown requested");
        self.capabilities.lock().await.close();
        Ok(Value::Object(serde_json::Map::new()))
    }

    async fn handle_tools_list(&self) -> McpResult<Value> {
        self.capabilities.lock().await.require_ready()?;

        let result = ToolListResult {
            tools: self.dispatcher.registry().list_tools(),
            next_cursor: None,
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> McpResult<Value> {
        // The session lock is not held across dispatch.
        self.capabilities.lock().await.require_ready()?;

        let call_params: ToolCallParams = parse_params(params, "Tool call")?;
        let request = CallRequest::from_params(call_params)?;

        let result = match self.dispatcher.dispatch(request).await {
            Ok(result) => result,
            Err(McpError::HandlerError(message)) => ToolCallResult::error(message),
            Err(e) => return Err(e),
        };

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>, what: &str) -> McpResult<T> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams(format!("{what} params required")))
}

fn error_value(error: &McpError, id: RequestId) -> Value {
    serde_json::to_value(error.to_json_rpc_error(id)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParameterSpec, ToolDescriptor, ToolHandler, ValidatedArgs};
    use async_trait::async_trait;
    use serde_json::json;

    struct Upper;

    #[async_trait]
    impl ToolHandler for Upper {
        async fn call(&self, args: ValidatedArgs) -> anyhow::Result<String> {
            let text = args.get_str("text").unwrap_or_default();
            if text == "fail" {
                anyhow::bail!("upstream unavailable");
            }
            Ok(text.to_uppercase())
        }
    }

    fn handler() -> ProtocolHandler {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolDescriptor::new("upper", "Uppercase text")
                    .param(ParameterSpec::string("text").required()),
                Arc::new(Upper),
            )
            .unwrap();
        ProtocolHandler::new(Arc::new(registry))
    }

    async fn send(handler: &ProtocolHandler, msg: Value) -> Value {
        let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
        handler.handle_message(parsed).await.unwrap()
    }

    async fn initialize(handler: &ProtocolHandler) {
        let resp = send(
            handler,
            json!({
                "jsonrpc": "2.0", "id": 0, "method": "initialize",
                "params": {
                    "protocolVersion": MCP_VERSION,
                    "capabilities": {},
                    "clientInfo": { "name": "t", "version": "0" }
                }
            }),
        )
        .await;
        assert_eq!(resp["result"]["protocolVersion"], MCP_VERSION);
    }

    #[tokio::test]
    async fn test_handler_error_is_a_result_not_a_protocol_error() {
        let h = handler();
        initialize(&h).await;

        let resp = send(
            &h,
            json!({
                "jsonrpc": "2.0", "id": 1, "method": "tools/call",
                "params": { "name": "upper", "arguments": { "text": "fail" } }
            }),
        )
        .await;
        assert!(resp.get("error").is_none());
        assert_eq!(resp["result"]["isError"], true);
        assert!(resp["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_ping_before_handshake_and_closed_after_shutdown() {
        let h = handler();
        let resp = send(&h, json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" })).await;
        assert_eq!(resp["result"], json!({}));

        initialize(&h).await;
        let resp = send(&h, json!({ "jsonrpc": "2.0", "id": 2, "method": "shutdown" })).await;
        assert_eq!(resp["result"], json!({}));
        assert!(h.is_closed().await);

        let resp = send(&h, json!({ "jsonrpc": "2.0", "id": 3, "method": "ping" })).await;
        assert_eq!(resp["error"]["code"], mcp_error_codes::NOT_READY);
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply() {
        let h = handler();
        initialize(&h).await;
        let parsed: JsonRpcMessage = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "notifications/cancelled",
            "params": { "requestId": 7, "reason": "user" }
        }))
        .unwrap();
        assert!(h.handle_message(parsed).await.is_none());
        assert_eq!(h.state().await, ConnectionState::Ready);
    }
}
