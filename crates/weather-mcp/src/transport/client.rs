//! Client side of the line-delimited JSON-RPC transport.

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::types::{
    JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, McpError, McpResult, RequestId,
};

use super::framing;

/// Sends requests and reads lines until the matching response arrives.
///
/// Ids are numbered from 1 per connection. One request is in flight at a
/// time.
pub struct ClientTransport<R, W> {
    reader: R,
    writer: W,
    next_id: i64,
    line: String,
}

impl<R, W> ClientTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            next_id: 1,
            line: String::new(),
        }
    }

    async fn send<T: Serialize>(&mut self, message: &T) -> McpResult<()> {
        let framed = framing::frame_message(message)?;
        self.writer
            .write_all(framed.as_bytes())
            .await
            .map_err(|e| McpError::Transport(format!("failed to write to server: {e}")))?;
        self.writer
            .flush()
            .await
            .map_err(|e| McpError::Transport(format!("failed to flush to server: {e}")))
    }

    /// Send `method` and wait for its result.
    ///
    /// Error responses come back as typed errors. Notifications and
    /// responses to other ids are skipped.
    pub async fn request(&mut self, method: &str, params: Option<Value>) -> McpResult<Value> {
        let id = RequestId::Number(self.next_id);
        self.next_id += 1;

        self.send(&JsonRpcRequest::new(id.clone(), method, params))
            .await?;

        loop {
            self.line.clear();
            let bytes_read = self
                .reader
                .read_line(&mut self.line)
                .await
                .map_err(|e| McpError::Transport(format!("failed to read from server: {e}")))?;

            if bytes_read == 0 {
                return Err(McpError::Transport(format!(
                    "server closed the connection while waiting for '{method}'"
                )));
            }

            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let message = match framing::parse_message(trimmed) {
                Ok(message) => message,
                Err(e) => {
                    tracing::debug!("Skipping unparseable line from server: {e}");
                    continue;
                }
            };

            match message {
                JsonRpcMessage::Response(resp) if resp.id == id => return Ok(resp.result),
                // A null id means the server could not read our request.
                JsonRpcMessage::Error(err) if err.id == id || err.id == RequestId::Null => {
                    return Err(McpError::from_error_object(err.error));
                }
                JsonRpcMessage::Notification(notif) => {
                    tracing::debug!("Server notification: {}", notif.method);
                }
                JsonRpcMessage::Request(req) => {
                    tracing::warn!("Rejecting server request '{}'", req.method);
                    let reply = McpError::MethodNotFound(req.method).to_json_rpc_error(req.id);
                    self.send(&reply).await?;
                }
                other => {
                    tracing::warn!(
                        "Skipping response for id {:?} while waiting for {id}",
                        other.id()
                    );
                }
            }
        }
    }

    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> McpResult<()> {
        self.send(&JsonRpcNotification::new(method, params)).await
    }
}
