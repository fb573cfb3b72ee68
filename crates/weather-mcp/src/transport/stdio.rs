//! Stdio transport. Reads JSON-RPC from stdin, writes to stdout.

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::protocol::ProtocolHandler;
use crate::types::{McpError, McpResult, RequestId};

use super::framing;

/// Stdio transport for desktop MCP clients.
pub struct StdioTransport {
    handler: ProtocolHandler,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self { handler }
    }

    /// Run the transport loop: reads from stdin, writes to stdout.
    pub async fn run(&self) -> McpResult<()> {
        let reader = BufReader::new(tokio::io::stdin());
        self.serve(reader, tokio::io::stdout()).await
    }

    /// Serve one connection until EOF or until the handler closes it.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        tracing::info!("Stdio transport started");

        loop {
            buf.clear();
            let bytes_read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(McpError::Io)?;

            if bytes_read == 0 {
                tracing::info!("EOF on stdin, shutting down");
                break;
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Dropping line that is not UTF-8: {e}");
                    let reply = McpError::ParseError(format!("invalid UTF-8: {e}"))
                        .to_json_rpc_error(RequestId::Null);
                    write_frame(&mut writer, &reply).await?;
                    continue;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let response = match framing::parse_message(trimmed) {
                Ok(msg) => self.handler.handle_message(msg).await,
                Err(e) => {
                    tracing::warn!("Parse error: {e}");
                    let reply = e.to_json_rpc_error(framing::salvage_id(trimmed));
                    Some(serde_json::to_value(reply).map_err(McpError::Json)?)
                }
            };

            if let Some(response) = response {
                write_frame(&mut writer, &response).await?;
            }

            if self.handler.is_closed().await {
                tracing::info!("Connection closed, shutting down");
                break;
            }
        }

        Ok(())
    }
}

async fn write_frame<W, T>(writer: &mut W, message: &T) -> McpResult<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let framed = framing::frame_message(message)?;
    writer
        .write_all(framed.as_bytes())
        .await
        .map_err(McpError::Io)?;
    writer.flush().await.map_err(McpError::Io)
}
