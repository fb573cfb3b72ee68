//! Client connection: handshake, tool calls, and per-request timeouts.

use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::protocol::{ConnectionState, Handshake};
use crate::tools::CallRequest;
use crate::types::{
    Implementation, InitializeParams, InitializeResult, McpError, McpResult, ServerCapabilities,
    ToolCallResult, ToolDefinition, ToolListResult,
};
use crate::transport::ClientTransport;

/// Default time allowed for a single exchange with the server.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

pub struct McpClient<R, W> {
    transport: ClientTransport<R, W>,
    handshake: Handshake,
    timeout: Duration,
    server_capabilities: Option<ServerCapabilities>,
}

impl<R, W> McpClient<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wrap an already-open connection. The handshake starts in `Connecting`.
    pub fn new(reader: R, writer: W, timeout: Duration) -> Self {
        Self {
            transport: ClientTransport::new(reader, writer),
            handshake: Handshake::opened(),
            timeout,
            server_capabilities: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.handshake.state()
    }

    pub fn server_info(&self) -> Option<&Implementation> {
        self.handshake.peer()
    }

    pub fn server_capabilities(&self) -> Option<&ServerCapabilities> {
        self.server_capabilities.as_ref()
    }

    pub fn protocol_version(&self) -> Option<&str> {
        self.handshake.protocol_version()
    }

    async fn exchange(&mut self, method: &str, params: Option<Value>) -> McpResult<Value> {
        let timeout = self.timeout;
        match tokio::time::timeout(timeout, self.transport.request(method, params)).await {
            Ok(result) => result,
            Err(_) => Err(McpError::Timeout {
                method: method.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Run the handshake at `protocol_version`.
    ///
    /// Any failure closes the connection. On success the server is told the
    /// client is ready.
    pub async fn initialize(&mut self, protocol_version: &str) -> McpResult<InitializeResult> {
        self.handshake.begin()?;

        let result = match self.send_initialize(protocol_version).await {
            Ok(result) => result,
            Err(e) => {
                self.handshake.fail();
                return Err(e);
            }
        };

        if result.protocol_version != protocol_version {
            tracing::info!(
                "Server answered protocol {} to our {protocol_version}",
                result.protocol_version
            );
        }
        self.handshake
            .complete(&result.protocol_version, result.server_info.clone())?;

        self.server_capabilities = Some(result.capabilities.clone());

        self.transport
            .notify("notifications/initialized", None)
            .await?;

        tracing::info!(
            "Connected to {} {} (protocol {})",
            result.server_info.name,
            result.server_info.version,
            result.protocol_version
        );
        Ok(result)
    }

    async fn send_initialize(&mut self, protocol_version: &str) -> McpResult<InitializeResult> {
        let params = serde_json::to_value(InitializeParams::new(protocol_version))?;
        let value = self.exchange("initialize", Some(params)).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn list_tools(&mut self) -> McpResult<Vec<ToolDefinition>> {
        self.handshake.require_ready()?;
        let value = self.exchange("tools/list", None).await?;
        let result: ToolListResult = serde_json::from_value(value)?;
        Ok(result.tools)
    }

    /// Call a tool. A handler failure on the server comes back as
    /// `Ok` with `is_error` set; validation failures come back as `Err`.
    pub async fn call_tool(&mut self, request: &CallRequest) -> McpResult<ToolCallResult> {
        self.handshake.require_ready()?;
        let params = serde_json::to_value(request.to_params())?;
        let value = self.exchange("tools/call", Some(params)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Liveness check; allowed before the handshake.
    pub async fn ping(&mut self) -> McpResult<()> {
        if self.handshake.is_closed() {
            return Err(McpError::NotReady(ConnectionState::Closed));
        }
        self.exchange("ping", None).await.map(|_| ())
    }

    /// Ask the server to shut down, then mark the connection closed.
    pub async fn close(&mut self) {
        if self.handshake.is_ready() {
            if let Err(e) = self.exchange("shutdown", None).await {
                tracing::debug!("Shutdown request failed: {e}");
            }
        }
        self.handshake.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_unsupported_echo_closes_the_client() {
        let (client_io, server_io) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client_io);
        let (server_read, mut server_write) = tokio::io::split(server_io);

        let peer = tokio::spawn(async move {
            let mut lines = BufReader::new(server_read).lines();
            let line = lines.next_line().await.unwrap().unwrap();
            let request: Value = serde_json::from_str(&line).unwrap();
            assert_eq!(request["method"], "initialize");
            assert_eq!(request["params"]["protocolVersion"], "2024-11-05");
            assert_eq!(request["params"]["clientInfo"]["name"], "weather-client");

            server_write
                .write_all(
                    b"{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"protocolVersion\":\"1999-01-01\",\
                      \"capabilities\":{},\"serverInfo\":{\"name\":\"old\",\"version\":\"0\"}}}\n",
                )
                .await
                .unwrap();
        });

        let mut client = McpClient::new(
            BufReader::new(client_read),
            client_write,
            Duration::from_secs(5),
        );
        let err = client.initialize("2024-11-05").await.unwrap_err();
        assert!(matches!(
            err,
            McpError::VersionUnsupported { ref requested, .. } if requested == "1999-01-01"
        ));
        assert_eq!(client.state(), ConnectionState::Closed);
        peer.await.unwrap();
    }

    #[tokio::test]
    async fn test_calls_are_gated_until_ready() {
        let mut client = McpClient::new(
            BufReader::new(Builder::new().build()),
            Builder::new().build(),
            Duration::from_secs(5),
        );
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, McpError::NotReady(ConnectionState::Connecting)));
        let err = client
            .call_tool(&CallRequest::new("weather"))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::NotReady(ConnectionState::Connecting)));
    }
}
