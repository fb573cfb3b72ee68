//! Server-side capability negotiation during initialization.

use crate::types::{ClientCapabilities, InitializeParams, InitializeResult, McpResult};

use super::state::{ConnectionState, Handshake};

/// Per-connection handshake state and the client capabilities it recorded.
#[derive(Debug, Clone)]
pub struct NegotiatedCapabilities {
    pub client: ClientCapabilities,
    handshake: Handshake,
    initialized_notified: bool,
}

impl NegotiatedCapabilities {
    /// State for a freshly opened transport (`Connecting`).
    pub fn connected() -> Self {
        Self {
            client: ClientCapabilities::default(),
            handshake: Handshake::opened(),
            initialized_notified: false,
        }
    }

    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    pub fn state(&self) -> ConnectionState {
        self.handshake.state()
    }

    pub fn negotiate(&mut self, params: InitializeParams) -> McpResult<InitializeResult> {
        self.handshake.begin()?;

        if let Err(e) = self
            .handshake
            .complete(&params.protocol_version, params.client_info.clone())
        {
            tracing::warn!(
                "Rejecting client {} v{}: {e}",
                params.client_info.name,
                params.client_info.version
            );
            return Err(e);
        }

        self.client = params.capabilities;

        tracing::info!(
            "Initialized with client: {} v{} (protocol {})",
            params.client_info.name,
            params.client_info.version,
            params.protocol_version
        );

        Ok(InitializeResult::for_version(&params.protocol_version))
    }

    pub fn mark_initialized(&mut self) {
        if !self.handshake.is_ready() {
            tracing::warn!(
                "Received initialized notification in state {}",
                self.handshake.state()
            );
            return;
        }
        self.initialized_notified = true;
        tracing::info!("MCP handshake complete");
    }

    /// Whether the client confirmed the handshake with a notification.
    pub fn initialized_notified(&self) -> bool {
        self.initialized_notified
    }

    pub fn require_ready(&self) -> McpResult<()> {
        self.handshake.require_ready()
    }

    pub fn close(&mut self) -> bool {
        self.handshake.close()
    }
}

impl Default for NegotiatedCapabilities {
    fn default() -> Self {
        Self::connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{McpError, MCP_VERSION};

    #[test]
    fn test_negotiate_echoes_supported_version() {
        let mut caps = NegotiatedCapabilities::connected();
        assert_eq!(caps.state(), ConnectionState::Connecting);

        let result = caps.negotiate(InitializeParams::new("2025-03-26")).unwrap();
        assert_eq!(result.protocol_version, "2025-03-26");
        assert!(result.capabilities.supports_tools());
        assert_eq!(caps.state(), ConnectionState::Ready);
        assert_eq!(caps.handshake().protocol_version(), Some("2025-03-26"));
    }

    #[test]
    fn test_negotiate_rejects_unknown_version() {
        let mut caps = NegotiatedCapabilities::connected();
        let err = caps.negotiate(InitializeParams::new("0.4.0")).unwrap_err();
        assert!(matches!(err, McpError::VersionUnsupported { .. }));
        assert_eq!(caps.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_initialized_notification_only_counts_when_ready() {
        let mut caps = NegotiatedCapabilities::connected();
        caps.mark_initialized();
        assert!(!caps.initialized_notified());

        caps.negotiate(InitializeParams::new(MCP_VERSION)).unwrap();
        caps.mark_initialized();
        assert!(caps.initialized_notified());
    }
}
