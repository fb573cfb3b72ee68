//! Connection lifecycle shared by both peers.
//!
//! `Disconnected → Connecting → Initializing → Ready → Closed`. A failed
//! handshake jumps straight to `Closed`.

use serde::{Deserialize, Serialize};

use crate::types::{is_supported_version, Implementation, McpError, McpResult, SUPPORTED_VERSIONS};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Initializing,
    Ready,
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Initializing => write!(f, "initializing"),
            ConnectionState::Ready => write!(f, "ready"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// Handshake bookkeeping for one connection.
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    state: ConnectionState,
    protocol_version: Option<String>,
    peer: Option<Implementation>,
}

impl Handshake {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handshake whose transport is already open (`Connecting`).
    pub fn opened() -> Self {
        Self {
            state: ConnectionState::Connecting,
            ..Self::default()
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Version agreed on, once `Ready`.
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Identity of the other side, once `Ready`.
    pub fn peer(&self) -> Option<&Implementation> {
        self.peer.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// The transport is open.
    pub fn start(&mut self) -> McpResult<()> {
        match self.state {
            ConnectionState::Disconnected => {
                self.state = ConnectionState::Connecting;
                Ok(())
            }
            other => Err(McpError::ProtocolViolation(format!(
                "cannot start a connection that is already {other}"
            ))),
        }
    }

    /// An initialize request is going out (client) or coming in (server).
    ///
    /// Rejections leave the state untouched.
    pub fn begin(&mut self) -> McpResult<()> {
        match self.state {
            ConnectionState::Connecting => {
                self.state = ConnectionState::Initializing;
                Ok(())
            }
            ConnectionState::Initializing => Err(McpError::ProtocolViolation(
                "initialize is already in progress".to_string(),
            )),
            ConnectionState::Ready => Err(McpError::ProtocolViolation(
                "connection is already initialized".to_string(),
            )),
            ConnectionState::Disconnected => Err(McpError::ProtocolViolation(
                "initialize sent before the transport was opened".to_string(),
            )),
            ConnectionState::Closed => Err(McpError::ProtocolViolation(
                "initialize sent on a closed connection".to_string(),
            )),
        }
    }

    /// Finish the in-flight handshake at `version` with `peer`.
    ///
    /// An unsupported version closes the connection.
    pub fn complete(&mut self, version: &str, peer: Implementation) -> McpResult<()> {
        if self.state != ConnectionState::Initializing {
            return Err(McpError::ProtocolViolation(format!(
                "no handshake in flight (state: {})",
                self.state
            )));
        }

        if !is_supported_version(version) {
            self.state = ConnectionState::Closed;
            return Err(McpError::VersionUnsupported {
                requested: version.to_string(),
                supported: SUPPORTED_VERSIONS.join(", "),
            });
        }

        self.protocol_version = Some(version.to_string());
        self.peer = Some(peer);
        self.state = ConnectionState::Ready;
        Ok(())
    }

    /// Abort a handshake that failed for a reason other than its version.
    pub fn fail(&mut self) {
        self.state = ConnectionState::Closed;
    }

    /// Gate for every request other than initialize and ping.
    pub fn require_ready(&self) -> McpResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(McpError::NotReady(self.state))
        }
    }

    /// Returns whether the connection was open before the call.
    pub fn close(&mut self) -> bool {
        let was_open = self.state != ConnectionState::Closed;
        self.state = ConnectionState::Closed;
        was_open
    }
}
