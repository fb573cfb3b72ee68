//! Transport layer for MCP communication.

pub mod client;
pub mod framing;
pub mod stdio;

pub use client::ClientTransport;
pub use stdio::StdioTransport;
