//! Weather MCP: a minimal Model Context Protocol server and client exposing a
//! weather forecast tool over stdio.

pub mod client;
pub mod config;
pub mod protocol;
pub mod tools;
pub mod transport;
pub mod types;

pub use client::{McpClient, ServerProcess};
pub use config::resolve_server_command;
pub use protocol::ProtocolHandler;
pub use tools::{Dispatcher, ToolRegistry};
pub use transport::StdioTransport;
