//! MCP client: connection handling and server process management.

pub mod connection;
pub mod process;

pub use connection::{McpClient, DEFAULT_REQUEST_TIMEOUT};
pub use process::{ProcessClient, ServerProcess, SHUTDOWN_TIMEOUT};
