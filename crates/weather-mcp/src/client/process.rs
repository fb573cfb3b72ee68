//! Server child-process lifecycle.

use std::time::Duration;

use tokio::io::BufReader;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::types::{McpError, McpResult};

use super::connection::McpClient;

/// Time the server gets to exit on its own before it is killed.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A client talking to a server it spawned.
pub type ProcessClient = McpClient<BufReader<ChildStdout>, ChildStdin>;

/// A spawned server. Its stderr is inherited so server logs stay visible.
pub struct ServerProcess {
    program: String,
    child: Child,
}

impl ServerProcess {
    /// Spawn `program` with piped stdio and wrap it in a client.
    pub fn spawn(
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> McpResult<(Self, ProcessClient)> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| McpError::Transport(format!("failed to spawn '{program}': {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Transport("failed to capture server stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Transport("failed to capture server stdout".into()))?;

        tracing::debug!("Spawned server '{program}' (pid {:?})", child.id());

        let client = McpClient::new(BufReader::new(stdout), stdin, timeout);
        Ok((
            Self {
                program: program.to_string(),
                child,
            },
            client,
        ))
    }

    /// Wait up to `grace` for the server to exit, then kill it.
    pub async fn shutdown(mut self, grace: Duration) -> McpResult<()> {
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!("Server '{}' exited with {status}", self.program);
                Ok(())
            }
            Ok(Err(e)) => Err(McpError::Io(e)),
            Err(_) => {
                tracing::warn!(
                    "Server '{}' did not exit within {grace:?}, killing it",
                    self.program
                );
                self.child.kill().await.map_err(McpError::Io)
            }
        }
    }
}
