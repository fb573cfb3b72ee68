//! Configuration loading and resolution.

use std::path::PathBuf;

/// Env var naming the server binary the client should spawn.
pub const SERVER_ENV: &str = "WEATHER_MCP_SERVER";

pub const SERVER_BINARY: &str = "weather-mcp";

/// Resolve the server command for the client.
///
/// Explicit flag, then `WEATHER_MCP_SERVER`, then a `weather-mcp` binary next
/// to the running executable, then `weather-mcp` on `PATH`.
pub fn resolve_server_command(explicit: Option<&str>) -> String {
    resolve_server_command_with(explicit, |key| std::env::var(key).ok())
}

pub fn resolve_server_command_with(
    explicit: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    if let Some(env_path) = lookup(SERVER_ENV).filter(|p| !p.trim().is_empty()) {
        return env_path;
    }

    if let Some(sibling) = sibling_binary().filter(|p| p.exists()) {
        return sibling.display().to_string();
    }

    SERVER_BINARY.to_string()
}

fn sibling_binary() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let name = format!("{SERVER_BINARY}{}", std::env::consts::EXE_SUFFIX);
    Some(exe.parent()?.join(name))
}

/// Install the stderr `tracing` subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
