//! Weather MCP client. Spawns the server, asks for one forecast, prints it.

use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;

use weather_mcp::client::{ServerProcess, DEFAULT_REQUEST_TIMEOUT, SHUTDOWN_TIMEOUT};
use weather_mcp::config::{init_logging, resolve_server_command};
use weather_mcp::tools::{weather, CallRequest, ToolDescriptor};
use weather_mcp::types::MCP_VERSION;

#[derive(Parser)]
#[command(
    name = "weather-client",
    about = "Call the weather tool on a weather-mcp server over stdio",
    version
)]
struct Cli {
    /// Server binary to spawn. Falls back to WEATHER_MCP_SERVER, then a
    /// weather-mcp next to this binary, then weather-mcp on PATH.
    #[arg(long)]
    server: Option<String>,

    /// Extra arguments passed to the server.
    #[arg(long = "server-arg", allow_hyphen_values = true)]
    server_args: Vec<String>,

    #[arg(long, default_value = "Warsaw")]
    city: String,

    #[arg(long, default_value = "Poland")]
    country: String,

    /// Start date (YYYY-MM-DD). Empty lets the server use today.
    #[arg(long, default_value = "2025-05-02")]
    from_date: String,

    /// End date (YYYY-MM-DD). Empty lets the server reuse the start date.
    #[arg(long, default_value = "2025-05-15")]
    to_date: String,

    /// Protocol version requested in the handshake.
    #[arg(long, default_value = MCP_VERSION)]
    protocol_version: String,

    /// Upper bound on each request to the server, in seconds.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let program = resolve_server_command(cli.server.as_deref());
    let timeout = Duration::from_secs(cli.timeout_secs);
    let (process, mut client) = ServerProcess::spawn(&program, &cli.server_args, timeout)?;

    let outcome = run(&mut client, &cli).await;

    client.close().await;
    drop(client);
    if let Err(e) = process.shutdown(SHUTDOWN_TIMEOUT).await {
        tracing::warn!("Server shutdown failed: {e}");
    }

    outcome
}

async fn run(client: &mut weather_mcp::client::ProcessClient, cli: &Cli) -> anyhow::Result<()> {
    client
        .initialize(&cli.protocol_version)
        .await
        .context("handshake failed")?;

    let definitions = client.list_tools().await.context("listing tools failed")?;
    let definition = definitions
        .iter()
        .find(|d| d.name == weather::TOOL_NAME)
        .with_context(|| format!("server does not offer the '{}' tool", weather::TOOL_NAME))?;
    let descriptor = ToolDescriptor::from_definition(definition)?;
    tracing::debug!(
        "Tool {} requires {:?}, accepts {:?}",
        descriptor.name,
        descriptor.required_names(),
        descriptor.optional_names()
    );

    let mut request = CallRequest::new(weather::TOOL_NAME)
        .arg("city", cli.city.as_str())
        .arg("country", cli.country.as_str());
    if !cli.from_date.is_empty() {
        request = request.arg("fromDate", cli.from_date.as_str());
    }
    if !cli.to_date.is_empty() {
        request = request.arg("toDate", cli.to_date.as_str());
    }

    let result = client
        .call_tool(&request)
        .await
        .context("weather call failed")?;

    if result.is_error {
        let message: Vec<&str> = result.texts().collect();
        bail!("weather tool reported an error: {}", message.join("\n"));
    }

    for text in result.texts() {
        println!("{text}");
    }

    Ok(())
}
