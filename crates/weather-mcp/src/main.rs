//! Weather MCP server entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use weather_forecast::{ForecastConfig, GeminiForecaster};
use weather_mcp::config::init_logging;
use weather_mcp::protocol::ProtocolHandler;
use weather_mcp::tools;
use weather_mcp::transport::StdioTransport;
use weather_mcp::types::{InitializeResult, SUPPORTED_VERSIONS};

#[derive(Parser)]
#[command(
    name = "weather-mcp",
    about = "MCP server exposing a weather forecast tool over stdio",
    version
)]
struct Cli {
    /// Gemini API key. Falls back to GOOGLE_API_KEY.
    #[arg(long)]
    api_key: Option<String>,

    /// Gemini model. Falls back to GEMINI_MODEL, then gemini-2.0-flash.
    #[arg(long)]
    model: Option<String>,

    /// Upper bound on one forecast call, in seconds.
    #[arg(long, default_value_t = 60)]
    forecast_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   weather-mcp completions bash > ~/.local/share/bash-completion/completions/weather-mcp
    ///   weather-mcp completions zsh > ~/.zfunc/_weather-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let timeout = Duration::from_secs(cli.forecast_timeout_secs);
            let config =
                ForecastConfig::resolve(cli.api_key.as_deref(), cli.model.as_deref(), timeout)
                    .context("forecast backend is not configured")?;

            tracing::info!("Weather MCP server (model {})", config.model);

            let forecaster = Arc::new(GeminiForecaster::new(config)?);
            let registry = tools::default_registry(forecaster, timeout)?;
            let handler = ProtocolHandler::new(Arc::new(registry));
            let transport = StdioTransport::new(handler);
            transport.run().await?;
        }

        Commands::Info => {
            let capabilities = InitializeResult::default_result();
            let tools = tools::builtin_definitions();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "supported_versions": SUPPORTED_VERSIONS,
                "capabilities": capabilities.capabilities,
                "tools": tools,
                "tool_count": tools.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "weather-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}
