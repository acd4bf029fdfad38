use std::time::Duration;

use clap::Parser;
use survey_bridge_core::config::DEFAULT_TIMEOUT_SECS;
use survey_bridge_core::{Credentials, GatewayConfig};
use survey_bridge_mcp_runtime::{McpCommands, run as run_mcp};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "survey-bridge-mcp",
    version,
    about = "MCP server for the survey platform's remote control API, over stdio"
)]
struct Cli {
    /// JSON-RPC endpoint, e.g. https://surveys.example.org/index.php/admin/remotecontrol
    #[arg(long, env = "SURVEY_API_URL")]
    api_url: String,

    /// Administrative user for the authenticate procedure
    #[arg(long, env = "SURVEY_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "SURVEY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Hide and refuse tools that modify data
    #[arg(long, env = "SURVEY_READ_ONLY")]
    read_only: bool,

    /// Per-request timeout for remote calls
    #[arg(long, env = "SURVEY_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Emit JSON log lines on stderr
    #[arg(long, env = "SURVEY_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<McpCommands>,
}

// stdout carries MCP frames; logs go to stderr.
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = GatewayConfig::new(
        cli.api_url,
        Credentials {
            username: cli.username,
            password: cli.password,
        },
    )
    .with_timeout(Duration::from_secs(cli.timeout_secs));

    let code = run_mcp(config, cli.read_only, cli.command.unwrap_or_default()).await;
    std::process::exit(code);
}
