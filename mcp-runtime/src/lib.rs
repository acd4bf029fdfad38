//! MCP stdio runtime exposing the survey gateway as tools.

use std::sync::Arc;

use clap::Subcommand;
use serde_json::{Value, json};
use survey_bridge_core::{Gateway, GatewayConfig};

mod args;
mod diagnose;
mod format;
mod framing;
mod server;
mod tools;

pub use server::McpServer;

const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const MCP_SERVER_NAME: &str = "survey-bridge-mcp";

#[derive(Subcommand, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum McpCommands {
    /// Run the MCP server over stdio (default)
    #[default]
    Serve,
    /// Authenticate, list surveys and release the session key, then print a report
    Diagnose,
}

/// Entry point shared by the binary. Returns the process exit code.
pub async fn run(config: GatewayConfig, read_only: bool, command: McpCommands) -> i32 {
    let endpoint = config.endpoint.clone();
    let gateway = match Gateway::connect(config) {
        Ok(gateway) => gateway,
        Err(err) => {
            let payload = json!({
                "error": err.code(),
                "message": err.to_string(),
            });
            eprintln!("{}", to_pretty_json(&payload));
            return 1;
        }
    };

    match command {
        McpCommands::Serve => {
            let server = Arc::new(McpServer::with_gateway(gateway, read_only));
            match server.serve_stdio().await {
                Ok(()) => 0,
                Err(err) => {
                    tracing::error!(error = %err, "mcp server stopped");
                    let payload = json!({
                        "error": "mcp_server_error",
                        "message": err,
                    });
                    eprintln!("{}", to_pretty_json(&payload));
                    1
                }
            }
        }
        McpCommands::Diagnose => match diagnose::run_diagnostics(&gateway, &endpoint).await {
            Ok(report) => {
                println!("{}", to_pretty_json(&report));
                if report
                    .get("status")
                    .and_then(Value::as_str)
                    .is_some_and(|status| status == "ready")
                {
                    0
                } else {
                    2
                }
            }
            Err(err) => {
                let payload = json!({
                    "error": err.code(),
                    "message": err.to_string(),
                });
                eprintln!("{}", to_pretty_json(&payload));
                1
            }
        },
    }
}

fn to_pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
