mod fusion;
mod mcp;
mod settings;

use clap::Parser;
use fusion::{FusionClient, FusionConfig, DEFAULT_BASE_URL};
use log::{error, info};
use mcp::McpServer;
use settings::Settings;
use std::process;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, env = "FUSION_CONFIG")]
    config: Option<String>,

    /// Fusion REST API base URL (e.g., http://localhost:8697)
    #[arg(short = 'b', long, env = "FUSION_BASE_URL")]
    base_url: Option<String>,

    /// Fusion REST API username (reserved; not sent with requests yet)
    #[arg(short = 'u', long, env = "FUSION_USERNAME")]
    username: Option<String>,

    /// Fusion REST API password
    #[arg(short = 'P', long, env = "FUSION_PASSWORD")]
    password: Option<String>,

    /// Log filter (error, warn, info, debug, trace)
    #[arg(short = 'L', long, env = "FUSION_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the JSON-RPC stream.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = match Settings::new(args.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // Override settings with CLI arguments if provided
    if let Some(base_url) = args.base_url {
        settings.base_url = Some(base_url);
    }
    if let Some(username) = args.username {
        settings.username = Some(username);
    }
    if let Some(password) = args.password {
        settings.password = Some(password);
    }

    if let Err(e) = settings.validate() {
        error!("Configuration error: {}", e);
        process::exit(1);
    }

    let config = FusionConfig {
        base_url: settings
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        username: settings.username,
        password: settings.password,
    };

    info!("Using VMware Fusion API at {}", config.base_url);

    let client = match FusionClient::new(config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create client: {}", e);
            process::exit(1);
        }
    };

    let mut server = McpServer::new(client);

    info!("Starting MCP server (stdio transport)...");
    if let Err(e) = server.run_stdio().await {
        error!("Server error: {}", e);
        process::exit(1);
    }
}
