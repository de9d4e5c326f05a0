//! Chat relay binary: HTTP + WebSocket front end over an Ollama backend.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use visage::VisageConfig;
use visage::relay::{OllamaBackend, RelayServer};

/// Relay chat messages between avatars and a local model.
#[derive(Parser)]
#[command(name = "visage-relay", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the HTTP port.
    #[arg(long)]
    http_port: Option<u16>,

    /// Override the WebSocket port.
    #[arg(long)]
    ws_port: Option<u16>,

    /// Override the model name.
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = VisageConfig::load_or_default(cli.config.as_deref())?;
    if let Some(port) = cli.http_port {
        config.relay.http_port = port;
    }
    if let Some(port) = cli.ws_port {
        config.relay.ws_port = port;
    }
    if let Some(model) = cli.model {
        config.llm.model = model;
    }

    let _log_guard = visage::logging::init(&config.logging)?;
    info!(model = %config.llm.model, api = %config.llm.api_url, "visage-relay starting");

    let backend = Arc::new(OllamaBackend::new(&config.llm));
    let server = RelayServer::start(&config.relay, backend).await?;

    println!("HTTP      http://{}", server.http_addr());
    println!("WebSocket {}", server.ws_url());
    println!("Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    info!("received Ctrl+C, shutting down...");
    server.shutdown();
    Ok(())
}
