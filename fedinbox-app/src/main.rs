use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fedinbox_client::{ClientStore, FileStore, GatewayClient, Inbox};
use fedinbox_common::observability::{LogConfig, init_logging};
use fedinbox_config::{FedinboxConfig, FedinboxConfigLoader};
use tracing::info;

const DEFAULT_CONFIG: &str = "fedinbox.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// YAML config file. `fedinbox.yaml` is used when present.
    #[arg(long, short, env = "FEDINBOX_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the timeline gateway.
    Serve {
        /// Overrides `gateway.port`.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Open the inbox in the terminal.
    Inbox,
}

fn load_config(path: Option<&PathBuf>) -> Result<FedinboxConfig> {
    let loader = match path {
        Some(path) => FedinboxConfigLoader::new().with_file(path),
        None => FedinboxConfigLoader::new().with_optional_file(DEFAULT_CONFIG),
    };
    loader.load().context("failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let mut cfg = load_config(cli.config.as_ref())?;

    // 2) Logging: the gateway also writes to stderr, the inbox only to file
    let (app_name, emit_stderr) = match cli.command {
        Command::Serve { .. } => ("fedinbox-gateway", true),
        Command::Inbox => ("fedinbox-inbox", false),
    };
    let log_path = init_logging(LogConfig {
        app_name,
        log_dir: cfg.logging.dir.clone(),
        emit_stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    info!(log = %log_path.display(), "Logging initialised");

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                cfg.gateway.port = port;
            }
            fedinbox_gateway::serve(&cfg.gateway).await
        }
        Command::Inbox => {
            let gateway = GatewayClient::from_settings(&cfg.client)?;
            let store_path = cfg.client.resolved_store_path();
            info!(gateway = ?gateway, store = %store_path.display(), "Opening inbox");
            let store = ClientStore::load(FileStore::open(store_path));
            fedinbox_tui::run_inbox(Inbox::new(Arc::new(gateway), store)).await
        }
    }
}
