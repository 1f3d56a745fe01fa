//! Seven server - serves the challenge progress API.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use seven_core::TaskCatalog;
use seven_server::{Api, Server, ServerConfig};
use seven_storage::JsonStorage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seven-server")]
#[command(about = "Seven-day challenge progress server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding users.json and tasks.json
    #[arg(short, long, default_value = ".seven")]
    data_dir: std::path::PathBuf,

    /// Log filter (e.g. "info", "seven_progress=debug")
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Accepted request origin; repeat for several. Defaults to the
    /// built-in list.
    #[arg(long = "allowed-origin")]
    allowed_origins: Vec<String>,

    /// Do not write the sample catalog into a new data directory
    #[arg(long)]
    no_seed: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve requests on stdin/stdout
    Stdio,

    /// Serve requests on a Unix socket
    Socket {
        /// Socket path
        path: std::path::PathBuf,
    },

    /// Print server info
    Info,
}

fn init_logging(level: &str) {
    // Logs go to stderr; stdout carries responses in stdio mode.
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut config = ServerConfig {
        data_dir: cli.data_dir,
        seed_catalog: !cli.no_seed,
        ..Default::default()
    };
    if !cli.allowed_origins.is_empty() {
        config.allowed_origins = cli.allowed_origins;
    }

    if let Commands::Info = cli.command {
        println!("{} server v{}", config.server_name, config.version);
        println!("Data directory: {}", config.data_dir.display());
        println!("Transport: stdio / Unix socket");
        println!("Allowed origins:");
        for origin in &config.allowed_origins {
            println!("  - {}", origin);
        }
        return Ok(());
    }

    let storage = JsonStorage::new(&config.data_dir).await?;
    if config.seed_catalog && storage.seed_catalog(&TaskCatalog::sample()).await? {
        info!("Seeded sample catalog");
    }

    let api = Api::new(Arc::new(storage), config);
    let server = Server::new(api);

    match cli.command {
        Commands::Stdio => server.start_with_stdio().await?,
        Commands::Socket { path } => server.start_with_socket(&path).await?,
        Commands::Info => {}
    }

    Ok(())
}
