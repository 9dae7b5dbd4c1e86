//! troved — the trove versioned-manifest server.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trove_server::{serve, ServerConfig, ShutdownCoordinator};

/// Trove Server Configuration
#[derive(Parser, Debug)]
#[command(name = "troved")]
#[command(author = "Trove Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Versioned-manifest tracking server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the server
    Start {
        /// Listen address (e.g., 0.0.0.0:7878)
        #[arg(short, long)]
        addr: Option<String>,

        /// Project root directory
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Configuration file
        #[arg(short, long, default_value = "troved.json")]
        config: PathBuf,

        /// Enable debug logging
        #[arg(long)]
        debug: bool,
    },

    /// Create the project root for a new server
    Init {
        /// Project root directory
        root: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            addr,
            root,
            config,
            debug,
        } => {
            let env_filter = if debug {
                tracing_subscriber::EnvFilter::new("debug")
            } else {
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(tracing::Level::INFO.into())
            };

            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer())
                .with(env_filter)
                .init();

            let mut config = ServerConfig::load(&config)?;
            if let Some(addr) = addr {
                config.listen_addr = addr;
            }
            if let Some(root) = root {
                config.project_root = root;
            }

            info!("starting troved on {}", config.listen_addr);
            info!("project root: {}", config.project_root.display());

            let shutdown = ShutdownCoordinator::from_signals();
            serve(config, shutdown).await
        }

        Commands::Init { root } => {
            std::fs::create_dir_all(&root)?;
            println!("Initialized project root at {}", root.display());
            println!("Start the server with:");
            println!("  troved start --root {}", root.display());
            Ok(())
        }
    }
}
