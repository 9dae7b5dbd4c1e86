//! trove — client for the trove versioned-manifest server.
//!
//! Every subcommand maps 1:1 to a server command. Success prints a
//! confirmation with the resulting version; any failure prints a specific
//! message and exits non-zero.

mod connection;
mod ops;
mod workspace;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workspace::Workspace;

#[derive(Parser, Debug)]
#[command(name = "trove")]
#[command(author = "Trove Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Versioned-manifest tracking client", long_about = None)]
struct Cli {
    /// Server address (overrides the workspace configuration)
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Workspace directory (defaults to the current directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new project on the server and initialize this workspace
    CreateProject {
        /// Project name
        name: String,
    },

    /// Send every local change to the server
    Push,

    /// Send previously staged changes to the server
    Commit,

    /// Fetch a project's manifest and files into this workspace
    Checkout {
        /// Project name
        name: String,
    },

    /// Print a project's current version number
    CurrentVersion {
        /// Project name (defaults to this workspace's project)
        name: Option<String>,
    },

    /// Revert the project to its previous recorded version
    Rollback,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_filter = if cli.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    let root = cli.dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let workspace = Workspace::new(root);

    match run(&cli, &workspace).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, workspace: &Workspace) -> trove_core::Result<()> {
    let addr = match &cli.server {
        Some(addr) => addr.clone(),
        None => workspace.load_config()?.server_addr,
    };

    match &cli.command {
        Commands::CreateProject { name } => ops::create_project(workspace, &addr, name).await,
        Commands::Push => ops::push(workspace, &addr).await,
        Commands::Commit => ops::commit(workspace, &addr).await,
        Commands::Checkout { name } => ops::checkout(workspace, &addr, name).await,
        Commands::CurrentVersion { name } => {
            ops::current_version(workspace, &addr, name.as_deref()).await
        }
        Commands::Rollback => ops::rollback(workspace, &addr).await,
    }
}
