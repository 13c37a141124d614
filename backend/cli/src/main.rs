mod check_cmd;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use snaptask_config::AppConfig;
use snaptask_gateway::{start_server, AppState};
use snaptask_pipeline::Orchestrator;

#[derive(Parser)]
#[command(name = "snaptask")]
#[command(about = "snaptask — turn a screenshot into a to-do entry")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the snaptask HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Manually exercise the vision and task-store integrations with a
    /// local image file
    Check {
        /// Path to the image file to analyze
        image_path: PathBuf,
        /// Analyze only; skip creating the task
        #[arg(long)]
        skip_todoist: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    snaptask_logging::init_logger(&config.log_dir, &config.log_level);

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);
            info!("starting with config: {:?}", config.redacted());

            let addr: SocketAddr = format!("{}:{}", config.bind_address, port).parse()?;
            let state = AppState {
                orchestrator: Arc::new(Orchestrator::new(&config)),
            };
            start_server(addr, state).await?;
        }
        Commands::Check { image_path, skip_todoist } => {
            check_cmd::run(&config, &image_path, skip_todoist).await?;
        }
    }

    Ok(())
}
