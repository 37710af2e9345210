mod analyze_cmd;
mod status_cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use framewise_config::{load_and_prepare, resolve_config_path, FramewiseConfig};
use framewise_logging::WorkerGuard;

#[derive(Parser)]
#[command(name = "framewise")]
#[command(about = "framewise: frame, speech and vision analysis for uploaded media")]
#[command(version)]
struct Cli {
    /// Path to config.yaml (defaults to $FRAMEWISE_CONFIG, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Query a running server's health endpoint
    Status {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Analyse a local video, image or audio file and print the report
    Analyze {
        file: PathBuf,
        /// Extra direction appended to the vision instruction
        #[arg(long, default_value = "")]
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Serve { port } => {
            let mut config = load_and_prepare(&config_path).await?;
            if let Some(port) = port {
                config.server.get_or_insert_with(Default::default).port = Some(port);
            }
            let _log_guard = init_logging(&config);
            info!(
                addr = %config.listen_addr(),
                work_dir = %config.work_dir().display(),
                transcription = config.assemblyai_api_key().is_some(),
                "Starting framewise"
            );
            framewise_gateway::start_server(&config).await?;
        }
        Commands::Status { port } => {
            status_cmd::run(&config_path, port).await?;
        }
        Commands::Analyze { file, prompt } => {
            let config = load_and_prepare(&config_path).await?;
            let _log_guard = init_logging(&config);
            analyze_cmd::run(&config, &file, &prompt).await?;
        }
    }

    Ok(())
}

fn init_logging(config: &FramewiseConfig) -> Option<WorkerGuard> {
    framewise_logging::init_logger(config.log_dir(), config.log_level())
}
