//! Photo Gateway
//!
//! Front door of the photo-sharing application.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                     GATEWAY                       │
//!     Client Request     │  ┌───────────┐   ┌──────────┐   ┌────────────┐   │
//!     ───────────────────┼─▶│access log │──▶│ routing  │──▶│   proxy    │───┼──▶ photo / authentication /
//!                        │  │  (begin)  │   │ (prefix) │   │ dispatcher │   │    profile / vote / comment
//!                        │  └───────────┘   └────┬─────┘   └────────────┘   │
//!                        │                       │ no match                  │
//!                        │                       ▼                           │
//!                        │                ┌─────────────┐                    │
//!                        │                │ static files│ (SPA fallback)     │
//!                        │                └─────────────┘                    │
//!     Client Response    │  ┌───────────┐                                    │
//!     ◀──────────────────┼──│access log │ (one line once the body completes) │
//!                        │  │ (commit)  │                                    │
//!                        │  └───────────┘                                    │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use photo_gateway::config::{load_environment, load_settings, GatewaySettings};
use photo_gateway::lifecycle::signals::spawn_signal_listener;
use photo_gateway::observability::logging;
use photo_gateway::{Gateway, GatewayError, Shutdown};

#[derive(Parser)]
#[command(name = "photo-gateway")]
#[command(about = "Path-prefix gateway for the photo-sharing services", long_about = None)]
struct Cli {
    /// Env file consulted for variables the environment does not set.
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Optional TOML file with timeouts, asset root, access log path.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway stopped");
            eprintln!("photo-gateway: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), GatewayError> {
    let settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => GatewaySettings::default(),
    };

    logging::init(&settings.observability.log_level);
    tracing::info!("photo-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let env = load_environment(&cli.env_file)?;
    let gateway = Gateway::start(&env, settings).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    gateway.run(server_shutdown).await
}
