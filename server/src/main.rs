mod error;
mod routes;
mod state;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use vidscribe::{load_config, Config, JobService, JobStore, LogFormat};

use state::AppState;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogFormat {
    Pretty,
    Json,
}

impl From<CliLogFormat> for LogFormat {
    fn from(value: CliLogFormat) -> Self {
        match value {
            CliLogFormat::Pretty => LogFormat::Pretty,
            CliLogFormat::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "vidscribe-server", version, about = "Video transcription job server")]
struct Cli {
    /// JSON config file; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `server.bind`.
    #[arg(long)]
    bind: Option<String>,

    #[arg(long, value_enum, default_value_t = CliLogFormat::Pretty)]
    log_format: CliLogFormat,
}

fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env_overrides();
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Everything `main` needs once startup has succeeded.
struct Started {
    store: JobStore,
    service: JobService,
    sweeper: Option<JoinHandle<()>>,
}

/// Opens the store and builds the service before any job is swept, so a
/// broken key or prompt leaves the database untouched.
async fn start(config: &Config) -> anyhow::Result<Started> {
    let store = JobStore::open(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path.display()))?;

    let service = JobService::from_config(config, store.clone()).await?;

    let status = service.status();
    let sweeper = match config.retention() {
        Some(max_age) => {
            status.sweep_expired(max_age)?;
            config
                .sweep_interval()
                .map(|interval| status.spawn_sweeper(max_age, interval))
        }
        None => None,
    };

    Ok(Started {
        store,
        service,
        sweeper,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    vidscribe::init_logging(cli.log_format.into())?;

    let config = load(&cli)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting vidscribe server");

    let Started {
        store,
        service,
        sweeper,
    } = start(&config).await?;
    let app = routes::router(AppState::new(service), config.server.max_upload_bytes());

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    info!(address = %config.server.bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    store.close()?;
    info!("Server stopped");
    Ok(())
}
