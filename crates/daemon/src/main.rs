use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use drivegate_core::oauth::{AUTHORIZATION_ENDPOINT, TOKEN_ENDPOINT};
use drivegate_daemon::config::{self, DaemonConfig};
use drivegate_daemon::drive::{self, GoogleDrive};
use drivegate_daemon::http;
use drivegate_daemon::state::AppState;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "drivegate", version, about = "Google Drive login/upload/download proxy")]
struct Args {
    /// Listen address, e.g. 127.0.0.1:5000
    #[arg(long, env = "DRIVEGATE_LISTEN", default_value = "127.0.0.1:5000")]
    listen: SocketAddr,

    /// JSON settings file with `GoogleDrive` and `FormOptions` sections.
    #[arg(long, env = "DRIVEGATE_SETTINGS", default_value = "appsettings.json")]
    settings: PathBuf,

    /// File that receives the raw OAuth token response.
    #[arg(long, env = "DRIVEGATE_TOKEN_FILE", default_value = "google-token.json")]
    token_file: PathBuf,

    #[arg(long, env = "DRIVEGATE_AUTHORIZATION_ENDPOINT", default_value = AUTHORIZATION_ENDPOINT)]
    authorization_endpoint: String,

    #[arg(long, env = "DRIVEGATE_TOKEN_ENDPOINT", default_value = TOKEN_ENDPOINT)]
    token_endpoint: String,

    /// Mount the Drive routes under this path, e.g. /api/drive
    #[arg(long, env = "DRIVEGATE_ROUTE_PREFIX")]
    route_prefix: Option<String>,

    /// Allowed CORS origin (repeatable, comma-separated in the env var). `*` allows any.
    #[arg(
        long = "cors-origin",
        env = "DRIVEGATE_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:4200"
    )]
    cors_origins: Vec<String>,

    /// HTTPS port to redirect plain-HTTP requests to (behind a TLS proxy).
    #[arg(long, env = "DRIVEGATE_HTTPS_PORT")]
    https_port: Option<u16>,

    /// Log level (env-filter syntax).
    #[arg(long, env = "DRIVEGATE_LOG", default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    drive::install_crypto_provider();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let settings = config::load_settings(&args.settings)?;

    let config = DaemonConfig {
        listen: args.listen,
        token_file: args.token_file,
        authorization_endpoint: args.authorization_endpoint,
        token_endpoint: args.token_endpoint,
        route_prefix: args.route_prefix.unwrap_or_default(),
        cors_origins: args.cors_origins,
        https_port: args.https_port,
    };
    info!("starting drivegate with config: {:?}", config);

    if config.https_port.is_none() {
        warn!("no https port configured; HTTPS redirection is disabled");
    }

    let listen = config.listen;
    let state = AppState::new(config, settings, Arc::new(GoogleDrive::new()))?;
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("bind {listen}"))?;
    info!("listening on http://{}", listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c, graceful shutdown disabled: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
