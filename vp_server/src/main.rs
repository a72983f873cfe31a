//! Shared card table server.
//!
//! Serves the table API and push streams, restores users and tables from
//! the state file at startup and saves them periodically and on shutdown.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Error;
use log::info;
use pico_args::Arguments;
use vp_server::{
    api,
    config::ServerConfig,
    logging, metrics,
    persistence::{self, StateFile},
};
use vpoker::{
    TableManager,
    registry::{TableRegistry, UserRegistry},
};

const HELP: &str = "\
Run a shared card table server

USAGE:
  vp_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --state      PATH        State file                  [default: env STATE_PATH or /tmp/vpoker.json]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  STATE_PATH               State file location
  SAVE_INTERVAL_SECS       Seconds between state saves [default: 10]
  TABLE_MAX_SEATS          Seats per table [default: 3]
  TABLE_CHIPS_PER_STACK    Chips of each denomination per seat [default: 10]
  PUSH_BUFFER              Pending pushes kept per viewer [default: 32]
  KEEPALIVE_SECS           Idle seconds before a ping [default: 15]
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  RUST_LOG                 Log filter [default: info,hyper=warn]
";

struct Args {
    bind: Option<SocketAddr>,
    state_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        state_path: pargs.opt_value_from_str("--state")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.state_path)?;
    config.validate()?;
    info!("Starting table server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics at http://{}/metrics", addr);
    }

    let manager = Arc::new(TableManager::new(
        Arc::new(UserRegistry::new()),
        Arc::new(TableRegistry::new()),
        config.table.clone(),
    ));

    let state_file = StateFile::new(config.persistence.path.clone());
    match state_file.restore_into(&manager).await {
        Ok(true) => info!("Loaded state from {}", state_file.path().display()),
        Ok(false) => info!(
            "No state file at {}, starting empty",
            state_file.path().display()
        ),
        Err(e) => {
            return Err(anyhow::anyhow!(
                "Failed to load {}: {}",
                state_file.path().display(),
                e
            ));
        }
    }
    metrics::active_tables(manager.table_count().await);
    metrics::known_users(manager.user_count().await);

    let saver = tokio::spawn(persistence::save_loop(
        state_file.clone(),
        manager.clone(),
        config.persistence.save_interval(),
    ));

    let app = api::create_router(api::AppState {
        manager: manager.clone(),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    saver.abort();
    state_file
        .save_from(&manager)
        .await
        .map_err(|e| anyhow::anyhow!("Final save failed: {}", e))?;
    info!("State saved to {}", state_file.path().display());

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for CTRL+C: {}", e);
        // Without a handler, never trigger shutdown.
        std::future::pending::<()>().await;
    }
}
