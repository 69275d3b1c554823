//! # viamond: VIA monitor daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and initialise logging
//! - Decide from `ROOM_SYSTEM` and the system id whether this controller
//!   monitors its room
//! - Construct the VIA connector and the event publisher
//! - Start one supervised monitor per device
//! - Serve the status API and shut everything down on SIGINT/SIGTERM
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod publisher;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use viamon_adapter_http_axum::state::AppState;
use viamon_adapter_via::TcpConnector;
use viamon_app::monitor::Fleet;

use crate::config::{Config, LoggingConfig};
use crate::publisher::Publisher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_tracing(&config.logging);

    let devices = config.monitored_devices()?;
    let cancel = CancellationToken::new();
    let publisher = Publisher::start(config.mqtt.as_ref(), cancel.child_token());
    let connector = Arc::new(TcpConnector::new(config.via.clone()));
    let generating_system = config.system.system_id.clone().unwrap_or_default();

    let fleet = Arc::new(Fleet::start(
        devices,
        &connector,
        &publisher,
        &generating_system,
        config.monitor.policy(),
    ));

    let app = viamon_adapter_http_axum::router::build(AppState::new(Arc::clone(&fleet)));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "viamond listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    fleet.shutdown().await;
    cancel.cancel();
    tracing::info!("viamond stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let (filter, rejected) = match EnvFilter::try_new(&logging.filter) {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new("info"), Some(err)),
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    if let Some(err) = rejected {
        tracing::warn!(%err, filter = %logging.filter, "invalid log filter, using `info`");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown requested");
}
