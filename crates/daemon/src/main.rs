// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `chengisd` — the CI daemon binary. Loads configuration from the
//! environment, wires up the job/build tables, agent registry, and
//! dispatcher, and serves the HTTP API until told to shut down.

use chengis_config::Config;
use chengis_daemon::AppState;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    chengis_config::init_logging(config.log_format, &config.log_level)?;

    info!(bind_addr = %config.bind_addr, "starting chengisd");

    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            tracing::debug!(?event, "build event");
        }
    });

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, events_tx);

    let worker_state = state.clone();
    tokio::spawn(chengis_daemon::queue_worker::run(worker_state));

    let app = chengis_daemon::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal()?)
        .await?;

    info!("chengisd shut down");
    Ok(())
}

async fn shutdown_signal() -> Result<impl std::future::Future<Output = ()>, std::io::Error> {
    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;
    Ok(async move {
        tokio::select! {
            _ = term.recv() => info!("received SIGTERM"),
            _ = int.recv() => info!("received SIGINT"),
        }
    })
}
