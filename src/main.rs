use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use topoview::{web, Config};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    topoview::init();

    info!("Topoview v{} starting", topoview::VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("failed to load configuration from {}", path))?,
        None => {
            info!("No configuration file given, using defaults");
            Config::default()
        }
    };
    let config = Arc::new(config);
    info!(
        "Serving {} with devices from {}",
        config.paths.root.display(),
        config.device_csv().display()
    );

    let state = web::AppState::new(config.clone());
    state.topologies.ensure_dir().await.with_context(|| {
        format!(
            "cannot create topology directory {}",
            state.topologies.dir().display()
        )
    })?;

    let runner = state.runner.clone();
    let shutdown = async move {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
        runner.cancel();
    };

    web::start_server(state, shutdown)
        .await
        .context("HTTP server failed")?;

    info!("Topoview stopped");
    Ok(())
}
