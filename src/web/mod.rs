// src/web/mod.rs - HTTP surface of the viewer
pub mod error;
pub mod handlers;
pub mod static_files;

use std::future::Future;
use std::sync::Arc;

use axum::{
    handler::HandlerWithoutStateExt,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::pacer::TokioPacer;
use crate::scenario::ScenarioRunner;
use crate::topology::TopologyStore;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub runner: Arc<ScenarioRunner<TokioPacer>>,
    pub topologies: TopologyStore,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let runner = Arc::new(ScenarioRunner::new(config.clone(), TokioPacer));
        let topologies = TopologyStore::new(config.saved_topology_dir());
        Self {
            config,
            runner,
            topologies,
        }
    }
}

/// API routes, with every other path served from `paths.root`
pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.config.paths.root)
        .not_found_service(static_files::not_found.into_service());

    Router::new()
        .route("/", get(static_files::index))
        .route("/health", get(handlers::health))
        .route("/api/devices", get(handlers::list_devices))
        .route("/api/device-status", get(handlers::device_status))
        .route("/api/topology-files", get(handlers::topology_files))
        .route("/api/save-topology", post(handlers::save_topology))
        .route("/api/delete-topology", post(handlers::delete_topology))
        .route("/api/power-off", get(handlers::power_off))
        .route("/api/alarm-playback", get(handlers::alarm_playback))
        .route("/api/cancel-scenario", post(handlers::cancel_scenario))
        .fallback_service(assets)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `server.bind` and serve until `shutdown` resolves
pub async fn start_server<F>(state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = state.config.server.bind;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Topology viewer listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
