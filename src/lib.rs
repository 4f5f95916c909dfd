//! TOPOVIEW - Data-center topology viewer and alarm playback simulator
//!
//! The crate loads a device inventory and an alarm feed from CSV tables and
//! replays the feed against the inventory one alarm at a time, writing a full
//! snapshot of the inventory after every step so a topology view polling the
//! table sees the fault move through the plant. A power-off scenario first
//! pins the power-input devices into a failed state and restores the whole
//! inventory when the feed is exhausted.
//!
//! # Feature Flags
//!
//! - `web` (default): axum router, static file serving and the `topoview`
//!   binary. The simulation core compiles without it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use topoview::{Config, Scenario, ScenarioRunner, TokioPacer};
//!
//! # async fn demo() -> topoview::Result<()> {
//! topoview::init();
//!
//! let config = Arc::new(Config::from_file("topoview.yaml")?);
//! let runner = ScenarioRunner::new(config, TokioPacer);
//! let result = runner.run(Scenario::PowerOff).await;
//! println!("{}", result.message);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// CORE MODULES (always available)
// ============================================================================

/// Error types shared by every module
pub mod error;

/// Configuration management with YAML support and validation
pub mod config;

/// Device inventory loaded from the device table
pub mod device;

/// Ordered alarm feed loaded from the alarm table
pub mod feed;

/// Alarm table column synonyms and severity vocabulary
pub mod resolver;

/// Pause between playback steps
pub mod pacer;

/// Snapshot persistence of the device inventory
pub mod snapshot;

/// Single-active alarm playback state machine
pub mod playback;

/// Playback and power-off scenarios with per-destination run locks
pub mod scenario;

/// Saved topology documents
pub mod topology;

// ============================================================================
// WEB MODULE (feature-gated)
// ============================================================================

#[cfg(feature = "web")]
#[cfg_attr(docsrs, doc(cfg(feature = "web")))]
/// HTTP API and static file serving
pub mod web;

// ============================================================================
// PUBLIC RE-EXPORTS
// ============================================================================

pub use config::Config;
pub use device::{DeviceRecord, DeviceRegistry, DeviceStatus};
pub use error::{Result, TopoError};
pub use feed::{AlarmFeed, AlarmRecord};
pub use pacer::{InstantPacer, Pacer, TokioPacer};
pub use playback::{PlaybackEngine, PlaybackPhase, PlaybackReport};
pub use resolver::{ColumnResolver, Severity};
pub use scenario::{Scenario, ScenarioResult, ScenarioRunner};
pub use snapshot::{CsvSnapshot, SnapshotSink};
pub use topology::{TopologyFile, TopologyStore};

// ============================================================================
// VERSION INFORMATION
// ============================================================================

/// TOPOVIEW version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Default log filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "topoview=info,tower_http=info";

/// Install the tracing subscriber.
///
/// Honors `RUST_LOG` and falls back to [`DEFAULT_LOG_FILTER`]. Calling it
/// again, or after the embedding application installed its own subscriber,
/// is a no-op.
pub fn init() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let initialized = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_ok();

    if initialized {
        tracing::info!("TOPOVIEW {} initialized", VERSION);
    }
}
