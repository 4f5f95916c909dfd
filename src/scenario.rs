// src/scenario.rs - Scenario entry points: ordinary playback and power-off
use crate::config::{Config, PowerOffConfig};
use crate::device::{DeviceField, DeviceRegistry, DeviceStatus};
use crate::error::{Result, TopoError};
use crate::feed::AlarmFeed;
use crate::pacer::{Pacer, TokioPacer};
use crate::playback::{PlaybackEngine, PlaybackPhase, PlaybackReport};
use crate::snapshot::{CsvSnapshot, SnapshotSink};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Top-level simulations that can be triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Replay the alarm feed into the sibling snapshot table
    Playback,
    /// Cut mains power, replay the feed into the device table, then restore
    PowerOff,
}

impl Scenario {
    /// Label used in result messages
    pub fn label(&self) -> &'static str {
        match self {
            Scenario::Playback => "告警回放",
            Scenario::PowerOff => "模拟断电",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Playback => f.write_str("playback"),
            Scenario::PowerOff => f.write_str("power-off"),
        }
    }
}

/// Response body of a scenario trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub success: bool,
    pub message: String,
}

impl ScenarioResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Pin the structural pre-conditions of a power cut.
///
/// Power-input devices go to `error`; devices on the standby supply path keep
/// their status but get a waiting message. None of these become the active
/// device, so the playback loop never clears them. Returns the number of
/// devices touched in each group.
pub fn cut_mains_power(registry: &mut DeviceRegistry, config: &PowerOffConfig) -> (usize, usize) {
    let inputs = registry.find_by_predicate(DeviceField::Type, &config.power_input_type);
    for &index in &inputs {
        registry.set_status(index, DeviceStatus::Error, config.power_input_message.as_str());
    }

    let standby = registry.find_by_predicate(DeviceField::Notes, &config.standby_notes);
    for &index in &standby {
        registry.set_error_info(index, config.standby_message.as_str());
    }

    (inputs.len(), standby.len())
}

/// Runs scenarios against the configured tables.
///
/// Runs that target the same snapshot destination are serialized; a second
/// trigger waits until the first one has finished.
pub struct ScenarioRunner<P: Pacer = TokioPacer> {
    config: Arc<Config>,
    pacer: P,
    run_locks: DashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>,
    cancel: Mutex<CancellationToken>,
}

impl<P: Pacer> ScenarioRunner<P> {
    pub fn new(config: Arc<Config>, pacer: P) -> Self {
        Self {
            config,
            pacer,
            run_locks: DashMap::new(),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Stop every in-flight run at its next pause, including runs still waiting
    /// for their destination. Later runs are unaffected.
    pub fn cancel(&self) {
        let mut current = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = CancellationToken::new();
        info!("Cancellation requested for running scenarios");
    }

    /// Run a scenario to completion and fold the outcome into a result body.
    pub async fn run(&self, scenario: Scenario) -> ScenarioResult {
        match self.execute(scenario).await {
            Ok(report) => {
                info!("Scenario {} finished: {:?}", scenario, report);
                match scenario {
                    Scenario::PowerOff => ScenarioResult::success("模拟断电成功"),
                    Scenario::Playback => ScenarioResult::success(format!(
                        "告警回放完成，共{}条告警，{}条未匹配",
                        report.steps, report.unmatched
                    )),
                }
            }
            Err(e) => {
                error!("Scenario {} failed: {}", scenario, e);
                ScenarioResult::failure(format!("{}失败: {}", scenario.label(), e))
            }
        }
    }

    /// Run a scenario and return the typed outcome.
    ///
    /// Source errors abort before anything is written. A failed snapshot write
    /// stops the run and leaves the snapshots already written in place. A
    /// cancelled run reports [`TopoError::Cancelled`]; for power-off the final
    /// reset is skipped so the last step's snapshot stands.
    pub async fn execute(&self, scenario: Scenario) -> Result<PlaybackReport> {
        let (destination, delay) = match scenario {
            Scenario::Playback => (
                self.config.playback_snapshot(),
                self.config.playback.step_delay(),
            ),
            Scenario::PowerOff => (
                self.config.power_off_snapshot(),
                self.config.power_off.step_delay(),
            ),
        };

        let lock = self
            .run_locks
            .entry(destination.clone())
            .or_default()
            .value()
            .clone();
        let cancel = self
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        // Waiting for the destination is cancellable as well
        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(
                    "Scenario {} cancelled while waiting for {}",
                    scenario,
                    destination.display()
                );
                return Err(TopoError::Cancelled { steps: 0 });
            }
            guard = lock.lock() => guard,
        };

        info!("Starting scenario {} -> {}", scenario, destination.display());

        let registry = DeviceRegistry::load(self.config.device_csv())?;
        let feed = AlarmFeed::load(self.config.alarm_csv(), &self.config.feed)?;
        let mut sink = CsvSnapshot::new(destination);

        match scenario {
            Scenario::Playback => {
                self.play(registry, &feed, &mut sink, delay, &cancel).await
            }
            Scenario::PowerOff => {
                self.power_off(registry, &feed, &mut sink, delay, &cancel).await
            }
        }
    }

    async fn play<S: SnapshotSink + Send>(
        &self,
        registry: DeviceRegistry,
        feed: &AlarmFeed,
        sink: &mut S,
        delay: Duration,
        cancel: &CancellationToken,
    ) -> Result<PlaybackReport> {
        let separator = self.config.feed.info_separator.as_str();
        let mut engine = PlaybackEngine::new(registry, delay, separator);
        let report = engine.run(feed, sink, &self.pacer, cancel).await?;
        finished(report)
    }

    async fn power_off<S: SnapshotSink + Send>(
        &self,
        registry: DeviceRegistry,
        feed: &AlarmFeed,
        sink: &mut S,
        delay: Duration,
        cancel: &CancellationToken,
    ) -> Result<PlaybackReport> {
        let separator = self.config.feed.info_separator.as_str();
        let mut engine = PlaybackEngine::new(registry, delay, separator);

        let (inputs, standby) = cut_mains_power(engine.registry_mut(), &self.config.power_off);
        info!("Power cut: {} input devices down, {} on standby path", inputs, standby);

        let report = finished(engine.run(feed, sink, &self.pacer, cancel).await?)?;

        engine.registry_mut().reset_all();
        sink.write(engine.registry())?;
        info!("Power restored, {} devices reset", engine.registry().len());

        Ok(PlaybackReport {
            snapshots: report.snapshots + 1,
            ..report
        })
    }
}

fn finished(report: PlaybackReport) -> Result<PlaybackReport> {
    match report.phase {
        PlaybackPhase::Cancelled => Err(TopoError::Cancelled { steps: report.steps }),
        _ => Ok(report),
    }
}
