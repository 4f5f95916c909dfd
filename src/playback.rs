// src/playback.rs - Alarm playback engine
//
// Replays an alarm feed against the device registry one record at a time.
// At most one device carries alarm-derived state at any step: the device hit
// by the previous alarm is returned to normal before the next alarm is
// applied. A snapshot is written after every step, then the engine pauses.

use crate::device::{DeviceRegistry, DeviceStatus};
use crate::error::{Result, TopoError};
use crate::feed::{AlarmFeed, AlarmRecord};
use crate::pacer::Pacer;
use crate::snapshot::SnapshotSink;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle of one playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    /// No record consumed yet
    Idle,
    /// Traversing the feed
    Running,
    /// Every record consumed
    Completed,
    /// Stopped by the cancellation token; the last snapshot is final
    Cancelled,
    /// Stopped by a snapshot write failure
    Aborted,
}

impl PlaybackPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlaybackPhase::Completed | PlaybackPhase::Cancelled | PlaybackPhase::Aborted
        )
    }
}

/// Cursor and active device of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    /// Registry index holding alarm-derived state, if any
    pub active: Option<usize>,
    /// Index of the next feed record
    pub cursor: usize,
    pub phase: PlaybackPhase,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            active: None,
            cursor: 0,
            phase: PlaybackPhase::Idle,
        }
    }
}

/// What a single step did to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// Device returned to normal before the alarm was applied
    pub deactivated: Option<usize>,
    /// Device the alarm resolved to; `None` for an unmatched alarm
    pub matched: Option<usize>,
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackReport {
    pub steps: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub snapshots: usize,
    pub phase: PlaybackPhase,
}

/// Alarm playback state machine. Owns the registry for the length of a run.
#[derive(Debug)]
pub struct PlaybackEngine {
    registry: DeviceRegistry,
    state: PlaybackState,
    step_delay: Duration,
    separator: String,
    matched: usize,
    unmatched: usize,
    snapshots: usize,
}

impl PlaybackEngine {
    pub fn new(
        registry: DeviceRegistry,
        step_delay: Duration,
        separator: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            state: PlaybackState::default(),
            step_delay,
            separator: separator.into(),
            matched: 0,
            unmatched: 0,
            snapshots: 0,
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Direct registry access for scenario pre- and post-steps
    pub fn registry_mut(&mut self) -> &mut DeviceRegistry {
        &mut self.registry
    }

    pub fn into_registry(self) -> DeviceRegistry {
        self.registry
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn report(&self) -> PlaybackReport {
        PlaybackReport {
            steps: self.state.cursor,
            matched: self.matched,
            unmatched: self.unmatched,
            snapshots: self.snapshots,
            phase: self.state.phase,
        }
    }

    /// Apply one alarm to the registry without persisting it.
    ///
    /// The previously active device is cleared first, whether or not the new
    /// alarm matches anything. An unrecognized severity leaves the status as it
    /// is but still rewrites `error_info`.
    pub fn apply(&mut self, alarm: &AlarmRecord) -> StepOutcome {
        let deactivated = self.state.active.take();
        if let Some(previous) = deactivated {
            self.registry.set_status(previous, DeviceStatus::Normal, "");
        }

        let matched = self.registry.find_by_name(&alarm.device_name);
        match matched {
            Some(index) => {
                self.state.active = Some(index);
                self.matched += 1;
                let info = alarm.describe(&self.separator);
                match alarm.severity.status() {
                    Some(status) => self.registry.set_status(index, status, info),
                    None => self.registry.set_error_info(index, info),
                }
            }
            None => {
                self.unmatched += 1;
                warn!(
                    "Alarm #{} names unknown device '{}'",
                    self.state.cursor + 1,
                    alarm.device_name
                );
            }
        }

        StepOutcome { deactivated, matched }
    }

    /// Apply one alarm and persist the registry. Does not pause or move the cursor.
    pub fn step<S: SnapshotSink>(
        &mut self,
        alarm: &AlarmRecord,
        sink: &mut S,
    ) -> Result<StepOutcome> {
        if self.state.phase.is_terminal() {
            return Err(TopoError::Config(format!(
                "playback already {:?}",
                self.state.phase
            )));
        }
        self.state.phase = PlaybackPhase::Running;

        let outcome = self.apply(alarm);
        if let Err(e) = sink.write(&self.registry) {
            self.state.phase = PlaybackPhase::Aborted;
            return Err(e);
        }
        self.snapshots += 1;
        debug!(
            "Step {}: '{}' -> {:?}",
            self.state.cursor + 1,
            alarm.device_name,
            outcome.matched
        );
        Ok(outcome)
    }

    /// Play the whole feed.
    ///
    /// Each step is applied, persisted, then followed by the configured pause.
    /// Cancellation is honoured before a step starts and during the pause;
    /// either way the snapshot already on disk is the final one.
    pub async fn run<S, P>(
        &mut self,
        feed: &AlarmFeed,
        sink: &mut S,
        pacer: &P,
        cancel: &CancellationToken,
    ) -> Result<PlaybackReport>
    where
        S: SnapshotSink + Send,
        P: Pacer,
    {
        info!(
            "Playing back {} alarms against {} devices ({:?} per step)",
            feed.len(),
            self.registry.len(),
            self.step_delay
        );

        while let Some(alarm) = feed.get(self.state.cursor) {
            if cancel.is_cancelled() {
                self.state.phase = PlaybackPhase::Cancelled;
                break;
            }

            self.step(alarm, sink)?;

            let interrupted = tokio::select! {
                biased;
                _ = cancel.cancelled() => true,
                _ = pacer.pause(self.step_delay) => false,
            };
            self.state.cursor += 1;

            if interrupted {
                self.state.phase = PlaybackPhase::Cancelled;
                break;
            }
        }

        if !self.state.phase.is_terminal() {
            self.state.phase = PlaybackPhase::Completed;
        }

        let report = self.report();
        info!(
            "Playback {:?} after {} steps ({} matched, {} unmatched)",
            report.phase, report.steps, report.matched, report.unmatched
        );
        Ok(report)
    }
}
