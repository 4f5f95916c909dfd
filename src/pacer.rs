// src/pacer.rs - Simulation clock used between playback steps
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Performs the pause between two playback steps.
///
/// Production wiring sleeps on the tokio timer; tests substitute a pacer that
/// returns immediately so a whole feed plays back without real delay.
pub trait Pacer: Send + Sync {
    fn pause(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Real-time pacer backed by `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    fn pause(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Pacer that never waits and records every requested pause
#[derive(Debug, Clone, Default)]
pub struct InstantPacer {
    pauses: Arc<Mutex<Vec<Duration>>>,
}

impl InstantPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pauses requested so far, in order
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Pacer for InstantPacer {
    fn pause(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.pauses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        tokio::task::yield_now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_instant_pacer_records() {
        let pacer = InstantPacer::new();
        pacer.pause(Duration::from_secs(10)).await;
        pacer.pause(Duration::from_secs(3)).await;
        assert_eq!(
            pacer.pauses(),
            vec![Duration::from_secs(10), Duration::from_secs(3)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_pacer_sleeps() {
        let start = tokio::time::Instant::now();
        TokioPacer.pause(Duration::from_secs(3)).await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
