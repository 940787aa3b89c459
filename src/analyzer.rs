//! Serial analysis loop.
//!
//! One worker thread owns the source and the detector; state changes are
//! marshalled over a channel so display side effects stay on the consumer's
//! thread. The filter state is never touched concurrently.
//!
//! A frame that fails to produce is logged and skipped; continuity of the
//! stream is the source's problem, not the analyzer's. Stopping means
//! "stop receiving frames": set the flag, join, read the run counters.

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::detect::{DetectorConfig, ObstructionDetector};
use crate::ingest::FrameSource;
use crate::StateChange;

/// Counters for one analysis run.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunStats {
    /// Frames pulled from the source.
    pub frames_seen: u64,
    /// Samples that passed the detector's rate gate.
    pub samples_accepted: u64,
    /// State transitions emitted.
    pub transitions: u64,
    /// Frames the source failed to produce.
    pub source_errors: u64,
}

/// Handle to a running analysis worker.
pub struct Analyzer {
    handle: JoinHandle<RunStats>,
    stop: Arc<AtomicBool>,
}

impl Analyzer {
    /// Spawn the analysis worker. Returns the handle and the channel on
    /// which transitions arrive.
    ///
    /// `pacing` is the wall-clock delay between frame pulls; the detector's
    /// rate gate stays the authoritative limiter. Pass `Duration::ZERO` to
    /// run a synthetic source flat out.
    pub fn spawn(
        mut source: Box<dyn FrameSource>,
        config: DetectorConfig,
        pacing: Duration,
    ) -> Result<(Self, Receiver<StateChange>)> {
        let mut detector = ObstructionDetector::new(config)?;
        source.connect()?;

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let (tx, rx) = mpsc::channel();

        let handle = std::thread::Builder::new()
            .name("lens-analyzer".to_string())
            .spawn(move || {
                let mut stats = RunStats::default();
                while !stop_flag.load(Ordering::Relaxed) {
                    match source.next_frame() {
                        Ok(frame) => {
                            stats.frames_seen += 1;
                            if let Some(change) = detector.process_frame(&frame) {
                                stats.transitions += 1;
                                if tx.send(change).is_err() {
                                    // Consumer went away; nothing left to do.
                                    break;
                                }
                            }
                        }
                        Err(e) => {
                            stats.source_errors += 1;
                            log::warn!("frame source error (continuing): {e:#}");
                        }
                    }
                    if !pacing.is_zero() {
                        std::thread::sleep(pacing);
                    }
                }
                stats.samples_accepted = detector.samples_accepted();
                stats
            })?;

        Ok((Self { handle, stop }, rx))
    }

    /// Ask the worker to stop pulling frames.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Wait for the worker and collect its counters.
    pub fn join(self) -> Result<RunStats> {
        self.handle
            .join()
            .map_err(|_| anyhow!("analyzer thread panicked"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{ScenePhase, StubConfig, StubSource};

    fn scene_source(phases: Vec<ScenePhase>) -> Box<dyn FrameSource> {
        Box::new(StubSource::new(StubConfig {
            name: "stub://analyzer-test".to_string(),
            width: 64,
            height: 48,
            phases,
            noise: 0,
            seed: Some(11),
            ..StubConfig::default()
        }))
    }

    fn tuned_config() -> DetectorConfig {
        DetectorConfig {
            low_threshold: 50.0,
            high_threshold: 90.0,
            ema_alpha: 0.3,
            ..DetectorConfig::default()
        }
    }

    #[test]
    fn worker_emits_scripted_transitions_then_stops() {
        let source = scene_source(vec![ScenePhase::uncovered(20), ScenePhase::covered(20)]);
        let (analyzer, transitions) =
            Analyzer::spawn(source, tuned_config(), Duration::ZERO).unwrap();

        let first = transitions.recv_timeout(Duration::from_secs(5)).unwrap();
        let second = transitions.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(!first.obscured);
        assert!(second.obscured);
        assert!(second.timestamp > first.timestamp);

        analyzer.stop();
        let stats = analyzer.join().unwrap();
        assert!(stats.frames_seen >= 21);
        assert!(stats.transitions >= 2);
        assert_eq!(stats.source_errors, 0);
    }

    #[test]
    fn dropping_the_receiver_ends_the_worker() {
        // The looping scene keeps producing transitions, so the worker hits
        // a failed send shortly after the receiver goes away.
        let source = scene_source(vec![ScenePhase::uncovered(10), ScenePhase::covered(10)]);
        let (analyzer, transitions) =
            Analyzer::spawn(source, tuned_config(), Duration::ZERO).unwrap();
        drop(transitions);
        let stats = analyzer.join().unwrap();
        assert!(stats.transitions >= 1);
    }

    #[test]
    fn invalid_config_fails_at_spawn() {
        let source = scene_source(Vec::new());
        let bad = DetectorConfig {
            ema_alpha: 0.0,
            ..DetectorConfig::default()
        };
        assert!(Analyzer::spawn(source, bad, Duration::ZERO).is_err());
    }
}
