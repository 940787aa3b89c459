//! Building blocks of the obstruction filter.
//!
//! Rate limiting, smoothing and the hysteresis decision are independent
//! concerns; `ObstructionDetector` composes them. Each piece is small enough
//! to test in isolation.

use std::time::Duration;

use crate::ObstructionState;

// ----------------------------------------------------------------------------
// RateGate
// ----------------------------------------------------------------------------

/// Drops samples that arrive faster than a configured rate.
///
/// The first sample is always accepted. A timestamp that does not move
/// forward from the last accepted one counts as "too soon" and is dropped.
#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    last_accepted: Option<Duration>,
}

impl RateGate {
    pub fn from_max_fps(max_fps: u32) -> Self {
        Self {
            min_interval: Duration::from_secs(1) / max_fps.max(1),
            last_accepted: None,
        }
    }

    /// Whether the sample at `timestamp` should be processed. Accepting a
    /// sample advances the gate; dropped samples leave it untouched.
    pub fn accept(&mut self, timestamp: Duration) -> bool {
        if let Some(last) = self.last_accepted {
            if timestamp.saturating_sub(last) < self.min_interval {
                return false;
            }
        }
        self.last_accepted = Some(timestamp);
        true
    }

    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

// ----------------------------------------------------------------------------
// EmaFilter
// ----------------------------------------------------------------------------

/// Exponential moving average over accepted samples.
///
/// Unseeded until the first sample: the first accepted sample becomes the
/// average exactly, later samples fold in with weight `alpha`.
#[derive(Debug)]
pub struct EmaFilter {
    alpha: f64,
    value: Option<f64>,
}

impl EmaFilter {
    /// `alpha` must be in (0, 1]; the detector config validates this.
    pub fn new(alpha: f64) -> Self {
        Self { alpha, value: None }
    }

    pub fn update(&mut self, sample: f64) -> f64 {
        let next = match self.value {
            None => sample,
            Some(prev) => self.alpha * sample + (1.0 - self.alpha) * prev,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

// ----------------------------------------------------------------------------
// Hysteresis
// ----------------------------------------------------------------------------

/// Two-threshold band. At or below `low` the lens reads as obscured, at or
/// above `high` it reads as clear; inside the band the previous state holds.
#[derive(Clone, Copy, Debug)]
pub struct Hysteresis {
    pub low: f64,
    pub high: f64,
}

impl Hysteresis {
    /// Pure decision: same inputs, same output.
    pub fn decide(&self, luma: f64, previous: ObstructionState) -> ObstructionState {
        if luma <= self.low {
            ObstructionState::Obscured
        } else if luma >= self.high {
            ObstructionState::Clear
        } else {
            previous
        }
    }
}
