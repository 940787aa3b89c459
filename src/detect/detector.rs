//! The obstruction detector: rate gate, EMA smoothing and hysteresis,
//! composed into a transition-only signal.

use anyhow::{anyhow, Result};
use std::time::Duration;

use super::filter::{EmaFilter, Hysteresis, RateGate};
use crate::frame::LumaFrame;
use crate::{ObstructionState, StateChange};

/// Detector tuning.
///
/// Thresholds are in luminance units (0..255 scale). The defaults are the
/// conservative ones for a generic sensor; daemons usually override them
/// after reading real covered/uncovered levels off their camera.
#[derive(Clone, Debug)]
pub struct DetectorConfig {
    /// Smoothed luminance at or below this reads as obscured.
    pub low_threshold: f64,
    /// Smoothed luminance at or above this reads as clear.
    pub high_threshold: f64,
    /// EMA weight of the newest sample, in (0, 1].
    pub ema_alpha: f64,
    /// Samples arriving faster than this are dropped.
    pub max_fps: u32,
    /// Sample every n-th pixel of every n-th row when reading frames.
    pub sample_stride: usize,
    /// Resolution hint for sources that synthesize or scale frames.
    pub target_width: u32,
    pub target_height: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            low_threshold: 20.0,
            high_threshold: 30.0,
            ema_alpha: 0.2,
            max_fps: 10,
            sample_stride: 4,
            target_width: 640,
            target_height: 480,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(anyhow!("ema_alpha must be in (0, 1]"));
        }
        if self.high_threshold <= self.low_threshold {
            return Err(anyhow!("high_threshold must be greater than low_threshold"));
        }
        if self.max_fps == 0 {
            return Err(anyhow!("max_fps must be >= 1"));
        }
        if self.sample_stride == 0 {
            return Err(anyhow!("sample_stride must be >= 1"));
        }
        Ok(())
    }
}

/// Debounced lens-obstruction detector.
///
/// Feed it luminance samples (or whole frames); it answers with a
/// `StateChange` only when the debounced state flips. Dropped samples and
/// in-band samples produce nothing.
pub struct ObstructionDetector {
    config: DetectorConfig,
    gate: RateGate,
    ema: EmaFilter,
    band: Hysteresis,
    state: ObstructionState,
    samples_accepted: u64,
}

impl ObstructionDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        let gate = RateGate::from_max_fps(config.max_fps);
        let ema = EmaFilter::new(config.ema_alpha);
        let band = Hysteresis {
            low: config.low_threshold,
            high: config.high_threshold,
        };
        Ok(Self {
            config,
            gate,
            ema,
            band,
            state: ObstructionState::Unknown,
            samples_accepted: 0,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Current debounced state.
    pub fn state(&self) -> ObstructionState {
        self.state
    }

    /// Smoothed luminance, `None` until the first accepted sample.
    pub fn smoothed_luma(&self) -> Option<f64> {
        self.ema.value()
    }

    /// Samples that passed the rate gate so far.
    pub fn samples_accepted(&self) -> u64 {
        self.samples_accepted
    }

    /// Feed one luminance sample with its capture timestamp.
    pub fn process_sample(&mut self, sample: f64, timestamp: Duration) -> Option<StateChange> {
        if !self.gate.accept(timestamp) {
            return None;
        }
        self.samples_accepted += 1;

        let smoothed = self.ema.update(sample);
        let decided = self.band.decide(smoothed, self.state);
        if decided == self.state {
            return None;
        }
        self.state = decided;
        Some(StateChange {
            obscured: decided == ObstructionState::Obscured,
            smoothed_luma: smoothed,
            timestamp,
        })
    }

    /// Sample a frame at the configured stride and feed its mean luminance.
    pub fn process_frame(&mut self, frame: &LumaFrame) -> Option<StateChange> {
        self.process_sample(frame.mean_luma(self.config.sample_stride), frame.timestamp)
    }

    /// Forget all filter state, as if analysis had just started.
    pub fn reset(&mut self) {
        self.gate.reset();
        self.ema.reset();
        self.state = ObstructionState::Unknown;
        self.samples_accepted = 0;
    }
}
