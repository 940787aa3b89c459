//! Lens obstruction sentinel.
//!
//! This crate watches a stream of camera luminance frames and raises a
//! debounced signal when the lens is physically covered (a finger over the
//! camera, a cap left on). The signal drives a fade-style overlay indicator.
//!
//! # Architecture
//!
//! - `frame`: owned luminance plane with sparse mean sampling
//! - `ingest`: frame sources (synthetic stub, local still images)
//! - `detect`: rate gate + EMA smoothing + hysteresis, transition-only output
//! - `analyzer`: serial analysis loop, transitions marshalled over a channel
//! - `overlay`: alpha-fade model and terminal indicator
//! - `journal`: append-only JSON-lines record of emitted transitions
//! - `config`: TOML file + environment configuration for the daemon
//!
//! The detector is deliberately dumb: one smoothed scalar against a two
//! threshold band. A dark room and a covered lens are indistinguishable to
//! it, which is acceptable for the indicator use case it serves.

use std::time::Duration;

pub mod analyzer;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod journal;
pub mod overlay;

pub use analyzer::{Analyzer, RunStats};
pub use config::{OverlaySettings, SentinelConfig};
pub use detect::{DetectorConfig, EmaFilter, Hysteresis, ObstructionDetector, RateGate};
pub use frame::LumaFrame;
pub use ingest::{
    open_source, FileConfig, FileSource, FrameSource, ScenePhase, SourceStats, StubConfig,
    StubSource,
};
pub use journal::{Journal, TransitionRecord};
pub use overlay::{Indicator, OverlayFade};

// -------------------- Obstruction state --------------------

/// Debounced lens state.
///
/// `Unknown` holds from detector start until the smoothed luminance first
/// leaves the hysteresis band. It is never re-entered afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObstructionState {
    Unknown,
    Clear,
    Obscured,
}

impl ObstructionState {
    /// `Some(true)` when obscured, `Some(false)` when clear, `None` before
    /// the first decision.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            ObstructionState::Unknown => None,
            ObstructionState::Clear => Some(false),
            ObstructionState::Obscured => Some(true),
        }
    }
}

// -------------------- State changes --------------------

/// Emitted by the detector on state transitions, and only on transitions.
/// There is no per-frame callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateChange {
    /// The new debounced state.
    pub obscured: bool,
    /// Smoothed luminance at the moment of the transition.
    pub smoothed_luma: f64,
    /// Capture timestamp of the frame that triggered the transition,
    /// relative to stream start.
    pub timestamp: Duration,
}
