mod detector;
mod filter;

pub use detector::{DetectorConfig, ObstructionDetector};
pub use filter::{EmaFilter, Hysteresis, RateGate};
