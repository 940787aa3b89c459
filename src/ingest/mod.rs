//! Frame ingestion sources.
//!
//! This module provides the sources the sentinel can watch:
//! - Stub source (`stub://`): scripted synthetic scenes for tests and demos
//! - File source: a local still image replayed at a fixed rate
//!
//! Live camera capture is out of scope; these sources stand in for the
//! platform pipeline. All sources produce `LumaFrame` instances on demand
//! and are driven by a single analyzer thread. The ingestion layer is
//! responsible for:
//! - Stamping frames with a stream-relative capture timestamp
//! - Producing a plain luminance plane, whatever the input format
//!
//! Sources report failures as errors; they never panic on malformed input.

mod file;
mod stub;

pub use file::{FileConfig, FileSource};
pub use stub::{ScenePhase, StubConfig, StubSource};

use anyhow::Result;

use crate::detect::DetectorConfig;
use crate::frame::LumaFrame;

/// A serial frame producer. One analyzer thread drives one source.
pub trait FrameSource: Send {
    /// Prepare the source (open files, decode stills). Must be called before
    /// the first `next_frame`.
    fn connect(&mut self) -> Result<()>;

    /// Capture the next frame.
    fn next_frame(&mut self) -> Result<LumaFrame>;

    /// Whether the source expects `next_frame` to keep succeeding.
    fn is_healthy(&self) -> bool;

    /// Counters for health logging.
    fn stats(&self) -> SourceStats;
}

/// Counters every source keeps.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_produced: u64,
    pub origin: String,
}

/// Build a source from a URL-ish string: `stub://<name>` for the synthetic
/// source, anything else is a local image path.
pub fn open_source(url: &str, detector: &DetectorConfig) -> Result<Box<dyn FrameSource>> {
    if url.starts_with("stub://") {
        let config = StubConfig {
            name: url.to_string(),
            fps: detector.max_fps,
            width: detector.target_width,
            height: detector.target_height,
            ..StubConfig::default()
        };
        Ok(Box::new(StubSource::new(config)))
    } else {
        let config = FileConfig {
            path: url.to_string(),
            target_fps: detector.max_fps,
        };
        Ok(Box::new(FileSource::new(config)?))
    }
}
