//! Local still-image source.
//!
//! Decodes one JPEG/PNG into a luminance plane and replays it at the target
//! rate. Useful for checking thresholds against captured covered/uncovered
//! shots without a camera attached. Local paths only; URL schemes are
//! rejected.

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

use super::{FrameSource, SourceStats};
use crate::frame::LumaFrame;

/// Configuration for a still-image source.
#[derive(Clone, Debug)]
pub struct FileConfig {
    /// Local image path (e.g. "shots/covered.jpg").
    pub path: String,
    /// Rate at which the image is replayed, frames per second.
    pub target_fps: u32,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            target_fps: 10,
        }
    }
}

/// Still-image frame source.
pub struct FileSource {
    config: FileConfig,
    plane: Option<DecodedPlane>,
    frame_count: u64,
}

struct DecodedPlane {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "file ingestion only supports local paths (no URL schemes)"
            ));
        }
        Ok(Self {
            config,
            plane: None,
            frame_count: 0,
        })
    }
}

impl FrameSource for FileSource {
    fn connect(&mut self) -> Result<()> {
        let img = image::open(&self.config.path)
            .with_context(|| format!("decoding image {}", self.config.path))?;
        let luma = img.to_luma8();
        let (width, height) = luma.dimensions();
        self.plane = Some(DecodedPlane {
            data: luma.into_raw(),
            width,
            height,
        });
        log::info!(
            "FileSource: loaded {} ({}x{})",
            self.config.path,
            width,
            height
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<LumaFrame> {
        let plane = self
            .plane
            .as_ref()
            .ok_or_else(|| anyhow!("file source not connected"))?;
        let fps = u64::from(self.config.target_fps.max(1));
        let timestamp = Duration::from_nanos(self.frame_count * 1_000_000_000 / fps);
        self.frame_count += 1;
        Ok(LumaFrame::tightly_packed(
            plane.data.clone(),
            plane.width,
            plane.height,
            timestamp,
        ))
    }

    fn is_healthy(&self) -> bool {
        self.plane.is_some()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_produced: self.frame_count,
            origin: self.config.path.clone(),
        }
    }
}

fn is_local_file_path(path: &str) -> bool {
    !path.trim().is_empty() && !path.contains("://")
}
