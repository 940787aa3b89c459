//! Synthetic stub source.
//!
//! Generates frames that follow a scripted scene: phases of uncovered and
//! covered luminance with a little sensor noise on top. The default levels
//! come from field readings on a rear phone camera: uncovered ~103, covered
//! by a finger ~30.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use super::{FrameSource, SourceStats};
use crate::frame::LumaFrame;

/// Field reading: mean luminance with the lens uncovered.
pub const UNCOVERED_LUMA: u8 = 103;
/// Field reading: mean luminance with a finger over the lens.
pub const COVERED_LUMA: u8 = 30;

/// One interval of the scripted scene.
#[derive(Clone, Copy, Debug)]
pub struct ScenePhase {
    /// Base luminance during the phase.
    pub luma: u8,
    /// How many frames the phase lasts.
    pub frames: u32,
}

impl ScenePhase {
    pub fn uncovered(frames: u32) -> Self {
        Self {
            luma: UNCOVERED_LUMA,
            frames,
        }
    }

    pub fn covered(frames: u32) -> Self {
        Self {
            luma: COVERED_LUMA,
            frames,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StubConfig {
    /// Origin label, usually the `stub://<name>` URL it was opened from.
    pub name: String,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    /// Scene script, looped for the life of the source.
    pub phases: Vec<ScenePhase>,
    /// Peak sensor noise, +/- luminance units per pixel.
    pub noise: u8,
    /// Seed for the noise generator; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            name: "stub://camera".to_string(),
            fps: 10,
            width: 640,
            height: 480,
            // 5 seconds uncovered, 5 seconds covered at the default rate.
            phases: vec![ScenePhase::uncovered(50), ScenePhase::covered(50)],
            noise: 2,
            seed: None,
        }
    }
}

/// Synthetic frame source following a scripted scene.
pub struct StubSource {
    config: StubConfig,
    rng: StdRng,
    frame_count: u64,
    phase_index: usize,
    frames_into_phase: u32,
}

impl StubSource {
    pub fn new(config: StubConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            frame_count: 0,
            phase_index: 0,
            frames_into_phase: 0,
        }
    }

    /// Base luminance for the current frame, advancing the script.
    fn step_scene(&mut self) -> u8 {
        if self.config.phases.is_empty() {
            return UNCOVERED_LUMA;
        }
        let phase = self.config.phases[self.phase_index % self.config.phases.len()];
        self.frames_into_phase += 1;
        if self.frames_into_phase >= phase.frames.max(1) {
            self.frames_into_phase = 0;
            self.phase_index = (self.phase_index + 1) % self.config.phases.len();
        }
        phase.luma
    }

    fn timestamp(&self) -> Duration {
        let fps = u64::from(self.config.fps.max(1));
        Duration::from_nanos(self.frame_count * 1_000_000_000 / fps)
    }
}

impl FrameSource for StubSource {
    fn connect(&mut self) -> Result<()> {
        log::info!("StubSource: connected to {} (synthetic)", self.config.name);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<LumaFrame> {
        let base = self.step_scene();
        let timestamp = self.timestamp();
        self.frame_count += 1;

        let noise = self.config.noise;
        let lo = base.saturating_sub(noise);
        let hi = base.saturating_add(noise);
        let pixel_count = self.config.width as usize * self.config.height as usize;
        let mut plane = vec![0u8; pixel_count];
        for pixel in plane.iter_mut() {
            *pixel = self.rng.gen_range(lo..=hi);
        }

        Ok(LumaFrame::tightly_packed(
            plane,
            self.config.width,
            self.config.height,
            timestamp,
        ))
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_produced: self.frame_count,
            origin: self.config.name.clone(),
        }
    }
}
