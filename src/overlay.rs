//! Overlay indicator.
//!
//! The visual contract, kept platform-free: a translucent marker idles at a
//! baseline alpha and fades linearly to full opacity while the lens is
//! obscured, then back down once it clears. `OverlayFade` is the time-based
//! model; `Indicator` renders the current alpha on a terminal.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Baseline translucency of the idle marker.
pub const DEFAULT_BASE_ALPHA: f32 = 0.2;
/// Default fade duration.
pub const DEFAULT_FADE: Duration = Duration::from_millis(1000);

/// Linear alpha fade between a baseline and full opacity.
///
/// Re-targeting mid-fade starts from the interpolated current alpha, so a
/// quick cover/uncover never snaps the marker.
#[derive(Clone, Debug)]
pub struct OverlayFade {
    base_alpha: f32,
    fade: Duration,
    start_alpha: f32,
    target_alpha: f32,
    started_at: Option<Duration>,
}

impl OverlayFade {
    pub fn new(base_alpha: f32, fade: Duration) -> Self {
        let base = base_alpha.clamp(0.0, 1.0);
        Self {
            base_alpha: base,
            fade,
            start_alpha: base,
            target_alpha: base,
            started_at: None,
        }
    }

    pub fn base_alpha(&self) -> f32 {
        self.base_alpha
    }

    /// Begin a fade toward `target` starting at `now`.
    pub fn fade_to(&mut self, target: f32, now: Duration) {
        self.start_alpha = self.alpha_at(now);
        self.target_alpha = target.clamp(0.0, 1.0);
        self.started_at = Some(now);
    }

    /// Fade to full opacity (lens obscured).
    pub fn fade_to_full(&mut self, now: Duration) {
        self.fade_to(1.0, now);
    }

    /// Fade back to the baseline (lens clear).
    pub fn fade_to_base(&mut self, now: Duration) {
        self.fade_to(self.base_alpha, now);
    }

    /// Alpha at time `now`.
    pub fn alpha_at(&self, now: Duration) -> f32 {
        let Some(started) = self.started_at else {
            return self.start_alpha;
        };
        if self.fade.is_zero() {
            return self.target_alpha;
        }
        let elapsed = now.saturating_sub(started);
        if elapsed >= self.fade {
            return self.target_alpha;
        }
        let t = elapsed.as_secs_f32() / self.fade.as_secs_f32();
        self.start_alpha + (self.target_alpha - self.start_alpha) * t
    }
}

impl Default for OverlayFade {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_ALPHA, DEFAULT_FADE)
    }
}

// ----------------------------------------------------------------------------
// Terminal rendering
// ----------------------------------------------------------------------------

/// Renders the overlay alpha as a bar on a TTY, plain stderr lines otherwise.
pub struct Indicator {
    bar: Option<ProgressBar>,
}

impl Indicator {
    pub fn new(is_tty: bool) -> Self {
        if is_tty {
            let bar = ProgressBar::new(100);
            bar.set_draw_target(ProgressDrawTarget::stderr());
            let style = ProgressStyle::with_template("lens {bar:24} {percent:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style);
            Self { bar: Some(bar) }
        } else {
            Self { bar: None }
        }
    }

    /// Draw the current alpha and state. `None` state renders as "--",
    /// matching the time before the first decision.
    pub fn render(&self, alpha: f32, obscured: Option<bool>) {
        let percent = (alpha.clamp(0.0, 1.0) * 100.0).round() as u64;
        let state = match obscured {
            Some(true) => "obscured",
            Some(false) => "clear",
            None => "--",
        };
        if let Some(bar) = &self.bar {
            bar.set_position(percent);
            bar.set_message(state);
        } else {
            eprintln!("lens alpha={percent:>3}% state={state}");
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
