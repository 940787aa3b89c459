use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::detect::DetectorConfig;

const DEFAULT_SOURCE: &str = "stub://front_camera";
const DEFAULT_JOURNAL_PATH: &str = "sentinel_journal.jsonl";

// Daemon thresholds tuned to readings off a rear phone camera:
// covered ~30, uncovered ~103. The library defaults in `DetectorConfig`
// stay conservative; the daemon ships the tuned profile.
const DEFAULT_LOW_THRESHOLD: f64 = 50.0;
const DEFAULT_HIGH_THRESHOLD: f64 = 90.0;
const DEFAULT_EMA_ALPHA: f64 = 0.3;

const DEFAULT_BASE_ALPHA: f32 = 0.2;
const DEFAULT_FADE_MS: u64 = 1000;

#[derive(Debug, Deserialize, Default)]
struct SentinelConfigFile {
    source: Option<SourceConfigFile>,
    detector: Option<DetectorConfigFile>,
    overlay: Option<OverlayConfigFile>,
    journal: Option<JournalConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    low_threshold: Option<f64>,
    high_threshold: Option<f64>,
    ema_alpha: Option<f64>,
    max_fps: Option<u32>,
    sample_stride: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    base_alpha: Option<f32>,
    fade_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct JournalConfigFile {
    path: Option<String>,
}

/// Daemon configuration: a TOML file named by `SENTINEL_CONFIG`, overlaid
/// with `SENTINEL_*` environment variables.
///
/// ```toml
/// [source]
/// url = "stub://front_camera"
///
/// [detector]
/// low_threshold = 50.0
/// high_threshold = 90.0
/// ema_alpha = 0.3
/// max_fps = 10
///
/// [overlay]
/// base_alpha = 0.2
/// fade_ms = 1000
///
/// [journal]
/// path = "sentinel_journal.jsonl"
/// ```
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    pub source_url: String,
    pub detector: DetectorConfig,
    pub overlay: OverlaySettings,
    pub journal_path: String,
}

#[derive(Debug, Clone)]
pub struct OverlaySettings {
    pub base_alpha: f32,
    pub fade: Duration,
}

impl SentinelConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SENTINEL_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SentinelConfigFile) -> Self {
        let source_url = file
            .source
            .as_ref()
            .and_then(|source| source.url.clone())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        let defaults = DetectorConfig::default();
        let detector = DetectorConfig {
            low_threshold: file
                .detector
                .as_ref()
                .and_then(|detector| detector.low_threshold)
                .unwrap_or(DEFAULT_LOW_THRESHOLD),
            high_threshold: file
                .detector
                .as_ref()
                .and_then(|detector| detector.high_threshold)
                .unwrap_or(DEFAULT_HIGH_THRESHOLD),
            ema_alpha: file
                .detector
                .as_ref()
                .and_then(|detector| detector.ema_alpha)
                .unwrap_or(DEFAULT_EMA_ALPHA),
            max_fps: file
                .detector
                .as_ref()
                .and_then(|detector| detector.max_fps)
                .unwrap_or(defaults.max_fps),
            sample_stride: file
                .detector
                .as_ref()
                .and_then(|detector| detector.sample_stride)
                .unwrap_or(defaults.sample_stride),
            target_width: file
                .source
                .as_ref()
                .and_then(|source| source.width)
                .unwrap_or(defaults.target_width),
            target_height: file
                .source
                .as_ref()
                .and_then(|source| source.height)
                .unwrap_or(defaults.target_height),
        };
        let overlay = OverlaySettings {
            base_alpha: file
                .overlay
                .as_ref()
                .and_then(|overlay| overlay.base_alpha)
                .unwrap_or(DEFAULT_BASE_ALPHA),
            fade: Duration::from_millis(
                file.overlay
                    .and_then(|overlay| overlay.fade_ms)
                    .unwrap_or(DEFAULT_FADE_MS),
            ),
        };
        let journal_path = file
            .journal
            .and_then(|journal| journal.path)
            .unwrap_or_else(|| DEFAULT_JOURNAL_PATH.to_string());
        Self {
            source_url,
            detector,
            overlay,
            journal_path,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("SENTINEL_SOURCE") {
            if !url.trim().is_empty() {
                self.source_url = url;
            }
        }
        if let Ok(value) = std::env::var("SENTINEL_LOW_THRESHOLD") {
            self.detector.low_threshold = value
                .parse()
                .map_err(|_| anyhow!("SENTINEL_LOW_THRESHOLD must be a number"))?;
        }
        if let Ok(value) = std::env::var("SENTINEL_HIGH_THRESHOLD") {
            self.detector.high_threshold = value
                .parse()
                .map_err(|_| anyhow!("SENTINEL_HIGH_THRESHOLD must be a number"))?;
        }
        if let Ok(value) = std::env::var("SENTINEL_EMA_ALPHA") {
            self.detector.ema_alpha = value
                .parse()
                .map_err(|_| anyhow!("SENTINEL_EMA_ALPHA must be a number"))?;
        }
        if let Ok(value) = std::env::var("SENTINEL_MAX_FPS") {
            self.detector.max_fps = value
                .parse()
                .map_err(|_| anyhow!("SENTINEL_MAX_FPS must be an integer"))?;
        }
        if let Ok(path) = std::env::var("SENTINEL_JOURNAL") {
            if !path.trim().is_empty() {
                self.journal_path = path;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        if !(0.0..=1.0).contains(&self.overlay.base_alpha) {
            return Err(anyhow!("overlay base_alpha must be in [0, 1]"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<SentinelConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_tuned_profile() {
        let cfg = SentinelConfig::from_file(SentinelConfigFile::default());
        assert_eq!(cfg.source_url, DEFAULT_SOURCE);
        assert_eq!(cfg.detector.low_threshold, 50.0);
        assert_eq!(cfg.detector.high_threshold, 90.0);
        assert_eq!(cfg.detector.ema_alpha, 0.3);
        assert_eq!(cfg.detector.max_fps, 10);
        assert_eq!(cfg.overlay.base_alpha, 0.2);
        assert_eq!(cfg.overlay.fade, Duration::from_millis(1000));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn file_values_override_defaults() {
        let file: SentinelConfigFile = toml::from_str(
            r#"
            [source]
            url = "shots/covered.jpg"
            width = 320
            height = 240

            [detector]
            low_threshold = 15.0
            high_threshold = 25.0
            ema_alpha = 0.5
            max_fps = 5

            [journal]
            path = "out/run.jsonl"
            "#,
        )
        .unwrap();
        let cfg = SentinelConfig::from_file(file);
        assert_eq!(cfg.source_url, "shots/covered.jpg");
        assert_eq!(cfg.detector.low_threshold, 15.0);
        assert_eq!(cfg.detector.high_threshold, 25.0);
        assert_eq!(cfg.detector.ema_alpha, 0.5);
        assert_eq!(cfg.detector.max_fps, 5);
        assert_eq!(cfg.detector.target_width, 320);
        assert_eq!(cfg.detector.target_height, 240);
        assert_eq!(cfg.journal_path, "out/run.jsonl");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let file: SentinelConfigFile = toml::from_str(
            r#"
            [detector]
            low_threshold = 10.0
            "#,
        )
        .unwrap();
        let cfg = SentinelConfig::from_file(file);
        assert_eq!(cfg.detector.low_threshold, 10.0);
        assert_eq!(cfg.detector.high_threshold, DEFAULT_HIGH_THRESHOLD);
        assert_eq!(cfg.journal_path, DEFAULT_JOURNAL_PATH);
    }

    #[test]
    fn env_overrides_file_and_defaults() {
        // No other test reads these variables, so setting them here is safe
        // even under the parallel test harness.
        std::env::set_var("SENTINEL_SOURCE", "stub://env_camera");
        std::env::set_var("SENTINEL_LOW_THRESHOLD", "33.5");
        std::env::set_var("SENTINEL_MAX_FPS", "4");

        let mut cfg = SentinelConfig::from_file(SentinelConfigFile::default());
        cfg.apply_env().unwrap();

        std::env::remove_var("SENTINEL_SOURCE");
        std::env::remove_var("SENTINEL_LOW_THRESHOLD");
        std::env::remove_var("SENTINEL_MAX_FPS");

        assert_eq!(cfg.source_url, "stub://env_camera");
        assert_eq!(cfg.detector.low_threshold, 33.5);
        assert_eq!(cfg.detector.max_fps, 4);
        // Untouched fields keep their defaults.
        assert_eq!(cfg.detector.high_threshold, DEFAULT_HIGH_THRESHOLD);

        // Garbage in an override is an error, not a silent default.
        std::env::set_var("SENTINEL_EMA_ALPHA", "not-a-number");
        let mut cfg = SentinelConfig::from_file(SentinelConfigFile::default());
        let result = cfg.apply_env();
        std::env::remove_var("SENTINEL_EMA_ALPHA");
        assert!(result.is_err());
    }

    #[test]
    fn validation_rejects_an_inverted_band() {
        let file: SentinelConfigFile = toml::from_str(
            r#"
            [detector]
            low_threshold = 90.0
            high_threshold = 50.0
            "#,
        )
        .unwrap();
        let cfg = SentinelConfig::from_file(file);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validation_rejects_out_of_range_base_alpha() {
        let file: SentinelConfigFile = toml::from_str(
            r#"
            [overlay]
            base_alpha = 1.5
            "#,
        )
        .unwrap();
        let cfg = SentinelConfig::from_file(file);
        assert!(cfg.validate().is_err());
    }
}
