//! sentineld - lens obstruction sentinel daemon
//!
//! This daemon:
//! 1. Ingests frames from the configured source (stub scene or still image)
//! 2. Runs the obstruction detector over mean frame luminance
//! 3. Receives state transitions marshalled from the analyzer thread
//! 4. Drives the overlay indicator fade and appends to the transition journal

use anyhow::Result;
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lens_sentinel::{open_source, Analyzer, Indicator, Journal, OverlayFade, SentinelConfig};

fn main() -> Result<()> {
    // Initialize logging (simple stderr)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = SentinelConfig::load()?;
    let source = open_source(&cfg.source_url, &cfg.detector)?;

    let mut journal = Journal::open(&cfg.journal_path)?;
    let mut fade = OverlayFade::new(cfg.overlay.base_alpha, cfg.overlay.fade);
    let indicator = Indicator::new(std::io::stderr().is_terminal());

    let running = Arc::new(AtomicBool::new(true));
    let running_flag = Arc::clone(&running);
    ctrlc::set_handler(move || running_flag.store(false, Ordering::SeqCst))?;

    // Pace frame pulls at the detector's rate; its gate stays authoritative.
    let pacing = Duration::from_secs(1) / cfg.detector.max_fps.max(1);
    let (analyzer, transitions) = Analyzer::spawn(source, cfg.detector.clone(), pacing)?;

    log::info!(
        "sentineld running. source={} journal={}",
        cfg.source_url,
        cfg.journal_path
    );
    log::info!(
        "thresholds: low={} high={} alpha={} max_fps={}",
        cfg.detector.low_threshold,
        cfg.detector.high_threshold,
        cfg.detector.ema_alpha,
        cfg.detector.max_fps
    );

    let started = Instant::now();
    let mut last_state: Option<bool> = None;
    let mut last_health_log = Instant::now();
    let mut transition_count = 0u64;

    while running.load(Ordering::SeqCst) {
        match transitions.recv_timeout(Duration::from_millis(50)) {
            Ok(change) => {
                transition_count += 1;
                let now = started.elapsed();
                if change.obscured {
                    fade.fade_to_full(now);
                } else {
                    fade.fade_to_base(now);
                }
                last_state = Some(change.obscured);
                let record = journal.append(&change)?;
                log::info!(
                    "transition #{}: obscured={} luma={:.1} t={}ms",
                    record.seq,
                    change.obscured,
                    change.smoothed_luma,
                    record.elapsed_ms
                );
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("analyzer channel closed, shutting down");
                break;
            }
        }

        indicator.render(fade.alpha_at(started.elapsed()), last_state);

        if last_health_log.elapsed() >= Duration::from_secs(5) {
            log::info!(
                "sentinel healthy; transitions={} uptime={}s",
                transition_count,
                started.elapsed().as_secs()
            );
            last_health_log = Instant::now();
        }
    }

    analyzer.stop();
    let stats = analyzer.join()?;
    indicator.finish();
    log::info!(
        "stopped. frames={} accepted={} transitions={} source_errors={}",
        stats.frames_seen,
        stats.samples_accepted,
        stats.transitions,
        stats.source_errors
    );
    Ok(())
}
