//! demo - end-to-end synthetic run of the obstruction pipeline

use anyhow::{anyhow, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use lens_sentinel::ingest::{FrameSource, ScenePhase, StubConfig, StubSource};
use lens_sentinel::{journal, DetectorConfig, Journal, ObstructionDetector, OverlayFade};

const DEFAULT_STUB_URL: &str = "stub://demo";

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Seconds per scene phase (uncovered, then covered).
    #[arg(long, default_value_t = 2)]
    phase_seconds: u32,
    /// Number of cover/uncover cycles.
    #[arg(long, default_value_t = 2)]
    cycles: u32,
    /// Frames per second for the synthetic source.
    #[arg(long, default_value_t = 10)]
    fps: u32,
    /// Output directory for the journal.
    #[arg(long, default_value = "demo_out")]
    out: String,
    /// Deterministic seed for sensor noise.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }
    if args.phase_seconds == 0 || args.cycles == 0 {
        return Err(anyhow!("phase-seconds and cycles must be >= 1"));
    }

    let out_dir = PathBuf::from(&args.out);
    fs::create_dir_all(&out_dir)?;
    let journal_path = out_dir.join("transitions.jsonl");
    // Each demo run gets a fresh journal.
    if journal_path.exists() {
        fs::remove_file(&journal_path)?;
    }

    stage("build scripted scene");
    let frames_per_phase = args.phase_seconds * args.fps;
    let mut phases = Vec::new();
    for _ in 0..args.cycles {
        phases.push(ScenePhase::uncovered(frames_per_phase));
        phases.push(ScenePhase::covered(frames_per_phase));
    }
    let total_frames = u64::from(frames_per_phase) * u64::from(args.cycles) * 2;
    let mut source = StubSource::new(StubConfig {
        name: DEFAULT_STUB_URL.to_string(),
        fps: args.fps,
        phases,
        seed: args.seed,
        ..StubConfig::default()
    });
    source.connect()?;

    stage("run detector over scene");
    // Tuned to the stub scene's field readings: covered ~30, uncovered ~103.
    let config = DetectorConfig {
        low_threshold: 50.0,
        high_threshold: 90.0,
        ema_alpha: 0.3,
        max_fps: args.fps,
        ..DetectorConfig::default()
    };
    let mut detector = ObstructionDetector::new(config)?;
    let mut fade = OverlayFade::default();
    let mut journal = Journal::open(&journal_path)?;

    let mut transition_count = 0u64;
    let mut final_timestamp = std::time::Duration::ZERO;
    for _ in 0..total_frames {
        let frame = source.next_frame()?;
        final_timestamp = frame.timestamp;
        if let Some(change) = detector.process_frame(&frame) {
            transition_count += 1;
            if change.obscured {
                fade.fade_to_full(change.timestamp);
            } else {
                fade.fade_to_base(change.timestamp);
            }
            journal.append(&change)?;
            eprintln!(
                "demo: t={:>6}ms obscured={} luma={:.1}",
                change.timestamp.as_millis(),
                change.obscured,
                change.smoothed_luma
            );
        }
    }

    stage("verify journal");
    let records = journal::read_records(&journal_path)?;
    if records.len() as u64 != transition_count {
        return Err(anyhow!(
            "journal mismatch: wrote {} transitions, read {}",
            transition_count,
            records.len()
        ));
    }
    for (index, record) in records.iter().enumerate() {
        if record.seq != index as u64 {
            return Err(anyhow!(
                "journal out of order at line {}: seq {}",
                index + 1,
                record.seq
            ));
        }
    }

    // One clear transition at the start of the first cycle, then one per
    // phase edge: 2 per cycle in total.
    let expected_transitions = u64::from(args.cycles) * 2;

    println!("demo summary:");
    println!("  frames processed: {}", total_frames);
    println!(
        "  transitions: {} (expected {})",
        transition_count, expected_transitions
    );
    println!("  journal: {}", journal_path.display());
    println!(
        "  overlay alpha at end: {:.2}",
        fade.alpha_at(final_timestamp)
    );
    println!(
        "  verify: {}",
        if transition_count == expected_transitions {
            "OK"
        } else {
            "FAIL"
        }
    );
    println!("next steps:");
    println!("  cargo run --bin sentineld");
    println!("  cat {}", journal_path.display());

    if transition_count != expected_transitions {
        return Err(anyhow!(
            "expected {} transitions, saw {}",
            expected_transitions,
            transition_count
        ));
    }
    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}
