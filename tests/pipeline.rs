//! Full pipeline: stub source -> analyzer thread -> channel -> journal.

use std::time::Duration;

use lens_sentinel::{
    journal, Analyzer, DetectorConfig, Journal, OverlayFade, ScenePhase, StubConfig, StubSource,
};

fn tuned_config() -> DetectorConfig {
    // Stub scene levels: uncovered ~103, covered ~30.
    DetectorConfig {
        low_threshold: 50.0,
        high_threshold: 90.0,
        ema_alpha: 0.3,
        ..DetectorConfig::default()
    }
}

#[test]
fn scripted_scene_reaches_the_consumer_thread() {
    let source = StubSource::new(StubConfig {
        name: "stub://pipeline-test".to_string(),
        width: 64,
        height: 48,
        phases: vec![ScenePhase::uncovered(20), ScenePhase::covered(20)],
        noise: 2,
        seed: Some(3),
        ..StubConfig::default()
    });
    let (analyzer, transitions) =
        Analyzer::spawn(Box::new(source), tuned_config(), Duration::ZERO).expect("spawn analyzer");

    let dir = tempfile::tempdir().expect("tempdir");
    let journal_path = dir.path().join("transitions.jsonl");
    let mut journal = Journal::open(&journal_path).expect("open journal");
    let mut fade = OverlayFade::default();

    // The scene loops; the first two transitions are clear then obscured.
    let mut received = Vec::new();
    while received.len() < 2 {
        let change = transitions
            .recv_timeout(Duration::from_secs(5))
            .expect("transition within timeout");
        if change.obscured {
            fade.fade_to_full(change.timestamp);
        } else {
            fade.fade_to_base(change.timestamp);
        }
        journal.append(&change).expect("journal append");
        received.push(change);
    }

    analyzer.stop();
    let stats = analyzer.join().expect("join analyzer");

    assert!(!received[0].obscured);
    assert!(received[1].obscured);
    assert!(received[0].smoothed_luma >= 90.0);
    assert!(received[1].smoothed_luma <= 50.0);
    assert!(stats.frames_seen >= stats.transitions);
    assert!(stats.samples_accepted <= stats.frames_seen);

    // A second past the obscured transition the overlay is fully opaque.
    let after = received[1].timestamp + Duration::from_millis(1000);
    assert_eq!(fade.alpha_at(after), 1.0);

    let records = journal::read_records(&journal_path).expect("read journal");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].seq, 0);
    assert!(!records[0].obscured);
    assert!(records[1].obscured);
}
