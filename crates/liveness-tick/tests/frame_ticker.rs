//! Integration tests for the frame ticker.
//!
//! Every async test runs with paused tokio time, so `sleep_until`
//! resolves as soon as the runtime is idle and frame timing is exact.

use std::time::Duration;

use liveness_tick::{FrameConfig, FramePolicy, FrameTicker};

// =========================================================================
// Helpers
// =========================================================================

fn config_20hz() -> FrameConfig {
    FrameConfig {
        initial_jitter_us: 0,
        ..FrameConfig::with_rate(20)
    }
}

// =========================================================================
// FrameConfig
// =========================================================================

#[test]
fn test_default_config_is_thirty_fps_skip() {
    let cfg = FrameConfig::default();
    assert_eq!(cfg.rate_hz, 30);
    assert_eq!(cfg.policy, FramePolicy::Skip);
}

#[test]
fn test_with_rate_sets_interval() {
    assert_eq!(FrameConfig::with_rate(20).interval(), Duration::from_millis(50));
}

#[test]
fn test_validated_clamps_zero_and_excess_rates() {
    assert_eq!(FrameConfig::with_rate(0).validated().rate_hz, 1);
    assert_eq!(
        FrameConfig::with_rate(1_000).validated().rate_hz,
        FrameConfig::MAX_RATE_HZ
    );
}

#[test]
fn test_validated_clamps_budget_threshold() {
    let cfg = FrameConfig {
        budget_warn_threshold: 3.0,
        ..FrameConfig::default()
    }
    .validated();
    assert_eq!(cfg.budget_warn_threshold, 1.0);
}

// =========================================================================
// Ticker creation and accessors
// =========================================================================

#[test]
fn test_ticker_initial_state() {
    let t = FrameTicker::new(config_20hz());
    assert_eq!(t.frame_count(), 0);
    assert_eq!(t.rate_hz(), 20);
    assert_eq!(t.interval(), Duration::from_millis(50));
    assert!(!t.is_paused());
}

// =========================================================================
// Frame firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_next_frame_fires_after_one_interval() {
    let mut t = FrameTicker::new(config_20hz());
    let start = tokio::time::Instant::now();

    let tick = t.next_frame().await;

    assert_eq!(tick.frame, 1);
    assert_eq!(tick.interval, Duration::from_millis(50));
    assert_eq!(start.elapsed(), Duration::from_millis(50));
    assert!(!tick.is_late());
    assert_eq!(tick.frames_skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn test_frames_increment_monotonically() {
    let mut t = FrameTicker::new(config_20hz());
    for expected in 1..=5 {
        assert_eq!(t.next_frame().await.frame, expected);
    }
    assert_eq!(t.frame_count(), 5);
    assert_eq!(t.metrics().total_frames, 5);
}

#[tokio::test(start_paused = true)]
async fn test_skip_policy_counts_missed_frames() {
    let mut t = FrameTicker::new(config_20hz());
    t.next_frame().await;

    // Stall for three and a half intervals.
    tokio::time::advance(Duration::from_millis(225)).await;
    let tick = t.next_frame().await;

    assert!(tick.is_late());
    assert_eq!(tick.frames_skipped, 3);
    assert_eq!(t.metrics().late_frames, 1);
    assert_eq!(t.metrics().skipped_frames, 3);
}

#[tokio::test(start_paused = true)]
async fn test_drop_policy_keeps_original_cadence() {
    let mut t = FrameTicker::new(FrameConfig {
        policy: FramePolicy::Drop,
        ..config_20hz()
    });
    let start = tokio::time::Instant::now();
    t.next_frame().await;

    tokio::time::advance(Duration::from_millis(70)).await;
    let late = t.next_frame().await;
    assert!(late.is_late());
    assert_eq!(late.frames_skipped, 0);

    // Third frame is due at 150ms regardless of the late second one.
    t.next_frame().await;
    assert_eq!(start.elapsed(), Duration::from_millis(150));
}

// =========================================================================
// Pause / Resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_prevents_frames() {
    let mut t = FrameTicker::new(config_20hz());
    t.next_frame().await;

    t.pause();
    let result = tokio::time::timeout(Duration::from_secs(1), t.next_frame()).await;
    assert!(result.is_err(), "paused ticker should not fire");
    assert_eq!(t.frame_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resume_restarts_one_interval_later() {
    let mut t = FrameTicker::new(config_20hz());
    t.pause();
    tokio::time::advance(Duration::from_secs(2)).await;

    t.resume();
    let resumed_at = tokio::time::Instant::now();
    let tick = t.next_frame().await;

    assert_eq!(tick.frame, 1);
    assert_eq!(tick.frames_skipped, 0);
    assert_eq!(resumed_at.elapsed(), Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_pause_resume_idempotent() {
    let mut t = FrameTicker::new(config_20hz());
    t.pause();
    t.pause();
    assert!(t.is_paused());
    t.resume();
    t.resume();
    assert!(!t.is_paused());
}

// =========================================================================
// Work budget
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_record_work_end_without_frame_is_noop() {
    let mut t = FrameTicker::new(config_20hz());
    t.record_work_end();
    assert_eq!(t.metrics().max_work_time, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_record_work_end_tracks_max_work_time() {
    let mut t = FrameTicker::new(config_20hz());
    t.next_frame().await;
    tokio::time::advance(Duration::from_millis(10)).await;
    t.record_work_end();

    t.next_frame().await;
    tokio::time::advance(Duration::from_millis(4)).await;
    t.record_work_end();

    assert_eq!(t.metrics().max_work_time, Duration::from_millis(10));
}

// =========================================================================
// select! integration
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_stops_on_signal() {
    let mut t = FrameTicker::new(config_20hz());
    let (stop_tx, mut stop_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(175)).await;
        let _ = stop_tx.send(());
    });

    let mut frames = 0;
    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            _ = t.next_frame() => frames += 1,
        }
    }
    assert_eq!(frames, 3);
}
