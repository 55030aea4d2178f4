//! Fixed-rate frame ticker.
//!
//! A session runs several periodic loops at once: the detection loop
//! samples the camera at the detection rate, and the color driver steps
//! its sweep once per display frame. Each loop owns one [`FrameTicker`].
//!
//! # Late frames
//!
//! A frame is late when it fires more than a tenth of an interval after
//! its deadline, which happens when the runtime is busy or the previous
//! frame's work overran. [`FramePolicy`] picks what happens next:
//!
//! - [`FramePolicy::Skip`] counts the whole frames that were missed and
//!   schedules the next one a full interval from now. There is never a
//!   burst of catch-up frames.
//! - [`FramePolicy::Drop`] leaves the schedule alone, so the next frame
//!   fires at its original time, possibly immediately.
//!
//! # Pausing
//!
//! [`FrameTicker::pause`] makes [`next_frame`](FrameTicker::next_frame)
//! pend forever. [`FrameTicker::resume`] restarts one interval from the
//! moment of resuming. The color driver pauses across a color's flat
//! display time and resumes for the next sweep.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a frame fires late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePolicy {
    /// Count the missed frames and reschedule from now.
    /// Right for capture and display, where a stale frame has no value.
    #[default]
    Skip,
    /// Keep the original cadence; the next frame fires on its old schedule.
    Drop,
}

/// Configuration for a [`FrameTicker`].
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Frames per second.
    pub rate_hz: u32,
    pub policy: FramePolicy,
    /// Share of the frame interval that per-frame work may use before a
    /// warning is logged (0.0–1.0).
    pub budget_warn_threshold: f64,
    /// Random delay (0–max µs) added before the first frame, so loops
    /// started together don't fire in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            rate_hz: 30,
            policy: FramePolicy::default(),
            budget_warn_threshold: 0.80,
            initial_jitter_us: 1_000,
        }
    }
}

impl FrameConfig {
    /// Fastest supported rate.
    pub const MAX_RATE_HZ: u32 = 120;

    pub fn with_rate(rate_hz: u32) -> Self {
        Self {
            rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values. Called by [`FrameTicker::new`].
    ///
    /// - `rate_hz` is kept within `1..=MAX_RATE_HZ`.
    /// - `budget_warn_threshold` is clamped to `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        if self.rate_hz == 0 {
            warn!("rate_hz of 0 is not a frame rate, using 1");
            self.rate_hz = 1;
        } else if self.rate_hz > Self::MAX_RATE_HZ {
            warn!(
                rate = self.rate_hz,
                max = Self::MAX_RATE_HZ,
                "rate_hz exceeds maximum, clamping"
            );
            self.rate_hz = Self::MAX_RATE_HZ;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.rate_hz.max(1)))
    }
}

// ---------------------------------------------------------------------------
// Per-frame info and metrics
// ---------------------------------------------------------------------------

/// Returned by [`FrameTicker::next_frame`].
#[derive(Debug, Clone)]
pub struct FrameTick {
    /// Frame number, starting at 1.
    pub frame: u64,
    pub interval: Duration,
    /// How far past its deadline this frame fired.
    pub late_by: Duration,
    /// Whole frames that were skipped because of the delay.
    pub frames_skipped: u64,
}

impl FrameTick {
    /// Late by more than a tenth of an interval.
    pub fn is_late(&self) -> bool {
        self.late_by > self.interval / 10
    }
}

/// Running totals for one ticker, read through [`FrameTicker::metrics`].
#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    pub total_frames: u64,
    pub late_frames: u64,
    pub skipped_frames: u64,
    /// Longest per-frame work time reported through
    /// [`FrameTicker::record_work_end`].
    pub max_work_time: Duration,
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Paces a periodic loop: camera sampling, face detection or color
/// rendering. One ticker per loop.
///
/// Built on tokio's clock, so tests with paused time step through frames
/// deterministically.
pub struct FrameTicker {
    config: FrameConfig,
    interval: Duration,
    frame: u64,
    next: Instant,
    work_started: Option<Instant>,
    paused: bool,
    metrics: FrameMetrics,
}

impl FrameTicker {
    pub fn new(config: FrameConfig) -> Self {
        let config = config.validated();
        let interval = config.interval();

        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };

        debug!(
            rate_hz = config.rate_hz,
            interval_ms = interval.as_secs_f64() * 1000.0,
            policy = ?config.policy,
            "frame ticker created"
        );

        Self {
            next: Instant::now() + interval + jitter,
            config,
            interval,
            frame: 0,
            work_started: None,
            paused: false,
            metrics: FrameMetrics::default(),
        }
    }

    pub fn with_rate(rate_hz: u32) -> Self {
        Self::new(FrameConfig::with_rate(rate_hz))
    }

    /// Waits for the next frame.
    ///
    /// While paused this pends forever, which lets it sit in a
    /// `tokio::select!` next to a stop signal.
    pub async fn next_frame(&mut self) -> FrameTick {
        if self.paused {
            std::future::pending::<()>().await;
        }

        let deadline = self.next;
        time::sleep_until(deadline).await;

        let now = Instant::now();
        self.frame += 1;
        self.work_started = Some(now);

        let late_by = now.saturating_duration_since(deadline);
        let mut frames_skipped = 0;
        let tick = FrameTick {
            frame: self.frame,
            interval: self.interval,
            late_by,
            frames_skipped: 0,
        };
        let late = tick.is_late();

        self.next = match self.config.policy {
            FramePolicy::Skip => {
                if late {
                    frames_skipped = (late_by.as_nanos() / self.interval.as_nanos()) as u64;
                    if frames_skipped > 0 {
                        warn!(
                            frame = self.frame,
                            skipped = frames_skipped,
                            late_ms = late_by.as_secs_f64() * 1000.0,
                            "frame late, skipping ahead"
                        );
                    }
                }
                now + self.interval
            }
            FramePolicy::Drop => {
                if late {
                    warn!(
                        frame = self.frame,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "frame late, keeping cadence"
                    );
                }
                deadline + self.interval
            }
        };

        self.metrics.total_frames += 1;
        if late {
            self.metrics.late_frames += 1;
        }
        self.metrics.skipped_frames += frames_skipped;
        trace!(frame = self.frame, late, "frame");

        FrameTick {
            frames_skipped,
            ..tick
        }
    }

    /// Marks the end of this frame's work, for budget tracking.
    ///
    /// A no-op unless called after [`next_frame`](Self::next_frame).
    pub fn record_work_end(&mut self) {
        let Some(start) = self.work_started.take() else {
            return;
        };
        let elapsed = start.elapsed();
        if elapsed > self.metrics.max_work_time {
            self.metrics.max_work_time = elapsed;
        }
        let utilization = elapsed.as_secs_f64() / self.interval.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                frame = self.frame,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = self.interval.as_secs_f64() * 1000.0,
                "frame work near budget"
            );
        }
    }

    /// Stops frames until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(frame = self.frame, "frame ticker paused");
        }
    }

    /// Restarts frames one interval from now, without a burst for the
    /// paused time.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next = Instant::now() + self.interval;
            debug!(frame = self.frame, "frame ticker resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn rate_hz(&self) -> u32 {
        self.config.rate_hz
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }
}
