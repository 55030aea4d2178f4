//! Paints a color sequence and reports each color as it appears.

use std::time::Duration;

use liveness_protocol::{ColorSequence, FreshnessColor, RenderedColor};
use liveness_tick::{Clock, FrameConfig, FrameTicker};

use crate::DisplayError;

/// A full-viewport drawing target.
pub trait ColorSurface: Send + 'static {
    /// Fills the whole surface with `color`. Returns once the color is
    /// committed for display.
    fn fill(&mut self, color: &FreshnessColor) -> Result<(), DisplayError>;

    /// Paints `to` sweeping down over `from`, `progress` of the way from
    /// the top (`0.0..=1.0`). `from` is `None` for the first color.
    ///
    /// The default paints `to` flat, for surfaces that cannot animate.
    fn scroll(
        &mut self,
        from: Option<&FreshnessColor>,
        to: &FreshnessColor,
        progress: f64,
    ) -> Result<(), DisplayError> {
        let _ = (from, progress);
        self.fill(to)
    }

    /// Removes the color overlay.
    fn clear(&mut self) -> Result<(), DisplayError>;
}

impl<S: ColorSurface + ?Sized> ColorSurface for Box<S> {
    fn fill(&mut self, color: &FreshnessColor) -> Result<(), DisplayError> {
        (**self).fill(color)
    }

    fn scroll(
        &mut self,
        from: Option<&FreshnessColor>,
        to: &FreshnessColor,
        progress: f64,
    ) -> Result<(), DisplayError> {
        (**self).scroll(from, to, progress)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        (**self).clear()
    }
}

/// Clears the surface if dropped before [`finish`](Overlay::finish), so a
/// run that is cancelled or fails part-way leaves nothing painted.
struct Overlay<'a, S: ColorSurface> {
    surface: &'a mut S,
    armed: bool,
}

impl<'a, S: ColorSurface> Overlay<'a, S> {
    fn new(surface: &'a mut S) -> Self {
        Self {
            surface,
            armed: true,
        }
    }

    fn finish(mut self) -> Result<(), DisplayError> {
        self.armed = false;
        self.surface.clear()
    }
}

impl<S: ColorSurface> Drop for Overlay<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.surface.clear() {
            Ok(()) => tracing::debug!("color sequence stopped early, overlay cleared"),
            Err(e) => tracing::warn!(error = %e, "failed to clear color overlay"),
        }
    }
}

/// Walks a color sequence on a surface and reports what was shown.
pub struct ColorSequenceDriver<S, C> {
    surface: S,
    clock: C,
    frames: FrameConfig,
}

impl<S: ColorSurface, C: Clock> ColorSequenceDriver<S, C> {
    /// A driver pacing paints at 60 frames per second.
    pub fn new(surface: S, clock: C) -> Self {
        Self::with_frames(surface, clock, FrameConfig::with_rate(60))
    }

    pub fn with_frames(surface: S, clock: C, frames: FrameConfig) -> Self {
        Self {
            surface,
            clock,
            frames,
        }
    }

    /// Shows each color in order and returns the rendered record.
    ///
    /// A color's sweep starts on the next frame tick. Its timestamp is read
    /// once that first paint completes, and it is reported to `on_rendered`
    /// right away. The sweep then advances one step per frame over
    /// `downscroll_duration`, and the finished color stays flat for
    /// `flat_display_duration`. A zero-length sweep paints the color flat
    /// on its first frame.
    ///
    /// The surface is cleared at the end, and also when the run stops
    /// early: on an error, or when the future is dropped.
    ///
    /// # Errors
    /// Stops at the first surface error. Colors already reported stay
    /// reported.
    pub async fn run<F>(
        &mut self,
        sequences: &[ColorSequence],
        mut on_rendered: F,
    ) -> Result<Vec<RenderedColor>, DisplayError>
    where
        F: FnMut(&RenderedColor),
    {
        let mut ticker = FrameTicker::new(self.frames.clone());
        let interval_ms = ticker.interval().as_secs_f64() * 1000.0;
        let mut overlay = Overlay::new(&mut self.surface);
        let mut rendered = Vec::with_capacity(sequences.len());
        let mut previous: Option<FreshnessColor> = None;

        for (index, step) in sequences.iter().enumerate() {
            let color = step.freshness_color;
            let sweep_frames = (step.downscroll_duration as f64 / interval_ms).ceil() as u32;

            let tick = ticker.next_frame().await;
            let start = if sweep_frames == 0 { 1.0 } else { 0.0 };
            overlay.surface.scroll(previous.as_ref(), &color, start)?;
            let timestamp_ms = self.clock.now_ms();
            ticker.record_work_end();

            let shown = RenderedColor {
                color,
                sequence_number: index as u32,
                timestamp_ms,
            };
            tracing::debug!(
                color = %shown.color,
                sequence = shown.sequence_number,
                timestamp_ms,
                sweep_frames,
                frames_skipped = tick.frames_skipped,
                "color rendered"
            );
            on_rendered(&shown);
            rendered.push(shown);

            for frame in 1..=sweep_frames {
                ticker.next_frame().await;
                let progress = f64::from(frame) / f64::from(sweep_frames);
                overlay.surface.scroll(previous.as_ref(), &color, progress)?;
                ticker.record_work_end();
            }

            // Flat phase; the next color starts one frame after it.
            ticker.pause();
            tokio::time::sleep(Duration::from_millis(step.flat_display_duration)).await;
            ticker.resume();
            previous = Some(color);
        }

        overlay.finish()?;
        Ok(rendered)
    }
}
