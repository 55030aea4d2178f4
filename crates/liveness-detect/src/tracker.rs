//! Detector trait and the tracker that turns raw candidates into at most
//! one trusted face per frame.

use serde::{Deserialize, Serialize};

use crate::{DetectError, Face, VideoFrame};

/// A face detection backend.
///
/// Implementations return every candidate they see, with confidences; the
/// [`FaceTracker`] decides which one (if any) to trust. Returning an empty
/// list is the normal way to say "no face".
pub trait FaceDetector: Send + Sync + 'static {
    /// Finds candidate faces in `frame`.
    ///
    /// # Errors
    /// Only for backend failures. Absence of a face is `Ok(vec![])`.
    fn detect(&self, frame: &VideoFrame) -> Result<Vec<Face>, DetectError>;
}

impl<D: FaceDetector + ?Sized> FaceDetector for Box<D> {
    fn detect(&self, frame: &VideoFrame) -> Result<Vec<Face>, DetectError> {
        (**self).detect(frame)
    }
}

impl<D: FaceDetector + ?Sized> FaceDetector for std::sync::Arc<D> {
    fn detect(&self, frame: &VideoFrame) -> Result<Vec<Face>, DetectError> {
        (**self).detect(frame)
    }
}

/// Tuning for [`FaceTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Candidates below this confidence are treated as absent.
    pub min_confidence: f64,
    /// Share of the previous box kept when smoothing, in `0.0..1.0`.
    /// Zero disables smoothing.
    pub smoothing: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.75,
            smoothing: 0.3,
        }
    }
}

impl TrackerConfig {
    /// Returns a copy with values clamped to usable ranges.
    pub fn validated(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            tracing::warn!(
                min_confidence = self.min_confidence,
                "min_confidence out of range, clamping"
            );
            self.min_confidence = self.min_confidence.clamp(0.0, 1.0);
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            tracing::warn!(smoothing = self.smoothing, "smoothing out of range, clamping");
            self.smoothing = self.smoothing.clamp(0.0, 0.95);
        }
        self
    }
}

/// Per-frame face estimation on top of a [`FaceDetector`].
///
/// The tracker holds no state between calls; callers pass the previous
/// face back in, which keeps it safe to share across tasks.
pub struct FaceTracker<D> {
    detector: D,
    config: TrackerConfig,
}

impl<D: FaceDetector> FaceTracker<D> {
    pub fn new(detector: D) -> Self {
        Self::with_config(detector, TrackerConfig::default())
    }

    pub fn with_config(detector: D, config: TrackerConfig) -> Self {
        Self {
            detector,
            config: config.validated(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Returns the best face in `frame`, smoothed against `previous`.
    ///
    /// Low-confidence candidates are dropped, so a blurry frame yields
    /// `Ok(None)` rather than an error. With several confident candidates,
    /// the most confident wins and ties go to the one nearest `previous`.
    pub fn track(&self, frame: &VideoFrame, previous: Option<&Face>) -> Result<Option<Face>, DetectError> {
        let candidates = self.detector.detect(frame)?;
        let total = candidates.len();

        let best = candidates
            .into_iter()
            .filter(|f| f.confidence >= self.config.min_confidence)
            .max_by(|a, b| {
                a.confidence
                    .total_cmp(&b.confidence)
                    .then_with(|| match previous {
                        Some(prev) => distance_to(prev, b).total_cmp(&distance_to(prev, a)),
                        None => std::cmp::Ordering::Equal,
                    })
            });

        let Some(mut face) = best else {
            if total > 0 {
                tracing::trace!(candidates = total, "no candidate above confidence gate");
            }
            return Ok(None);
        };

        face.timestamp_ms = frame.timestamp_ms();
        if let Some(prev) = previous {
            if self.config.smoothing > 0.0 {
                face.region = prev.region.blend(&face.region, self.config.smoothing);
            }
        }
        Ok(Some(face))
    }
}

fn distance_to(a: &Face, b: &Face) -> f64 {
    let (ca, cb) = (a.region.center(), b.region.center());
    (ca.x - cb.x).hypot(ca.y - cb.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Region;

    /// Returns a fixed candidate list for every frame.
    struct Fixed(Vec<Face>);

    impl FaceDetector for Fixed {
        fn detect(&self, _frame: &VideoFrame) -> Result<Vec<Face>, DetectError> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl FaceDetector for Broken {
        fn detect(&self, _frame: &VideoFrame) -> Result<Vec<Face>, DetectError> {
            Err(DetectError::Backend("model not loaded".into()))
        }
    }

    fn face(left: f64, confidence: f64) -> Face {
        Face {
            region: Region::new(left, 10.0, 100.0, 100.0),
            landmarks: None,
            confidence,
            timestamp_ms: 0,
        }
    }

    fn frame() -> VideoFrame {
        VideoFrame::new(4, 4, vec![0; 16], 1234).unwrap()
    }

    #[test]
    fn test_track_returns_none_below_confidence_gate() {
        let tracker = FaceTracker::new(Fixed(vec![face(0.0, 0.5)]));
        assert_eq!(tracker.track(&frame(), None).unwrap(), None);
    }

    #[test]
    fn test_track_returns_none_for_empty_frame() {
        let tracker = FaceTracker::new(Fixed(vec![]));
        assert_eq!(tracker.track(&frame(), None).unwrap(), None);
    }

    #[test]
    fn test_track_picks_most_confident_and_stamps_frame_time() {
        let tracker = FaceTracker::new(Fixed(vec![face(0.0, 0.8), face(50.0, 0.95)]));
        let found = tracker.track(&frame(), None).unwrap().expect("face");
        assert_eq!(found.region.left, 50.0);
        assert_eq!(found.timestamp_ms, 1234);
    }

    #[test]
    fn test_track_breaks_confidence_tie_by_distance_to_previous() {
        let tracker = FaceTracker::with_config(
            Fixed(vec![face(0.0, 0.9), face(200.0, 0.9)]),
            TrackerConfig {
                smoothing: 0.0,
                ..TrackerConfig::default()
            },
        );
        let prev = face(190.0, 0.9);
        let found = tracker.track(&frame(), Some(&prev)).unwrap().expect("face");
        assert_eq!(found.region.left, 200.0);
    }

    #[test]
    fn test_track_smooths_toward_previous() {
        let tracker = FaceTracker::with_config(
            Fixed(vec![face(100.0, 0.9)]),
            TrackerConfig {
                smoothing: 0.5,
                ..TrackerConfig::default()
            },
        );
        let prev = face(0.0, 0.9);
        let found = tracker.track(&frame(), Some(&prev)).unwrap().expect("face");
        assert_eq!(found.region.left, 50.0);
    }

    #[test]
    fn test_track_propagates_backend_failure() {
        let tracker = FaceTracker::new(Broken);
        assert!(matches!(
            tracker.track(&frame(), None),
            Err(DetectError::Backend(_))
        ));
    }

    #[test]
    fn test_config_validated_clamps_out_of_range_values() {
        let config = TrackerConfig {
            min_confidence: 1.5,
            smoothing: 1.0,
        }
        .validated();
        assert_eq!(config.min_confidence, 1.0);
        assert_eq!(config.smoothing, 0.95);
    }
}
