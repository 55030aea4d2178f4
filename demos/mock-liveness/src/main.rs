//! Runs one light-challenge liveness session against an in-process mock
//! service, with a synthetic camera whose face walks into the oval once
//! recording starts.
//!
//! `RUST_LOG=debug cargo run -p mock-liveness` shows every transition.

use std::sync::Mutex;
use std::time::Duration;

use liveness::prelude::*;
use liveness_protocol::{
    ChallengeConfig, ClientMessage, ColorSequence, JsonCodec, LightChallengeType, OvalParameters,
    ServerChallenge, ServerEvent, SessionInformation,
};
use liveness_tick::{Clock, SessionClock};
use liveness_transport::MemoryListener;
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

/// How long the synthetic face takes to reach the oval.
const APPROACH: Duration = Duration::from_millis(1_500);

// ---------------------------------------------------------------------------
// Synthetic camera and detector
// ---------------------------------------------------------------------------

/// Shared by the camera and the detector: the face starts moving when
/// recording starts.
struct Scene {
    clock: SessionClock,
    recording_since: Mutex<Option<Instant>>,
}

impl Scene {
    fn new() -> Self {
        Self {
            clock: SessionClock::new(),
            recording_since: Mutex::new(None),
        }
    }

    fn recording_for(&self) -> Option<Duration> {
        self.recording_since
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .map(|since| since.elapsed())
    }

    /// Small and centered before recording, then growing into the target.
    fn face_region(&self) -> Region {
        let start = Region::new(260.0, 150.0, 120.0, 180.0);
        let target = Region::new(220.0, 90.0, 200.0, 300.0);
        match self.recording_for() {
            None => start,
            Some(elapsed) => {
                let progress = (elapsed.as_secs_f64() / APPROACH.as_secs_f64()).min(1.0);
                start.blend(&target, 1.0 - progress)
            }
        }
    }
}

struct SyntheticCamera(std::sync::Arc<Scene>);

impl CaptureDevice for SyntheticCamera {
    fn open(&self, device_id: Option<&str>) -> Result<CameraInfo, CaptureError> {
        Ok(CameraInfo {
            device_id: device_id.unwrap_or("synthetic-0").to_string(),
            label: "Synthetic camera".into(),
            width: WIDTH,
            height: HEIGHT,
            frame_rate: 30,
        })
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        vec![DeviceInfo {
            device_id: "synthetic-0".into(),
            label: "Synthetic camera".into(),
        }]
    }

    fn frame(&self) -> Result<VideoFrame, CaptureError> {
        let luma = vec![120; (WIDTH * HEIGHT) as usize];
        VideoFrame::new(WIDTH, HEIGHT, luma, self.0.clock.now_ms())
            .map_err(|e| CaptureError::Unavailable(e.to_string()))
    }

    fn start_recording(&self) -> Result<(), CaptureError> {
        *self
            .0
            .recording_since
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(Instant::now());
        Ok(())
    }

    fn take_chunk(&self) -> Result<Option<Vec<u8>>, CaptureError> {
        Ok(Some(vec![0u8; 4_096]))
    }

    fn stop_recording(&self) -> Result<Option<Vec<u8>>, CaptureError> {
        Ok(Some(vec![0u8; 1_024]))
    }

    fn release(&self) -> Result<(), CaptureError> {
        tracing::info!("camera released");
        Ok(())
    }
}

struct SyntheticDetector(std::sync::Arc<Scene>);

impl FaceDetector for SyntheticDetector {
    fn detect(&self, frame: &VideoFrame) -> Result<Vec<Face>, DetectError> {
        Ok(vec![Face {
            region: self.0.face_region(),
            landmarks: None,
            confidence: 0.97,
            timestamp_ms: frame.timestamp_ms(),
        }])
    }
}

/// Logs each color instead of painting it.
struct ConsoleSurface;

impl ColorSurface for ConsoleSurface {
    fn fill(&mut self, color: &FreshnessColor) -> Result<(), DisplayError> {
        tracing::info!(%color, "screen color");
        Ok(())
    }

    fn scroll(
        &mut self,
        from: Option<&FreshnessColor>,
        to: &FreshnessColor,
        progress: f64,
    ) -> Result<(), DisplayError> {
        if progress >= 1.0 {
            return self.fill(to);
        }
        tracing::trace!(?from, %to, progress, "screen sweep");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        tracing::info!("screen cleared");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mock service
// ---------------------------------------------------------------------------

fn challenge() -> ServerChallenge {
    let step = |r, g, b| ColorSequence {
        freshness_color: FreshnessColor::new(r, g, b),
        downscroll_duration: 300,
        flat_display_duration: 200,
    };
    ServerChallenge::FaceMovementAndLight {
        oval_parameters: OvalParameters {
            width: 200.0,
            height: 300.0,
            center_x: 320.0,
            center_y: 240.0,
        },
        challenge_config: ChallengeConfig::default(),
        color_sequences: vec![step(255, 255, 255), step(255, 0, 0), step(0, 0, 255)],
        light_challenge_type: LightChallengeType::Sequential,
    }
}

/// Sends the challenge, logs what comes back and ends the stream once the
/// video is complete.
async fn serve(mut listener: MemoryListener) {
    let codec = JsonCodec;
    let Some(mut peer) = listener.accept().await else {
        return;
    };
    tracing::info!(url = %peer.request().url(), "service: session start");

    let hello = ServerEvent::SessionInformation(SessionInformation {
        challenge: challenge(),
        challenge_id: None,
    });
    match hello.to_frame(&codec).and_then(|f| f.encode(&codec)) {
        Ok(bytes) => {
            let _ = peer.send(bytes);
        }
        Err(e) => {
            tracing::error!(error = %e, "service: cannot encode challenge");
            return;
        }
    }

    let mut video_bytes = 0;
    while let Some(bytes) = peer.recv().await {
        let message = liveness_protocol::Frame::decode(&codec, &bytes)
            .and_then(|frame| ClientMessage::from_frame(&codec, &frame));
        match message {
            Ok(ClientMessage::Video { data, .. }) if data.is_empty() => {
                tracing::info!(video_bytes, "service: video complete, disconnecting");
                let bye = ServerEvent::Disconnection {
                    timestamp_millis: SessionClock::new().now_ms(),
                };
                if let Ok(bytes) = bye.to_frame(&codec).and_then(|f| f.encode(&codec)) {
                    let _ = peer.send(bytes);
                }
            }
            Ok(ClientMessage::Video { data, .. }) => video_bytes += data.len(),
            Ok(ClientMessage::SessionInformation(info)) => {
                tracing::info!(details = ?info.challenge.details(), "service: client event");
            }
            Err(e) => tracing::warn!(error = %e, "service: bad frame"),
        }
    }
    tracing::info!("service: stream closed");
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (connector, listener) = MemoryConnector::new();
    let service = tokio::spawn(serve(listener));

    let scene = std::sync::Arc::new(Scene::new());
    let options = LivenessOptions {
        disable_start_screen: true,
        endpoint_override: Some("mem://mock-liveness".into()),
        ..LivenessOptions::new("demo-session", "us-east-1")
    };
    let session = LivenessSession::builder(options)
        .camera(SyntheticCamera(std::sync::Arc::clone(&scene)))
        .detector(SyntheticDetector(scene))
        .surface(ConsoleSurface)
        .start(connector)?;

    let mut snapshots = session.subscribe();
    tokio::spawn(async move {
        let mut last = None;
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if last != Some(snapshot.state) {
                tracing::info!(
                    state = %snapshot.state,
                    face = ?snapshot.face_match_state,
                    "snapshot"
                );
                last = Some(snapshot.state);
            }
        }
    });

    session.begin().await?;
    session
        .set_dom_and_camera_details(DomAndCameraDetails {
            surface: DisplaySurface {
                width: f64::from(WIDTH),
                height: f64::from(HEIGHT),
            },
            selectable_devices: vec![],
            is_mobile: false,
        })
        .await?;

    let report = session.wait().await?;
    service.await?;

    eprintln!(
        "session {} finished: {:?} (attempt {}, {} colors shown)",
        report.session_id,
        report.outcome,
        report.attempt_count,
        report.freshness_colors.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_region_is_small_before_recording() {
        let scene = Scene::new();
        assert_eq!(scene.face_region().width, 120.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_face_region_reaches_target_after_approach() {
        let scene = std::sync::Arc::new(Scene::new());
        SyntheticCamera(std::sync::Arc::clone(&scene))
            .start_recording()
            .unwrap();
        tokio::time::advance(APPROACH).await;
        let region = scene.face_region();
        assert_eq!(region.width, 200.0);
        assert_eq!(region.height, 300.0);
    }

    #[test]
    fn test_challenge_has_light_sequence() {
        assert_eq!(challenge().color_sequences().len(), 3);
    }
}
