//! End-to-end tests for the session runtime.
//!
//! Each test runs a real `LivenessSession` against an in-memory service
//! over `MemoryConnector`, with a fake camera and detector. Tokio time is
//! paused, so timers and frame ticks resolve as soon as everything is idle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use liveness::{
    ATTEMPT_KEY, CaptureDevice, CaptureError, ColorSurface, FaceDetector, KeyValueStore,
    LivenessError, LivenessOptions, LivenessSession, LivenessSessionBuilder, MemoryStore,
    SessionOutcome,
};
use liveness_detect::{DetectError, Face, Region, VideoFrame};
use liveness_display::DisplayError;
use liveness_protocol::endpoint::{ATTEMPT_COUNT_PARAM, PRECHECK_VIEW_ENABLED_PARAM, SESSION_ID_PARAM};
use liveness_protocol::{
    ChallengeConfig, ClientMessage, ColorSequence, Frame, FreshnessColor, JsonCodec,
    LightChallengeType, OvalParameters, ServerChallenge, ServerEvent, ServerExceptionKind,
    SessionInformation,
};
use liveness_session::{
    CameraInfo, DeviceInfo, DisplaySurface, DomAndCameraDetails, ErrorState, LivenessState,
    RuntimeErrorKind,
};
use liveness_transport::{
    ConnectRequest, Connector, MemoryConnection, MemoryConnector, MemoryListener, TransportError,
    WebSocketConnector,
};

// =========================================================================
// Fakes
// =========================================================================

const SESSION_ID: &str = "session-1";
const CHALLENGE_ID: &str = "challenge-1";

#[derive(Default)]
struct FakeCamera {
    deny: bool,
    broken_frames: bool,
    releases: Arc<AtomicUsize>,
}

impl CaptureDevice for FakeCamera {
    fn open(&self, device_id: Option<&str>) -> Result<CameraInfo, CaptureError> {
        if self.deny {
            return Err(CaptureError::PermissionDenied("NotAllowedError".into()));
        }
        Ok(CameraInfo {
            device_id: device_id.unwrap_or("cam-0").into(),
            label: "Fake camera".into(),
            width: 640,
            height: 480,
            frame_rate: 30,
        })
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        vec![DeviceInfo {
            device_id: "cam-0".into(),
            label: "Fake camera".into(),
        }]
    }

    fn frame(&self) -> Result<VideoFrame, CaptureError> {
        if self.broken_frames {
            return Err(CaptureError::Unavailable("track ended".into()));
        }
        VideoFrame::new(640, 480, vec![128; 640 * 480], 0)
            .map_err(|e| CaptureError::Unavailable(e.to_string()))
    }

    fn start_recording(&self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn take_chunk(&self) -> Result<Option<Vec<u8>>, CaptureError> {
        Ok(Some(vec![1, 2, 3]))
    }

    fn stop_recording(&self) -> Result<Option<Vec<u8>>, CaptureError> {
        Ok(Some(vec![9]))
    }

    fn release(&self) -> Result<(), CaptureError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Always sees one face sitting exactly on the target oval.
struct FakeDetector;

impl FaceDetector for FakeDetector {
    fn detect(&self, frame: &VideoFrame) -> Result<Vec<Face>, DetectError> {
        Ok(vec![Face {
            region: Region::new(220.0, 90.0, 200.0, 300.0),
            landmarks: None,
            confidence: 0.99,
            timestamp_ms: frame.timestamp_ms(),
        }])
    }
}

/// Paints flat; every sweep frame shows up as another fill.
#[derive(Clone, Default)]
struct RecordingSurface {
    fills: Arc<Mutex<Vec<FreshnessColor>>>,
    clears: Arc<AtomicUsize>,
}

impl RecordingSurface {
    /// Distinct colors in paint order.
    fn colors(&self) -> Vec<FreshnessColor> {
        let mut colors = self.fills.lock().unwrap().clone();
        colors.dedup();
        colors
    }
}

impl ColorSurface for RecordingSurface {
    fn fill(&mut self, color: &FreshnessColor) -> Result<(), DisplayError> {
        self.fills.lock().unwrap().push(*color);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A connector whose connect never finishes.
struct StalledConnector;

impl Connector for StalledConnector {
    type Connection = MemoryConnection;
    type Error = TransportError;

    async fn connect(&self, _request: &ConnectRequest) -> Result<MemoryConnection, TransportError> {
        std::future::pending().await
    }
}

// =========================================================================
// Mock service
// =========================================================================

enum Plan {
    /// Send the challenge, then wait for the upload to finish.
    Challenge(ServerChallenge),
    /// Declare a failure straight away.
    Fail(ServerExceptionKind),
}

struct ServiceLog {
    request: ConnectRequest,
    messages: Vec<ClientMessage>,
}

impl ServiceLog {
    fn video(&self) -> Vec<&[u8]> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                ClientMessage::Video { data, .. } => Some(data.as_slice()),
                _ => None,
            })
            .collect()
    }

    fn details(&self) -> Vec<&liveness_protocol::ChallengeDetails> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                ClientMessage::SessionInformation(info) => Some(info.challenge.details()),
                _ => None,
            })
            .collect()
    }
}

fn server_frame(event: ServerEvent) -> Vec<u8> {
    let codec = JsonCodec;
    event
        .to_frame(&codec)
        .and_then(|frame| frame.encode(&codec))
        .expect("server frame")
}

/// Plays the service for one connection. Replies to the end of the video
/// stream with a disconnection, and returns once the client closes.
async fn run_service(mut listener: MemoryListener, plan: Plan) -> ServiceLog {
    let mut peer = listener.accept().await.expect("client connects");
    let request = peer.request().clone();
    let codec = JsonCodec;

    let opening = match plan {
        Plan::Challenge(challenge) => ServerEvent::SessionInformation(SessionInformation {
            challenge,
            challenge_id: Some(CHALLENGE_ID.into()),
        }),
        Plan::Fail(kind) => ServerEvent::Exception {
            kind,
            message: "request refused".into(),
        },
    };
    let _ = peer.send(server_frame(opening));

    let mut messages = Vec::new();
    while let Some(bytes) = peer.recv().await {
        let frame = Frame::decode(&codec, &bytes).expect("client frame");
        let message = ClientMessage::from_frame(&codec, &frame).expect("client message");
        let end_of_video = matches!(&message, ClientMessage::Video { data, .. } if data.is_empty());
        messages.push(message);
        if end_of_video {
            let _ = peer.send(server_frame(ServerEvent::Disconnection {
                timestamp_millis: 0,
            }));
        }
    }
    ServiceLog { request, messages }
}

// =========================================================================
// Helpers
// =========================================================================

fn target_oval() -> OvalParameters {
    OvalParameters {
        width: 200.0,
        height: 300.0,
        center_x: 320.0,
        center_y: 240.0,
    }
}

fn movement_challenge() -> ServerChallenge {
    ServerChallenge::FaceMovement {
        oval_parameters: target_oval(),
        challenge_config: ChallengeConfig::default(),
    }
}

fn light_challenge() -> ServerChallenge {
    ServerChallenge::FaceMovementAndLight {
        oval_parameters: target_oval(),
        challenge_config: ChallengeConfig::default(),
        color_sequences: vec![
            ColorSequence {
                freshness_color: FreshnessColor::new(255, 0, 0),
                downscroll_duration: 300,
                flat_display_duration: 100,
            },
            ColorSequence {
                freshness_color: FreshnessColor::new(0, 0, 255),
                downscroll_duration: 300,
                flat_display_duration: 0,
            },
        ],
        light_challenge_type: LightChallengeType::Sequential,
    }
}

fn options(disable_start_screen: bool) -> LivenessOptions {
    LivenessOptions {
        disable_start_screen,
        endpoint_override: Some("mem://liveness".into()),
        ..LivenessOptions::new(SESSION_ID, "us-east-1")
    }
}

fn builder(options: LivenessOptions, camera: FakeCamera) -> LivenessSessionBuilder {
    LivenessSession::builder(options)
        .camera(camera)
        .detector(FakeDetector)
        .surface(RecordingSurface::default())
}

fn dom_details() -> DomAndCameraDetails {
    DomAndCameraDetails {
        surface: DisplaySurface {
            width: 1280.0,
            height: 960.0,
        },
        selectable_devices: vec![],
        is_mobile: false,
    }
}

async fn wait_for_state(session: &LivenessSession, state: LivenessState) {
    session
        .subscribe()
        .wait_for(|s| s.state == state)
        .await
        .expect("session still running");
}

// =========================================================================
// Happy paths
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_movement_challenge_auto_start_succeeds() {
    let (connector, listener) = MemoryConnector::new();
    let service = tokio::spawn(run_service(listener, Plan::Challenge(movement_challenge())));

    let camera = FakeCamera::default();
    let releases = Arc::clone(&camera.releases);

    let session = builder(options(true), camera).start(connector).unwrap();
    session.begin().await.unwrap();
    session.set_dom_and_camera_details(dom_details()).await.unwrap();
    let report = session.wait().await.unwrap();

    assert_eq!(report.outcome, SessionOutcome::Success);
    assert_eq!(report.final_state, LivenessState::Success);
    assert_eq!(releases.load(Ordering::SeqCst), 1);
    assert_eq!(report.challenge_id.as_deref(), Some(CHALLENGE_ID));
    assert!(report.freshness_colors.is_empty());

    let log = service.await.unwrap();
    let details = log.details();
    assert!(details[0].video_start_timestamp.is_some());
    assert!(details.iter().any(|d| d.initial_face.is_some() && d.target_oval.is_some()));
    assert!(details.iter().any(|d| d.target_face.is_some()));
    assert!(details.iter().any(|d| d.video_end_timestamp.is_some()));
    assert!(details.iter().all(|d| d.challenge_id == CHALLENGE_ID));

    // The recorder's final chunk, then the empty end-of-video marker.
    let video = log.video();
    assert!(video.contains(&&[9u8][..]));
    assert!(matches!(log.messages.last(), Some(ClientMessage::Video { data, .. }) if data.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn test_explicit_start_recording_after_ready_succeeds() {
    let (connector, listener) = MemoryConnector::new();
    let service = tokio::spawn(run_service(listener, Plan::Challenge(movement_challenge())));

    let session = builder(options(false), FakeCamera::default())
        .start(connector)
        .unwrap();
    session.begin().await.unwrap();
    session.set_dom_and_camera_details(dom_details()).await.unwrap();

    session
        .subscribe()
        .wait_for(|s| s.ready_to_record)
        .await
        .unwrap();
    assert_eq!(session.snapshot().state, LivenessState::DetectFaceBeforeStart);
    session.start_recording().await.unwrap();

    let report = session.wait().await.unwrap();
    assert_eq!(report.outcome, SessionOutcome::Success);
    assert!(!service.await.unwrap().video().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_light_challenge_paints_every_color_and_reports_it() {
    let (connector, listener) = MemoryConnector::new();
    let service = tokio::spawn(run_service(listener, Plan::Challenge(light_challenge())));
    let surface = RecordingSurface::default();

    let session = LivenessSession::builder(options(true))
        .camera(FakeCamera::default())
        .detector(FakeDetector)
        .surface(surface.clone())
        .start(connector)
        .unwrap();
    session.begin().await.unwrap();
    session.set_dom_and_camera_details(dom_details()).await.unwrap();
    let report = session.wait().await.unwrap();

    assert_eq!(report.outcome, SessionOutcome::Success);
    let shown: Vec<_> = report.freshness_colors.iter().map(|c| c.color).collect();
    assert_eq!(
        shown,
        vec![FreshnessColor::new(255, 0, 0), FreshnessColor::new(0, 0, 255)]
    );
    assert_eq!(surface.colors(), shown);
    assert_eq!(surface.clears.load(Ordering::SeqCst), 1);
    assert!(report.freshness_colors[0].timestamp_ms < report.freshness_colors[1].timestamp_ms);

    let log = service.await.unwrap();
    let colors: Vec<_> = log
        .details()
        .into_iter()
        .filter_map(|d| d.color_displayed)
        .collect();
    assert_eq!(colors.len(), 2);
    assert_eq!(colors[0].previous_color, None);
    assert_eq!(colors[1].previous_color, Some(FreshnessColor::new(255, 0, 0)));
    assert_eq!(colors[1].sequence_number, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_sequence_clears_the_screen() {
    let (connector, listener) = MemoryConnector::new();
    let _service = tokio::spawn(run_service(listener, Plan::Challenge(light_challenge())));
    let surface = RecordingSurface::default();

    let session = LivenessSession::builder(options(true))
        .camera(FakeCamera::default())
        .detector(FakeDetector)
        .surface(surface.clone())
        .start(connector)
        .unwrap();
    session.begin().await.unwrap();
    session.set_dom_and_camera_details(dom_details()).await.unwrap();
    session
        .subscribe()
        .wait_for(|s| s.freshness_colors_shown >= 1)
        .await
        .unwrap();
    assert_eq!(surface.clears.load(Ordering::SeqCst), 0);

    session.cancel().await.unwrap();
    let report = session.wait().await.unwrap();
    assert_eq!(report.outcome, SessionOutcome::UserCancelled);
    assert_eq!(surface.clears.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_carries_components_and_scaled_oval() {
    let mut opts = options(false);
    opts.components.insert("header".into(), "custom".into());

    let session = builder(opts, FakeCamera::default())
        .start(StalledConnector)
        .unwrap();
    assert_eq!(session.snapshot().components["header"], "custom");

    session.begin().await.unwrap();
    session.set_dom_and_camera_details(dom_details()).await.unwrap();
    wait_for_state(&session, LivenessState::DetectFaceBeforeStart).await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.components["header"], "custom");
    assert_eq!(snapshot.selectable_devices, FakeCamera::default().devices());
    assert_eq!(snapshot.selected_device_id.as_deref(), Some("cam-0"));
    let oval = snapshot.oval.expect("start oval");
    // The view is twice the camera size.
    assert_eq!(oval.center().x, 640.0);
    assert_eq!(oval.center().y, 480.0);

    session.cancel().await.unwrap();
    session.wait().await.unwrap();
}

// =========================================================================
// Failures and cancellation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_closes_the_stream() {
    let (connector, listener) = MemoryConnector::new();
    let service = tokio::spawn(run_service(listener, Plan::Challenge(movement_challenge())));

    let session = builder(options(false), FakeCamera::default())
        .start(connector)
        .unwrap();
    session.begin().await.unwrap();
    session.set_dom_and_camera_details(dom_details()).await.unwrap();
    // Ready means the stream is open and the challenge has arrived.
    session
        .subscribe()
        .wait_for(|s| s.ready_to_record)
        .await
        .unwrap();

    session.cancel().await.unwrap();
    let report = session.wait().await.unwrap();

    assert_eq!(report.outcome, SessionOutcome::UserCancelled);
    assert_eq!(report.final_state, LivenessState::UserCancel);
    // The service loop only ends once the client closed its side.
    let log = service.await.unwrap();
    assert!(log.messages.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_recording_releases_camera() {
    let camera = FakeCamera::default();
    let releases = Arc::clone(&camera.releases);

    let session = builder(options(false), camera)
        .start(StalledConnector)
        .unwrap();
    session.begin().await.unwrap();
    session.set_dom_and_camera_details(dom_details()).await.unwrap();
    wait_for_state(&session, LivenessState::DetectFaceBeforeStart).await;
    assert_eq!(releases.load(Ordering::SeqCst), 0);

    session.cancel().await.unwrap();
    let report = session.wait().await.unwrap();
    assert_eq!(report.outcome, SessionOutcome::UserCancelled);
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_denied_camera_is_never_released() {
    let camera = FakeCamera {
        deny: true,
        ..FakeCamera::default()
    };
    let releases = Arc::clone(&camera.releases);

    let session = builder(options(false), camera)
        .start(StalledConnector)
        .unwrap();
    session.begin().await.unwrap();
    wait_for_state(&session, LivenessState::PermissionDenied).await;
    session.cancel().await.unwrap();
    session.wait().await.unwrap();

    assert_eq!(releases.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_server_exception_fails_session() {
    let (connector, listener) = MemoryConnector::new();
    let service = tokio::spawn(run_service(
        listener,
        Plan::Fail(ServerExceptionKind::Throttling),
    ));

    let session = builder(options(true), FakeCamera::default())
        .start(connector)
        .unwrap();
    session.begin().await.unwrap();
    let report = session.wait().await.unwrap();

    assert_eq!(
        report.outcome,
        SessionOutcome::Failed(ErrorState::Server(ServerExceptionKind::Throttling))
    );
    assert_eq!(report.final_state, LivenessState::ServerError);
    service.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stalled_connect_times_out() {
    let session = builder(options(true), FakeCamera::default())
        .start(StalledConnector)
        .unwrap();
    session.begin().await.unwrap();
    let report = session.wait().await.unwrap();

    assert_eq!(
        report.outcome,
        SessionOutcome::Failed(ErrorState::ConnectionTimeout)
    );
    assert_eq!(report.final_state, LivenessState::CheckConnection);
}

/// Accepts TCP connections and never answers the WebSocket upgrade.
async fn silent_listener() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("ws://{addr}")
}

#[tokio::test]
async fn test_websocket_open_timeout_reports_connection_timeout() {
    let mut opts = options(true);
    opts.endpoint_override = Some(silent_listener().await);
    opts.session.connection_timeout_ms = 3_000;
    let connector = WebSocketConnector::new().with_open_timeout(Duration::from_millis(300));

    let session = builder(opts, FakeCamera::default()).start(connector).unwrap();
    session.begin().await.unwrap();
    let report = tokio::time::timeout(Duration::from_secs(2), session.wait())
        .await
        .expect("connector timeout ends the session before the session timer")
        .unwrap();

    assert_eq!(
        report.outcome,
        SessionOutcome::Failed(ErrorState::ConnectionTimeout)
    );
    assert_eq!(report.final_state, LivenessState::CheckConnection);
}

#[tokio::test(start_paused = true)]
async fn test_camera_permission_denied_waits_for_retry() {
    let camera = FakeCamera {
        deny: true,
        ..FakeCamera::default()
    };

    let session = builder(options(false), camera)
        .start(StalledConnector)
        .unwrap();
    session.begin().await.unwrap();
    wait_for_state(&session, LivenessState::PermissionDenied).await;

    // Still denied: back to the denial screen.
    session.retry_camera_check().await.unwrap();
    wait_for_state(&session, LivenessState::PermissionDenied).await;

    session.cancel().await.unwrap();
    let report = session.wait().await.unwrap();
    assert_eq!(report.outcome, SessionOutcome::UserCancelled);
}

#[tokio::test(start_paused = true)]
async fn test_broken_camera_fails_with_runtime_error() {
    let (connector, listener) = MemoryConnector::new();
    let _service = tokio::spawn(run_service(listener, Plan::Challenge(movement_challenge())));
    let camera = FakeCamera {
        broken_frames: true,
        ..FakeCamera::default()
    };

    let session = builder(options(true), camera).start(connector).unwrap();
    session.begin().await.unwrap();
    session.set_dom_and_camera_details(dom_details()).await.unwrap();
    let report = session.wait().await.unwrap();

    assert_eq!(
        report.outcome,
        SessionOutcome::Failed(ErrorState::Runtime(RuntimeErrorKind::CameraUnavailable))
    );
}

#[tokio::test(start_paused = true)]
async fn test_mobile_landscape_ends_session() {
    let session = builder(options(false), FakeCamera::default())
        .start(StalledConnector)
        .unwrap();
    session.begin().await.unwrap();
    session.report_mobile_landscape().await.unwrap();
    let report = session.wait().await.unwrap();

    assert_eq!(
        report.outcome,
        SessionOutcome::Failed(ErrorState::MobileLandscape)
    );
}

#[tokio::test(start_paused = true)]
async fn test_commands_after_end_report_session_closed() {
    let session = builder(options(true), FakeCamera::default())
        .start(StalledConnector)
        .unwrap();
    session.begin().await.unwrap();
    session
        .subscribe()
        .wait_for(|s| s.is_terminal())
        .await
        .unwrap();
    while !session.is_finished() {
        tokio::task::yield_now().await;
    }

    assert!(matches!(
        session.start_recording().await,
        Err(LivenessError::SessionClosed)
    ));
}

// =========================================================================
// Session start request
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_session_start_carries_telemetry_and_counts_attempts() {
    let store = Arc::new(MemoryStore::new());

    for expected in ["1", "2"] {
        let (connector, listener) = MemoryConnector::new();
        let service = tokio::spawn(run_service(
            listener,
            Plan::Fail(ServerExceptionKind::Validation),
        ));
        let session = builder(options(false), FakeCamera::default())
            .store(Arc::clone(&store))
            .start(connector)
            .unwrap();
        assert_eq!(session.attempt_count().to_string(), expected);
        session.begin().await.unwrap();
        session.wait().await.unwrap();

        let request = service.await.unwrap().request;
        assert_eq!(request.query_value(SESSION_ID_PARAM), Some(SESSION_ID));
        assert_eq!(request.query_value(ATTEMPT_COUNT_PARAM), Some(expected));
        assert_eq!(request.query_value(PRECHECK_VIEW_ENABLED_PARAM), Some("1"));
        assert!(request.endpoint().starts_with("mem://liveness"));
    }
    assert!(store.get(ATTEMPT_KEY).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_credentials_are_applied_to_the_request() {
    let (connector, listener) = MemoryConnector::new();
    let service = tokio::spawn(run_service(
        listener,
        Plan::Fail(ServerExceptionKind::Validation),
    ));

    let session = builder(options(true), FakeCamera::default())
        .credentials(|request: &mut ConnectRequest| {
            request.set_query("X-Signature", "signed");
            Ok::<(), LivenessError>(())
        })
        .start(connector)
        .unwrap();
    session.begin().await.unwrap();
    session.wait().await.unwrap();

    let request = service.await.unwrap().request;
    assert_eq!(request.query_value("X-Signature"), Some("signed"));
    assert_eq!(request.query_value(PRECHECK_VIEW_ENABLED_PARAM), Some("0"));
}

#[test]
fn test_credential_refusal_fails_start() {
    let (connector, _listener) = MemoryConnector::new();
    let result = builder(options(true), FakeCamera::default())
        .credentials(|_: &mut ConnectRequest| {
            Err::<(), LivenessError>(LivenessError::Credentials("expired".into()))
        })
        .start(connector);
    assert!(matches!(result, Err(LivenessError::Credentials(_))));
}

#[test]
fn test_start_without_camera_is_rejected() {
    let (connector, _listener) = MemoryConnector::new();
    let result = LivenessSession::builder(options(true))
        .detector(FakeDetector)
        .surface(RecordingSurface::default())
        .start(connector);
    assert!(matches!(
        result,
        Err(LivenessError::MissingComponent("camera"))
    ));
}

#[test]
fn test_start_with_blank_session_id_is_rejected() {
    let (connector, _listener) = MemoryConnector::new();
    let result = builder(LivenessOptions::new(" ", "us-east-1"), FakeCamera::default())
        .start(connector);
    assert!(matches!(result, Err(LivenessError::Session(_))));
}
