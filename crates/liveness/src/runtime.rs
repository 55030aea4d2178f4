//! The session runtime: one actor task per liveness session.
//!
//! The actor owns the [`LivenessMachine`] and everything its effects touch:
//! the stream, the camera loops, the color surface and the timers. Callers
//! talk to it through a [`LivenessSession`] handle; the background tasks it
//! spawns only post events back. Every event, whatever its source, goes
//! through the machine in arrival order.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use liveness_detect::{FaceDetector, FaceTracker, IlluminationState};
use liveness_display::{ColorSequenceDriver, ColorSurface};
use liveness_protocol::{
    ClientEvent, ColorSequence, Frame, JsonCodec, ProtocolError, RenderedColor, ServerEvent,
};
use liveness_session::{
    DomAndCameraDetails, Effect, ErrorState, LivenessMachine, LivenessState, RuntimeErrorKind,
    SessionEvent, SessionOutcome, StateSnapshot, TimerKind, TimerToken, generate_challenge_id,
};
use liveness_tick::{Clock, FrameTicker, SessionClock};
use liveness_transport::{ConnectRequest, Connection, Connector, DuplexStream, TransportError};

use crate::{
    AttemptTracker, CaptureDevice, CaptureError, CredentialProvider, KeyValueStore, LivenessError,
    LivenessOptions, MemoryStore, TelemetryQuery,
};

/// Capacity of the caller → actor command channel.
const DEFAULT_CHANNEL_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Caller requests, sent through the bounded command channel.
#[derive(Debug)]
enum Command {
    Event(SessionEvent),
    /// Stamped with the actor's clock on arrival.
    StartRecording,
    SwitchCamera { device_id: String },
}

/// Reports from the actor's own background tasks.
enum Internal<C> {
    Event(SessionEvent),
    Connected(C),
}

enum Next<C> {
    Command(Command),
    Internal(Internal<C>),
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub session_id: String,
    /// The challenge the session ran, if the service sent one.
    pub challenge_id: Option<String>,
    pub outcome: SessionOutcome,
    /// The attempt number sent with the session start.
    pub attempt_count: u32,
    /// Colors as they actually appeared, for light challenges.
    pub freshness_colors: Vec<RenderedColor>,
    pub final_state: LivenessState,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Assembles a [`LivenessSession`].
///
/// Camera, detector and color surface are required. The attempt store
/// defaults to a [`MemoryStore`], the clock to a [`SessionClock`], and
/// requests go out unauthorized unless credentials are set.
///
/// # Example
///
/// ```rust,ignore
/// let session = LivenessSession::builder(LivenessOptions::new(id, "us-east-1"))
///     .camera(camera)
///     .detector(detector)
///     .surface(surface)
///     .start(WebSocketConnector::new())?;
/// session.begin().await?;
/// ```
pub struct LivenessSessionBuilder {
    options: LivenessOptions,
    camera: Option<Arc<dyn CaptureDevice>>,
    detector: Option<Arc<dyn FaceDetector>>,
    surface: Option<Box<dyn ColorSurface>>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl fmt::Debug for LivenessSessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LivenessSessionBuilder")
            .field("options", &self.options)
            .field("camera", &self.camera.is_some())
            .field("detector", &self.detector.is_some())
            .field("surface", &self.surface.is_some())
            .field("credentials", &self.credentials.is_some())
            .finish_non_exhaustive()
    }
}

impl LivenessSessionBuilder {
    pub fn new(options: LivenessOptions) -> Self {
        Self {
            options,
            camera: None,
            detector: None,
            surface: None,
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(SessionClock::new()),
            credentials: None,
        }
    }

    pub fn camera(mut self, camera: impl CaptureDevice) -> Self {
        self.camera = Some(Arc::new(camera));
        self
    }

    pub fn detector(mut self, detector: impl FaceDetector) -> Self {
        self.detector = Some(Arc::new(detector));
        self
    }

    /// Where light-challenge colors are painted.
    pub fn surface(mut self, surface: impl ColorSurface) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    /// Durable storage for the attempt counter.
    pub fn store(mut self, store: impl KeyValueStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn credentials(mut self, credentials: impl CredentialProvider) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }

    /// Records the attempt, prepares the session-start request and spawns
    /// the session actor. Nothing is opened until
    /// [`begin`](LivenessSession::begin).
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// A missing collaborator, a blank session id, or a credential
    /// provider refusal.
    pub fn start<K: Connector>(self, connector: K) -> Result<LivenessSession, LivenessError> {
        let options = self.options.validated();
        let camera = self.camera.ok_or(LivenessError::MissingComponent("camera"))?;
        let detector = self
            .detector
            .ok_or(LivenessError::MissingComponent("face detector"))?;
        let surface = self
            .surface
            .ok_or(LivenessError::MissingComponent("color surface"))?;

        let machine = LivenessMachine::new(options.session_id.clone(), options.session_config())?;

        let attempt_count =
            AttemptTracker::new(Arc::clone(&self.store), Arc::clone(&self.clock)).attempt_count();
        let mut request = options.connect_request();
        TelemetryQuery {
            attempt_count,
            precheck_view_enabled: options.precheck_view_enabled(),
        }
        .apply(&mut request);
        if let Some(credentials) = &self.credentials {
            credentials.authorize(&mut request)?;
        }

        let mut initial = machine.snapshot();
        initial.components = options.components.clone();
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (command_tx, command_rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        let session_id = options.session_id.clone();
        let actor = SessionActor::<K> {
            machine,
            options,
            connector: Arc::new(connector),
            request,
            camera,
            detector,
            surface: Some(surface),
            clock: self.clock,
            codec: JsonCodec,
            commands: command_rx,
            internal_tx,
            internal_rx,
            snapshots: snapshot_tx,
            stream: None,
            connect_task: None,
            reader_task: None,
            detection_task: None,
            chunk_task: None,
            color_task: None,
            timers: HashMap::new(),
            attempt_count,
        };
        let task = tokio::spawn(actor.run());

        info!(session = %session_id, attempt_count, "liveness session created");
        Ok(LivenessSession {
            session_id,
            attempt_count,
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        })
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running liveness session.
///
/// Dropping the handle cancels the session.
#[derive(Debug)]
pub struct LivenessSession {
    session_id: String,
    attempt_count: u32,
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<StateSnapshot>,
    task: JoinHandle<SessionReport>,
}

impl LivenessSession {
    pub fn builder(options: LivenessOptions) -> LivenessSessionBuilder {
        LivenessSessionBuilder::new(options)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Opens the stream and the camera.
    pub async fn begin(&self) -> Result<(), LivenessError> {
        self.send(Command::Event(SessionEvent::Begin)).await
    }

    /// Hands over the mounted view's size and the cameras on offer. Face
    /// detection starts once the camera is open and this has arrived.
    ///
    /// An empty device list is filled in from the capture device.
    pub async fn set_dom_and_camera_details(
        &self,
        details: DomAndCameraDetails,
    ) -> Result<(), LivenessError> {
        self.send(Command::Event(SessionEvent::SetDomAndCameraDetails(details)))
            .await
    }

    /// Asks to start recording. Refused unless the face is in position,
    /// the challenge has arrived and the stream is open; watch
    /// [`StateSnapshot::ready_to_record`].
    pub async fn start_recording(&self) -> Result<(), LivenessError> {
        self.send(Command::StartRecording).await
    }

    /// Switches to another camera. Only honored before recording starts.
    pub async fn switch_camera(&self, device_id: impl Into<String>) -> Result<(), LivenessError> {
        self.send(Command::SwitchCamera {
            device_id: device_id.into(),
        })
        .await
    }

    /// Asks for camera access again after a denial.
    pub async fn retry_camera_check(&self) -> Result<(), LivenessError> {
        self.send(Command::Event(SessionEvent::RetryCameraCheck))
            .await
    }

    /// A phone was rotated to landscape. Ends the session.
    pub async fn report_mobile_landscape(&self) -> Result<(), LivenessError> {
        self.send(Command::Event(SessionEvent::MobileLandscapeWarning))
            .await
    }

    /// Ends the session as cancelled by the user.
    pub async fn cancel(&self) -> Result<(), LivenessError> {
        self.send(Command::Event(SessionEvent::Cancel)).await
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> StateSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that sees every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.snapshots.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the session to end.
    pub async fn wait(self) -> Result<SessionReport, LivenessError> {
        let Self { commands, task, .. } = self;
        let report = task.await.map_err(|e| {
            warn!(error = %e, "session task failed");
            LivenessError::SessionClosed
        });
        drop(commands);
        report
    }

    async fn send(&self, command: Command) -> Result<(), LivenessError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| LivenessError::SessionClosed)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct SessionActor<K: Connector> {
    machine: LivenessMachine,
    options: LivenessOptions,
    connector: Arc<K>,
    request: ConnectRequest,
    camera: Arc<dyn CaptureDevice>,
    detector: Arc<dyn FaceDetector>,
    /// Taken by the color task while a sequence runs.
    surface: Option<Box<dyn ColorSurface>>,
    clock: Arc<dyn Clock>,
    codec: JsonCodec,
    commands: mpsc::Receiver<Command>,
    internal_tx: mpsc::UnboundedSender<Internal<K::Connection>>,
    internal_rx: mpsc::UnboundedReceiver<Internal<K::Connection>>,
    snapshots: watch::Sender<StateSnapshot>,
    stream: Option<DuplexStream<K::Connection>>,
    connect_task: Option<JoinHandle<()>>,
    reader_task: Option<JoinHandle<()>>,
    detection_task: Option<JoinHandle<()>>,
    chunk_task: Option<JoinHandle<()>>,
    color_task: Option<JoinHandle<()>>,
    timers: HashMap<TimerKind, (TimerToken, JoinHandle<()>)>,
    attempt_count: u32,
}

impl<K: Connector> SessionActor<K> {
    async fn run(mut self) -> SessionReport {
        info!(session = %self.options.session_id, "session actor started");

        while !self.machine.is_terminal() {
            let next = tokio::select! {
                biased;
                Some(msg) = self.internal_rx.recv() => Next::Internal(msg),
                command = self.commands.recv() => match command {
                    Some(command) => Next::Command(command),
                    // Handle dropped.
                    None => Next::Command(Command::Event(SessionEvent::Cancel)),
                },
            };

            match next {
                Next::Internal(Internal::Event(event)) => self.dispatch(event).await,
                Next::Internal(Internal::Connected(conn)) => self.on_connected(conn).await,
                Next::Command(command) => self.on_command(command).await,
            }
        }

        self.shutdown().await;
        let report = self.report();
        info!(
            session = %report.session_id,
            state = %report.final_state,
            outcome = ?report.outcome,
            "session actor stopped"
        );
        report
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::Event(SessionEvent::SetDomAndCameraDetails(mut details)) => {
                if details.selectable_devices.is_empty() {
                    details.selectable_devices = self.camera.devices();
                }
                self.dispatch(SessionEvent::SetDomAndCameraDetails(details))
                    .await
            }
            Command::Event(event) => self.dispatch(event).await,
            Command::StartRecording => {
                let at = self.clock.now_ms();
                self.dispatch(SessionEvent::StartRecording { at }).await;
            }
            Command::SwitchCamera { device_id } => {
                if !self.machine.state().accepts_device_change() {
                    debug!(state = %self.machine.state(), "camera switch refused");
                    return;
                }
                match self.camera.open(Some(&device_id)) {
                    Ok(camera) => {
                        self.dispatch(SessionEvent::UpdateDeviceAndStream { camera })
                            .await
                    }
                    Err(e) => warn!(device = %device_id, error = %e, "camera switch failed"),
                }
            }
        }
    }

    /// Feeds `event` and every follow-up event it causes through the
    /// machine, then publishes one snapshot.
    async fn dispatch(&mut self, event: SessionEvent) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            trace!(event = event.name(), state = %self.machine.state(), "event");
            for effect in self.machine.handle(event) {
                self.run_effect(effect, &mut queue).await;
            }
        }
        self.publish();
    }

    fn publish(&self) {
        let mut snapshot = self.machine.snapshot();
        snapshot.components = self.options.components.clone();
        self.snapshots.send_replace(snapshot);
    }

    async fn run_effect(&mut self, effect: Effect, queue: &mut VecDeque<SessionEvent>) {
        match effect {
            Effect::OpenTransport => self.open_transport(),
            Effect::CloseTransport => self.close_transport().await,
            Effect::AcquireCamera { device_id } => {
                queue.push_back(self.acquire_camera(device_id.as_deref()))
            }
            Effect::StartFaceDetection => self.start_detection(),
            Effect::StopFaceDetection => abort(&mut self.detection_task),
            Effect::StartRecording => self.start_recording(queue),
            Effect::StopRecording => self.stop_recording(queue),
            Effect::ReleaseCamera => self.release_camera(),
            Effect::StartColorSequence(sequences) => self.start_colors(sequences, queue),
            Effect::Send(event) => {
                if let Err(failure) = self.send(event) {
                    queue.push_back(failure);
                }
            }
            Effect::StartTimer { kind, token, after } => self.start_timer(kind, token, after),
            Effect::CancelTimer { kind, token } => self.cancel_timer(kind, token),
        }
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    fn open_transport(&mut self) {
        let connector = Arc::clone(&self.connector);
        let request = self.request.clone();
        let tx = self.internal_tx.clone();
        self.connect_task = Some(tokio::spawn(async move {
            debug!(endpoint = request.endpoint(), "connecting");
            let msg = match connector.connect(&request).await {
                Ok(conn) => Internal::Connected(conn),
                Err(e) => {
                    warn!(endpoint = request.endpoint(), error = %e, "connect failed");
                    Internal::Event(connect_failure(&e))
                }
            };
            let _ = tx.send(msg);
        }));
    }

    async fn on_connected(&mut self, conn: K::Connection) {
        self.connect_task = None;
        let stream = DuplexStream::new(conn);
        info!(session = %self.options.session_id, id = %stream.id(), "stream connected");
        self.reader_task = Some(spawn_reader(
            stream.connection(),
            self.codec,
            self.internal_tx.clone(),
        ));
        self.stream = Some(stream);
        self.dispatch(SessionEvent::TransportOpened).await;
    }

    /// Frames and enqueues one event. Events raised before the stream is
    /// open are dropped.
    fn send(&self, event: ClientEvent) -> Result<(), SessionEvent> {
        let name = event.event_type();
        let Some(stream) = &self.stream else {
            debug!(event = name, "stream not open, event dropped");
            return Ok(());
        };
        let bytes = event
            .encode(&self.codec)
            .map_err(|e| runtime_error(RuntimeErrorKind::ProtocolFailure, e))?;
        stream
            .send(bytes)
            .map_err(|e| runtime_error(RuntimeErrorKind::TransportFailure, e))?;
        trace!(event = name, "event sent");
        Ok(())
    }

    async fn close_transport(&mut self) {
        abort(&mut self.connect_task);
        abort(&mut self.reader_task);
        if let Some(stream) = self.stream.take() {
            stream.close().await;
            info!(session = %self.options.session_id, id = %stream.id(), "stream closed");
        }
    }

    // -----------------------------------------------------------------------
    // Camera
    // -----------------------------------------------------------------------

    fn acquire_camera(&self, device_id: Option<&str>) -> SessionEvent {
        match self.camera.open(device_id) {
            Ok(camera) => {
                info!(
                    device = %camera.device_id,
                    width = camera.width,
                    height = camera.height,
                    "camera ready"
                );
                SessionEvent::CameraReady { camera }
            }
            Err(CaptureError::PermissionDenied(reason)) => SessionEvent::CameraDenied { reason },
            Err(e) => runtime_error(RuntimeErrorKind::CameraUnavailable, e),
        }
    }

    fn start_detection(&mut self) {
        abort(&mut self.detection_task);
        let camera = Arc::clone(&self.camera);
        let tracker = FaceTracker::with_config(Arc::clone(&self.detector), self.options.tracker);
        let clock = Arc::clone(&self.clock);
        let tx = self.internal_tx.clone();
        let rate_hz = self.options.detection_rate_hz;

        self.detection_task = Some(tokio::spawn(async move {
            let mut ticker = FrameTicker::with_rate(rate_hz);
            let mut previous = None;
            loop {
                ticker.next_frame().await;
                let frame = match camera.frame() {
                    Ok(frame) => frame,
                    Err(e) => {
                        let _ = tx.send(Internal::Event(runtime_error(
                            RuntimeErrorKind::CameraUnavailable,
                            e,
                        )));
                        break;
                    }
                };
                let face = match tracker.track(&frame, previous.as_ref()) {
                    Ok(face) => face,
                    Err(e) => {
                        let _ = tx.send(Internal::Event(runtime_error(
                            RuntimeErrorKind::DetectorFailure,
                            e,
                        )));
                        break;
                    }
                };
                ticker.record_work_end();
                previous = face;

                let sample = SessionEvent::FaceDetected {
                    face,
                    illumination: IlluminationState::from_frame(&frame),
                    at: clock.now_ms(),
                };
                if tx.send(Internal::Event(sample)).is_err() {
                    break;
                }
            }
            debug!(frames = ticker.frame_count(), "detection loop stopped");
        }));
    }

    fn start_recording(&mut self, queue: &mut VecDeque<SessionEvent>) {
        if let Err(e) = self.camera.start_recording() {
            queue.push_back(runtime_error(RuntimeErrorKind::CaptureFailure, e));
            return;
        }
        queue.push_back(SessionEvent::RecordingStarted {
            at: self.clock.now_ms(),
        });

        let camera = Arc::clone(&self.camera);
        let clock = Arc::clone(&self.clock);
        let tx = self.internal_tx.clone();
        let every = Duration::from_millis(self.options.chunk_interval_ms);

        self.chunk_task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            loop {
                interval.tick().await;
                let event = match camera.take_chunk() {
                    Ok(Some(data)) if !data.is_empty() => SessionEvent::VideoChunk {
                        data,
                        at: clock.now_ms(),
                    },
                    Ok(_) => continue,
                    Err(e) => runtime_error(RuntimeErrorKind::CaptureFailure, e),
                };
                let failed = matches!(event, SessionEvent::RuntimeError { .. });
                if tx.send(Internal::Event(event)).is_err() || failed {
                    break;
                }
            }
        }));
    }

    /// Stops the chunk loop and flushes the recorder. The last chunk goes
    /// out before `RecordingStopped`.
    fn stop_recording(&mut self, queue: &mut VecDeque<SessionEvent>) {
        abort(&mut self.chunk_task);
        let at = self.clock.now_ms();
        match self.camera.stop_recording() {
            Ok(last) => {
                if let Some(data) = last.filter(|d| !d.is_empty()) {
                    queue.push_back(SessionEvent::VideoChunk { data, at });
                }
                queue.push_back(SessionEvent::RecordingStopped { at });
            }
            Err(e) => queue.push_back(runtime_error(RuntimeErrorKind::CaptureFailure, e)),
        }
    }

    fn release_camera(&mut self) {
        abort(&mut self.detection_task);
        abort(&mut self.chunk_task);
        match self.camera.release() {
            Ok(()) => debug!(session = %self.options.session_id, "camera released"),
            Err(e) => warn!(session = %self.options.session_id, error = %e, "camera release failed"),
        }
    }

    // -----------------------------------------------------------------------
    // Light challenge
    // -----------------------------------------------------------------------

    fn start_colors(&mut self, sequences: Vec<ColorSequence>, queue: &mut VecDeque<SessionEvent>) {
        let Some(surface) = self.surface.take() else {
            queue.push_back(SessionEvent::RuntimeError {
                kind: RuntimeErrorKind::DisplayFailure,
                message: "color surface already in use".into(),
            });
            return;
        };
        let clock = Arc::clone(&self.clock);
        let tx = self.internal_tx.clone();

        self.color_task = Some(tokio::spawn(async move {
            let mut driver = ColorSequenceDriver::new(surface, clock);
            let result = driver
                .run(&sequences, |shown| {
                    let _ = tx.send(Internal::Event(SessionEvent::ColorDisplayed(*shown)));
                })
                .await;
            let done = match result {
                Ok(shown) => {
                    debug!(colors = shown.len(), "color sequence finished");
                    SessionEvent::ColorSequenceComplete
                }
                Err(e) => runtime_error(RuntimeErrorKind::DisplayFailure, e),
            };
            let _ = tx.send(Internal::Event(done));
        }));
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    fn start_timer(&mut self, kind: TimerKind, token: TimerToken, after: Duration) {
        let tx = self.internal_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(Internal::Event(SessionEvent::TimerFired { kind, token }));
        });
        trace!(?kind, %token, after_ms = after.as_millis() as u64, "timer armed");
        if let Some((_, replaced)) = self.timers.insert(kind, (token, handle)) {
            replaced.abort();
        }
    }

    fn cancel_timer(&mut self, kind: TimerKind, token: TimerToken) {
        if self.timers.get(&kind).is_some_and(|(armed, _)| *armed == token) {
            if let Some((_, handle)) = self.timers.remove(&kind) {
                handle.abort();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    async fn shutdown(&mut self) {
        for task in [
            &mut self.connect_task,
            &mut self.reader_task,
            &mut self.detection_task,
            &mut self.chunk_task,
        ] {
            abort(task);
        }
        // The color driver clears its overlay when dropped; wait for that.
        if let Some(task) = self.color_task.take() {
            task.abort();
            let _ = task.await;
        }
        for (_, (_, handle)) in self.timers.drain() {
            handle.abort();
        }
        if let Some(stream) = self.stream.take() {
            stream.close().await;
        }
    }

    fn report(&self) -> SessionReport {
        let ctx = self.machine.context();
        SessionReport {
            session_id: ctx.session_id.clone(),
            challenge_id: ctx.challenge_id.clone(),
            outcome: self
                .machine
                .outcome()
                .unwrap_or(SessionOutcome::Failed(ErrorState::StreamClosed)),
            attempt_count: self.attempt_count,
            freshness_colors: ctx.freshness_color.freshness_colors.clone(),
            final_state: self.machine.state(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn abort(task: &mut Option<JoinHandle<()>>) {
    if let Some(task) = task.take() {
        task.abort();
    }
}

fn runtime_error(kind: RuntimeErrorKind, err: impl fmt::Display) -> SessionEvent {
    SessionEvent::RuntimeError {
        kind,
        message: err.to_string(),
    }
}

/// Classifies a failed connect. A connector that gave up waiting for the
/// stream to open reports the same timeout as the session's own timer.
fn connect_failure(err: &(dyn std::error::Error + 'static)) -> SessionEvent {
    let timed_out = err
        .downcast_ref::<TransportError>()
        .is_some_and(TransportError::is_open_timeout);
    if timed_out {
        SessionEvent::ConnectionTimeout
    } else {
        runtime_error(RuntimeErrorKind::TransportFailure, err)
    }
}

/// Reads service events until the stream ends or the service says
/// something final.
fn spawn_reader<C: Connection>(
    conn: Arc<C>,
    codec: JsonCodec,
    tx: mpsc::UnboundedSender<Internal<C>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = match conn.recv().await {
                Ok(Some(bytes)) => match decode_server_event(&codec, &bytes) {
                    Ok(Some(event)) => event,
                    Ok(None) => continue,
                    Err(e) => runtime_error(RuntimeErrorKind::ProtocolFailure, e),
                },
                Ok(None) => SessionEvent::Disconnect,
                Err(e) => runtime_error(RuntimeErrorKind::TransportFailure, e),
            };
            let last = !matches!(event, SessionEvent::SetSessionInfo { .. });
            if tx.send(Internal::Event(event)).is_err() || last {
                break;
            }
        }
        debug!(id = %conn.id(), "reader stopped");
    })
}

/// Turns one inbound frame into a session event. Events this client
/// doesn't know are skipped.
fn decode_server_event(
    codec: &JsonCodec,
    bytes: &[u8],
) -> Result<Option<SessionEvent>, ProtocolError> {
    let frame = Frame::decode(codec, bytes)?;
    let event = match ServerEvent::from_frame(codec, &frame) {
        Ok(event) => event,
        Err(ProtocolError::UnknownEvent(name)) => {
            debug!(%name, "unknown server event skipped");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    Ok(Some(match event {
        ServerEvent::SessionInformation(info) => SessionEvent::SetSessionInfo {
            challenge_id: info
                .challenge_id
                .clone()
                .unwrap_or_else(generate_challenge_id),
            info,
        },
        ServerEvent::Disconnection { .. } => SessionEvent::Disconnect,
        ServerEvent::Exception { kind, message } => SessionEvent::ServerError { kind, message },
    }))
}
