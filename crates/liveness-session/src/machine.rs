//! The liveness session state machine.
//!
//! [`LivenessMachine::handle`] is the whole transition function: it takes
//! one event, updates state and context, and returns the effects the
//! runtime must carry out. It never blocks, sleeps or touches I/O, so every
//! path is testable by feeding events in and inspecting what comes out.
//!
//! Two rules hold for every transition:
//!
//! - Once a terminal state is reached, every later event is ignored. The
//!   first transition out of a state wins.
//! - Every terminal transition cancels live timers, stops detection and
//!   recording if they run, releases the camera if it was opened, and emits
//!   `CloseTransport` exactly once.

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use liveness_detect::{
    Face, FaceMatchState, MatchThresholds, OvalDetails, classify_face, face_match_percentage,
};
use liveness_protocol::{BoundingBox, ChallengeRef, ClientEvent, ServerChallenge};

use crate::{
    Effect, ErrorState, LivenessState, SessionConfig, SessionContext, SessionError, SessionEvent,
    SessionOutcome, StateSnapshot, TimeoutPhase, TimerKind, TimerToken,
};

/// Generates a random challenge id: 16 random bytes as 32 lowercase hex
/// characters.
pub fn generate_challenge_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// One liveness check, from `Begin` to a terminal state.
#[derive(Debug)]
pub struct LivenessMachine {
    state: LivenessState,
    ctx: SessionContext,
    config: SessionConfig,
    thresholds: MatchThresholds,
    timers: HashMap<TimerKind, TimerToken>,
    next_token: u64,
    detecting: bool,
    recording: bool,
    last_sample_at: Option<u64>,
}

impl LivenessMachine {
    /// Creates a machine in `Start`.
    ///
    /// # Errors
    /// `SessionError::EmptySessionId` if `session_id` is blank.
    pub fn new(session_id: impl Into<String>, config: SessionConfig) -> Result<Self, SessionError> {
        let session_id = session_id.into();
        if session_id.trim().is_empty() {
            return Err(SessionError::EmptySessionId);
        }
        let config = config.validated();
        Ok(Self {
            state: LivenessState::Start,
            ctx: SessionContext::new(session_id, config.max_failed_attempts),
            thresholds: config.thresholds,
            config,
            timers: HashMap::new(),
            next_token: 0,
            detecting: false,
            recording: false,
            last_sample_at: None,
        })
    }

    pub fn state(&self) -> LivenessState {
        self.state
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// The final result, once terminal.
    pub fn outcome(&self) -> Option<SessionOutcome> {
        match self.state {
            LivenessState::Success => Some(SessionOutcome::Success),
            LivenessState::UserCancel => Some(SessionOutcome::UserCancelled),
            s if s.is_terminal() => Some(SessionOutcome::Failed(
                self.ctx.error_state.unwrap_or(ErrorState::StreamClosed),
            )),
            _ => None,
        }
    }

    /// What the rendering layer needs right now.
    pub fn snapshot(&self) -> StateSnapshot {
        let scale = self.ctx.oval.scale_factor.unwrap_or(1.0);
        StateSnapshot {
            state: self.state,
            face_match_state: self.ctx.face_match.face_match_state,
            face_match_percentage: self.ctx.face_match.face_match_percentage,
            illumination_state: self.ctx.face_match.illumination_state,
            oval: self.ctx.oval.oval_details.map(|o| o.scaled(scale)),
            selectable_devices: self.ctx.video.selectable_devices.clone(),
            selected_device_id: self.ctx.video.selected_device_id.clone(),
            failed_attempts: self.ctx.failed_attempts,
            freshness_colors_shown: self.ctx.freshness_color.freshness_colors.len(),
            current_color: self
                .ctx
                .freshness_color
                .freshness_colors
                .last()
                .filter(|_| self.state == LivenessState::FlashColors)
                .map(|c| c.color),
            ready_to_record: self.state == LivenessState::DetectFaceBeforeStart
                && self
                    .last_sample_at
                    .is_some_and(|at| self.start_gate_open(at)),
            error_state: self.ctx.error_state,
            components: Default::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Transition function
    // -----------------------------------------------------------------------

    /// Applies one event and returns the effects to run, in order.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        let mut fx = Vec::new();
        if self.state.is_terminal() {
            debug!(state = %self.state, event = event.name(), "session over, event ignored");
            return fx;
        }

        match event {
            SessionEvent::Begin => self.on_begin(&mut fx),
            SessionEvent::TransportOpened => {
                if !self.ctx.connected {
                    self.ctx.connected = true;
                    self.cancel_timer(TimerKind::Connection, &mut fx);
                    info!(session = %self.ctx.session_id, "stream open");
                    self.maybe_auto_start(&mut fx);
                }
            }
            SessionEvent::ConnectionTimeout => self.on_connection_timeout(&mut fx),
            SessionEvent::SetSessionInfo { challenge_id, info } => {
                if self.ctx.set_challenge(challenge_id, info.challenge) {
                    info!(
                        session = %self.ctx.session_id,
                        challenge_id = self.ctx.challenge_id.as_deref().unwrap_or_default(),
                        "challenge received"
                    );
                    self.maybe_auto_start(&mut fx);
                } else {
                    warn!(
                        session = %self.ctx.session_id,
                        "duplicate session information ignored"
                    );
                }
            }
            SessionEvent::CameraReady { camera } => {
                if self.state == LivenessState::CameraCheck {
                    self.ctx.video.selected_device_id = Some(camera.device_id.clone());
                    self.ctx.video.camera = Some(camera);
                    self.transition(LivenessState::WaitForDomAndCameraDetails);
                } else {
                    self.ignore("CameraReady");
                }
            }
            SessionEvent::CameraDenied { reason } => {
                if self.state == LivenessState::CameraCheck {
                    warn!(session = %self.ctx.session_id, %reason, "camera access denied");
                    self.transition(LivenessState::PermissionDenied);
                } else {
                    self.ignore("CameraDenied");
                }
            }
            SessionEvent::RetryCameraCheck => {
                if self.state == LivenessState::PermissionDenied {
                    fx.push(Effect::AcquireCamera {
                        device_id: self.ctx.video.selected_device_id.clone(),
                    });
                    self.transition(LivenessState::CameraCheck);
                } else {
                    self.ignore("RetryCameraCheck");
                }
            }
            SessionEvent::SetDomAndCameraDetails(details) => {
                if self.state == LivenessState::WaitForDomAndCameraDetails {
                    self.ctx.video.surface = Some(details.surface);
                    self.ctx.video.selectable_devices = details.selectable_devices;
                    self.ctx.video.is_mobile = details.is_mobile;
                    self.refresh_start_oval();
                    self.detecting = true;
                    fx.push(Effect::StartFaceDetection);
                    self.start_timer(
                        TimerKind::FaceSearch,
                        Duration::from_millis(self.config.face_search_timeout_ms),
                        &mut fx,
                    );
                    self.transition(LivenessState::DetectFaceBeforeStart);
                } else {
                    self.ignore("SetDomAndCameraDetails");
                }
            }
            SessionEvent::UpdateDeviceAndStream { camera } => {
                if self.state.accepts_device_change() {
                    info!(device = %camera.device_id, "camera switched");
                    self.ctx.video.selected_device_id = Some(camera.device_id.clone());
                    self.ctx.video.camera = Some(camera);
                    self.ctx.face_stable_since = None;
                    if self.state == LivenessState::DetectFaceBeforeStart {
                        self.refresh_start_oval();
                    }
                } else {
                    self.ignore("UpdateDeviceAndStream");
                }
            }
            SessionEvent::FaceDetected {
                face,
                illumination,
                at,
            } => {
                self.ctx.face_match.illumination_state = Some(illumination);
                self.on_face_sample(face, at, &mut fx);
            }
            SessionEvent::StartRecording { at } => {
                if self.state == LivenessState::DetectFaceBeforeStart && self.start_gate_open(at) {
                    self.begin_recording(&mut fx);
                } else {
                    debug!(
                        state = %self.state,
                        connected = self.ctx.connected,
                        has_challenge = self.ctx.server_session_information.is_some(),
                        "start recording refused"
                    );
                }
            }
            SessionEvent::RecordingStarted { at } => {
                if self.state == LivenessState::RecordingStart {
                    self.ctx.video.recording_start_timestamp = Some(at);
                    if let Some(challenge) = self.challenge_ref() {
                        fx.push(Effect::Send(ClientEvent::VideoStarted {
                            challenge,
                            timestamp_ms: at,
                        }));
                    }
                    self.transition(LivenessState::CheckFaceDetected);
                } else {
                    self.ignore("RecordingStarted");
                }
            }
            SessionEvent::ColorDisplayed(rendered) => {
                if self.state == LivenessState::FlashColors {
                    let previous = self
                        .ctx
                        .freshness_color
                        .freshness_colors
                        .last()
                        .map(|c| c.color);
                    if self.ctx.push_freshness_color(rendered) {
                        if let Some(challenge) = self.challenge_ref() {
                            fx.push(Effect::Send(ClientEvent::ColorDisplayed {
                                challenge,
                                current: rendered.color,
                                previous,
                                sequence_number: rendered.sequence_number,
                                started_at: rendered.timestamp_ms,
                            }));
                        }
                    }
                } else {
                    self.ignore("ColorDisplayed");
                }
            }
            SessionEvent::ColorSequenceComplete => {
                if self.state == LivenessState::FlashColors {
                    self.ctx.freshness_color.freshness_colors_complete = true;
                    self.cancel_timer(TimerKind::Freshness, &mut fx);
                    self.enter_upload(&mut fx);
                } else {
                    self.ignore("ColorSequenceComplete");
                }
            }
            SessionEvent::RecordingStopped { at } => self.on_recording_stopped(at, &mut fx),
            SessionEvent::VideoChunk { data, at } => {
                if self.state.is_recording() && !self.ctx.is_recording_stopped {
                    fx.push(Effect::Send(ClientEvent::VideoChunk {
                        data,
                        timestamp_ms: at,
                    }));
                } else {
                    self.ignore("VideoChunk");
                }
            }
            SessionEvent::TimerFired { kind, token } => self.on_timer(kind, token, &mut fx),
            SessionEvent::Disconnect => {
                if self.state == LivenessState::UploadImages {
                    if self.ctx.is_recording_stopped {
                        self.terminate(LivenessState::Success, None, &mut fx);
                    } else {
                        debug!("disconnect before recording stopped, deferring");
                        self.ctx.should_disconnect = true;
                    }
                } else {
                    self.terminate(
                        LivenessState::RuntimeError,
                        Some(ErrorState::StreamClosed),
                        &mut fx,
                    );
                }
            }
            SessionEvent::ServerError { kind, message } => {
                warn!(
                    session = %self.ctx.session_id,
                    exception = kind.exception_name(),
                    %message,
                    "server error"
                );
                self.terminate(
                    LivenessState::ServerError,
                    Some(ErrorState::Server(kind)),
                    &mut fx,
                );
            }
            SessionEvent::RuntimeError { kind, message } => {
                warn!(session = %self.ctx.session_id, ?kind, %message, "runtime error");
                self.terminate(
                    LivenessState::RuntimeError,
                    Some(ErrorState::Runtime(kind)),
                    &mut fx,
                );
            }
            SessionEvent::MobileLandscapeWarning => {
                self.terminate(
                    LivenessState::RuntimeError,
                    Some(ErrorState::MobileLandscape),
                    &mut fx,
                );
            }
            SessionEvent::Cancel => {
                self.ctx.should_disconnect = true;
                self.terminate(LivenessState::UserCancel, None, &mut fx);
            }
        }
        fx
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    fn on_begin(&mut self, fx: &mut Vec<Effect>) {
        if self.state != LivenessState::Start {
            self.ignore("Begin");
            return;
        }
        fx.push(Effect::OpenTransport);
        self.start_timer(TimerKind::Connection, self.config.connection_timeout(), fx);
        fx.push(Effect::AcquireCamera { device_id: None });
        self.transition(LivenessState::CameraCheck);
    }

    fn on_connection_timeout(&mut self, fx: &mut Vec<Effect>) {
        if self.ctx.connected {
            debug!("connection timeout after open, ignored");
            return;
        }
        self.terminate(
            LivenessState::CheckConnection,
            Some(ErrorState::ConnectionTimeout),
            fx,
        );
    }

    fn on_timer(&mut self, kind: TimerKind, token: TimerToken, fx: &mut Vec<Effect>) {
        if self.timers.get(&kind) != Some(&token) {
            debug!(?kind, %token, state = %self.state, "stale timer ignored");
            return;
        }
        self.timers.remove(&kind);

        match kind {
            TimerKind::Connection => self.on_connection_timeout(fx),
            TimerKind::FaceSearch => self.phase_timeout(TimeoutPhase::FaceSearch, fx),
            TimerKind::Challenge => self.phase_timeout(TimeoutPhase::Challenge, fx),
            TimerKind::Freshness => self.phase_timeout(TimeoutPhase::Freshness, fx),
            TimerKind::Analysis => self.phase_timeout(TimeoutPhase::Analysis, fx),
            TimerKind::StartupDelay => {
                if self.state == LivenessState::RecordingStartupDelay {
                    self.start_challenge(fx);
                }
            }
        }
    }

    fn phase_timeout(&mut self, phase: TimeoutPhase, fx: &mut Vec<Effect>) {
        warn!(session = %self.ctx.session_id, ?phase, state = %self.state, "phase timed out");
        self.terminate(LivenessState::Timeout, Some(ErrorState::Timeout(phase)), fx);
    }

    fn on_face_sample(&mut self, face: Option<Face>, at: u64, fx: &mut Vec<Effect>) {
        self.last_sample_at = Some(at);
        self.ctx.face_match.current_face = face;

        match self.state {
            LivenessState::DetectFaceBeforeStart => self.position_face(face, at, fx),
            LivenessState::CheckFaceDetected => {
                if let Some(face) = face {
                    self.ctx.face_match.start_face = Some(face);
                    self.ctx.oval.initial_face = Some(face);
                    self.ctx.face_match.face_match_state = Some(FaceMatchState::FaceIdentified);
                    self.start_timer(
                        TimerKind::StartupDelay,
                        Duration::from_millis(self.config.recording_startup_delay_ms),
                        fx,
                    );
                    self.transition(LivenessState::RecordingStartupDelay);
                }
            }
            LivenessState::LiveChallenge => self.track_challenge(face, at, fx),
            _ => {}
        }
    }

    /// Pre-recording positioning against the static oval.
    fn position_face(&mut self, face: Option<Face>, at: u64, fx: &mut Vec<Effect>) {
        let (Some(face), Some(oval)) = (face, self.ctx.oval.oval_details) else {
            self.ctx.face_match.face_match_state = Some(FaceMatchState::CantIdentify);
            self.ctx.face_stable_since = None;
            return;
        };

        let state = classify_face(&face, &oval, &self.thresholds);
        self.ctx.face_match.face_match_state = Some(state);

        if state.is_out_of_bounds() {
            self.ctx.face_stable_since = None;
            self.ctx.failed_attempts += 1;
            debug!(
                ?state,
                failed = self.ctx.failed_attempts,
                max = self.ctx.max_failed_attempts,
                "face out of bounds"
            );
            if self.ctx.failed_attempts > self.ctx.max_failed_attempts {
                let error = if state == FaceMatchState::TooClose {
                    ErrorState::FaceDistanceError
                } else {
                    ErrorState::FaceNotCenteredError
                };
                self.terminate(LivenessState::PositioningFailed, Some(error), fx);
            }
            return;
        }

        if state.is_acceptable() {
            self.ctx.face_stable_since.get_or_insert(at);
            self.maybe_auto_start(fx);
        } else {
            self.ctx.face_stable_since = None;
        }
    }

    /// Live challenge tracking against the service's oval.
    fn track_challenge(&mut self, face: Option<Face>, at: u64, fx: &mut Vec<Effect>) {
        let Some(face) = face else {
            self.ctx.face_match.face_match_state = Some(FaceMatchState::CantIdentify);
            return;
        };
        let Some(oval) = self.ctx.oval.oval_details else {
            return;
        };

        let state = classify_face(&face, &oval, &self.thresholds);
        self.ctx.face_match.face_match_state = Some(state);
        if let Some(initial) = self.ctx.oval.initial_face {
            self.ctx.face_match.face_match_percentage =
                Some(face_match_percentage(&face, &initial, &oval, &self.thresholds));
        }
        if let Some(challenge) = self.challenge_ref() {
            fx.push(Effect::Send(ClientEvent::FaceDetected {
                challenge,
                face: self.to_wire(&face),
                timestamp_ms: at,
            }));
        }

        if state != FaceMatchState::Matched {
            return;
        }
        info!(session = %self.ctx.session_id, "face matched target oval");
        self.ctx.face_match.end_face = Some(face);
        self.ctx.face_matched_at = Some(at);
        self.cancel_timer(TimerKind::Challenge, fx);

        let light = self
            .ctx
            .server_session_information
            .as_ref()
            .filter(|c| c.has_light_challenge())
            .cloned();
        match light {
            Some(challenge) => {
                fx.push(Effect::StartColorSequence(challenge.color_sequences().to_vec()));
                self.start_timer(
                    TimerKind::Freshness,
                    self.config.freshness_timeout(&challenge),
                    fx,
                );
                self.transition(LivenessState::FlashColors);
            }
            None => self.enter_upload(fx),
        }
    }

    fn on_recording_stopped(&mut self, at: u64, fx: &mut Vec<Effect>) {
        if self.state != LivenessState::UploadImages || self.ctx.is_recording_stopped {
            self.ignore("RecordingStopped");
            return;
        }
        self.ctx.is_recording_stopped = true;
        self.recording = false;

        if let Some(challenge) = self.challenge_ref() {
            if let (Some(end_face), Some(matched_at)) =
                (self.ctx.face_match.end_face, self.ctx.face_matched_at)
            {
                fx.push(Effect::Send(ClientEvent::ChallengeCompleted {
                    challenge: challenge.clone(),
                    target_face: self.to_wire(&end_face),
                    matched_at,
                    completed_at: at,
                }));
            }
            fx.push(Effect::Send(ClientEvent::VideoEnded {
                challenge,
                timestamp_ms: at,
            }));
        }
        // An empty chunk closes the video stream.
        fx.push(Effect::Send(ClientEvent::VideoChunk {
            data: Vec::new(),
            timestamp_ms: at,
        }));

        if self.ctx.should_disconnect {
            self.terminate(LivenessState::Success, None, fx);
        }
    }

    // -----------------------------------------------------------------------
    // Phase entry
    // -----------------------------------------------------------------------

    fn begin_recording(&mut self, fx: &mut Vec<Effect>) {
        let Some(challenge) = self.ctx.server_session_information.clone() else {
            return;
        };
        self.cancel_timer(TimerKind::FaceSearch, fx);

        self.thresholds = self
            .config
            .thresholds
            .with_challenge_config(challenge.challenge_config());
        self.ctx.oval.oval_details = Some(OvalDetails::from_parameters(challenge.oval_parameters()));
        self.ctx.face_stable_since = None;

        self.recording = true;
        fx.push(Effect::StartRecording);
        self.start_timer(
            TimerKind::Challenge,
            self.config.oval_fit_timeout(&challenge),
            fx,
        );
        self.transition(LivenessState::RecordingStart);
    }

    fn start_challenge(&mut self, fx: &mut Vec<Effect>) {
        let (Some(challenge), Some(initial), Some(oval)) = (
            self.challenge_ref(),
            self.ctx.oval.initial_face,
            self.ctx.oval.oval_details,
        ) else {
            return;
        };
        fx.push(Effect::Send(ClientEvent::ChallengeStarted {
            challenge,
            initial_face: self.to_wire(&initial),
            detected_at: initial.timestamp_ms,
            target_oval: oval.to_parameters(),
        }));
        self.transition(LivenessState::LiveChallenge);
    }

    fn enter_upload(&mut self, fx: &mut Vec<Effect>) {
        self.stop_detection(fx);
        self.recording = false;
        fx.push(Effect::StopRecording);
        self.start_timer(
            TimerKind::Analysis,
            Duration::from_millis(self.config.analysis_timeout_ms),
            fx,
        );
        self.transition(LivenessState::UploadImages);
    }

    /// Starts recording on its own once the gate opens, when configured to.
    fn maybe_auto_start(&mut self, fx: &mut Vec<Effect>) {
        if !self.config.auto_start || self.state != LivenessState::DetectFaceBeforeStart {
            return;
        }
        if let Some(at) = self.last_sample_at {
            if self.start_gate_open(at) {
                self.begin_recording(fx);
            }
        }
    }

    /// Recording may start once the face has been acceptable for the stable
    /// window, the challenge is known and the stream is open.
    fn start_gate_open(&self, at: u64) -> bool {
        let stable = self
            .ctx
            .face_stable_since
            .is_some_and(|since| at.saturating_sub(since) >= self.config.face_stable_ms);
        let acceptable = self
            .ctx
            .face_match
            .face_match_state
            .is_some_and(|s| s.is_acceptable());
        stable && acceptable && self.ctx.server_session_information.is_some() && self.ctx.connected
    }

    // -----------------------------------------------------------------------
    // Termination
    // -----------------------------------------------------------------------

    fn terminate(&mut self, to: LivenessState, error: Option<ErrorState>, fx: &mut Vec<Effect>) {
        if let Some(error) = error {
            self.ctx.set_error(error);
        }

        let mut live: Vec<_> = self.timers.drain().collect();
        live.sort_by_key(|(_, token)| token.into_inner());
        fx.extend(
            live.into_iter()
                .map(|(kind, token)| Effect::CancelTimer { kind, token }),
        );

        self.stop_detection(fx);
        if self.recording {
            self.recording = false;
            fx.push(Effect::StopRecording);
        }
        if self.ctx.video.camera.is_some() {
            fx.push(Effect::ReleaseCamera);
        }
        if !self.ctx.transport_close_requested {
            self.ctx.transport_close_requested = true;
            fx.push(Effect::CloseTransport);
        }

        self.transition(to);
        match self.ctx.error_state {
            Some(error) if to != LivenessState::Success && to != LivenessState::UserCancel => {
                warn!(session = %self.ctx.session_id, state = %to, %error, "session failed");
            }
            _ => info!(session = %self.ctx.session_id, state = %to, "session finished"),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn transition(&mut self, to: LivenessState) {
        debug!(session = %self.ctx.session_id, from = %self.state, %to, "transition");
        self.state = to;
    }

    fn ignore(&self, event: &'static str) {
        debug!(state = %self.state, event, "event not valid in this state, ignored");
    }

    fn start_timer(&mut self, kind: TimerKind, after: Duration, fx: &mut Vec<Effect>) {
        self.cancel_timer(kind, fx);
        self.next_token += 1;
        let token = TimerToken::new(self.next_token);
        self.timers.insert(kind, token);
        fx.push(Effect::StartTimer { kind, token, after });
    }

    fn cancel_timer(&mut self, kind: TimerKind, fx: &mut Vec<Effect>) {
        if let Some(token) = self.timers.remove(&kind) {
            fx.push(Effect::CancelTimer { kind, token });
        }
    }

    fn stop_detection(&mut self, fx: &mut Vec<Effect>) {
        if self.detecting {
            self.detecting = false;
            fx.push(Effect::StopFaceDetection);
        }
    }

    /// Recomputes the pre-start oval for the current camera and surface.
    fn refresh_start_oval(&mut self) {
        let Some(camera) = &self.ctx.video.camera else {
            return;
        };
        self.ctx.oval.oval_details = Some(OvalDetails::for_frame(camera.width, camera.height));
        if let Some(surface) = self.ctx.video.surface {
            if camera.width > 0 {
                self.ctx.oval.scale_factor = Some(surface.width / f64::from(camera.width));
            }
        }
    }

    fn challenge_ref(&self) -> Option<ChallengeRef> {
        let id = self.ctx.challenge_id.clone()?;
        let kind = self
            .ctx
            .server_session_information
            .as_ref()
            .map(ServerChallenge::kind)?;
        Some(ChallengeRef { id, kind })
    }

    fn to_wire(&self, face: &Face) -> BoundingBox {
        let (w, h) = self
            .ctx
            .video
            .camera
            .as_ref()
            .map_or((1, 1), |c| (c.width, c.height));
        face.region.to_wire(w, h)
    }
}
