//! The session actor and its handle.
//!
//! One actor owns every mutable piece of a session: lifecycle state, the
//! stream registry, the participant roster and the media control state.
//! Transport calls run in spawned tasks; their completions re-enter the
//! mailbox as messages tagged with the generation of the connect attempt
//! that issued them. Because only the actor task mutates state, no ordering
//! between transport channels has to be assumed: whatever order completions
//! and events arrive in, they are applied one at a time.
//!
//! Generations make abandonment cheap. `exit()` (and attempt failure) bumps
//! the generation instead of cancelling in-flight transport calls; when the
//! calls eventually resolve, their stale generation no longer matches and
//! the result is logged and dropped.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use common::types::{DeviceId, MediaHandle, MeetingId, StreamId};

use crate::actor::messages::{
    ConnectParams, ConnectionState, SessionMessage, SessionSnapshot, SessionView,
};
use crate::actor::metrics::{MailboxMonitor, SessionMetrics, SessionMetricsSnapshot};
use crate::config::Config;
use crate::errors::SessionError;
use crate::media::MediaControlState;
use crate::observability::metrics;
use crate::registry::{StreamDescriptor, StreamRegistry};
use crate::roster::{ParticipantInfo, ParticipantRoster};
use crate::transport::{AuthRequest, RemoteVideoInfo, StreamEvent, TransportClient, TransportError};

/// Camera label attached to the local capture placeholder.
const LOCAL_CAMERA_LABEL: &str = "Camera";

/// Handle to the session actor.
///
/// Cloneable; every clone talks to the same actor. The actor stops when the
/// handle is cancelled or every clone (and thus the mailbox) is dropped.
#[derive(Clone)]
pub struct SessionActorHandle {
    sender: mpsc::Sender<SessionMessage>,
    cancel_token: CancellationToken,
    view_rx: watch::Receiver<SessionView>,
    metrics: Arc<SessionMetrics>,
}

impl SessionActorHandle {
    /// Spawn a session actor driving `transport` and return its handle.
    #[must_use]
    pub fn new(config: Config, transport: Arc<dyn TransportClient>) -> Self {
        let (sender, receiver) = mpsc::channel(config.command_buffer);
        let cancel_token = CancellationToken::new();
        let session_metrics = SessionMetrics::new();
        let (view_tx, view_rx) = watch::channel(SessionView::idle());

        let actor = SessionActor {
            client_id: config.client_id.clone(),
            server: config.server,
            transport,
            receiver,
            // Weak: the actor must not keep its own mailbox open once every
            // handle is gone.
            self_sender: sender.downgrade(),
            event_buffer: config.event_buffer,
            state: ConnectionState::Idle,
            generation: 0,
            session: None,
            pending_connect: None,
            pending_activations: HashSet::new(),
            registry: StreamRegistry::new(),
            roster: ParticipantRoster::new(),
            media: MediaControlState::new(config.default_capture_device),
            view_tx,
            metrics: Arc::clone(&session_metrics),
            mailbox: MailboxMonitor::new(&config.client_id),
            cancel_token: cancel_token.clone(),
        };

        tokio::spawn(actor.run());

        Self {
            sender,
            cancel_token,
            view_rx,
            metrics: session_metrics,
        }
    }

    /// Connect to a meeting: authenticate, join, then bring up local media.
    ///
    /// Resolves once the session is in the meeting, or with the error that
    /// ended the attempt. Guest mode is [`common::types::Credentials::guest`]
    /// plus a display name.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyActive`] when a session is active,
    /// [`SessionError::EmptyMeetingId`] / [`SessionError::EmptyDisplayName`]
    /// on invalid input, [`SessionError::Authentication`] or
    /// [`SessionError::Join`] when the transport rejects the attempt, and
    /// [`SessionError::Aborted`] when an exit abandons it first.
    pub async fn connect(&self, params: ConnectParams) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::Connect {
                params,
                respond_to: tx,
            })
            .await
            .map_err(|e| SessionError::Internal(format!("channel send failed: {e}")))?;
        rx.await
            .map_err(|e| SessionError::Internal(format!("response receive failed: {e}")))?
    }

    /// Leave the meeting (or abandon a pending attempt) and reset to idle.
    ///
    /// The disconnect is fire-and-forget; local state is reset before the
    /// transport acknowledges anything.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotInMeeting`] when the controller is already idle.
    pub async fn exit(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::Exit { respond_to: tx })
            .await
            .map_err(|e| SessionError::Internal(format!("channel send failed: {e}")))?;
        rx.await
            .map_err(|e| SessionError::Internal(format!("response receive failed: {e}")))?
    }

    /// Enable or disable the local video feed.
    ///
    /// Resolves when the toggle is accepted; the enable/disable round trip
    /// completes in the background and is observed through the view.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotInMeeting`] outside a meeting,
    /// [`SessionError::OperationInFlight`] while a previous toggle is still
    /// pending.
    pub async fn toggle_local_video(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::ToggleLocalVideo { respond_to: tx })
            .await
            .map_err(|e| SessionError::Internal(format!("channel send failed: {e}")))?;
        rx.await
            .map_err(|e| SessionError::Internal(format!("response receive failed: {e}")))?
    }

    /// Mute or unmute the audio input.
    ///
    /// # Errors
    ///
    /// Same guards as [`toggle_local_video`](Self::toggle_local_video).
    pub async fn toggle_audio_input(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::ToggleAudioInput { respond_to: tx })
            .await
            .map_err(|e| SessionError::Internal(format!("channel send failed: {e}")))?;
        rx.await
            .map_err(|e| SessionError::Internal(format!("response receive failed: {e}")))?
    }

    /// Select the capture device used by subsequent local-video enables.
    ///
    /// The id is opaque and passed to the transport unchanged. Switching
    /// while video is enabled takes effect on the next enable; disable and
    /// re-enable to switch a live capture.
    ///
    /// # Errors
    ///
    /// Only internal channel failures.
    pub async fn set_capture_device(&self, device: DeviceId) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::SetCaptureDevice {
                device,
                respond_to: tx,
            })
            .await
            .map_err(|e| SessionError::Internal(format!("channel send failed: {e}")))?;
        rx.await
            .map_err(|e| SessionError::Internal(format!("response receive failed: {e}")))
    }

    /// Read the control-enablement snapshot.
    ///
    /// # Errors
    ///
    /// Only internal channel failures.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::GetSnapshot { respond_to: tx })
            .await
            .map_err(|e| SessionError::Internal(format!("channel send failed: {e}")))?;
        rx.await
            .map_err(|e| SessionError::Internal(format!("response receive failed: {e}")))
    }

    /// Read the stream descriptors in rendering order.
    ///
    /// # Errors
    ///
    /// Only internal channel failures.
    pub async fn streams(&self) -> Result<Vec<StreamDescriptor>, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::ListStreams { respond_to: tx })
            .await
            .map_err(|e| SessionError::Internal(format!("channel send failed: {e}")))?;
        rx.await
            .map_err(|e| SessionError::Internal(format!("response receive failed: {e}")))
    }

    /// Read the participant roster in announcement order.
    ///
    /// # Errors
    ///
    /// Only internal channel failures.
    pub async fn participants(&self) -> Result<Vec<ParticipantInfo>, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::ListParticipants { respond_to: tx })
            .await
            .map_err(|e| SessionError::Internal(format!("channel send failed: {e}")))?;
        rx.await
            .map_err(|e| SessionError::Internal(format!("response receive failed: {e}")))
    }

    /// Subscribe to observable-state updates. The receiver always holds the
    /// latest published view.
    #[must_use]
    pub fn watch_view(&self) -> watch::Receiver<SessionView> {
        self.view_rx.clone()
    }

    /// Point-in-time copy of the session outcome counters.
    #[must_use]
    pub fn metrics_snapshot(&self) -> SessionMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Signal the actor to shut down.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// True once shutdown has been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// Facts about the attempt currently owning the generation.
#[derive(Debug)]
struct ActiveSession {
    display_name: String,
    email: String,
    meeting_id: MeetingId,
    started_at: DateTime<Utc>,
}

/// The session actor. Single owner of all session state; see the module docs
/// for the concurrency model.
struct SessionActor {
    client_id: String,
    server: String,
    transport: Arc<dyn TransportClient>,
    receiver: mpsc::Receiver<SessionMessage>,
    self_sender: mpsc::WeakSender<SessionMessage>,
    event_buffer: usize,

    state: ConnectionState,
    /// Identifier of the current connect attempt. Bumped on every connect,
    /// exit and failure; completions carrying an older value are discarded.
    generation: u64,
    session: Option<ActiveSession>,
    /// Responder of the in-progress connect, held until the attempt resolves.
    pending_connect: Option<oneshot::Sender<Result<(), SessionError>>>,
    /// Remote streams whose activation round trip is in flight.
    pending_activations: HashSet<StreamId>,
    registry: StreamRegistry,
    roster: ParticipantRoster,
    media: MediaControlState,

    view_tx: watch::Sender<SessionView>,
    metrics: Arc<SessionMetrics>,
    mailbox: MailboxMonitor,
    cancel_token: CancellationToken,
}

impl SessionActor {
    #[instrument(skip_all, name = "sc.actor.session", fields(client_id = %self.client_id))]
    async fn run(mut self) {
        info!(
            target: "sc.actor.session",
            client_id = %self.client_id,
            server = %self.server,
            "SessionActor started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "sc.actor.session",
                        client_id = %self.client_id,
                        "SessionActor received cancellation signal"
                    );
                    self.graceful_shutdown();
                    break;
                }
                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.mailbox.record_enqueue();
                            self.handle_message(message);
                            self.mailbox.record_dequeue();
                            metrics::set_mailbox_depth(self.mailbox.current_depth());
                        }
                        None => {
                            info!(
                                target: "sc.actor.session",
                                client_id = %self.client_id,
                                "SessionActor channel closed, exiting"
                            );
                            self.graceful_shutdown();
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "sc.actor.session",
            client_id = %self.client_id,
            messages_processed = self.mailbox.messages_processed(),
            "SessionActor stopped"
        );
    }

    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Connect { params, respond_to } => {
                self.handle_connect(params, respond_to);
            }
            SessionMessage::Exit { respond_to } => {
                let result = self.handle_exit();
                let _ = respond_to.send(result);
            }
            SessionMessage::ToggleLocalVideo { respond_to } => {
                let result = self.handle_toggle_local_video();
                let _ = respond_to.send(result);
            }
            SessionMessage::ToggleAudioInput { respond_to } => {
                let result = self.handle_toggle_audio_input();
                let _ = respond_to.send(result);
            }
            SessionMessage::SetCaptureDevice { device, respond_to } => {
                self.handle_set_capture_device(device);
                let _ = respond_to.send(());
            }
            SessionMessage::GetSnapshot { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }
            SessionMessage::ListStreams { respond_to } => {
                let _ = respond_to.send(self.registry.list());
            }
            SessionMessage::ListParticipants { respond_to } => {
                let _ = respond_to.send(self.roster.list());
            }
            SessionMessage::AuthCompleted { generation, result } => {
                self.handle_auth_completed(generation, result);
            }
            SessionMessage::JoinCompleted { generation, result } => {
                self.handle_join_completed(generation, result);
            }
            SessionMessage::TransportEvent { generation, event } => {
                self.handle_transport_event(generation, event);
            }
            SessionMessage::RemoteVideoEnabled {
                generation,
                info,
                result,
            } => {
                self.handle_remote_video_enabled(generation, info, result);
            }
            SessionMessage::LocalVideoEnabled { generation, handle } => {
                self.handle_local_video_enabled(generation, handle);
            }
            SessionMessage::LocalVideoDisabled { generation } => {
                self.handle_local_video_disabled(generation);
            }
        }
    }

    // ----- connect lifecycle -----

    fn handle_connect(
        &mut self,
        params: ConnectParams,
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    ) {
        if self.state != ConnectionState::Idle {
            let _ = respond_to.send(Err(SessionError::AlreadyActive));
            return;
        }
        if params.meeting_id.is_empty() {
            let _ = respond_to.send(Err(SessionError::EmptyMeetingId));
            return;
        }
        if params.display_name.is_empty() {
            let _ = respond_to.send(Err(SessionError::EmptyDisplayName));
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        self.state = ConnectionState::Connecting;
        self.session = Some(ActiveSession {
            display_name: params.display_name.clone(),
            email: params.credentials.email.clone(),
            meeting_id: params.meeting_id.clone(),
            started_at: Utc::now(),
        });
        self.pending_connect = Some(respond_to);
        self.metrics.record_connect_attempt();
        metrics::record_connect_attempt();

        info!(
            target: "sc.actor.session",
            client_id = %self.client_id,
            generation,
            meeting_id = %params.meeting_id,
            guest = params.credentials.is_guest(),
            "Connect attempt started"
        );

        let request = AuthRequest {
            server: self.server.clone(),
            credentials: params.credentials,
            meeting_id: params.meeting_id,
            display_name: params.display_name,
        };
        let transport = Arc::clone(&self.transport);
        let self_sender = self.self_sender.clone();
        tokio::spawn(async move {
            debug!(target: "sc.transport", generation, "Authenticate issued");
            let result = transport.authenticate(request).await;
            if let Some(sender) = self_sender.upgrade() {
                let _ = sender
                    .send(SessionMessage::AuthCompleted { generation, result })
                    .await;
            }
        });

        self.publish_view();
    }

    fn handle_auth_completed(&mut self, generation: u64, result: Result<(), TransportError>) {
        if self.is_stale(generation, "auth_completed") {
            return;
        }

        match result {
            Ok(()) => {
                debug!(
                    target: "sc.actor.session",
                    client_id = %self.client_id,
                    generation,
                    "Authentication complete, joining meeting"
                );
                self.state = ConnectionState::JoiningMeeting;
                self.spawn_join(generation);
                self.publish_view();
            }
            Err(e) => {
                self.metrics.record_auth_failure();
                metrics::record_connect_failure("authenticate");
                self.fail_attempt(SessionError::Authentication(e.to_string()));
            }
        }
    }

    fn spawn_join(&mut self, generation: u64) {
        let Some(session) = self.session.as_ref() else {
            warn!(
                target: "sc.actor.session",
                client_id = %self.client_id,
                generation,
                "Join requested without an active session"
            );
            self.fail_attempt(SessionError::Internal(
                "join without active session".to_string(),
            ));
            return;
        };
        let meeting_id = session.meeting_id.clone();

        let (events_tx, mut events_rx) = mpsc::channel(self.event_buffer);

        // Forward stream events into the mailbox, tagged with this attempt's
        // generation so a later attempt never mistakes them for its own.
        let forward = self.self_sender.clone();
        tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                let Some(sender) = forward.upgrade() else {
                    break;
                };
                if sender
                    .send(SessionMessage::TransportEvent { generation, event })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        let transport = Arc::clone(&self.transport);
        let self_sender = self.self_sender.clone();
        tokio::spawn(async move {
            debug!(target: "sc.transport", generation, meeting_id = %meeting_id, "Join issued");
            let result = transport.join(meeting_id, events_tx).await;
            if let Some(sender) = self_sender.upgrade() {
                let _ = sender
                    .send(SessionMessage::JoinCompleted { generation, result })
                    .await;
            }
        });
    }

    fn handle_join_completed(&mut self, generation: u64, result: Result<(), TransportError>) {
        if self.is_stale(generation, "join_completed") {
            return;
        }

        match result {
            Ok(()) => {
                self.state = ConnectionState::InMeeting;
                if let Some(respond_to) = self.pending_connect.take() {
                    let _ = respond_to.send(Ok(()));
                }
                self.metrics.record_meeting_joined();

                if let Some(session) = self.session.as_ref() {
                    let elapsed = Utc::now()
                        .signed_duration_since(session.started_at)
                        .to_std()
                        .unwrap_or_default();
                    metrics::record_session_established(elapsed);
                    info!(
                        target: "sc.actor.session",
                        client_id = %self.client_id,
                        generation,
                        meeting_id = %session.meeting_id,
                        connect_ms = elapsed.as_millis() as u64,
                        "Joined meeting"
                    );
                }

                // Bring up local media. Capture and audio ride separate
                // transport channels; neither orders against stream events.
                self.spawn_enable_local_video(generation);
                self.transport.enable_audio();
                self.media.audio_input_muted = false;
                self.publish_view();
            }
            Err(e) => {
                self.metrics.record_join_failure();
                metrics::record_connect_failure("join");
                self.fail_attempt(SessionError::Join(e.to_string()));
            }
        }
    }

    /// Fail the current attempt: surface the error, invalidate the
    /// generation, reset to idle.
    fn fail_attempt(&mut self, error: SessionError) {
        // Join failures happen on an authenticated transport session;
        // release it so the next attempt starts clean.
        let authenticated = self.state == ConnectionState::JoiningMeeting;

        warn!(
            target: "sc.actor.session",
            client_id = %self.client_id,
            generation = self.generation,
            error = %error,
            error_type = error.error_type_label(),
            "Connect attempt failed"
        );

        self.state = ConnectionState::Failed;
        self.generation += 1;
        if let Some(respond_to) = self.pending_connect.take() {
            let _ = respond_to.send(Err(error));
        }
        self.session = None;
        self.registry.clear();
        self.roster.clear();
        self.pending_activations.clear();
        self.media.reset();
        if authenticated {
            self.transport.disconnect();
        }

        // Failed never outlives the attempt; the controller is immediately
        // reusable.
        self.state = ConnectionState::Idle;
        self.publish_view();
    }

    fn handle_exit(&mut self) -> Result<(), SessionError> {
        if self.state == ConnectionState::Idle {
            return Err(SessionError::NotInMeeting);
        }
        let was_in_meeting = self.state == ConnectionState::InMeeting;

        self.state = ConnectionState::Exiting;
        // Abandon the current attempt: any in-flight completion now carries
        // a stale generation.
        self.generation += 1;
        if let Some(respond_to) = self.pending_connect.take() {
            let _ = respond_to.send(Err(SessionError::Aborted));
        }

        if let Some(session) = self.session.take() {
            if was_in_meeting {
                let lived = Utc::now()
                    .signed_duration_since(session.started_at)
                    .to_std()
                    .unwrap_or_default();
                metrics::record_session_exited(lived);
                info!(
                    target: "sc.actor.session",
                    client_id = %self.client_id,
                    meeting_id = %session.meeting_id,
                    duration_secs = lived.as_secs(),
                    "Exiting meeting"
                );
            } else {
                debug!(
                    target: "sc.actor.session",
                    client_id = %self.client_id,
                    meeting_id = %session.meeting_id,
                    "Abandoning connect attempt"
                );
            }
        }

        self.registry.clear();
        self.roster.clear();
        self.pending_activations.clear();
        self.media.reset();
        // Fire-and-forget: the controls must come back without waiting on
        // the transport.
        self.transport.disconnect();
        self.metrics.record_exit();

        self.state = ConnectionState::Idle;
        self.publish_view();
        Ok(())
    }

    // ----- media controls -----

    fn handle_toggle_local_video(&mut self) -> Result<(), SessionError> {
        if self.state != ConnectionState::InMeeting {
            self.metrics.record_toggle_refused();
            metrics::record_toggle_refused("video", "not_in_meeting");
            return Err(SessionError::NotInMeeting);
        }
        if !self.media.can_toggle() {
            self.metrics.record_toggle_refused();
            metrics::record_toggle_refused("video", "operation_in_flight");
            return Err(SessionError::OperationInFlight);
        }

        let generation = self.generation;
        if self.media.local_video_enabled {
            debug!(
                target: "sc.actor.session",
                client_id = %self.client_id,
                "Disabling local video"
            );
            self.media.begin_operation();
            let transport = Arc::clone(&self.transport);
            let self_sender = self.self_sender.clone();
            tokio::spawn(async move {
                debug!(target: "sc.transport", generation, "Disable local video issued");
                transport.disable_local_video().await;
                if let Some(sender) = self_sender.upgrade() {
                    let _ = sender
                        .send(SessionMessage::LocalVideoDisabled { generation })
                        .await;
                }
            });
        } else {
            debug!(
                target: "sc.actor.session",
                client_id = %self.client_id,
                device = %self.media.capture_device,
                "Enabling local video"
            );
            self.spawn_enable_local_video(generation);
        }

        self.publish_view();
        Ok(())
    }

    fn spawn_enable_local_video(&mut self, generation: u64) {
        self.media.begin_operation();
        let device = self.media.capture_device.clone();
        let transport = Arc::clone(&self.transport);
        let self_sender = self.self_sender.clone();
        tokio::spawn(async move {
            debug!(target: "sc.transport", generation, device = %device, "Enable local video issued");
            let handle = transport.enable_local_video(device).await;
            if let Some(sender) = self_sender.upgrade() {
                let _ = sender
                    .send(SessionMessage::LocalVideoEnabled { generation, handle })
                    .await;
            }
        });
    }

    fn handle_local_video_enabled(&mut self, generation: u64, handle: MediaHandle) {
        if self.is_stale(generation, "local_video_enabled") {
            return;
        }
        self.media.finish_operation();

        let Some(session) = self.session.as_ref() else {
            warn!(
                target: "sc.actor.session",
                client_id = %self.client_id,
                "Local capture completed without an active session"
            );
            self.publish_view();
            return;
        };

        let descriptor = StreamDescriptor {
            id: StreamId::local(),
            participant_email: session.email.clone(),
            participant_name: session.display_name.clone(),
            camera_label: Some(LOCAL_CAMERA_LABEL.to_string()),
            is_screen_share: false,
            media_handle: handle,
        };
        match self.registry.insert(descriptor) {
            Ok(()) => {
                self.media.local_video_enabled = true;
                self.metrics.record_stream_added();
                metrics::record_stream_event("local_video_added");
            }
            Err(e) => {
                warn!(
                    target: "sc.actor.session",
                    client_id = %self.client_id,
                    error = %e,
                    "Local descriptor insert rejected"
                );
            }
        }
        self.publish_view();
    }

    fn handle_local_video_disabled(&mut self, generation: u64) {
        if self.is_stale(generation, "local_video_disabled") {
            return;
        }
        self.media.finish_operation();
        self.media.local_video_enabled = false;
        if self.registry.remove(&StreamId::local()).is_some() {
            self.metrics.record_stream_removed();
            metrics::record_stream_event("local_video_removed");
        }
        self.publish_view();
    }

    fn handle_toggle_audio_input(&mut self) -> Result<(), SessionError> {
        if self.state != ConnectionState::InMeeting {
            self.metrics.record_toggle_refused();
            metrics::record_toggle_refused("audio", "not_in_meeting");
            return Err(SessionError::NotInMeeting);
        }
        if !self.media.can_toggle() {
            self.metrics.record_toggle_refused();
            metrics::record_toggle_refused("audio", "operation_in_flight");
            return Err(SessionError::OperationInFlight);
        }

        // The mute state flips on acceptance; the transport call is
        // fire-and-forget.
        let muted = self.media.flip_audio_muted();
        if muted {
            self.transport.mute_audio_input();
        } else {
            self.transport.unmute_audio_input();
        }
        debug!(
            target: "sc.actor.session",
            client_id = %self.client_id,
            muted,
            "Audio input toggled"
        );
        self.publish_view();
        Ok(())
    }

    fn handle_set_capture_device(&mut self, device: DeviceId) {
        debug!(
            target: "sc.actor.session",
            client_id = %self.client_id,
            device = %device,
            "Capture device selected"
        );
        self.media.capture_device = device;
    }

    // ----- stream events -----

    fn handle_transport_event(&mut self, generation: u64, event: StreamEvent) {
        if self.is_stale(generation, "stream_event") {
            return;
        }

        match event {
            StreamEvent::VideoAdded(info) => self.handle_video_added(generation, info),
            StreamEvent::VideoRemoved { id } => self.handle_video_removed(&id),
            StreamEvent::AudioAdded { id, email, name } => {
                metrics::record_stream_event("audio_added");
                let added = self.roster.add(ParticipantInfo {
                    stream_id: id,
                    email,
                    display_name: name,
                });
                if added {
                    self.publish_view();
                }
            }
            StreamEvent::AudioRemoved { id } => {
                metrics::record_stream_event("audio_removed");
                if self.roster.remove(&id).is_some() {
                    self.publish_view();
                }
            }
        }
    }

    fn handle_video_added(&mut self, generation: u64, info: RemoteVideoInfo) {
        metrics::record_stream_event("video_added");

        // The server echoes our own stream back under its own id; swap it
        // for the placeholder instead of capturing twice.
        let own_echo = self
            .session
            .as_ref()
            .is_some_and(|s| s.display_name == info.name);
        if own_echo {
            self.apply_echo_replacement(&info);
            return;
        }

        if self.registry.contains(&info.id) || self.pending_activations.contains(&info.id) {
            debug!(
                target: "sc.actor.session",
                client_id = %self.client_id,
                stream_id = %info.id,
                "Duplicate stream announcement ignored"
            );
            return;
        }

        self.pending_activations.insert(info.id.clone());
        let stream_id = info.id.clone();
        let transport = Arc::clone(&self.transport);
        let self_sender = self.self_sender.clone();
        tokio::spawn(async move {
            debug!(target: "sc.transport", generation, stream_id = %stream_id, "Enable remote video issued");
            let result = transport.enable_remote_video(stream_id).await;
            if let Some(sender) = self_sender.upgrade() {
                let _ = sender
                    .send(SessionMessage::RemoteVideoEnabled {
                        generation,
                        info,
                        result,
                    })
                    .await;
            }
        });
    }

    fn apply_echo_replacement(&mut self, info: &RemoteVideoInfo) {
        let local_id = StreamId::local();
        let Some(placeholder) = self.registry.get(&local_id) else {
            // Nothing to swap: local video is off or the capture is still
            // being enabled. Activating our own echo would only loop the
            // camera back at us, so the announcement is dropped.
            debug!(
                target: "sc.actor.session",
                client_id = %self.client_id,
                stream_id = %info.id,
                "Own stream echoed with no local placeholder, ignored"
            );
            return;
        };

        let descriptor = StreamDescriptor {
            id: info.id.clone(),
            participant_email: info.email.clone(),
            participant_name: info.name.clone(),
            camera_label: info.camera.clone(),
            is_screen_share: info.is_screen_share,
            // The placeholder's capture handle keeps rendering; only the
            // identity changes.
            media_handle: placeholder.media_handle.clone(),
        };
        match self.registry.replace(&local_id, descriptor) {
            Ok(()) => {
                debug!(
                    target: "sc.actor.session",
                    client_id = %self.client_id,
                    stream_id = %info.id,
                    "Local placeholder replaced by server echo"
                );
                self.metrics.record_echo_replacement();
                metrics::record_echo_replacement();
                self.publish_view();
            }
            Err(e) => {
                warn!(
                    target: "sc.actor.session",
                    client_id = %self.client_id,
                    stream_id = %info.id,
                    error = %e,
                    "Echo replacement rejected"
                );
            }
        }
    }

    fn handle_video_removed(&mut self, id: &StreamId) {
        metrics::record_stream_event("video_removed");
        // Also cancels a pending activation: its completion will find the
        // stream no longer pending and drop the handle.
        let was_pending = self.pending_activations.remove(id);

        if self.registry.remove(id).is_some() {
            self.metrics.record_stream_removed();
            self.publish_view();
        } else {
            // The removal may describe a stream that never activated or was
            // already replaced by the echo swap. Unknown ids stay a no-op.
            debug!(
                target: "sc.actor.session",
                client_id = %self.client_id,
                stream_id = %id,
                was_pending,
                "Stream removal for unregistered id"
            );
        }
    }

    fn handle_remote_video_enabled(
        &mut self,
        generation: u64,
        info: RemoteVideoInfo,
        result: Result<MediaHandle, TransportError>,
    ) {
        if self.is_stale(generation, "remote_video_enabled") {
            return;
        }

        if !self.pending_activations.remove(&info.id) {
            // The stream was removed while the activation was in flight.
            debug!(
                target: "sc.actor.session",
                client_id = %self.client_id,
                stream_id = %info.id,
                "Activation completed for a stream no longer pending"
            );
            return;
        }

        let handle = match result {
            Ok(handle) => handle,
            Err(e) => {
                // Non-fatal: the stream is skipped, the session continues.
                let error = SessionError::MediaActivation {
                    stream_id: info.id.clone(),
                    reason: e.to_string(),
                };
                warn!(
                    target: "sc.actor.session",
                    client_id = %self.client_id,
                    stream_id = %info.id,
                    error = %error,
                    error_type = error.error_type_label(),
                    "Remote video activation failed"
                );
                self.metrics.record_media_activation_failure();
                metrics::record_media_activation_failure();
                return;
            }
        };

        let descriptor = StreamDescriptor {
            id: info.id.clone(),
            participant_email: info.email,
            participant_name: info.name,
            camera_label: info.camera,
            is_screen_share: info.is_screen_share,
            media_handle: handle,
        };
        match self.registry.insert(descriptor) {
            Ok(()) => {
                self.metrics.record_stream_added();
                self.publish_view();
            }
            Err(e) => {
                warn!(
                    target: "sc.actor.session",
                    client_id = %self.client_id,
                    stream_id = %info.id,
                    error = %e,
                    "Activated stream insert rejected"
                );
            }
        }
    }

    // ----- shared plumbing -----

    /// True when `generation` belongs to an abandoned attempt. Discarding is
    /// logged and counted but never an error.
    fn is_stale(&self, generation: u64, kind: &'static str) -> bool {
        if generation == self.generation {
            return false;
        }
        debug!(
            target: "sc.actor.session",
            client_id = %self.client_id,
            generation,
            current_generation = self.generation,
            kind,
            "Discarding callback from abandoned attempt"
        );
        self.metrics.record_stale_callback();
        metrics::record_stale_callback(kind);
        true
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            connection_state: self.state,
            in_meeting: self.state == ConnectionState::InMeeting,
            video_enabled: self.media.local_video_enabled,
            audio_input_muted: self.media.audio_input_muted,
            busy: self.state.is_transitional() || self.media.operation_in_flight,
        }
    }

    fn publish_view(&self) {
        let view = SessionView {
            snapshot: self.snapshot(),
            streams: self.registry.list(),
            participants: self.roster.list(),
        };
        metrics::set_streams_active(view.streams.len());
        metrics::set_participants_active(view.participants.len());
        let _ = self.view_tx.send(view);
    }

    fn graceful_shutdown(&mut self) {
        info!(
            target: "sc.actor.session",
            client_id = %self.client_id,
            state = self.state.as_str(),
            "SessionActor shutting down"
        );
        if let Some(respond_to) = self.pending_connect.take() {
            let _ = respond_to.send(Err(SessionError::Aborted));
        }
        if self.state != ConnectionState::Idle {
            self.transport.disconnect();
        }
        self.generation += 1;
        self.session = None;
        self.registry.clear();
        self.roster.clear();
        self.pending_activations.clear();
        self.media.reset();
        self.state = ConnectionState::Idle;
        self.publish_view();
    }
}
