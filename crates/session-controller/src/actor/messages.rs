//! Message types for the session actor.
//!
//! Two families share the mailbox. Commands come from the handle and carry a
//! `respond_to` channel. Completion and event variants are posted back by
//! tasks the actor spawned; each carries the generation of the connect
//! attempt that spawned it, and the actor discards any whose generation no
//! longer matches.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use common::types::{Credentials, DeviceId, MediaHandle, MeetingId};

use crate::errors::SessionError;
use crate::registry::StreamDescriptor;
use crate::roster::ParticipantInfo;
use crate::transport::{RemoteVideoInfo, StreamEvent, TransportError};

/// Parameters of a connect request.
///
/// Guest mode is `Credentials::guest()`; the meeting id and display name are
/// required either way.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// Account credentials; both fields empty for guests.
    pub credentials: Credentials,
    /// Meeting to join.
    pub meeting_id: MeetingId,
    /// Name shown to other participants.
    pub display_name: String,
}

/// Lifecycle state of the session.
///
/// `Failed` never outlives the attempt it describes: the actor surfaces the
/// failure to the caller and immediately collapses back to `Idle`, so
/// observers only ever see `Failed` inside a published view transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No session; connect is accepted.
    Idle,
    /// Authenticate call pending.
    Connecting,
    /// Authenticated; join call pending.
    JoiningMeeting,
    /// Joined; media and stream events are live.
    InMeeting,
    /// Tearing down on the way back to `Idle`.
    Exiting,
    /// The current attempt failed.
    Failed,
}

impl ConnectionState {
    /// String form for logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::JoiningMeeting => "joining_meeting",
            ConnectionState::InMeeting => "in_meeting",
            ConnectionState::Exiting => "exiting",
            ConnectionState::Failed => "failed",
        }
    }

    /// True while a connect attempt or teardown is progressing.
    #[must_use]
    pub const fn is_transitional(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::JoiningMeeting | ConnectionState::Exiting
        )
    }
}

/// Control-enablement snapshot for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Current lifecycle state.
    pub connection_state: ConnectionState,
    /// True when media controls are allowed.
    pub in_meeting: bool,
    /// Local video is captured and registered.
    pub video_enabled: bool,
    /// Microphone input is muted.
    pub audio_input_muted: bool,
    /// True while any operation that should disable controls is pending:
    /// a transitional lifecycle state or an in-flight media operation.
    pub busy: bool,
}

/// Full observable state, published over the handle's watch channel after
/// every mutation the presentation layer can see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    /// Control-enablement snapshot.
    pub snapshot: SessionSnapshot,
    /// Stream descriptors in rendering order.
    pub streams: Vec<StreamDescriptor>,
    /// Participants in announcement order.
    pub participants: Vec<ParticipantInfo>,
}

impl SessionView {
    /// View of an idle controller.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            snapshot: SessionSnapshot {
                connection_state: ConnectionState::Idle,
                in_meeting: false,
                video_enabled: false,
                audio_input_muted: false,
                busy: false,
            },
            streams: Vec::new(),
            participants: Vec::new(),
        }
    }
}

/// Messages handled by the session actor.
#[derive(Debug)]
pub enum SessionMessage {
    /// Start a connect attempt: authenticate, then join. Responds when the
    /// attempt reaches the meeting or fails.
    Connect {
        /// Credentials, meeting and display name.
        params: ConnectParams,
        /// Resolution of the whole attempt.
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    /// Leave the meeting (or abandon the current attempt) and reset to idle.
    Exit {
        /// Acknowledged as soon as local state is reset.
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    /// Enable or disable the local video feed.
    ToggleLocalVideo {
        /// Resolves on acceptance; completion is observed through the view.
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    /// Mute or unmute the audio input.
    ToggleAudioInput {
        /// Resolves on acceptance.
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    /// Select the capture device used by subsequent local-video enables.
    SetCaptureDevice {
        /// Opaque device id, passed to the transport unchanged.
        device: DeviceId,
        /// Acknowledgment.
        respond_to: oneshot::Sender<()>,
    },

    /// Read the control-enablement snapshot.
    GetSnapshot {
        /// Snapshot reply.
        respond_to: oneshot::Sender<SessionSnapshot>,
    },

    /// Read the stream descriptors in rendering order.
    ListStreams {
        /// Descriptor list reply.
        respond_to: oneshot::Sender<Vec<StreamDescriptor>>,
    },

    /// Read the participant roster.
    ListParticipants {
        /// Roster reply.
        respond_to: oneshot::Sender<Vec<ParticipantInfo>>,
    },

    /// Authenticate call resolved.
    AuthCompleted {
        /// Attempt that issued the call.
        generation: u64,
        /// Transport result.
        result: Result<(), TransportError>,
    },

    /// Join call resolved.
    JoinCompleted {
        /// Attempt that issued the call.
        generation: u64,
        /// Transport result.
        result: Result<(), TransportError>,
    },

    /// A stream event arrived from the transport.
    TransportEvent {
        /// Attempt whose event channel delivered it.
        generation: u64,
        /// The notification.
        event: StreamEvent,
    },

    /// Remote video activation resolved.
    RemoteVideoEnabled {
        /// Attempt that issued the call.
        generation: u64,
        /// Announcement the activation was requested for.
        info: RemoteVideoInfo,
        /// Handle on success.
        result: Result<MediaHandle, TransportError>,
    },

    /// Local video enable resolved with its capture handle.
    LocalVideoEnabled {
        /// Attempt that issued the call.
        generation: u64,
        /// Handle to the local capture.
        handle: MediaHandle,
    },

    /// Local video disable acknowledged.
    LocalVideoDisabled {
        /// Attempt that issued the call.
        generation: u64,
    },
}
