//! Contract with the external transport engine.
//!
//! The transport owns every network and media resource: connections, the
//! camera, remote stream subscriptions. The session controller only sequences
//! calls against this trait and reconciles the notifications it emits. The
//! trait is object-safe so the controller can hold `Arc<dyn TransportClient>`
//! and tests can substitute a scripted double.
//!
//! Calls fall into three shapes:
//!
//! - request/response with failure (`authenticate`, `join`,
//!   `enable_remote_video`)
//! - request/acknowledgment that does not fail (`enable_local_video`,
//!   `disable_local_video`)
//! - fire-and-forget (`enable_audio`, mute controls, `disconnect`)
//!
//! The controller never assumes ordering between completions of different
//! calls or between completions and stream events. Each arrives on its own
//! schedule and is reconciled through the actor mailbox.

use async_trait::async_trait;
use tokio::sync::mpsc;

use common::types::{Credentials, DeviceId, MediaHandle, MeetingId, StreamId};

/// Everything `authenticate` needs in one request.
///
/// `server` is the deployment's fixed server address; the remaining fields
/// come from the connect call. Guest mode is an empty email and password.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// Server address the transport signs in against.
    pub server: String,
    /// Account credentials; both fields empty for guests.
    pub credentials: Credentials,
    /// Meeting the caller intends to join.
    pub meeting_id: MeetingId,
    /// Name shown to other participants.
    pub display_name: String,
}

/// Metadata announced with a remote video stream.
///
/// Carried through the activation round trip so the descriptor can be built
/// once the transport hands back a media handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVideoInfo {
    /// Server-assigned stream id.
    pub id: StreamId,
    /// Email of the owning participant; may be empty.
    pub email: String,
    /// Display name of the owning participant.
    pub name: String,
    /// Camera label, when the transport announces one.
    pub camera: Option<String>,
    /// True for screen-share feeds.
    pub is_screen_share: bool,
}

/// Asynchronous notifications pushed by the transport after a join.
///
/// Audio events only describe the roster; audio playback is routed by the
/// transport on its own and never passes through the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A remote video stream became available.
    VideoAdded(RemoteVideoInfo),
    /// A remote video stream went away.
    VideoRemoved {
        /// Server-assigned stream id.
        id: StreamId,
    },
    /// A participant's audio stream was announced.
    AudioAdded {
        /// Server-assigned stream id.
        id: StreamId,
        /// Participant email; may be empty.
        email: String,
        /// Participant display name.
        name: String,
    },
    /// A participant's audio stream went away.
    AudioRemoved {
        /// Server-assigned stream id.
        id: StreamId,
    },
}

/// Errors surfaced by transport calls.
///
/// `Clone` so scripted test doubles can hand the same failure to repeated
/// calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server could not be reached.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The server rejected the supplied credentials.
    #[error("credentials rejected: {0}")]
    CredentialsRejected(String),

    /// The meeting could not be joined.
    #[error("join rejected: {0}")]
    JoinRejected(String),

    /// A remote stream could not be activated.
    #[error("stream unavailable: {0}")]
    StreamUnavailable(String),
}

/// The external real-time engine the controller drives.
///
/// Implementations must be safe to call from spawned tasks; the controller
/// clones an `Arc` of the client into each in-flight operation. Stream events
/// for a meeting are delivered over the channel handed to [`join`] and stop
/// when the implementation drops its sender.
///
/// [`join`]: TransportClient::join
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Sign in to the server. Completes before any join may be issued.
    async fn authenticate(&self, request: AuthRequest) -> Result<(), TransportError>;

    /// Join a meeting, registering `events` as the sink for stream
    /// notifications of this meeting.
    async fn join(
        &self,
        meeting_id: MeetingId,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<(), TransportError>;

    /// Subscribe to a remote video stream, yielding a handle for rendering.
    async fn enable_remote_video(&self, stream_id: StreamId)
        -> Result<MediaHandle, TransportError>;

    /// Start local capture on `device_id`. Does not fail; a broken camera
    /// still yields a handle whose feed stays dark.
    async fn enable_local_video(&self, device_id: DeviceId) -> MediaHandle;

    /// Stop local capture. Completes once the transport has released the
    /// device.
    async fn disable_local_video(&self);

    /// Open the audio input and output channels. Fire-and-forget.
    fn enable_audio(&self);

    /// Stop sending microphone audio. Fire-and-forget.
    fn mute_audio_input(&self);

    /// Resume sending microphone audio. Fire-and-forget.
    fn unmute_audio_input(&self);

    /// Tear down the connection. Fire-and-forget; the controller resets its
    /// own state without waiting.
    fn disconnect(&self);
}
