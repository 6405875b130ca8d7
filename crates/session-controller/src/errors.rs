//! Session controller error types.
//!
//! Errors carry a bounded metric label and a client-safe message. Internal
//! details (transport messages, channel failures) are logged but never shown
//! to the user.

use thiserror::Error;

use common::types::StreamId;

/// Errors surfaced by session controller operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Sign-in failed: bad credentials or an unreachable server.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The meeting join was rejected or failed. The attempt is abandoned,
    /// never retried automatically.
    #[error("Join failed: {0}")]
    Join(String),

    /// A remote stream could not be activated. Non-fatal: the stream is
    /// skipped and the session continues.
    #[error("Media activation failed for stream {stream_id}: {reason}")]
    MediaActivation {
        /// The stream that could not be activated.
        stream_id: StreamId,
        /// Transport-reported reason.
        reason: String,
    },

    /// A connect was requested while a session is already active.
    #[error("A session is already active")]
    AlreadyActive,

    /// The operation requires an in-meeting session.
    #[error("Not in a meeting")]
    NotInMeeting,

    /// A media operation is still pending with the transport; the toggle
    /// was refused, not queued.
    #[error("A media operation is already in flight")]
    OperationInFlight,

    /// The connect attempt was abandoned by an exit before it completed.
    #[error("Connect attempt aborted")]
    Aborted,

    /// Meeting id must not be empty.
    #[error("Meeting id must not be empty")]
    EmptyMeetingId,

    /// Display name must not be empty.
    #[error("Display name must not be empty")]
    EmptyDisplayName,

    /// Internal controller error (actor channel failures and the like).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Returns a bounded label string for the error variant (for metrics).
    ///
    /// Uses variant names, not message content, so label cardinality stays
    /// bounded.
    #[must_use]
    pub fn error_type_label(&self) -> &'static str {
        match self {
            SessionError::Authentication(_) => "authentication",
            SessionError::Join(_) => "join",
            SessionError::MediaActivation { .. } => "media_activation",
            SessionError::AlreadyActive => "already_active",
            SessionError::NotInMeeting => "not_in_meeting",
            SessionError::OperationInFlight => "operation_in_flight",
            SessionError::Aborted => "aborted",
            SessionError::EmptyMeetingId => "empty_meeting_id",
            SessionError::EmptyDisplayName => "empty_display_name",
            SessionError::Internal(_) => "internal",
        }
    }

    /// Returns a message suitable for direct display to the user.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            SessionError::Authentication(_) => {
                "Could not sign in. Check the server address and your credentials".to_string()
            }
            SessionError::Join(_) => "Could not join the meeting".to_string(),
            SessionError::MediaActivation { .. } => {
                "A participant's video could not be shown".to_string()
            }
            SessionError::AlreadyActive => "Already connected to a meeting".to_string(),
            SessionError::NotInMeeting => "Join a meeting first".to_string(),
            SessionError::OperationInFlight => {
                "Please wait for the current operation to finish".to_string()
            }
            SessionError::Aborted => "The connection attempt was cancelled".to_string(),
            SessionError::EmptyMeetingId => "Enter a meeting id".to_string(),
            SessionError::EmptyDisplayName => "Enter a display name".to_string(),
            SessionError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}
