//! Participant roster tracked from audio stream announcements.
//!
//! Audio streams are routed entirely by the transport; the controller never
//! activates or renders them. The announcements are still useful: every
//! participant in a meeting carries an audio stream, so the added/removed
//! notifications double as a presence feed.

use serde::{Deserialize, Serialize};

use common::types::StreamId;

/// One meeting participant, keyed by their audio stream id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    /// Audio stream id that announced this participant.
    pub stream_id: StreamId,
    /// Participant email; may be empty.
    pub email: String,
    /// Display name.
    pub display_name: String,
}

/// Insertion-ordered roster of meeting participants.
#[derive(Debug, Default)]
pub struct ParticipantRoster {
    participants: Vec<ParticipantInfo>,
}

impl ParticipantRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// True when nobody is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// True when a participant with this audio stream id is tracked.
    #[must_use]
    pub fn contains(&self, stream_id: &StreamId) -> bool {
        self.participants.iter().any(|p| p.stream_id == *stream_id)
    }

    /// Track a participant, returning false when the id is already known.
    /// Re-announcements keep the original entry and position.
    pub fn add(&mut self, participant: ParticipantInfo) -> bool {
        if self.contains(&participant.stream_id) {
            return false;
        }
        self.participants.push(participant);
        true
    }

    /// Stop tracking the participant with this audio stream id. Absent ids
    /// are a no-op yielding `None`.
    pub fn remove(&mut self, stream_id: &StreamId) -> Option<ParticipantInfo> {
        let index = self
            .participants
            .iter()
            .position(|p| p.stream_id == *stream_id)?;
        Some(self.participants.remove(index))
    }

    /// Snapshot of participants in announcement order.
    #[must_use]
    pub fn list(&self) -> Vec<ParticipantInfo> {
        self.participants.clone()
    }

    /// Drop every participant.
    pub fn clear(&mut self) {
        self.participants.clear();
    }
}
