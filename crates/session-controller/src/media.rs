//! Local media control state.
//!
//! Tracks the user's video and audio intent plus the guard that keeps rapid
//! repeated toggles from double-invoking the transport. The session actor
//! owns an instance and consults it before every toggle.

use serde::{Deserialize, Serialize};

use common::types::DeviceId;

/// Local media toggle state and the in-flight guard.
///
/// `operation_in_flight` is set while a local-video enable or disable round
/// trip is pending with the transport. Toggles arriving in that window are
/// refused outright rather than queued; the caller retries once the pending
/// operation resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaControlState {
    /// Local video is captured and registered.
    pub local_video_enabled: bool,
    /// Microphone input is muted.
    pub audio_input_muted: bool,
    /// A local-video round trip is pending with the transport.
    pub operation_in_flight: bool,
    /// Capture device used for local-video enables, passed to the transport
    /// unchanged.
    pub capture_device: DeviceId,
}

impl MediaControlState {
    /// Fresh state: video off, audio unmuted, nothing in flight.
    #[must_use]
    pub fn new(capture_device: DeviceId) -> Self {
        Self {
            local_video_enabled: false,
            audio_input_muted: false,
            operation_in_flight: false,
            capture_device,
        }
    }

    /// True when a toggle may proceed.
    #[must_use]
    pub fn can_toggle(&self) -> bool {
        !self.operation_in_flight
    }

    /// Mark a local-video round trip as started.
    pub fn begin_operation(&mut self) {
        self.operation_in_flight = true;
    }

    /// Mark the pending round trip as resolved.
    pub fn finish_operation(&mut self) {
        self.operation_in_flight = false;
    }

    /// Flip the audio mute intent, returning the new value.
    pub fn flip_audio_muted(&mut self) -> bool {
        self.audio_input_muted = !self.audio_input_muted;
        self.audio_input_muted
    }

    /// Reset toggles to their defaults. The capture device is configuration
    /// intent, not session state, and survives the reset.
    pub fn reset(&mut self) {
        self.local_video_enabled = false;
        self.audio_input_muted = false;
        self.operation_in_flight = false;
    }
}
