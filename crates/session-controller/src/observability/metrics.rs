//! Metric recording helpers for the session controller.
//!
//! Thin wrappers around the `metrics` facade so call sites stay one line and
//! metric names and labels live in one place. The controller never installs
//! a recorder; the embedding application decides whether and where metrics
//! are exported, and without a recorder every call here is a no-op.
//!
//! Label values are bounded (lifecycle stages, event kinds, refusal
//! reasons), never ids or user input, so cardinality stays flat per process.

use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// Record a connect attempt starting.
///
/// Metric: `sc_connect_attempts_total` (counter)
pub fn record_connect_attempt() {
    counter!("sc_connect_attempts_total").increment(1);
}

/// Record a connect attempt failing.
///
/// Metric: `sc_connect_failures_total` (counter)
/// Labels: `stage` (authenticate | join)
pub fn record_connect_failure(stage: &str) {
    counter!("sc_connect_failures_total", "stage" => stage.to_string()).increment(1);
}

/// Record the time from connect to in-meeting for a successful attempt.
///
/// Metric: `sc_connect_duration_seconds` (histogram)
pub fn record_session_established(duration: Duration) {
    histogram!("sc_connect_duration_seconds").record(duration.as_secs_f64());
}

/// Record how long a session lived when it was exited.
///
/// Metric: `sc_session_duration_seconds` (histogram)
pub fn record_session_exited(duration: Duration) {
    histogram!("sc_session_duration_seconds").record(duration.as_secs_f64());
}

/// Record a stream event observed from the transport.
///
/// Metric: `sc_stream_events_total` (counter)
/// Labels: `kind` (video_added | video_removed | audio_added |
/// audio_removed | local_video_added | local_video_removed)
pub fn record_stream_event(kind: &str) {
    counter!("sc_stream_events_total", "kind" => kind.to_string()).increment(1);
}

/// Record the server echo replacing the local placeholder.
///
/// Metric: `sc_echo_replacements_total` (counter)
pub fn record_echo_replacement() {
    counter!("sc_echo_replacements_total").increment(1);
}

/// Record a remote activation failing (non-fatal).
///
/// Metric: `sc_media_activation_failures_total` (counter)
pub fn record_media_activation_failure() {
    counter!("sc_media_activation_failures_total").increment(1);
}

/// Record a completion discarded for carrying a stale generation.
///
/// Metric: `sc_stale_callbacks_total` (counter)
/// Labels: `kind` (completion variant name)
pub fn record_stale_callback(kind: &str) {
    counter!("sc_stale_callbacks_total", "kind" => kind.to_string()).increment(1);
}

/// Record a media toggle refused by the guards.
///
/// Metric: `sc_toggles_refused_total` (counter)
/// Labels: `control` (video | audio), `reason` (not_in_meeting |
/// operation_in_flight)
pub fn record_toggle_refused(control: &str, reason: &str) {
    counter!(
        "sc_toggles_refused_total",
        "control" => control.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Set the number of registered stream descriptors.
///
/// Metric: `sc_streams_active` (gauge)
#[allow(clippy::cast_precision_loss)] // stream counts are far below 2^52
pub fn set_streams_active(count: usize) {
    gauge!("sc_streams_active").set(count as f64);
}

/// Set the number of tracked participants.
///
/// Metric: `sc_participants_active` (gauge)
#[allow(clippy::cast_precision_loss)] // participant counts are far below 2^52
pub fn set_participants_active(count: usize) {
    gauge!("sc_participants_active").set(count as f64);
}

/// Set the current actor mailbox depth.
///
/// Metric: `sc_mailbox_depth` (gauge)
#[allow(clippy::cast_precision_loss)] // mailbox depth is far below 2^52
pub fn set_mailbox_depth(depth: usize) {
    gauge!("sc_mailbox_depth").set(depth as f64);
}
