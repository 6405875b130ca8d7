//! In-process metrics for the session actor.
//!
//! Two pieces live here: [`MailboxMonitor`] watches command mailbox depth so
//! a stalled actor shows up in logs before the channel fills, and
//! [`SessionMetrics`] counts session-level outcomes for tests and embedding
//! applications. Exported metrics go through
//! [`crate::observability::metrics`]; these atomics are the cheap in-process
//! mirror the handle can read without a recorder installed.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

/// Mailbox depth below this is healthy.
pub const SESSION_MAILBOX_NORMAL: usize = 50;

/// Mailbox depth at or above this logs a warning.
pub const SESSION_MAILBOX_WARNING: usize = 200;

/// Health classification of the actor mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxLevel {
    /// Depth below the elevated threshold.
    Normal,
    /// Depth between the elevated and warning thresholds.
    Elevated,
    /// Depth at or above the warning threshold.
    Critical,
}

impl MailboxLevel {
    /// String form for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MailboxLevel::Normal => "normal",
            MailboxLevel::Elevated => "elevated",
            MailboxLevel::Critical => "critical",
        }
    }
}

/// Tracks mailbox depth and processing counts for the session actor.
#[derive(Debug)]
pub struct MailboxMonitor {
    actor_id: String,
    current_depth: AtomicUsize,
    peak_depth: AtomicUsize,
    messages_processed: AtomicU64,
}

impl MailboxMonitor {
    /// Create a monitor labeled with the client instance id.
    #[must_use]
    pub fn new(actor_id: &str) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            current_depth: AtomicUsize::new(0),
            peak_depth: AtomicUsize::new(0),
            messages_processed: AtomicU64::new(0),
        }
    }

    /// Record a message entering processing. Logs when depth crosses the
    /// elevated or warning thresholds.
    pub fn record_enqueue(&self) {
        let depth = self.current_depth.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_depth.fetch_max(depth, Ordering::SeqCst);

        if depth >= SESSION_MAILBOX_WARNING {
            warn!(
                target: "sc.actor.mailbox",
                actor_id = %self.actor_id,
                depth,
                threshold = SESSION_MAILBOX_WARNING,
                "Session actor mailbox depth critical"
            );
        } else if depth >= SESSION_MAILBOX_NORMAL {
            debug!(
                target: "sc.actor.mailbox",
                actor_id = %self.actor_id,
                depth,
                threshold = SESSION_MAILBOX_NORMAL,
                "Session actor mailbox depth elevated"
            );
        }
    }

    /// Record a message leaving processing.
    pub fn record_dequeue(&self) {
        // Saturating: a dequeue without a matching enqueue must not wrap.
        let _ = self
            .current_depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |d| d.checked_sub(1));
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Current depth including the message being processed.
    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.current_depth.load(Ordering::SeqCst)
    }

    /// Highest depth observed since creation or the last peak reset.
    #[must_use]
    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::SeqCst)
    }

    /// Total messages processed.
    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    /// Classify the current depth.
    #[must_use]
    pub fn current_level(&self) -> MailboxLevel {
        let depth = self.current_depth();
        if depth >= SESSION_MAILBOX_WARNING {
            MailboxLevel::Critical
        } else if depth >= SESSION_MAILBOX_NORMAL {
            MailboxLevel::Elevated
        } else {
            MailboxLevel::Normal
        }
    }

    /// Reset the peak to the current depth.
    pub fn reset_peak(&self) {
        self.peak_depth
            .store(self.current_depth(), Ordering::SeqCst);
    }
}

/// Session-level outcome counters.
///
/// All counters are monotonically increasing and relaxed; a snapshot is a
/// point-in-time read, not a consistent cut.
#[derive(Debug, Default)]
pub struct SessionMetrics {
    connect_attempts: AtomicU64,
    auth_failures: AtomicU64,
    join_failures: AtomicU64,
    meetings_joined: AtomicU64,
    exits: AtomicU64,
    streams_added: AtomicU64,
    streams_removed: AtomicU64,
    echo_replacements: AtomicU64,
    media_activation_failures: AtomicU64,
    stale_callbacks_discarded: AtomicU64,
    toggles_refused: AtomicU64,
}

/// Point-in-time copy of [`SessionMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMetricsSnapshot {
    /// Connect attempts started.
    pub connect_attempts: u64,
    /// Attempts that failed during authentication.
    pub auth_failures: u64,
    /// Attempts that failed during join.
    pub join_failures: u64,
    /// Attempts that reached the meeting.
    pub meetings_joined: u64,
    /// Exits processed.
    pub exits: u64,
    /// Stream descriptors registered.
    pub streams_added: u64,
    /// Stream descriptors removed.
    pub streams_removed: u64,
    /// Local placeholders replaced by the server echo.
    pub echo_replacements: u64,
    /// Remote activations that failed (non-fatal).
    pub media_activation_failures: u64,
    /// Callbacks discarded for carrying a stale generation.
    pub stale_callbacks_discarded: u64,
    /// Media toggles refused by the guards.
    pub toggles_refused: u64,
}

impl SessionMetrics {
    /// Create a shared metrics instance.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A connect attempt was started.
    pub fn record_connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// An attempt failed during authentication.
    pub fn record_auth_failure(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// An attempt failed during join.
    pub fn record_join_failure(&self) {
        self.join_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// An attempt reached the meeting.
    pub fn record_meeting_joined(&self) {
        self.meetings_joined.fetch_add(1, Ordering::Relaxed);
    }

    /// An exit was processed.
    pub fn record_exit(&self) {
        self.exits.fetch_add(1, Ordering::Relaxed);
    }

    /// A descriptor was registered.
    pub fn record_stream_added(&self) {
        self.streams_added.fetch_add(1, Ordering::Relaxed);
    }

    /// A descriptor was removed.
    pub fn record_stream_removed(&self) {
        self.streams_removed.fetch_add(1, Ordering::Relaxed);
    }

    /// The server echo replaced the local placeholder.
    pub fn record_echo_replacement(&self) {
        self.echo_replacements.fetch_add(1, Ordering::Relaxed);
    }

    /// A remote activation failed.
    pub fn record_media_activation_failure(&self) {
        self.media_activation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A stale-generation callback was discarded.
    pub fn record_stale_callback(&self) {
        self.stale_callbacks_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// A toggle was refused by the guards.
    pub fn record_toggle_refused(&self) {
        self.toggles_refused.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> SessionMetricsSnapshot {
        SessionMetricsSnapshot {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            join_failures: self.join_failures.load(Ordering::Relaxed),
            meetings_joined: self.meetings_joined.load(Ordering::Relaxed),
            exits: self.exits.load(Ordering::Relaxed),
            streams_added: self.streams_added.load(Ordering::Relaxed),
            streams_removed: self.streams_removed.load(Ordering::Relaxed),
            echo_replacements: self.echo_replacements.load(Ordering::Relaxed),
            media_activation_failures: self.media_activation_failures.load(Ordering::Relaxed),
            stale_callbacks_discarded: self.stale_callbacks_discarded.load(Ordering::Relaxed),
            toggles_refused: self.toggles_refused.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_depth_tracking() {
        let monitor = MailboxMonitor::new("sc-test");

        monitor.record_enqueue();
        monitor.record_enqueue();
        assert_eq!(monitor.current_depth(), 2);
        assert_eq!(monitor.peak_depth(), 2);

        monitor.record_dequeue();
        assert_eq!(monitor.current_depth(), 1);
        assert_eq!(monitor.peak_depth(), 2);
        assert_eq!(monitor.messages_processed(), 1);
    }

    #[test]
    fn test_mailbox_dequeue_never_underflows() {
        let monitor = MailboxMonitor::new("sc-test");

        monitor.record_dequeue();
        assert_eq!(monitor.current_depth(), 0);
        assert_eq!(monitor.messages_processed(), 1);
    }

    #[test]
    fn test_mailbox_levels() {
        let monitor = MailboxMonitor::new("sc-test");
        assert_eq!(monitor.current_level(), MailboxLevel::Normal);

        for _ in 0..SESSION_MAILBOX_NORMAL {
            monitor.record_enqueue();
        }
        assert_eq!(monitor.current_level(), MailboxLevel::Elevated);

        for _ in 0..(SESSION_MAILBOX_WARNING - SESSION_MAILBOX_NORMAL) {
            monitor.record_enqueue();
        }
        assert_eq!(monitor.current_level(), MailboxLevel::Critical);
    }

    #[test]
    fn test_mailbox_reset_peak() {
        let monitor = MailboxMonitor::new("sc-test");

        monitor.record_enqueue();
        monitor.record_enqueue();
        monitor.record_dequeue();
        assert_eq!(monitor.peak_depth(), 2);

        monitor.reset_peak();
        assert_eq!(monitor.peak_depth(), 1);
    }

    #[test]
    fn test_level_labels() {
        assert_eq!(MailboxLevel::Normal.as_str(), "normal");
        assert_eq!(MailboxLevel::Elevated.as_str(), "elevated");
        assert_eq!(MailboxLevel::Critical.as_str(), "critical");
    }

    #[test]
    fn test_session_metrics_counters() {
        let metrics = SessionMetrics::new();

        metrics.record_connect_attempt();
        metrics.record_connect_attempt();
        metrics.record_auth_failure();
        metrics.record_meeting_joined();
        metrics.record_stream_added();
        metrics.record_echo_replacement();
        metrics.record_stale_callback();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.connect_attempts, 2);
        assert_eq!(snapshot.auth_failures, 1);
        assert_eq!(snapshot.meetings_joined, 1);
        assert_eq!(snapshot.streams_added, 1);
        assert_eq!(snapshot.echo_replacements, 1);
        assert_eq!(snapshot.stale_callbacks_discarded, 1);
        assert_eq!(snapshot.join_failures, 0);
        assert_eq!(snapshot.toggles_refused, 0);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let metrics = SessionMetrics::new();
        let before = metrics.snapshot();

        metrics.record_exit();

        assert_eq!(before.exits, 0);
        assert_eq!(metrics.snapshot().exits, 1);
    }
}
