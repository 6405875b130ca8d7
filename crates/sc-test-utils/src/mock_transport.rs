//! Scripted in-memory transport client.
//!
//! [`MockTransport`] implements the transport contract entirely in memory.
//! Results default to success; `with_*` builders script failures, hold gates
//! park individual calls until the test releases them, and `push_*` methods
//! emit stream events over the channel captured at join time.
//!
//! Every call is recorded as a [`TransportCall`] in invocation order.
//! Passwords are deliberately not recorded; assertions go against the email.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Notify};

use common::types::{DeviceId, MediaHandle, MeetingId, StreamId};
use session_controller::transport::{
    AuthRequest, RemoteVideoInfo, StreamEvent, TransportClient, TransportError,
};

/// A transport call observed by the mock, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// `authenticate` was called.
    Authenticate {
        /// Server address from the request.
        server: String,
        /// Email from the request; empty for guests.
        email: String,
        /// Meeting from the request.
        meeting_id: MeetingId,
        /// Display name from the request.
        display_name: String,
    },
    /// `join` was called.
    Join {
        /// Meeting being joined.
        meeting_id: MeetingId,
    },
    /// `enable_remote_video` was called.
    EnableRemoteVideo {
        /// Stream being activated.
        stream_id: StreamId,
    },
    /// `enable_local_video` was called.
    EnableLocalVideo {
        /// Capture device passed through.
        device: DeviceId,
    },
    /// `disable_local_video` was called.
    DisableLocalVideo,
    /// `enable_audio` was called.
    EnableAudio,
    /// `mute_audio_input` was called.
    MuteAudioInput,
    /// `unmute_audio_input` was called.
    UnmuteAudioInput,
    /// `disconnect` was called.
    Disconnect,
}

struct Inner {
    auth_result: Result<(), TransportError>,
    join_result: Result<(), TransportError>,
    remote_video_failures: HashMap<StreamId, TransportError>,
    hold_auth: bool,
    hold_join: bool,
    hold_remote_video: bool,
    hold_local_video: bool,
    calls: Vec<TransportCall>,
    events_tx: Option<mpsc::Sender<StreamEvent>>,
    local_handle_seq: u64,
}

/// Scripted transport double.
///
/// Local capture handles are minted as `local-capture-1`, `local-capture-2`,
/// ... and remote handles as `remote-<stream id>`, so tests can assert on
/// handle identity (in particular that the echo dedup reuses the capture
/// handle instead of minting a new one).
pub struct MockTransport {
    inner: Mutex<Inner>,
    auth_release: Notify,
    join_release: Notify,
    remote_video_release: Notify,
    local_video_release: Notify,
    auth_calls: watch::Sender<u64>,
    join_calls: watch::Sender<u64>,
    remote_video_calls: watch::Sender<u64>,
    local_video_calls: watch::Sender<u64>,
}

/// Park the caller on `release` when `held`, publishing the call on
/// `counter` only after the parked waiter is registered so a release cannot
/// be lost between the two.
async fn gate(held: bool, release: &Notify, counter: &watch::Sender<u64>) {
    if held {
        let notified = release.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        counter.send_modify(|count| *count += 1);
        notified.await;
    } else {
        counter.send_modify(|count| *count += 1);
    }
}

impl MockTransport {
    /// A mock where every call succeeds immediately.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                auth_result: Ok(()),
                join_result: Ok(()),
                remote_video_failures: HashMap::new(),
                hold_auth: false,
                hold_join: false,
                hold_remote_video: false,
                hold_local_video: false,
                calls: Vec::new(),
                events_tx: None,
                local_handle_seq: 0,
            }),
            auth_release: Notify::new(),
            join_release: Notify::new(),
            remote_video_release: Notify::new(),
            local_video_release: Notify::new(),
            auth_calls: watch::channel(0).0,
            join_calls: watch::channel(0).0,
            remote_video_calls: watch::channel(0).0,
            local_video_calls: watch::channel(0).0,
        }
    }

    /// Script `authenticate` to fail with `error`.
    pub fn with_auth_failure(self, error: TransportError) -> Self {
        self.lock().auth_result = Err(error);
        self
    }

    /// Script `join` to fail with `error`.
    pub fn with_join_failure(self, error: TransportError) -> Self {
        self.lock().join_result = Err(error);
        self
    }

    /// Script `enable_remote_video` for `stream_id` to fail with `error`.
    pub fn with_remote_video_failure(self, stream_id: StreamId, error: TransportError) -> Self {
        self.lock().remote_video_failures.insert(stream_id, error);
        self
    }

    /// Hold `authenticate` calls open until [`release_auth`](Self::release_auth).
    pub fn with_held_auth(self) -> Self {
        self.lock().hold_auth = true;
        self
    }

    /// Hold `join` calls open until [`release_join`](Self::release_join).
    pub fn with_held_join(self) -> Self {
        self.lock().hold_join = true;
        self
    }

    /// Hold `enable_remote_video` calls open until
    /// [`release_remote_video`](Self::release_remote_video).
    pub fn with_held_remote_video(self) -> Self {
        self.lock().hold_remote_video = true;
        self
    }

    /// Hold `enable_local_video` calls open until
    /// [`release_local_video`](Self::release_local_video).
    pub fn with_held_local_video(self) -> Self {
        self.lock().hold_local_video = true;
        self
    }

    /// Change whether future `join` calls are held.
    pub fn set_join_hold(&self, held: bool) {
        self.lock().hold_join = held;
    }

    /// Change whether future `enable_remote_video` calls are held.
    pub fn set_remote_video_hold(&self, held: bool) {
        self.lock().hold_remote_video = held;
    }

    /// Re-script the result of future `authenticate` calls.
    pub fn set_auth_result(&self, result: Result<(), TransportError>) {
        self.lock().auth_result = result;
    }

    /// Re-script the result of future `join` calls.
    pub fn set_join_result(&self, result: Result<(), TransportError>) {
        self.lock().join_result = result;
    }

    /// Release every currently held `authenticate` call.
    pub fn release_auth(&self) {
        self.auth_release.notify_waiters();
    }

    /// Release every currently held `join` call.
    pub fn release_join(&self) {
        self.join_release.notify_waiters();
    }

    /// Release every currently held `enable_remote_video` call.
    pub fn release_remote_video(&self) {
        self.remote_video_release.notify_waiters();
    }

    /// Release every currently held `enable_local_video` call.
    pub fn release_local_video(&self) {
        self.local_video_release.notify_waiters();
    }

    /// Wait until at least `n` `authenticate` calls have been issued.
    pub async fn wait_for_auth_calls(&self, n: u64) {
        let mut rx = self.auth_calls.subscribe();
        rx.wait_for(|count| *count >= n)
            .await
            .expect("auth call counter closed");
    }

    /// Wait until at least `n` `join` calls have been issued.
    pub async fn wait_for_join_calls(&self, n: u64) {
        let mut rx = self.join_calls.subscribe();
        rx.wait_for(|count| *count >= n)
            .await
            .expect("join call counter closed");
    }

    /// Wait until at least `n` `enable_remote_video` calls have been issued.
    pub async fn wait_for_remote_video_calls(&self, n: u64) {
        let mut rx = self.remote_video_calls.subscribe();
        rx.wait_for(|count| *count >= n)
            .await
            .expect("remote video call counter closed");
    }

    /// Wait until at least `n` `enable_local_video` calls have been issued.
    pub async fn wait_for_local_video_calls(&self, n: u64) {
        let mut rx = self.local_video_calls.subscribe();
        rx.wait_for(|count| *count >= n)
            .await
            .expect("local video call counter closed");
    }

    /// Emit a video-added event over the channel captured at join time.
    ///
    /// Panics when `join` has not been called yet.
    pub async fn push_video_added(&self, info: RemoteVideoInfo) {
        self.events_sender()
            .send(StreamEvent::VideoAdded(info))
            .await
            .expect("event channel closed");
    }

    /// Emit a video-removed event.
    pub async fn push_video_removed(&self, id: StreamId) {
        self.events_sender()
            .send(StreamEvent::VideoRemoved { id })
            .await
            .expect("event channel closed");
    }

    /// Emit an audio-added event.
    pub async fn push_audio_added(&self, id: StreamId, email: &str, name: &str) {
        self.events_sender()
            .send(StreamEvent::AudioAdded {
                id,
                email: email.to_string(),
                name: name.to_string(),
            })
            .await
            .expect("event channel closed");
    }

    /// Emit an audio-removed event.
    pub async fn push_audio_removed(&self, id: StreamId) {
        self.events_sender()
            .send(StreamEvent::AudioRemoved { id })
            .await
            .expect("event channel closed");
    }

    /// Every call recorded so far, in invocation order.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("mock transport lock poisoned")
    }

    fn events_sender(&self) -> mpsc::Sender<StreamEvent> {
        self.lock()
            .events_tx
            .clone()
            .expect("no event channel captured: join() has not been called")
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportClient for MockTransport {
    async fn authenticate(&self, request: AuthRequest) -> Result<(), TransportError> {
        let (held, result) = {
            let mut inner = self.lock();
            inner.calls.push(TransportCall::Authenticate {
                server: request.server,
                email: request.credentials.email,
                meeting_id: request.meeting_id,
                display_name: request.display_name,
            });
            (inner.hold_auth, inner.auth_result.clone())
        };
        gate(held, &self.auth_release, &self.auth_calls).await;
        result
    }

    async fn join(
        &self,
        meeting_id: MeetingId,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<(), TransportError> {
        let (held, result) = {
            let mut inner = self.lock();
            inner.calls.push(TransportCall::Join {
                meeting_id: meeting_id.clone(),
            });
            inner.events_tx = Some(events);
            (inner.hold_join, inner.join_result.clone())
        };
        gate(held, &self.join_release, &self.join_calls).await;
        result
    }

    async fn enable_remote_video(
        &self,
        stream_id: StreamId,
    ) -> Result<MediaHandle, TransportError> {
        let (held, result) = {
            let mut inner = self.lock();
            inner.calls.push(TransportCall::EnableRemoteVideo {
                stream_id: stream_id.clone(),
            });
            let result = match inner.remote_video_failures.get(&stream_id) {
                Some(error) => Err(error.clone()),
                None => Ok(MediaHandle::new(format!("remote-{stream_id}"))),
            };
            (inner.hold_remote_video, result)
        };
        gate(held, &self.remote_video_release, &self.remote_video_calls).await;
        result
    }

    async fn enable_local_video(&self, device_id: DeviceId) -> MediaHandle {
        let (held, handle) = {
            let mut inner = self.lock();
            inner
                .calls
                .push(TransportCall::EnableLocalVideo { device: device_id });
            inner.local_handle_seq += 1;
            let handle = MediaHandle::new(format!("local-capture-{}", inner.local_handle_seq));
            (inner.hold_local_video, handle)
        };
        gate(held, &self.local_video_release, &self.local_video_calls).await;
        handle
    }

    async fn disable_local_video(&self) {
        self.lock().calls.push(TransportCall::DisableLocalVideo);
    }

    fn enable_audio(&self) {
        self.lock().calls.push(TransportCall::EnableAudio);
    }

    fn mute_audio_input(&self) {
        self.lock().calls.push(TransportCall::MuteAudioInput);
    }

    fn unmute_audio_input(&self) {
        self.lock().calls.push(TransportCall::UnmuteAudioInput);
    }

    fn disconnect(&self) {
        self.lock().calls.push(TransportCall::Disconnect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use common::types::Credentials;

    fn auth_request() -> AuthRequest {
        AuthRequest {
            server: "meet.test.example".to_string(),
            credentials: Credentials::guest(),
            meeting_id: MeetingId::new("m1"),
            display_name: "Bob".to_string(),
        }
    }

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let mock = MockTransport::new();

        mock.authenticate(auth_request()).await.unwrap();
        mock.enable_audio();
        mock.disconnect();

        let calls = mock.calls();
        assert!(matches!(
            calls.first(),
            Some(TransportCall::Authenticate { email, .. }) if email.is_empty()
        ));
        assert_eq!(calls.get(1), Some(&TransportCall::EnableAudio));
        assert_eq!(calls.get(2), Some(&TransportCall::Disconnect));
    }

    #[tokio::test]
    async fn test_scripted_auth_failure() {
        let mock = MockTransport::new()
            .with_auth_failure(TransportError::CredentialsRejected("nope".to_string()));

        let result = mock.authenticate(auth_request()).await;
        assert_eq!(
            result,
            Err(TransportError::CredentialsRejected("nope".to_string()))
        );
    }

    #[tokio::test]
    async fn test_join_captures_event_channel() {
        let mock = MockTransport::new();
        let (events_tx, mut events_rx) = mpsc::channel(8);

        mock.join(MeetingId::new("m1"), events_tx).await.unwrap();
        mock.push_video_removed(StreamId::new("r1")).await;

        let event = events_rx.recv().await.unwrap();
        assert_eq!(
            event,
            StreamEvent::VideoRemoved {
                id: StreamId::new("r1")
            }
        );
    }

    #[tokio::test]
    async fn test_held_join_blocks_until_release() {
        let mock = Arc::new(MockTransport::new().with_held_join());
        let (events_tx, _events_rx) = mpsc::channel(8);

        let task = {
            let mock = Arc::clone(&mock);
            tokio::spawn(async move { mock.join(MeetingId::new("m1"), events_tx).await })
        };

        mock.wait_for_join_calls(1).await;
        assert!(!task.is_finished());

        mock.release_join();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_local_handles_are_sequential() {
        let mock = MockTransport::new();

        let first = mock.enable_local_video(DeviceId::default()).await;
        let second = mock.enable_local_video(DeviceId::new("usb-cam-2")).await;

        assert_eq!(first.token(), "local-capture-1");
        assert_eq!(second.token(), "local-capture-2");
    }

    #[tokio::test]
    async fn test_remote_failure_only_hits_scripted_stream() {
        let mock = MockTransport::new().with_remote_video_failure(
            StreamId::new("r1"),
            TransportError::StreamUnavailable("gone".to_string()),
        );

        assert!(mock.enable_remote_video(StreamId::new("r1")).await.is_err());
        let handle = mock
            .enable_remote_video(StreamId::new("r2"))
            .await
            .unwrap();
        assert_eq!(handle.token(), "remote-r2");
    }
}
