//! Pre-configured test data and session helpers.

use std::sync::Arc;

use common::config::ObservabilityConfig;
use common::secret::SecretString;
use common::types::{Credentials, DeviceId, MeetingId, StreamId};
use session_controller::actor::{ConnectParams, SessionView};
use session_controller::config::Config;
use session_controller::transport::RemoteVideoInfo;
use session_controller::SessionActorHandle;

use crate::mock_transport::MockTransport;

/// Config pointing at a fixture server, suitable for spawning test actors.
pub fn test_config() -> Config {
    Config {
        server: "meet.test.example".to_string(),
        client_id: format!("sc-test-{}", uuid::Uuid::new_v4()),
        default_capture_device: DeviceId::default(),
        command_buffer: 64,
        event_buffer: 64,
        observability: ObservabilityConfig::default(),
    }
}

/// Guest connect parameters for the given meeting and display name.
pub fn guest_connect(meeting_id: &str, display_name: &str) -> ConnectParams {
    ConnectParams {
        credentials: Credentials::guest(),
        meeting_id: MeetingId::new(meeting_id),
        display_name: display_name.to_string(),
    }
}

/// Authenticated connect parameters.
pub fn user_connect(
    email: &str,
    password: &str,
    meeting_id: &str,
    display_name: &str,
) -> ConnectParams {
    ConnectParams {
        credentials: Credentials::new(email, SecretString::from(password)),
        meeting_id: MeetingId::new(meeting_id),
        display_name: display_name.to_string(),
    }
}

/// Remote camera stream announcement.
pub fn camera_stream(id: &str, name: &str) -> RemoteVideoInfo {
    RemoteVideoInfo {
        id: StreamId::new(id),
        email: format!("{}@example.com", name.to_lowercase()),
        name: name.to_string(),
        camera: Some("Camera".to_string()),
        is_screen_share: false,
    }
}

/// Remote screen-share announcement.
pub fn screen_share_stream(id: &str, name: &str) -> RemoteVideoInfo {
    RemoteVideoInfo {
        id: StreamId::new(id),
        email: format!("{}@example.com", name.to_lowercase()),
        name: name.to_string(),
        camera: None,
        is_screen_share: true,
    }
}

/// Block until the published view satisfies `predicate`.
pub async fn wait_for_view<F>(handle: &SessionActorHandle, predicate: F)
where
    F: FnMut(&SessionView) -> bool,
{
    let mut rx = handle.watch_view();
    rx.wait_for(predicate).await.expect("view channel closed");
}

/// Spawn an actor on `transport` and drive it into a meeting as a guest,
/// waiting until local media bring-up has settled.
///
/// Panics when the connect fails; tests that script failures or hold gates
/// drive the attempt by hand instead.
pub async fn join_guest_session(
    transport: Arc<MockTransport>,
    meeting_id: &str,
    display_name: &str,
) -> SessionActorHandle {
    let handle = SessionActorHandle::new(test_config(), transport);
    handle
        .connect(guest_connect(meeting_id, display_name))
        .await
        .expect("connect should succeed");
    wait_for_view(&handle, |view| {
        view.snapshot.in_meeting && !view.snapshot.busy
    })
    .await;
    handle
}
