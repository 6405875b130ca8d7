//! Integration tests for generation fencing.
//!
//! Every connect attempt gets a fresh generation number, and completions
//! or stream events tagged with an older generation are discarded. These
//! tests park transport calls on hold gates, abandon the attempt, then
//! release the gates and verify the late callbacks change nothing.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use sc_test_utils::{
    camera_stream, guest_connect, join_guest_session, test_config, wait_for_view, MockTransport,
    TransportCall,
};
use session_controller::{ConnectionState, SessionActorHandle, SessionError};

/// Let spawned completions drain through the actor mailbox.
async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_exit_abandons_pending_join() {
    let transport = Arc::new(MockTransport::new().with_held_join());
    let handle = SessionActorHandle::new(test_config(), transport.clone());

    let connect_task = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.connect(guest_connect("standup", "Bob")).await })
    };
    transport.wait_for_join_calls(1).await;

    handle.exit().await.unwrap();
    let connect_result = connect_task.await.unwrap();
    assert!(matches!(connect_result, Err(SessionError::Aborted)));

    // The parked join now succeeds for an attempt nobody owns, and the
    // abandoned attempt's event channel delivers a stream.
    transport.release_join();
    transport.push_video_added(camera_stream("r1", "Carol")).await;
    settle().await;

    let view = handle.watch_view().borrow().clone();
    assert_eq!(view.snapshot.connection_state, ConnectionState::Idle);
    assert!(view.streams.is_empty());
    assert!(!view.snapshot.busy);

    // The stale join success must not start local media.
    let calls = transport.calls();
    assert!(!calls
        .iter()
        .any(|c| matches!(c, TransportCall::EnableLocalVideo { .. })));
    assert!(!calls.iter().any(|c| matches!(c, TransportCall::EnableAudio)));
    assert!(calls.iter().any(|c| matches!(c, TransportCall::Disconnect)));
    assert!(handle.metrics_snapshot().stale_callbacks_discarded >= 1);
}

#[tokio::test]
async fn test_exit_abandons_pending_auth() {
    let transport = Arc::new(MockTransport::new().with_held_auth());
    let handle = SessionActorHandle::new(test_config(), transport.clone());

    let connect_task = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.connect(guest_connect("standup", "Bob")).await })
    };
    transport.wait_for_auth_calls(1).await;

    handle.exit().await.unwrap();
    assert!(matches!(
        connect_task.await.unwrap(),
        Err(SessionError::Aborted)
    ));

    // The stale auth success must not trigger a join.
    transport.release_auth();
    settle().await;

    assert!(!transport
        .calls()
        .iter()
        .any(|c| matches!(c, TransportCall::Join { .. })));
    let view = handle.watch_view().borrow().clone();
    assert_eq!(view.snapshot.connection_state, ConnectionState::Idle);
    assert!(handle.metrics_snapshot().stale_callbacks_discarded >= 1);
}

#[tokio::test]
async fn test_stale_events_after_exit_do_not_repopulate() {
    let transport = Arc::new(MockTransport::new());
    let handle = join_guest_session(Arc::clone(&transport), "standup", "Bob").await;

    transport.push_video_added(camera_stream("r1", "Carol")).await;
    wait_for_view(&handle, |v| v.streams.len() == 2).await;

    handle.exit().await.unwrap();

    // The old attempt's event channel is still open on the mock side;
    // anything it delivers now is stale.
    transport.push_video_added(camera_stream("r2", "Dave")).await;
    settle().await;

    assert!(handle.streams().await.unwrap().is_empty());
    let view = handle.watch_view().borrow().clone();
    assert_eq!(view.snapshot.connection_state, ConnectionState::Idle);
    assert!(!transport.calls().iter().any(
        |c| matches!(c, TransportCall::EnableRemoteVideo { stream_id } if stream_id.as_str() == "r2")
    ));
    assert!(handle.metrics_snapshot().stale_callbacks_discarded >= 1);
}

#[tokio::test]
async fn test_new_attempt_ignores_previous_attempt_callbacks() {
    let transport = Arc::new(MockTransport::new().with_held_join());
    let handle = SessionActorHandle::new(test_config(), transport.clone());

    let first_connect = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.connect(guest_connect("standup", "Bob")).await })
    };
    transport.wait_for_join_calls(1).await;

    handle.exit().await.unwrap();
    assert!(matches!(
        first_connect.await.unwrap(),
        Err(SessionError::Aborted)
    ));

    // Second attempt joins straight through while the first join stays
    // parked on the gate.
    transport.set_join_hold(false);
    handle.connect(guest_connect("retro", "Bob")).await.unwrap();
    wait_for_view(&handle, |v| v.snapshot.in_meeting && !v.snapshot.busy).await;

    // The abandoned join completes late; the live session is untouched.
    transport.release_join();
    settle().await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.connection_state, ConnectionState::InMeeting);
    assert!(snapshot.video_enabled);

    // Exactly one capture was started, for the live attempt.
    let captures = transport
        .calls()
        .iter()
        .filter(|c| matches!(c, TransportCall::EnableLocalVideo { .. }))
        .count();
    assert_eq!(captures, 1);
    assert!(handle.metrics_snapshot().stale_callbacks_discarded >= 1);
}
