//! Integration tests for remote stream handling.
//!
//! Pushes video and audio stream events through the scripted transport
//! and verifies registry ordering, echo deduplication, activation
//! failures and the roster.
//!
//! Stream events are only ordered relative to each other, never relative
//! to command completions, so several tests push a trailing marker stream
//! and wait for it to show up before asserting on earlier events.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use common::types::StreamId;
use sc_test_utils::{
    camera_stream, guest_connect, join_guest_session, screen_share_stream, test_config,
    wait_for_view, MockTransport, TransportCall,
};
use session_controller::{SessionActorHandle, TransportError};

// ============================================================================
// Registry ordering
// ============================================================================

#[tokio::test]
async fn test_streams_keep_arrival_order() {
    let transport = Arc::new(MockTransport::new());
    let handle = join_guest_session(Arc::clone(&transport), "standup", "Bob").await;

    transport.push_video_added(camera_stream("r1", "Carol")).await;
    wait_for_view(&handle, |v| v.streams.len() == 2).await;
    transport.push_video_added(camera_stream("r2", "Dave")).await;
    wait_for_view(&handle, |v| v.streams.len() == 3).await;
    transport.push_video_added(camera_stream("r3", "Eve")).await;
    wait_for_view(&handle, |v| v.streams.len() == 4).await;

    let ids: Vec<String> = handle
        .streams()
        .await
        .unwrap()
        .iter()
        .map(|d| d.id.as_str().to_string())
        .collect();
    assert_eq!(ids, vec!["local", "r1", "r2", "r3"]);

    // Removing from the middle keeps the survivors in order.
    transport.push_video_removed(StreamId::new("r2")).await;
    wait_for_view(&handle, |v| v.streams.len() == 3).await;

    let ids: Vec<String> = handle
        .streams()
        .await
        .unwrap()
        .iter()
        .map(|d| d.id.as_str().to_string())
        .collect();
    assert_eq!(ids, vec!["local", "r1", "r3"]);
}

#[tokio::test]
async fn test_remote_stream_comes_and_goes() {
    let transport = Arc::new(MockTransport::new());
    let handle = join_guest_session(Arc::clone(&transport), "standup", "Bob").await;

    transport.push_video_added(camera_stream("r1", "Carol")).await;
    wait_for_view(&handle, |v| v.streams.len() == 2).await;

    let streams = handle.streams().await.unwrap();
    let carol = streams.iter().find(|d| d.id.as_str() == "r1").unwrap();
    assert_eq!(carol.participant_name, "Carol");
    assert_eq!(carol.camera_label.as_deref(), Some("Camera"));
    assert!(!carol.is_screen_share);

    transport.push_video_removed(StreamId::new("r1")).await;
    wait_for_view(&handle, |v| v.streams.len() == 1).await;

    let ids: Vec<String> = handle
        .streams()
        .await
        .unwrap()
        .iter()
        .map(|d| d.id.as_str().to_string())
        .collect();
    assert_eq!(ids, vec!["local"]);
}

#[tokio::test]
async fn test_events_during_pending_join_are_applied() {
    let transport = Arc::new(MockTransport::new().with_held_join());
    let handle = SessionActorHandle::new(test_config(), transport.clone());

    let connect_task = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.connect(guest_connect("standup", "Bob")).await })
    };
    transport.wait_for_join_calls(1).await;

    // The event channel is live from the moment join is invoked, so
    // streams announced before the join resolves still land.
    transport.push_video_added(camera_stream("r1", "Carol")).await;
    transport.push_video_added(camera_stream("r2", "Dave")).await;
    wait_for_view(&handle, |v| v.streams.len() == 2).await;

    transport.release_join();
    connect_task.await.unwrap().unwrap();
    wait_for_view(&handle, |v| v.snapshot.in_meeting && !v.snapshot.busy).await;

    // Same membership as if the events had arrived after the join; the
    // relative order of concurrently activated streams is unspecified.
    let mut ids: Vec<String> = handle
        .streams()
        .await
        .unwrap()
        .iter()
        .map(|d| d.id.as_str().to_string())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["local", "r1", "r2"]);
}

#[tokio::test]
async fn test_screen_share_descriptor_carries_no_camera() {
    let transport = Arc::new(MockTransport::new());
    let handle = join_guest_session(Arc::clone(&transport), "standup", "Bob").await;

    transport
        .push_video_added(screen_share_stream("ss1", "Carol"))
        .await;
    wait_for_view(&handle, |v| v.streams.len() == 2).await;

    let streams = handle.streams().await.unwrap();
    let share = streams.iter().find(|d| d.id.as_str() == "ss1").unwrap();
    assert!(share.is_screen_share);
    assert_eq!(share.camera_label, None);
    assert_eq!(share.participant_name, "Carol");
}

// ============================================================================
// Echo deduplication
// ============================================================================

#[tokio::test]
async fn test_own_echo_replaces_local_placeholder() {
    let transport = Arc::new(MockTransport::new());
    let handle = join_guest_session(Arc::clone(&transport), "standup", "Alice").await;

    // The server announces our own capture back under its wire id.
    transport.push_video_added(camera_stream("s9", "Alice")).await;
    wait_for_view(&handle, |v| {
        v.streams.first().is_some_and(|d| d.id.as_str() == "s9")
    })
    .await;

    let streams = handle.streams().await.unwrap();
    assert_eq!(streams.len(), 1);
    let echo = streams.first().unwrap();
    assert_eq!(echo.participant_name, "Alice");
    // The capture handle carries over; the echo is not a second capture.
    assert_eq!(echo.media_handle.token(), "local-capture-1");

    // No activation request went out for our own stream.
    assert!(!transport
        .calls()
        .iter()
        .any(|c| matches!(c, TransportCall::EnableRemoteVideo { .. })));
    assert_eq!(handle.metrics_snapshot().echo_replacements, 1);
}

#[tokio::test]
async fn test_own_echo_without_placeholder_is_dropped() {
    let transport = Arc::new(MockTransport::new());
    let handle = join_guest_session(Arc::clone(&transport), "standup", "Alice").await;

    // Turn local video off so there is no placeholder to replace.
    handle.toggle_local_video().await.unwrap();
    wait_for_view(&handle, |v| {
        !v.snapshot.video_enabled && !v.snapshot.busy && v.streams.is_empty()
    })
    .await;

    transport.push_video_added(camera_stream("s9", "Alice")).await;
    // Marker stream: once it is visible the echo has been processed.
    transport.push_video_added(camera_stream("r2", "Dave")).await;
    wait_for_view(&handle, |v| v.streams.iter().any(|d| d.id.as_str() == "r2")).await;

    let streams = handle.streams().await.unwrap();
    assert!(!streams.iter().any(|d| d.id.as_str() == "s9"));
    assert!(!transport.calls().iter().any(
        |c| matches!(c, TransportCall::EnableRemoteVideo { stream_id } if stream_id.as_str() == "s9")
    ));
}

// ============================================================================
// Activation failures and races
// ============================================================================

#[tokio::test]
async fn test_activation_failure_keeps_session_alive() {
    let transport = Arc::new(MockTransport::new().with_remote_video_failure(
        StreamId::new("r1"),
        TransportError::StreamUnavailable("relay gone".to_string()),
    ));
    let handle = join_guest_session(Arc::clone(&transport), "standup", "Bob").await;

    transport.push_video_added(camera_stream("r1", "Carol")).await;
    transport.push_video_added(camera_stream("r2", "Dave")).await;
    wait_for_view(&handle, |v| v.streams.iter().any(|d| d.id.as_str() == "r2")).await;

    // The failed activation resolves in the background.
    tokio::time::timeout(Duration::from_secs(5), async {
        while handle.metrics_snapshot().media_activation_failures == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("activation failure should be recorded");

    let streams = handle.streams().await.unwrap();
    assert!(!streams.iter().any(|d| d.id.as_str() == "r1"));
    assert!(streams.iter().any(|d| d.id.as_str() == "r2"));

    // The session itself is unaffected.
    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.in_meeting);
    assert!(!snapshot.busy);
}

#[tokio::test]
async fn test_remove_unknown_stream_is_noop() {
    let transport = Arc::new(MockTransport::new());
    let handle = join_guest_session(Arc::clone(&transport), "standup", "Bob").await;

    transport.push_video_added(camera_stream("r1", "Carol")).await;
    wait_for_view(&handle, |v| v.streams.len() == 2).await;

    transport.push_video_removed(StreamId::new("ghost")).await;
    transport.push_video_added(camera_stream("r2", "Dave")).await;
    wait_for_view(&handle, |v| v.streams.iter().any(|d| d.id.as_str() == "r2")).await;

    let ids: Vec<String> = handle
        .streams()
        .await
        .unwrap()
        .iter()
        .map(|d| d.id.as_str().to_string())
        .collect();
    assert_eq!(ids, vec!["local", "r1", "r2"]);
    assert!(handle.snapshot().await.unwrap().in_meeting);
}

#[tokio::test]
async fn test_stream_removed_while_activation_pending_stays_out() {
    let transport = Arc::new(MockTransport::new().with_held_remote_video());
    let handle = join_guest_session(Arc::clone(&transport), "standup", "Bob").await;

    transport.push_video_added(camera_stream("r1", "Carol")).await;
    transport.wait_for_remote_video_calls(1).await;

    // The stream goes away while its activation is parked.
    transport.push_video_removed(StreamId::new("r1")).await;
    // Audio marker confirms the removal has been processed.
    transport
        .push_audio_added(StreamId::new("a1"), "dave@example.com", "Dave")
        .await;
    wait_for_view(&handle, |v| v.participants.len() == 1).await;

    transport.set_remote_video_hold(false);
    transport.release_remote_video();

    // A later stream still activates; the removed one must not
    // resurface when its stale completion drains.
    transport.push_video_added(camera_stream("r2", "Eve")).await;
    wait_for_view(&handle, |v| v.streams.iter().any(|d| d.id.as_str() == "r2")).await;

    let streams = handle.streams().await.unwrap();
    assert!(!streams.iter().any(|d| d.id.as_str() == "r1"));
}

#[tokio::test]
async fn test_duplicate_announcement_activates_once() {
    let transport = Arc::new(MockTransport::new());
    let handle = join_guest_session(Arc::clone(&transport), "standup", "Bob").await;

    transport.push_video_added(camera_stream("r1", "Carol")).await;
    wait_for_view(&handle, |v| v.streams.len() == 2).await;

    // Same stream announced again, then a marker.
    transport.push_video_added(camera_stream("r1", "Carol")).await;
    transport.push_video_added(camera_stream("r2", "Dave")).await;
    wait_for_view(&handle, |v| v.streams.iter().any(|d| d.id.as_str() == "r2")).await;

    assert_eq!(handle.streams().await.unwrap().len(), 3);
    let r1_activations = transport
        .calls()
        .iter()
        .filter(|c| {
            matches!(c, TransportCall::EnableRemoteVideo { stream_id } if stream_id.as_str() == "r1")
        })
        .count();
    assert_eq!(r1_activations, 1);
}

// ============================================================================
// Audio roster
// ============================================================================

#[tokio::test]
async fn test_audio_streams_track_roster() {
    let transport = Arc::new(MockTransport::new());
    let handle = join_guest_session(Arc::clone(&transport), "standup", "Bob").await;

    transport
        .push_audio_added(StreamId::new("a1"), "carol@example.com", "Carol")
        .await;
    transport
        .push_audio_added(StreamId::new("a2"), "dave@example.com", "Dave")
        .await;
    wait_for_view(&handle, |v| v.participants.len() == 2).await;

    // Re-announcement and an unknown removal are both ignored.
    transport
        .push_audio_added(StreamId::new("a1"), "carol@example.com", "Carol")
        .await;
    transport.push_audio_removed(StreamId::new("ghost")).await;
    transport.push_audio_removed(StreamId::new("a1")).await;
    wait_for_view(&handle, |v| v.participants.len() == 1).await;

    let roster = handle.participants().await.unwrap();
    let remaining = roster.first().unwrap();
    assert_eq!(remaining.display_name, "Dave");
    assert_eq!(remaining.email, "dave@example.com");

    // Audio events never touch the video registry.
    assert_eq!(handle.streams().await.unwrap().len(), 1);
}
