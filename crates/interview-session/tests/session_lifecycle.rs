//! Session start, connection state machine and resource release.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use common::types::SubjectId;
use interview_session::errors::{InterviewError, PreJoinFailure};
use interview_session::session::{ConnectionState, SessionEvent};
use interview_session::view::SessionView;
use interview_session::Config;
use session_test_utils::*;
use std::time::Duration;

#[tokio::test]
async fn test_join_sends_start_interview_once() {
    let session = TestSession::builder()
        .subject(SubjectId(7))
        .start()
        .await
        .unwrap();

    let snapshot = session.wait_for_connection(ConnectionState::Connected).await;
    assert!(!snapshot.flags.interview_started);

    session
        .observer
        .wait_for(|e| matches!(e, SessionEvent::MessageSent { .. }))
        .await;

    assert_eq!(
        session.room.published_json(),
        vec![serde_json::json!({"type": "start_interview", "resumeId": 7})]
    );
    assert!(session.room.all_published_reliable());
    assert_eq!(
        session.room.last_endpoint().as_deref(),
        Some(TEST_ROOM_ENDPOINT)
    );
    assert_eq!(session.tokens.validate_calls(), 1);
    assert_eq!(session.tokens.acquire_calls(), 1);
    assert_eq!(session.tokens.subjects(), vec![SubjectId(7)]);
}

#[tokio::test]
async fn test_duplicate_joined_event_does_not_resend_start() {
    let session = TestSession::builder().start().await.unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    session
        .room
        .emit(interview_session::room::RoomEvent::Joined);
    // Barrier: a later message on the same channel.
    session
        .room
        .inject_json(serde_json::json!({"type": "interview_started"}));
    session.wait_until(|s| s.flags.interview_started).await;

    assert_eq!(session.room.published_count("start_interview"), 1);
    assert_eq!(
        session
            .observer
            .count(|e| matches!(e, SessionEvent::TransitionRejected { .. })),
        1
    );
}

#[tokio::test]
async fn test_question_after_join_sets_question_and_speaking() {
    let session = TestSession::builder().start().await.unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    session.room.inject_json(serde_json::json!({
        "type": "question",
        "text": "Tell me about yourself"
    }));

    let snapshot = session
        .wait_until(|s| s.flags.current_question.is_some())
        .await;

    assert_eq!(
        snapshot.flags.current_question.as_deref(),
        Some("Tell me about yourself")
    );
    assert!(snapshot.flags.is_speaking);
    assert_eq!(snapshot.connection, ConnectionState::Connected);
    assert_eq!(
        SessionView::project(&snapshot),
        SessionView::InProgress {
            question: Some("Tell me about yourself".to_string()),
            is_speaking: true,
            is_muted: false,
        }
    );
}

#[tokio::test]
async fn test_subject_not_found_never_touches_room() {
    let tokens = MockTokenService::builder()
        .failing_acquire(PreJoinFailure::NotFound)
        .build();

    let (err, mocks) = TestSession::builder()
        .tokens(tokens)
        .start()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InterviewError::PreJoin(PreJoinFailure::NotFound)
    ));
    assert_eq!(err.client_message(), "Resume not found");
    assert_eq!(mocks.room.connect_calls(), 0);
    assert_eq!(mocks.room.subscribe_calls(), 0);
    assert_eq!(mocks.host.count(), 0);
    assert_eq!(
        mocks
            .observer
            .count(|e| matches!(e, SessionEvent::PreJoinFailed { .. })),
        1
    );
}

#[tokio::test]
async fn test_not_eligible_carries_server_message() {
    let tokens = MockTokenService::builder()
        .not_eligible(Some("Resume is still being analyzed"))
        .build();

    let (err, mocks) = TestSession::builder()
        .tokens(tokens)
        .start()
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        InterviewError::PreJoin(PreJoinFailure::NotReady(Some(_)))
    ));
    assert_eq!(
        SessionView::from_error(&err),
        SessionView::CannotStart {
            message: "Resume is still being analyzed".to_string()
        }
    );
    // Eligibility failed: no credentials were requested.
    assert_eq!(mocks.tokens.acquire_calls(), 0);
    assert_eq!(mocks.room.connect_calls(), 0);
}

#[tokio::test]
async fn test_missing_endpoint_is_unknown_pre_join_failure() {
    let tokens = MockTokenService::builder().without_endpoint().build();

    let (err, mocks) = TestSession::builder()
        .tokens(tokens)
        .start()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InterviewError::PreJoin(PreJoinFailure::Unknown(_))
    ));
    assert_eq!(mocks.room.connect_calls(), 0);
}

#[tokio::test]
async fn test_configured_endpoint_is_fallback() {
    let tokens = MockTokenService::builder().without_endpoint().build();
    let config = Config {
        room_server_url: Some("wss://fallback.rooms.test".to_string()),
        ..Config::default()
    };

    let session = TestSession::builder()
        .tokens(tokens)
        .config(config)
        .start()
        .await
        .unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    assert_eq!(
        session.room.last_endpoint().as_deref(),
        Some("wss://fallback.rooms.test")
    );
}

#[tokio::test]
async fn test_connect_failure_moves_to_failed_and_releases() {
    let room = MockMediaRoom::builder()
        .failing_connect("signal server unreachable")
        .build();

    let session = TestSession::builder().room(room).start().await.unwrap();

    let snapshot = session.wait_for_connection(ConnectionState::Failed).await;
    assert!(snapshot
        .flags
        .last_error
        .as_deref()
        .unwrap()
        .contains("signal server unreachable"));
    assert!(matches!(
        SessionView::project(&snapshot),
        SessionView::ConnectionError { .. }
    ));

    session
        .observer
        .wait_for(|e| matches!(e, SessionEvent::Released))
        .await;
    assert_eq!(session.room.listener_count(), 0);
    assert_eq!(session.room.disconnect_calls(), 1);
    assert_eq!(session.room.connect_calls(), 1);
    assert_eq!(session.host.count(), 0);
}

#[tokio::test]
async fn test_transport_error_mid_session_fails_without_reconnect() {
    let session = TestSession::builder().start().await.unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    session.room.transport_error("ice connection failed");

    let snapshot = session.wait_for_connection(ConnectionState::Failed).await;
    assert_eq!(
        snapshot.flags.last_error.as_deref(),
        Some("ice connection failed")
    );

    session
        .observer
        .wait_for(|e| matches!(e, SessionEvent::Released))
        .await;
    assert_eq!(session.room.connect_calls(), 1);
    assert_eq!(session.room.listener_count(), 0);

    let state = session.handle.get_state().await.unwrap();
    assert_eq!(state.connection, ConnectionState::Failed);
}

#[tokio::test]
async fn test_remote_hangup_disconnects_and_notifies_once() {
    let session = TestSession::builder().start().await.unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    session.room.remote_hangup();

    session.wait_for_connection(ConnectionState::Disconnected).await;
    session.host.wait_called().await;

    // Termination after hangup has nothing left to do.
    let outcome = session.handle.end_interview().await.unwrap();
    assert_eq!(
        outcome,
        interview_session::session::TerminationOutcome::AlreadyTerminated
    );

    assert_eq!(session.host.count(), 1);
    assert_eq!(session.room.disconnect_calls(), 1);
    assert_eq!(session.room.listener_count(), 0);
    assert_eq!(session.authority.call_count(), 0);
}

#[tokio::test]
async fn test_cancel_releases_room_without_host_callback() {
    let session = TestSession::builder().start().await.unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    session.handle.cancel();
    assert!(session.handle.is_cancelled());

    let TestSession {
        handle,
        task,
        room,
        host,
        ..
    } = session;
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(room.disconnect_calls(), 1);
    assert_eq!(room.listener_count(), 0);
    assert!(!room.is_connected());
    assert_eq!(host.count(), 0);

    // The actor is gone.
    assert!(matches!(
        handle.get_state().await,
        Err(InterviewError::SessionClosed)
    ));
}

#[tokio::test]
async fn test_dropping_handles_releases_room() {
    let session = TestSession::builder().start().await.unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;
    let room = session.room.clone();

    session.shutdown().await;

    assert_eq!(room.disconnect_calls(), 1);
    assert_eq!(room.listener_count(), 0);
    assert_eq!(room.subscribe_calls(), room.unsubscribe_calls());
}

#[tokio::test]
async fn test_release_after_termination_does_not_disconnect_twice() {
    let session = TestSession::builder().start().await.unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    session.handle.end_interview().await.unwrap();
    let room = session.room.clone();
    session.shutdown().await;

    assert_eq!(room.disconnect_calls(), 1);
    assert_eq!(room.unsubscribe_calls(), 1);
}

#[tokio::test]
async fn test_credentials_event_reports_session_id() {
    let session = TestSession::builder()
        .session_id(None)
        .start()
        .await
        .unwrap();

    assert_eq!(
        session.observer.count(|e| matches!(
            e,
            SessionEvent::CredentialsAcquired {
                has_session_id: false
            }
        )),
        1
    );
    assert!(session.authority.ended_sessions().is_empty());
}

#[tokio::test]
async fn test_commands_answered_while_connect_pending() {
    let room = MockMediaRoom::builder()
        .slow_connect(Duration::from_millis(300))
        .build();
    let session = TestSession::builder().room(room).start().await.unwrap();
    session.room.wait_for_listeners(1).await;

    let asked = std::time::Instant::now();
    let state = session.handle.get_state().await.unwrap();
    assert!(asked.elapsed() < Duration::from_millis(150));
    assert_eq!(state.connection, ConnectionState::Connecting);

    session.wait_for_connection(ConnectionState::Connected).await;
    session
        .observer
        .wait_for(|e| matches!(e, SessionEvent::MessageSent { .. }))
        .await;
    assert_eq!(session.room.published_count("start_interview"), 1);
    assert_eq!(session.room.connect_calls(), 1);
}

#[tokio::test]
async fn test_failed_start_interview_is_recorded_and_not_retried() {
    let room = MockMediaRoom::builder().failing_publish().build();
    let session = TestSession::builder().room(room).start().await.unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    session
        .observer
        .wait_for(|e| matches!(e, SessionEvent::MessageSendFailed { .. }))
        .await;

    // A repeated join does not trigger another attempt.
    session
        .room
        .emit(interview_session::room::RoomEvent::Joined);
    session
        .room
        .inject_json(serde_json::json!({"type": "interview_started"}));
    let snapshot = session.wait_until(|s| s.flags.interview_started).await;

    assert_eq!(snapshot.connection, ConnectionState::Connected);
    assert_eq!(
        session
            .observer
            .count(|e| matches!(e, SessionEvent::MessageSendFailed { .. })),
        1
    );
    assert_eq!(
        session
            .observer
            .count(|e| matches!(e, SessionEvent::MessageSent { .. })),
        0
    );
    assert_eq!(session.room.published_count("start_interview"), 0);
}
