//! Termination sequencing: idempotence, ordering and best-effort steps.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use common::types::SessionId;
use control_protocol::MessageKind;
use interview_session::session::{
    ConnectionState, SessionEvent, StepOutcome, TerminationOutcome, TerminationPhase,
    TerminationStep, TerminationTrigger, TERMINATION_SEQUENCE,
};
use interview_session::Config;
use serde_json::json;
use session_test_utils::*;
use std::time::{Duration, Instant};

fn disconnected_transitions(observer: &RecordingObserver) -> usize {
    observer.count(|e| {
        matches!(
            e,
            SessionEvent::ConnectionStateChanged {
                to: ConnectionState::Disconnected,
                ..
            }
        )
    })
}

fn expect_report(outcome: TerminationOutcome) -> interview_session::session::TerminationReport {
    match outcome {
        TerminationOutcome::Completed(report) => report,
        TerminationOutcome::AlreadyTerminated => panic!("expected the sequence to run"),
    }
}

#[tokio::test]
async fn test_user_end_runs_every_step_in_order() {
    let session = TestSession::builder()
        .session_id(Some(555))
        .start()
        .await
        .unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    let report = expect_report(session.handle.end_interview().await.unwrap());

    assert_eq!(report.trigger, TerminationTrigger::UserRequested);
    let steps: Vec<TerminationStep> = report.steps.iter().map(|(step, _)| *step).collect();
    assert_eq!(steps, TERMINATION_SEQUENCE.to_vec());
    assert!(report
        .steps
        .iter()
        .all(|(_, outcome)| *outcome == StepOutcome::Completed));

    assert_eq!(session.authority.ended_sessions(), vec![SessionId(555)]);
    assert_eq!(
        session.room.published_types(),
        vec!["start_interview".to_string(), "end_interview".to_string()]
    );
    assert_eq!(
        session.room.published_json().last().unwrap(),
        &json!({"type": "end_interview", "resumeId": 42})
    );

    let state = session.handle.get_state().await.unwrap();
    assert_eq!(state.connection, ConnectionState::Disconnected);
    assert_eq!(state.termination, TerminationPhase::Completed);
    assert_eq!(session.host.count(), 1);
    assert_eq!(session.room.disconnect_calls(), 1);
    assert_eq!(session.room.listener_count(), 0);
}

#[tokio::test]
async fn test_double_termination_is_idempotent() {
    let session = TestSession::builder().start().await.unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    let first = session.handle.end_interview().await.unwrap();
    let second = session.handle.end_interview().await.unwrap();

    assert!(matches!(first, TerminationOutcome::Completed(_)));
    assert_eq!(second, TerminationOutcome::AlreadyTerminated);

    assert_eq!(session.authority.call_count(), 1);
    assert_eq!(session.room.disconnect_calls(), 1);
    assert_eq!(session.host.count(), 1);
    assert_eq!(disconnected_transitions(&session.observer), 1);
    assert_eq!(
        session
            .observer
            .count(|e| matches!(e, SessionEvent::TerminationIgnored { .. })),
        1
    );
}

#[tokio::test]
async fn test_double_click_end_while_force_end_in_flight() {
    let session = TestSession::builder()
        .authority(MockTerminationAuthority::slow(Duration::from_millis(100)))
        .start()
        .await
        .unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    let first_handle = session.handle.clone();
    let second_handle = session.handle.clone();
    let (first, second) = tokio::join!(first_handle.end_interview(), async move {
        // Sent while the first termination is suspended in force-end.
        tokio::time::sleep(Duration::from_millis(10)).await;
        second_handle.end_interview().await
    });

    let outcomes = [first.unwrap(), second.unwrap()];
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, TerminationOutcome::Completed(_)))
            .count(),
        1
    );
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| **o == TerminationOutcome::AlreadyTerminated)
            .count(),
        1
    );

    assert_eq!(session.authority.call_count(), 1);
    assert_eq!(disconnected_transitions(&session.observer), 1);
    assert_eq!(session.host.count(), 1);
}

#[tokio::test]
async fn test_failing_force_end_and_publish_still_tear_down() {
    let session = TestSession::builder()
        .authority(MockTerminationAuthority::failing())
        .start()
        .await
        .unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;
    session
        .observer
        .wait_for(|e| matches!(e, SessionEvent::MessageSent { .. }))
        .await;

    session.room.set_publish_fails(true);

    let report = expect_report(session.handle.end_interview().await.unwrap());

    assert!(matches!(
        report.outcome(TerminationStep::ForceEnd),
        Some(StepOutcome::Failed(_))
    ));
    assert!(matches!(
        report.outcome(TerminationStep::SignalEnd),
        Some(StepOutcome::Failed(_))
    ));
    for step in [
        TerminationStep::MarkDisconnected,
        TerminationStep::DisconnectRoom,
        TerminationStep::NotifyHost,
    ] {
        assert_eq!(report.outcome(step), Some(&StepOutcome::Completed), "{step}");
    }
    assert!(report.has_failures());

    let state = session.handle.get_state().await.unwrap();
    assert_eq!(state.connection, ConnectionState::Disconnected);
    assert_eq!(session.host.count(), 1);
    assert_eq!(session.room.disconnect_calls(), 1);
}

#[tokio::test]
async fn test_interview_complete_with_session_id_force_ends() {
    let session = TestSession::builder()
        .session_id(Some(9001))
        .start()
        .await
        .unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    session
        .room
        .inject_json(json!({"type": "interview_complete"}));
    session.host.wait_called().await;

    assert_eq!(session.authority.ended_sessions(), vec![SessionId(9001)]);
    assert_eq!(session.room.published_count("end_interview"), 1);
    assert_eq!(
        session.observer.count(|e| matches!(
            e,
            SessionEvent::TerminationStarted {
                trigger: TerminationTrigger::InterviewComplete
            }
        )),
        1
    );

    let state = session.handle.get_state().await.unwrap();
    assert_eq!(state.connection, ConnectionState::Disconnected);
    assert_eq!(session.host.count(), 1);

    // The user clicking "end" afterwards changes nothing.
    assert_eq!(
        session.handle.end_interview().await.unwrap(),
        TerminationOutcome::AlreadyTerminated
    );
    assert_eq!(session.authority.call_count(), 1);
    assert_eq!(session.host.count(), 1);
}

#[tokio::test]
async fn test_interview_complete_without_session_id_skips_force_end() {
    let session = TestSession::builder()
        .session_id(None)
        .start()
        .await
        .unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    session
        .room
        .inject_json(json!({"type": "interview_complete"}));
    session.host.wait_called().await;

    assert_eq!(session.authority.call_count(), 0);
    assert_eq!(
        session.observer.count(|e| matches!(
            e,
            SessionEvent::TerminationStep {
                step: TerminationStep::ForceEnd,
                outcome: StepOutcome::Skipped(_)
            }
        )),
        1
    );
    assert_eq!(session.host.count(), 1);
    assert_eq!(session.room.disconnect_calls(), 1);
}

#[tokio::test]
async fn test_interview_complete_force_end_can_be_disabled() {
    let config = Config {
        force_end_on_complete: false,
        ..Config::default()
    };
    let session = TestSession::builder()
        .session_id(Some(3))
        .config(config)
        .start()
        .await
        .unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    session
        .room
        .inject_json(json!({"type": "interview_complete"}));
    session.host.wait_called().await;

    assert_eq!(session.authority.call_count(), 0);
    assert_eq!(session.host.count(), 1);
}

#[tokio::test]
async fn test_end_after_transport_failure_notifies_host() {
    let session = TestSession::builder().start().await.unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    session.room.transport_error("peer connection closed");
    session.wait_for_connection(ConnectionState::Failed).await;

    let report = expect_report(session.handle.end_interview().await.unwrap());

    assert_eq!(
        report.outcome(TerminationStep::ForceEnd),
        Some(&StepOutcome::Completed)
    );
    assert!(matches!(
        report.outcome(TerminationStep::SignalEnd),
        Some(StepOutcome::Skipped(_))
    ));
    assert!(matches!(
        report.outcome(TerminationStep::MarkDisconnected),
        Some(StepOutcome::Skipped(_))
    ));
    assert!(matches!(
        report.outcome(TerminationStep::DisconnectRoom),
        Some(StepOutcome::Skipped(_))
    ));
    assert_eq!(
        report.outcome(TerminationStep::NotifyHost),
        Some(&StepOutcome::Completed)
    );

    // Failed stays failed.
    let state = session.handle.get_state().await.unwrap();
    assert_eq!(state.connection, ConnectionState::Failed);
    assert_eq!(session.room.disconnect_calls(), 1);
    assert_eq!(session.host.count(), 1);
}

#[tokio::test]
async fn test_termination_steps_reported_to_observer_in_order() {
    let session = TestSession::builder().start().await.unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    session.handle.end_interview().await.unwrap();

    let steps: Vec<TerminationStep> = session
        .observer
        .events()
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::TerminationStep { step, .. } => Some(step),
            _ => None,
        })
        .collect();
    assert_eq!(steps, TERMINATION_SEQUENCE.to_vec());
    assert_eq!(
        session
            .observer
            .count(|e| matches!(e, SessionEvent::TerminationCompleted { .. })),
        1
    );
}

#[tokio::test]
async fn test_snapshot_shows_termination_phase() {
    let session = TestSession::builder()
        .authority(MockTerminationAuthority::slow(Duration::from_millis(50)))
        .start()
        .await
        .unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    let handle = session.handle.clone();
    let end = tokio::spawn(async move { handle.end_interview().await });

    let during = session
        .wait_until(|s| s.termination == TerminationPhase::InProgress)
        .await;
    assert_eq!(during.connection, ConnectionState::Connected);

    end.await.unwrap().unwrap();
    let after = session.handle.snapshot();
    assert_eq!(after.termination, TerminationPhase::Completed);
    assert_eq!(after.connection, ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_session_stays_responsive_while_force_end_pending() {
    let session = TestSession::builder()
        .authority(MockTerminationAuthority::slow(Duration::from_millis(300)))
        .start()
        .await
        .unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    let handle = session.handle.clone();
    let end = tokio::spawn(async move { handle.end_interview().await });
    session
        .wait_until(|s| s.termination == TerminationPhase::InProgress)
        .await;

    // Delivered and applied while the backend call is outstanding.
    session
        .room
        .inject_json(json!({"type": "question", "text": "Any questions for us?"}));
    let during = session
        .wait_until(|s| s.flags.current_question.is_some())
        .await;
    assert_eq!(during.connection, ConnectionState::Connected);
    assert_eq!(during.termination, TerminationPhase::InProgress);

    let asked = Instant::now();
    let state = session.handle.get_state().await.unwrap();
    assert!(asked.elapsed() < Duration::from_millis(150));
    assert_eq!(
        state.flags.current_question.as_deref(),
        Some("Any questions for us?")
    );
    assert_eq!(state.termination, TerminationPhase::InProgress);

    // A second end is answered immediately instead of queueing behind the first.
    let asked = Instant::now();
    assert_eq!(
        session.handle.end_interview().await.unwrap(),
        TerminationOutcome::AlreadyTerminated
    );
    assert!(asked.elapsed() < Duration::from_millis(150));

    let report = expect_report(end.await.unwrap().unwrap());
    assert!(report
        .steps
        .iter()
        .all(|(_, outcome)| *outcome == StepOutcome::Completed));
    assert_eq!(
        session.observer.count(|e| matches!(
            e,
            SessionEvent::MessageReceived {
                kind: MessageKind::Question,
                ..
            }
        )),
        1
    );
    assert_eq!(session.authority.call_count(), 1);
    assert_eq!(session.host.count(), 1);
    assert_eq!(session.room.disconnect_calls(), 1);
}

#[tokio::test]
async fn test_cancel_during_force_end_waits_for_call_then_releases() {
    let session = TestSession::builder()
        .authority(MockTerminationAuthority::slow(Duration::from_millis(100)))
        .start()
        .await
        .unwrap();
    session.wait_for_connection(ConnectionState::Connected).await;

    let handle = session.handle.clone();
    let end = tokio::spawn(async move { handle.end_interview().await });
    session
        .wait_until(|s| s.termination == TerminationPhase::InProgress)
        .await;

    session.handle.cancel();
    session
        .observer
        .wait_for(|e| {
            matches!(
                e,
                SessionEvent::TerminationStep {
                    step: TerminationStep::ForceEnd,
                    outcome: StepOutcome::Completed
                }
            )
        })
        .await;
    session
        .observer
        .wait_for(|e| matches!(e, SessionEvent::Released))
        .await;

    // The abandoned sequence reports no outcome and never reaches the host.
    assert!(end.await.unwrap().is_err());
    assert_eq!(session.authority.call_count(), 1);
    assert_eq!(session.room.published_count("end_interview"), 0);
    assert_eq!(session.room.disconnect_calls(), 1);
    assert_eq!(session.host.count(), 0);
}

#[tokio::test]
async fn test_end_while_connecting_closes_late_connection() {
    let room = MockMediaRoom::builder()
        .slow_connect(Duration::from_millis(100))
        .build();
    let session = TestSession::builder().room(room).start().await.unwrap();
    session.room.wait_for_listeners(1).await;

    let report = expect_report(session.handle.end_interview().await.unwrap());
    assert!(matches!(
        report.outcome(TerminationStep::SignalEnd),
        Some(StepOutcome::Failed(_))
    ));
    assert_eq!(
        report.outcome(TerminationStep::DisconnectRoom),
        Some(&StepOutcome::Completed)
    );
    assert_eq!(session.host.count(), 1);

    // The connect that was still pending is closed once it lands.
    session.room.wait_for_disconnects(2).await;
    assert!(!session.room.is_connected());
    assert_eq!(session.room.connect_calls(), 1);
    assert_eq!(session.room.published_count("start_interview"), 0);
    assert_eq!(
        session.handle.snapshot().connection,
        ConnectionState::Disconnected
    );
}
