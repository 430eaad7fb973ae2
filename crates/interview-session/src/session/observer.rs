//! Session events and the observer boundary.
//!
//! The controller reports everything worth logging or counting as a
//! [`SessionEvent`]. [`TracingObserver`] turns events into `tracing` records
//! and metrics; tests substitute a recording observer.

use super::messages::MuteOutcome;
use super::state::{ConnectionState, MessageEffect};
use super::termination::{StepOutcome, TerminationStep, TerminationTrigger};
use crate::errors::PreJoinFailure;
use crate::observability::metrics;
use common::types::SubjectId;
use control_protocol::MessageKind;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Something that happened in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Eligibility check and credential acquisition succeeded.
    CredentialsAcquired { has_session_id: bool },
    /// Session could not be started.
    PreJoinFailed { failure: PreJoinFailure },
    ConnectionStateChanged {
        from: ConnectionState,
        to: ConnectionState,
    },
    /// A transition was attempted out of a state that does not allow it.
    TransitionRejected {
        from: ConnectionState,
        to: ConnectionState,
    },
    TransportError { message: String },
    MessageSent { kind: MessageKind },
    MessageSendFailed { kind: MessageKind, error: String },
    MessageReceived {
        kind: MessageKind,
        effect: MessageEffect,
    },
    /// Inbound payload could not be decoded; dropped.
    MalformedMessage { error: String },
    /// Inbound payload had a type this client does not know; dropped.
    UnrecognizedMessage { tag: String },
    MuteToggled { outcome: MuteOutcome },
    MuteFailed { error: String },
    TerminationStarted { trigger: TerminationTrigger },
    TerminationStep {
        step: TerminationStep,
        outcome: StepOutcome,
    },
    TerminationCompleted {
        trigger: TerminationTrigger,
        had_failures: bool,
        duration: Duration,
    },
    /// Termination requested again; no side effects.
    TerminationIgnored { trigger: TerminationTrigger },
    /// Room listener and connection released.
    Released,
}

/// Receives session events. Must not block.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, subject: SubjectId, event: &SessionEvent);
}

/// Default observer: structured logs plus metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    #[allow(clippy::too_many_lines)]
    fn on_event(&self, subject: SubjectId, event: &SessionEvent) {
        match event {
            SessionEvent::CredentialsAcquired { has_session_id } => {
                info!(
                    target: "session.controller",
                    subject_id = %subject,
                    has_session_id,
                    "Session credentials acquired"
                );
            }
            SessionEvent::PreJoinFailed { failure } => {
                warn!(
                    target: "session.controller",
                    subject_id = %subject,
                    error = %failure,
                    "Interview cannot start"
                );
                metrics::record_session_start(pre_join_label(failure));
            }
            SessionEvent::ConnectionStateChanged { from, to } => {
                info!(
                    target: "session.controller",
                    subject_id = %subject,
                    from = %from,
                    to = %to,
                    "Connection state changed"
                );
                metrics::record_connection_state(to.as_str());
                if *to == ConnectionState::Connected {
                    metrics::record_session_start("joined_room");
                }
            }
            SessionEvent::TransitionRejected { from, to } => {
                debug!(
                    target: "session.controller",
                    subject_id = %subject,
                    from = %from,
                    to = %to,
                    "Connection state transition rejected"
                );
            }
            SessionEvent::TransportError { message } => {
                error!(
                    target: "session.controller",
                    subject_id = %subject,
                    error = %message,
                    "Room transport error"
                );
            }
            SessionEvent::MessageSent { kind } => {
                debug!(
                    target: "session.protocol",
                    subject_id = %subject,
                    kind = %kind,
                    "Control message sent"
                );
                metrics::record_outbound_message(kind.as_str(), true);
            }
            SessionEvent::MessageSendFailed { kind, error } => {
                warn!(
                    target: "session.protocol",
                    subject_id = %subject,
                    kind = %kind,
                    error = %error,
                    "Control message send failed"
                );
                metrics::record_outbound_message(kind.as_str(), false);
            }
            SessionEvent::MessageReceived { kind, effect } => {
                debug!(
                    target: "session.protocol",
                    subject_id = %subject,
                    kind = %kind,
                    effect = effect.as_str(),
                    "Control message received"
                );
                metrics::record_inbound_message(kind.as_str(), effect.as_str());
            }
            SessionEvent::MalformedMessage { error } => {
                warn!(
                    target: "session.protocol",
                    subject_id = %subject,
                    error = %error,
                    "Dropped malformed control message"
                );
                metrics::record_inbound_message("unknown", "malformed");
            }
            SessionEvent::UnrecognizedMessage { tag } => {
                debug!(
                    target: "session.protocol",
                    subject_id = %subject,
                    tag = %tag,
                    "Ignored unrecognized control message"
                );
                metrics::record_inbound_message("unknown", "ignored");
            }
            SessionEvent::MuteToggled { outcome } => {
                debug!(
                    target: "session.controller",
                    subject_id = %subject,
                    outcome = outcome.as_str(),
                    "Mute toggled"
                );
                metrics::record_mute_toggle(outcome.as_str());
            }
            SessionEvent::MuteFailed { error } => {
                warn!(
                    target: "session.controller",
                    subject_id = %subject,
                    error = %error,
                    "Mute toggle failed"
                );
                metrics::record_mute_toggle("failed");
            }
            SessionEvent::TerminationStarted { trigger } => {
                info!(
                    target: "session.termination",
                    subject_id = %subject,
                    trigger = %trigger,
                    "Termination started"
                );
            }
            SessionEvent::TerminationStep { step, outcome } => {
                match outcome {
                    StepOutcome::Failed(error) => warn!(
                        target: "session.termination",
                        subject_id = %subject,
                        step = %step,
                        error = %error,
                        "Termination step failed, continuing"
                    ),
                    StepOutcome::Skipped(reason) => debug!(
                        target: "session.termination",
                        subject_id = %subject,
                        step = %step,
                        reason,
                        "Termination step skipped"
                    ),
                    StepOutcome::Completed => debug!(
                        target: "session.termination",
                        subject_id = %subject,
                        step = %step,
                        "Termination step completed"
                    ),
                }
                metrics::record_termination_step(step.as_str(), outcome.as_str());
            }
            SessionEvent::TerminationCompleted {
                trigger,
                had_failures,
                duration,
            } => {
                info!(
                    target: "session.termination",
                    subject_id = %subject,
                    trigger = %trigger,
                    had_failures,
                    duration_ms = duration.as_millis(),
                    "Termination completed"
                );
                metrics::record_termination(trigger.as_str(), *duration);
            }
            SessionEvent::TerminationIgnored { trigger } => {
                debug!(
                    target: "session.termination",
                    subject_id = %subject,
                    trigger = %trigger,
                    "Termination already in progress or done"
                );
            }
            SessionEvent::Released => {
                debug!(
                    target: "session.controller",
                    subject_id = %subject,
                    "Room released"
                );
            }
        }
    }
}

fn pre_join_label(failure: &PreJoinFailure) -> &'static str {
    match failure {
        PreJoinFailure::NotFound => "not_found",
        PreJoinFailure::NotReady(_) => "not_ready",
        PreJoinFailure::Unauthorized => "unauthorized",
        PreJoinFailure::Unknown(_) => "unknown",
    }
}
