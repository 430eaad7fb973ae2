//! Termination sequencing.
//!
//! Termination is an ordered list of best-effort steps. Every step runs and
//! reports an outcome even when an earlier step failed; the host callback is
//! always the last step.

use common::types::SessionId;
use std::fmt;

/// What started the termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationTrigger {
    /// The user pressed "end interview".
    UserRequested,
    /// The interviewer sent `interview_complete`.
    InterviewComplete,
}

impl TerminationTrigger {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TerminationTrigger::UserRequested => "user_requested",
            TerminationTrigger::InterviewComplete => "interview_complete",
        }
    }
}

impl fmt::Display for TerminationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Termination progress. Checked at the top of the termination routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminationPhase {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// One step of the termination sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationStep {
    /// Ask the Termination Authority to end the server-side session.
    ForceEnd,
    /// Publish `end_interview` to the interviewer.
    SignalEnd,
    /// Set the connection state to disconnected.
    MarkDisconnected,
    /// Disconnect from the media room.
    DisconnectRoom,
    /// Invoke the host callback.
    NotifyHost,
}

/// Steps in execution order.
pub const TERMINATION_SEQUENCE: [TerminationStep; 5] = [
    TerminationStep::ForceEnd,
    TerminationStep::SignalEnd,
    TerminationStep::MarkDisconnected,
    TerminationStep::DisconnectRoom,
    TerminationStep::NotifyHost,
];

impl TerminationStep {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TerminationStep::ForceEnd => "force_end",
            TerminationStep::SignalEnd => "signal_end",
            TerminationStep::MarkDisconnected => "mark_disconnected",
            TerminationStep::DisconnectRoom => "disconnect_room",
            TerminationStep::NotifyHost => "notify_host",
        }
    }
}

impl fmt::Display for TerminationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Skipped(&'static str),
    Failed(String),
}

impl StepOutcome {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StepOutcome::Completed => "completed",
            StepOutcome::Skipped(_) => "skipped",
            StepOutcome::Failed(_) => "failed",
        }
    }
}

/// Per-step outcomes of one termination run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationReport {
    pub trigger: TerminationTrigger,
    pub steps: Vec<(TerminationStep, StepOutcome)>,
}

impl TerminationReport {
    #[must_use]
    pub fn new(trigger: TerminationTrigger) -> Self {
        Self {
            trigger,
            steps: Vec::with_capacity(TERMINATION_SEQUENCE.len()),
        }
    }

    /// Outcome recorded for `step`, if it ran.
    #[must_use]
    pub fn outcome(&self, step: TerminationStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| outcome)
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.steps
            .iter()
            .any(|(_, outcome)| matches!(outcome, StepOutcome::Failed(_)))
    }
}

/// Result of requesting termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// This request ran the sequence.
    Completed(TerminationReport),
    /// Termination was already running or done; nothing happened.
    AlreadyTerminated,
}

/// Decide whether the Termination Authority is called.
///
/// Returns the session id to end, or the reason the step is skipped.
pub fn should_force_end(
    trigger: TerminationTrigger,
    session_id: Option<SessionId>,
    force_end_on_complete: bool,
) -> Result<SessionId, &'static str> {
    let session_id = session_id.ok_or("no server session id")?;
    match trigger {
        TerminationTrigger::UserRequested => Ok(session_id),
        TerminationTrigger::InterviewComplete if force_end_on_complete => Ok(session_id),
        TerminationTrigger::InterviewComplete => Err("disabled for interview_complete"),
    }
}
