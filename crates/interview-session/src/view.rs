//! Screen model for the presentation shell.
//!
//! A pure projection of [`SessionSnapshot`]. The shell renders whatever
//! variant it gets; it never reads the session state directly.

use crate::errors::{FailureScreen, InterviewError, PreJoinFailure};
use crate::session::{ConnectionState, SessionSnapshot, TerminationPhase};

/// User-facing message for a transport failure.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection to the interview failed";

/// What the shell shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionView {
    /// Joining the room.
    Connecting,
    /// In the room, waiting for the interviewer to begin.
    Waiting { is_muted: bool },
    /// Interview running.
    InProgress {
        question: Option<String>,
        is_speaking: bool,
        is_muted: bool,
    },
    /// Session ended or ending.
    Ended,
    /// Failure before joining. Offers back/retry.
    CannotStart { message: String },
    /// Transport failure. Offers back/retry.
    ConnectionError { message: String },
}

impl SessionView {
    /// Project a state snapshot onto a screen.
    #[must_use]
    pub fn project(snapshot: &SessionSnapshot) -> Self {
        let flags = &snapshot.flags;

        match snapshot.connection {
            ConnectionState::Failed => SessionView::ConnectionError {
                message: CONNECTION_ERROR_MESSAGE.to_string(),
            },
            ConnectionState::Disconnected => SessionView::Ended,
            _ if snapshot.termination != TerminationPhase::NotStarted => SessionView::Ended,
            ConnectionState::Connecting => SessionView::Connecting,
            ConnectionState::Connected
                if flags.interview_started || flags.current_question.is_some() =>
            {
                SessionView::InProgress {
                    question: flags.current_question.clone(),
                    is_speaking: flags.is_speaking,
                    is_muted: flags.is_muted,
                }
            }
            ConnectionState::Connected => SessionView::Waiting {
                is_muted: flags.is_muted,
            },
        }
    }

    /// Screen for a failed session start.
    #[must_use]
    pub fn cannot_start(failure: &PreJoinFailure) -> Self {
        SessionView::CannotStart {
            message: failure.client_message(),
        }
    }

    /// Screen for an error returned by the session API.
    #[must_use]
    pub fn from_error(error: &InterviewError) -> Self {
        match error.failure_screen() {
            FailureScreen::CannotStart => SessionView::CannotStart {
                message: error.client_message(),
            },
            FailureScreen::ConnectionError => SessionView::ConnectionError {
                message: error.client_message(),
            },
        }
    }

    /// Both failure screens offer back/retry.
    #[must_use]
    pub fn offers_retry(&self) -> bool {
        matches!(
            self,
            SessionView::CannotStart { .. } | SessionView::ConnectionError { .. }
        )
    }
}
