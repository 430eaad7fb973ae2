//! Interview session error types.
//!
//! Every error maps to one of the two failure screens the shell can show.
//! Internal details are logged but not exposed to the user.

use crate::room::RoomError;
use thiserror::Error;

/// Why a session could not be started.
///
/// Produced before any room connection is attempted: by the eligibility
/// check, by credential acquisition, or by endpoint resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreJoinFailure {
    /// The subject (resume) does not exist.
    #[error("Subject not found")]
    NotFound,

    /// The subject exists but cannot be interviewed yet.
    #[error("Subject not ready for interview")]
    NotReady(Option<String>),

    /// The backend rejected our credentials.
    #[error("Not authorized to start interview")]
    Unauthorized,

    /// Network failure, unexpected status, or unusable response.
    #[error("Failed to start interview: {0}")]
    Unknown(String),
}

impl PreJoinFailure {
    /// Returns a user-facing message (no internal details).
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            PreJoinFailure::NotFound => "Resume not found".to_string(),
            PreJoinFailure::NotReady(Some(message)) if !message.trim().is_empty() => {
                message.clone()
            }
            PreJoinFailure::NotReady(_) => "Resume not ready for interview".to_string(),
            PreJoinFailure::Unauthorized => {
                "You are not authorized to start this interview".to_string()
            }
            PreJoinFailure::Unknown(_) => "Failed to start interview".to_string(),
        }
    }
}

/// Which failure screen an error belongs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureScreen {
    /// The interview never started (token/eligibility problems).
    CannotStart,
    /// The room connection failed or the session is unusable.
    ConnectionError,
}

/// Interview session error type.
#[derive(Debug, Error)]
pub enum InterviewError {
    /// Session could not be started.
    #[error("Pre-join failure: {0}")]
    PreJoin(#[from] PreJoinFailure),

    /// A room operation (publish, mute) failed.
    #[error("Room error: {0}")]
    Room(#[from] RoomError),

    /// The session actor is gone or the session is already terminal.
    #[error("Session closed")]
    SessionClosed,
}

impl InterviewError {
    /// Returns the failure screen this error is surfaced on.
    #[must_use]
    pub fn failure_screen(&self) -> FailureScreen {
        match self {
            InterviewError::PreJoin(_) => FailureScreen::CannotStart,
            InterviewError::Room(_) | InterviewError::SessionClosed => {
                FailureScreen::ConnectionError
            }
        }
    }

    /// Returns a user-safe error message (no internal details).
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            InterviewError::PreJoin(failure) => failure.client_message(),
            InterviewError::Room(_) => "Audio operation failed, please try again".to_string(),
            InterviewError::SessionClosed => "The interview session has ended".to_string(),
        }
    }
}
