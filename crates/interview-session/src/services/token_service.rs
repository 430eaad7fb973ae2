//! Token Service boundary.

use crate::errors::PreJoinFailure;
use common::secret::SecretString;
use common::types::{SessionId, SubjectId};

/// Credentials for one interview attempt.
///
/// Obtained once per session and owned by the controller for its lifetime.
#[derive(Debug, Clone)]
pub struct SessionCredentials {
    /// Room access token.
    pub token: SecretString,

    /// Room server endpoint. When absent the configured fallback is used.
    pub endpoint: Option<String>,

    /// Room name (informational).
    pub room_name: Option<String>,

    /// Server-side session identifier, used for force-end.
    pub session_id: Option<SessionId>,
}

/// Outcome of the eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    pub can_interview: bool,
    pub message: Option<String>,
}

impl Eligibility {
    /// Subject may be interviewed.
    #[must_use]
    pub fn allowed() -> Self {
        Self {
            can_interview: true,
            message: None,
        }
    }

    /// Subject may not be interviewed, with an optional server message.
    #[must_use]
    pub fn denied(message: Option<String>) -> Self {
        Self {
            can_interview: false,
            message,
        }
    }
}

/// Trait for Token Service operations (enables mocking).
#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    /// Ask whether `subject` may be interviewed right now.
    async fn validate_interview(&self, subject: SubjectId) -> Result<Eligibility, PreJoinFailure>;

    /// Authorize a session for `subject` and return room credentials.
    async fn acquire_session(
        &self,
        subject: SubjectId,
    ) -> Result<SessionCredentials, PreJoinFailure>;
}
