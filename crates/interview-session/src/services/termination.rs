//! Termination Authority boundary.

use common::types::SessionId;
use thiserror::Error;

/// Force-end failed. Logged by the caller, never blocks teardown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminationError {
    #[error("Termination request failed: {0}")]
    Request(String),

    #[error("Termination rejected with status {0}")]
    Rejected(u16),
}

/// Trait for server-side session termination (enables mocking).
#[async_trait::async_trait]
pub trait TerminationAuthority: Send + Sync {
    /// Force-end the server-side session.
    async fn force_end_session(&self, session_id: SessionId) -> Result<(), TerminationError>;
}
