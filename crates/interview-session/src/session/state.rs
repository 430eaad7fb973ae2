//! Session state store.
//!
//! Pure data: connection state, session flags and the rules for mutating
//! them. Only the session actor holds a [`SessionState`]; everyone else sees
//! [`SessionSnapshot`] copies.

use super::termination::TerminationPhase;
use control_protocol::ControlMessage;
use std::fmt;

/// Room connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Disconnected,
    Failed,
}

impl ConnectionState {
    /// Terminal states accept no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Failed)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
        }
    }

    const fn can_transition_to(self, to: ConnectionState) -> bool {
        matches!(
            (self, to),
            (ConnectionState::Connecting, ConnectionState::Connected)
                | (
                    ConnectionState::Connecting | ConnectionState::Connected,
                    ConnectionState::Disconnected | ConnectionState::Failed
                )
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags driven by room events and user commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFlags {
    /// Local microphone muted.
    pub is_muted: bool,
    /// Interviewer is producing audio.
    pub is_speaking: bool,
    /// Interviewer acknowledged the start.
    pub interview_started: bool,
    /// Last question asked by the interviewer.
    pub current_question: Option<String>,
    /// Last transport error.
    pub last_error: Option<String>,
}

/// A connection state transition that is not allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Transition {from} -> {to} rejected")]
pub struct TransitionRejected {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

/// What applying an inbound message did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageEffect {
    /// Flags were updated.
    Applied,
    /// Message is not meant for the client; nothing changed.
    Ignored,
    /// Interviewer finished; the caller must start termination.
    TerminationRequested,
}

impl MessageEffect {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MessageEffect::Applied => "applied",
            MessageEffect::Ignored => "ignored",
            MessageEffect::TerminationRequested => "termination_requested",
        }
    }
}

/// Connection state plus flags for one session instance.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    connection: ConnectionState,
    flags: SessionFlags,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    #[must_use]
    pub fn flags(&self) -> &SessionFlags {
        &self.flags
    }

    /// Move to `to`, returning the previous state.
    ///
    /// # Errors
    ///
    /// Returns `TransitionRejected` when the edge does not exist, which
    /// includes every transition out of a terminal state.
    pub fn transition(&mut self, to: ConnectionState) -> Result<ConnectionState, TransitionRejected> {
        let from = self.connection;
        if from.can_transition_to(to) {
            self.connection = to;
            Ok(from)
        } else {
            Err(TransitionRejected { from, to })
        }
    }

    /// Move to `Failed` and remember the error.
    ///
    /// # Errors
    ///
    /// Returns `TransitionRejected` if the session is already terminal; the
    /// error is not recorded in that case.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<ConnectionState, TransitionRejected> {
        let previous = self.transition(ConnectionState::Failed)?;
        self.flags.last_error = Some(message.into());
        Ok(previous)
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.flags.is_muted = muted;
    }

    /// Apply an inbound control message to the flags.
    pub fn apply_message(&mut self, message: &ControlMessage) -> MessageEffect {
        match message {
            ControlMessage::Question { text } => {
                self.flags.current_question = Some(text.clone());
                self.flags.is_speaking = true;
                MessageEffect::Applied
            }
            ControlMessage::AiSpeakingStart => {
                self.flags.is_speaking = true;
                MessageEffect::Applied
            }
            // An unmatched end is a no-op.
            ControlMessage::AiSpeakingEnd if !self.flags.is_speaking => MessageEffect::Ignored,
            ControlMessage::AiSpeakingEnd => {
                self.flags.is_speaking = false;
                MessageEffect::Applied
            }
            ControlMessage::InterviewStarted => {
                self.flags.interview_started = true;
                MessageEffect::Applied
            }
            ControlMessage::InterviewComplete => MessageEffect::TerminationRequested,
            ControlMessage::StartInterview { .. } | ControlMessage::EndInterview { .. } => {
                MessageEffect::Ignored
            }
        }
    }

    #[must_use]
    pub fn snapshot(&self, termination: TerminationPhase) -> SessionSnapshot {
        SessionSnapshot {
            connection: self.connection,
            flags: self.flags.clone(),
            termination,
        }
    }
}

/// Read-only copy of the session state published to the shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub connection: ConnectionState,
    pub flags: SessionFlags,
    pub termination: TerminationPhase,
}
