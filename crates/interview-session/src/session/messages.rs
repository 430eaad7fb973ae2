//! Messages accepted by the session actor.

use super::state::SessionSnapshot;
use super::termination::TerminationOutcome;
use crate::errors::InterviewError;
use tokio::sync::oneshot;

/// Result of a mute toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteOutcome {
    /// The microphone is now muted.
    Muted,
    /// The microphone is now live.
    Unmuted,
    /// There is no local audio publication; nothing changed.
    NoAudioTrack,
}

impl MuteOutcome {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MuteOutcome::Muted => "muted",
            MuteOutcome::Unmuted => "unmuted",
            MuteOutcome::NoAudioTrack => "no_audio_track",
        }
    }
}

/// Commands sent from [`super::InterviewSessionHandle`] to the actor.
#[derive(Debug)]
pub enum SessionCommand {
    /// Flip the local microphone.
    ToggleMute {
        respond_to: oneshot::Sender<Result<MuteOutcome, InterviewError>>,
    },

    /// User asked to end the interview.
    EndInterview {
        respond_to: oneshot::Sender<TerminationOutcome>,
    },

    /// Get a snapshot of the current state.
    GetState {
        respond_to: oneshot::Sender<SessionSnapshot>,
    },
}
