//! Control message types.

use common::types::SubjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A control message exchanged with the interviewer agent.
///
/// The `type` tag selects the variant. `start_interview` and `end_interview`
/// are sent by the client and carry the subject id as `resumeId` so the
/// agent can correlate them; the remaining variants are sent by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Client is ready; the agent may begin the interview.
    StartInterview {
        #[serde(rename = "resumeId")]
        resume_id: SubjectId,
    },

    /// Agent asks a question (and starts speaking it).
    Question { text: String },

    /// Agent started producing audio.
    AiSpeakingStart,

    /// Agent stopped producing audio.
    AiSpeakingEnd,

    /// Agent acknowledged the start of the interview.
    InterviewStarted,

    /// Agent finished the interview; the client should tear down.
    InterviewComplete,

    /// Client is leaving the interview.
    EndInterview {
        #[serde(rename = "resumeId")]
        resume_id: SubjectId,
    },
}

impl ControlMessage {
    /// Returns the kind (type tag) of this message.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            ControlMessage::StartInterview { .. } => MessageKind::StartInterview,
            ControlMessage::Question { .. } => MessageKind::Question,
            ControlMessage::AiSpeakingStart => MessageKind::AiSpeakingStart,
            ControlMessage::AiSpeakingEnd => MessageKind::AiSpeakingEnd,
            ControlMessage::InterviewStarted => MessageKind::InterviewStarted,
            ControlMessage::InterviewComplete => MessageKind::InterviewComplete,
            ControlMessage::EndInterview { .. } => MessageKind::EndInterview,
        }
    }
}

/// Fieldless mirror of [`ControlMessage`] used for logging and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    StartInterview,
    Question,
    AiSpeakingStart,
    AiSpeakingEnd,
    InterviewStarted,
    InterviewComplete,
    EndInterview,
}

impl MessageKind {
    /// All kinds known to this protocol version.
    pub const ALL: [MessageKind; 7] = [
        MessageKind::StartInterview,
        MessageKind::Question,
        MessageKind::AiSpeakingStart,
        MessageKind::AiSpeakingEnd,
        MessageKind::InterviewStarted,
        MessageKind::InterviewComplete,
        MessageKind::EndInterview,
    ];

    /// The wire tag for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MessageKind::StartInterview => "start_interview",
            MessageKind::Question => "question",
            MessageKind::AiSpeakingStart => "ai_speaking_start",
            MessageKind::AiSpeakingEnd => "ai_speaking_end",
            MessageKind::InterviewStarted => "interview_started",
            MessageKind::InterviewComplete => "interview_complete",
            MessageKind::EndInterview => "end_interview",
        }
    }

    /// Look up a kind by its wire tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
