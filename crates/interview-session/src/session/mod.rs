//! Interview session actor and its state.
//!
//! - `controller` - the session actor and its handle
//! - `state` - connection state machine and session flags
//! - `termination` - ordered termination steps
//! - `observer` - session events and the observer boundary
//! - `messages` - commands accepted by the actor

pub mod controller;
pub mod messages;
pub mod observer;
pub mod state;
pub mod termination;

pub use controller::{HostCallback, InterviewSessionActor, InterviewSessionHandle, SessionDeps};
pub use messages::{MuteOutcome, SessionCommand};
pub use observer::{SessionEvent, SessionObserver, TracingObserver};
pub use state::{
    ConnectionState, MessageEffect, SessionFlags, SessionSnapshot, SessionState,
    TransitionRejected,
};
pub use termination::{
    StepOutcome, TerminationOutcome, TerminationPhase, TerminationReport, TerminationStep,
    TerminationTrigger, TERMINATION_SEQUENCE,
};
