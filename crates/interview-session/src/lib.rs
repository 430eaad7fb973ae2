//! Interview Session Controller
//!
//! Joins a live audio room with an AI interviewer, exchanges the control
//! message protocol over the room's data channel, tracks connection, mute
//! and speaking state, and tears the session down through an ordered,
//! best-effort termination sequence.
//!
//! # Architecture
//!
//! ```text
//! InterviewSessionHandle (cloneable, used by the shell)
//!   │ commands (mpsc) + state snapshots (watch)
//!   ▼
//! InterviewSessionActor (one per interview attempt)
//!   ├── owns SessionState and the host callback
//!   ├── MediaRoom (connect, data channel, mute)
//!   ├── TokenService (eligibility, credentials)
//!   ├── TerminationAuthority (server-side force-end)
//!   └── SessionObserver (logs and metrics)
//! ```
//!
//! # Modules
//!
//! - [`config`] - configuration from environment
//! - [`errors`] - error types and failure screens
//! - [`room`] - media room abstraction
//! - [`services`] - backend collaborators and their HTTP client
//! - [`session`] - session actor, state machine and termination
//! - [`view`] - screen model for the presentation shell
//! - [`observability`] - metrics and tracing setup

pub mod config;
pub mod errors;
pub mod observability;
pub mod room;
pub mod services;
pub mod session;
pub mod view;

pub use config::Config;
pub use errors::{FailureScreen, InterviewError, PreJoinFailure};
pub use session::{InterviewSessionActor, InterviewSessionHandle, SessionDeps};
