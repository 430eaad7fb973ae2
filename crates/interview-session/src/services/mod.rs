//! Backend service collaborators.
//!
//! # Components
//!
//! - `token_service` - eligibility check and session credential acquisition
//! - `termination` - server-side force-end of a session
//! - `api_client` - HTTP implementation of both against the interview backend

pub mod api_client;
pub mod termination;
pub mod token_service;

pub use api_client::HttpInterviewApi;
pub use termination::{TerminationAuthority, TerminationError};
pub use token_service::{Eligibility, SessionCredentials, TokenService};
