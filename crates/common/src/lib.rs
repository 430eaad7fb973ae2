//! Common utilities and types shared across the interview client crates.

#![warn(clippy::pedantic)]

/// Module for identifier types shared by the protocol and the controller
pub mod types;

/// Module for secret types that prevent accidental logging
pub mod secret;
