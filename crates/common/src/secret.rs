//! Secret types for credentials that must never reach the logs.
//!
//! Room access tokens handed out by the Token Service and the optional API
//! bearer token are wrapped in [`SecretString`]. Its `Debug` output is
//! redacted, so structs holding credentials can derive `Debug` and be passed
//! to `tracing` fields without leaking the value.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct RoomGrant {
//!     room: String,
//!     token: SecretString,
//! }
//!
//! let grant = RoomGrant {
//!     room: "interview-42".to_string(),
//!     token: SecretString::from("eyJhbGciOi..."),
//! };
//!
//! assert!(!format!("{grant:?}").contains("eyJhbGciOi"));
//! assert_eq!(grant.token.expose_secret(), "eyJhbGciOi...");
//! ```
//!
//! The value is only reachable through an explicit `expose_secret()` call,
//! which keeps every place that hands the token to a transport greppable.

pub use secrecy::{ExposeSecret, SecretString};
