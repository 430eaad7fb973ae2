//! # Session Test Utilities
//!
//! Mocks and fixtures for testing the interview session controller without
//! a real media SDK or backend.
//!
//! ## Modules
//!
//! - `mock_room` - in-memory `MediaRoom` with event injection
//! - `mock_services` - scripted `TokenService` and `TerminationAuthority`
//! - `observer` - `RecordingObserver` and `HostCallbackRecorder`
//! - `fixtures` - `TestSession` harness and common test data
//!
//! ## Usage
//!
//! ```rust,ignore
//! use session_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let session = TestSession::builder().session_id(Some(7)).start().await.unwrap();
//!     session.wait_for_connection(ConnectionState::Connected).await;
//!
//!     session.room.inject_json(serde_json::json!({"type": "interview_started"}));
//!     session.wait_until(|s| s.flags.interview_started).await;
//! }
//! ```

pub mod fixtures;
pub mod mock_room;
pub mod mock_services;
pub mod observer;

pub use fixtures::*;
pub use mock_room::*;
pub use mock_services::*;
pub use observer::*;
