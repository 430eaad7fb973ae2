//! Control protocol for interview sessions.
//!
//! Messages travel over the reliable data channel of the media room as
//! UTF-8 JSON objects of the form `{ "type": <tag>, ...payload }`.
//!
//! - [`message`] - the tagged [`ControlMessage`] union and its [`MessageKind`]
//! - [`codec`] - defensive decoding and encoding to wire bytes

#![warn(clippy::pedantic)]

pub mod codec;
pub mod message;

pub use codec::{decode_message, encode_message, CodecError};
pub use message::{ControlMessage, MessageKind};
