//! Media room abstraction.
//!
//! The real-time media SDK is an external collaborator. The controller only
//! needs connect/disconnect, a listener registration for room events, a
//! reliable data channel and mute control over the local audio track.

use bytes::Bytes;
use common::secret::SecretString;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Identifier for a registered room event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Identifier for a published track.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackSid(pub String);

impl fmt::Display for TrackSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Data channel delivery mode.
///
/// Control messages need ordered, retransmitted delivery; it is the only
/// mode this client publishes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reliability {
    Reliable,
}

/// Event emitted by the media room to registered listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// Local participant joined the room.
    Joined,
    /// Room connection closed (remote hangup, server close, local disconnect).
    Left { reason: Option<String> },
    /// Transport error after join.
    Error { message: String },
    /// Data channel payload from a remote participant.
    DataReceived {
        payload: Bytes,
        participant: Option<String>,
    },
}

/// Media room error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Mute operation failed: {0}")]
    Mute(String),

    #[error("Not connected")]
    NotConnected,
}

/// Media room interface.
///
/// Implementations wrap a real-time media SDK. All methods take `&self`;
/// implementations use interior mutability as needed.
#[async_trait::async_trait]
pub trait MediaRoom: Send + Sync {
    /// Connect to the room at `endpoint` with the given access token.
    async fn connect(&self, endpoint: &str, token: &SecretString) -> Result<(), RoomError>;

    /// Disconnect from the room. Must be idempotent.
    async fn disconnect(&self);

    /// Register an event listener.
    fn subscribe(&self) -> (ListenerId, mpsc::UnboundedReceiver<RoomEvent>);

    /// Remove an event listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: ListenerId);

    /// Send a payload on the data channel.
    async fn publish_data(&self, payload: Bytes, reliability: Reliability)
        -> Result<(), RoomError>;

    /// The local outgoing audio publication, if one exists.
    fn local_audio_publication(&self) -> Option<TrackSid>;

    /// Mute a local track.
    async fn mute(&self, track: &TrackSid) -> Result<(), RoomError>;

    /// Unmute a local track.
    async fn unmute(&self, track: &TrackSid) -> Result<(), RoomError>;
}

/// A listener registration that is removed from the room when dropped.
pub struct RoomSubscription {
    room: Arc<dyn MediaRoom>,
    id: ListenerId,
    events: mpsc::UnboundedReceiver<RoomEvent>,
}

impl RoomSubscription {
    /// Register a new listener on `room`.
    pub fn register(room: Arc<dyn MediaRoom>) -> Self {
        let (id, events) = room.subscribe();
        Self { room, id, events }
    }

    /// Listener id of this registration.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Receive the next room event. Returns `None` once the room drops the sender.
    pub async fn recv(&mut self) -> Option<RoomEvent> {
        self.events.recv().await
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        self.room.unsubscribe(self.id);
    }
}

impl fmt::Debug for RoomSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomSubscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
