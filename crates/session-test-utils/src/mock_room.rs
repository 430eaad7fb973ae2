//! In-memory media room.
//!
//! Records every call, lets tests inject room events and exposes the data
//! messages the controller published.

use crate::observer::TEST_WAIT;
use bytes::Bytes;
use common::secret::SecretString;
use interview_session::room::{
    ListenerId, MediaRoom, Reliability, RoomError, RoomEvent, TrackSid,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Default local audio track id.
pub const TEST_AUDIO_TRACK: &str = "TR_local_audio";

#[derive(Default)]
struct RoomInner {
    listeners: HashMap<ListenerId, mpsc::UnboundedSender<RoomEvent>>,
    next_listener: u64,
    connected: bool,
    published: Vec<(Bytes, Reliability)>,
    last_endpoint: Option<String>,
}

/// Mock media room.
pub struct MockMediaRoom {
    inner: Mutex<RoomInner>,
    audio_track: Option<TrackSid>,
    connect_error: Option<String>,
    connect_delay: Option<Duration>,
    auto_join: bool,
    publish_fails: AtomicBool,
    mute_fails: AtomicBool,

    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
    unsubscribe_calls: AtomicUsize,
    mute_calls: AtomicUsize,
    unmute_calls: AtomicUsize,
}

impl MockMediaRoom {
    /// Room that joins on connect and has a local audio track.
    pub fn new() -> Arc<Self> {
        Self::builder().build()
    }

    pub fn builder() -> MockMediaRoomBuilder {
        MockMediaRoomBuilder::default()
    }

    /// Deliver an event to every registered listener.
    pub fn emit(&self, event: RoomEvent) {
        let inner = self.inner.lock().unwrap();
        for sender in inner.listeners.values() {
            let _ = sender.send(event.clone());
        }
    }

    /// Deliver raw data channel bytes.
    pub fn inject_raw(&self, payload: impl Into<Bytes>) {
        self.emit(RoomEvent::DataReceived {
            payload: payload.into(),
            participant: Some("agent".to_string()),
        });
    }

    /// Deliver a JSON control message.
    pub fn inject_json(&self, value: serde_json::Value) {
        self.inject_raw(serde_json::to_vec(&value).unwrap());
    }

    /// Simulate a remote hangup.
    pub fn remote_hangup(&self) {
        self.inner.lock().unwrap().connected = false;
        self.emit(RoomEvent::Left {
            reason: Some("remote hangup".to_string()),
        });
    }

    /// Simulate a transport error.
    pub fn transport_error(&self, message: &str) {
        self.emit(RoomEvent::Error {
            message: message.to_string(),
        });
    }

    pub fn set_publish_fails(&self, fails: bool) {
        self.publish_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_mute_fails(&self, fails: bool) {
        self.mute_fails.store(fails, Ordering::SeqCst);
    }

    /// Published payloads decoded as JSON, in publish order.
    pub fn published_json(&self) -> Vec<serde_json::Value> {
        self.inner
            .lock()
            .unwrap()
            .published
            .iter()
            .map(|(payload, _)| serde_json::from_slice(payload).unwrap())
            .collect()
    }

    /// `type` tags of published messages, in publish order.
    pub fn published_types(&self) -> Vec<String> {
        self.published_json()
            .iter()
            .map(|value| value["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// Number of published messages with the given `type`.
    pub fn published_count(&self, message_type: &str) -> usize {
        self.published_types()
            .iter()
            .filter(|t| t.as_str() == message_type)
            .count()
    }

    /// True if every publish used reliable delivery.
    pub fn all_published_reliable(&self) -> bool {
        self.inner
            .lock()
            .unwrap()
            .published
            .iter()
            .all(|(_, reliability)| *reliability == Reliability::Reliable)
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }

    pub fn last_endpoint(&self) -> Option<String> {
        self.inner.lock().unwrap().last_endpoint.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().unwrap().listeners.len()
    }

    /// Wait until `n` listeners are registered.
    pub async fn wait_for_listeners(&self, n: usize) {
        let deadline = tokio::time::Instant::now() + TEST_WAIT;
        while self.listener_count() < n {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {n} room listeners"
            );
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Wait until `disconnect` has been called `n` times.
    pub async fn wait_for_disconnects(&self, n: usize) {
        let deadline = tokio::time::Instant::now() + TEST_WAIT;
        while self.disconnect_calls() < n {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {n} room disconnects"
            );
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }

    pub fn mute_calls(&self) -> usize {
        self.mute_calls.load(Ordering::SeqCst)
    }

    pub fn unmute_calls(&self) -> usize {
        self.unmute_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MediaRoom for MockMediaRoom {
    async fn connect(&self, endpoint: &str, _token: &SecretString) -> Result<(), RoomError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.lock().unwrap().last_endpoint = Some(endpoint.to_string());

        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.connect_error {
            return Err(RoomError::Connect(message.clone()));
        }

        self.inner.lock().unwrap().connected = true;
        if self.auto_join {
            self.emit(RoomEvent::Joined);
        }
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        let was_connected = {
            let mut inner = self.inner.lock().unwrap();
            std::mem::replace(&mut inner.connected, false)
        };
        if was_connected {
            self.emit(RoomEvent::Left {
                reason: Some("client disconnect".to_string()),
            });
        }
    }

    fn subscribe(&self) -> (ListenerId, mpsc::UnboundedReceiver<RoomEvent>) {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.insert(id, tx);
        (id, rx)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.lock().unwrap().listeners.remove(&id);
    }

    async fn publish_data(
        &self,
        payload: Bytes,
        reliability: Reliability,
    ) -> Result<(), RoomError> {
        if self.publish_fails.load(Ordering::SeqCst) {
            return Err(RoomError::Publish("mock publish rejected".to_string()));
        }
        let mut inner = self.inner.lock().unwrap();
        if !inner.connected {
            return Err(RoomError::NotConnected);
        }
        inner.published.push((payload, reliability));
        Ok(())
    }

    fn local_audio_publication(&self) -> Option<TrackSid> {
        self.audio_track.clone()
    }

    async fn mute(&self, _track: &TrackSid) -> Result<(), RoomError> {
        self.mute_calls.fetch_add(1, Ordering::SeqCst);
        if self.mute_fails.load(Ordering::SeqCst) {
            return Err(RoomError::Mute("mock mute rejected".to_string()));
        }
        Ok(())
    }

    async fn unmute(&self, _track: &TrackSid) -> Result<(), RoomError> {
        self.unmute_calls.fetch_add(1, Ordering::SeqCst);
        if self.mute_fails.load(Ordering::SeqCst) {
            return Err(RoomError::Mute("mock unmute rejected".to_string()));
        }
        Ok(())
    }
}

/// Builder for [`MockMediaRoom`].
pub struct MockMediaRoomBuilder {
    audio_track: Option<TrackSid>,
    connect_error: Option<String>,
    connect_delay: Option<Duration>,
    auto_join: bool,
    publish_fails: bool,
    mute_fails: bool,
}

impl Default for MockMediaRoomBuilder {
    fn default() -> Self {
        Self {
            audio_track: Some(TrackSid(TEST_AUDIO_TRACK.to_string())),
            connect_error: None,
            connect_delay: None,
            auto_join: true,
            publish_fails: false,
            mute_fails: false,
        }
    }
}

impl MockMediaRoomBuilder {
    /// No local audio publication.
    pub fn without_audio_track(mut self) -> Self {
        self.audio_track = None;
        self
    }

    /// `connect` fails with the given message.
    pub fn failing_connect(mut self, message: &str) -> Self {
        self.connect_error = Some(message.to_string());
        self
    }

    /// `connect` takes `delay` before it resolves.
    pub fn slow_connect(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// `connect` succeeds but `Joined` must be emitted by the test.
    pub fn manual_join(mut self) -> Self {
        self.auto_join = false;
        self
    }

    pub fn failing_publish(mut self) -> Self {
        self.publish_fails = true;
        self
    }

    pub fn failing_mute(mut self) -> Self {
        self.mute_fails = true;
        self
    }

    pub fn build(self) -> Arc<MockMediaRoom> {
        Arc::new(MockMediaRoom {
            inner: Mutex::new(RoomInner::default()),
            audio_track: self.audio_track,
            connect_error: self.connect_error,
            connect_delay: self.connect_delay,
            auto_join: self.auto_join,
            publish_fails: AtomicBool::new(self.publish_fails),
            mute_fails: AtomicBool::new(self.mute_fails),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            subscribe_calls: AtomicUsize::new(0),
            unsubscribe_calls: AtomicUsize::new(0),
            mute_calls: AtomicUsize::new(0),
            unmute_calls: AtomicUsize::new(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_emits_joined() {
        let room = MockMediaRoom::new();
        let (_id, mut rx) = room.subscribe();

        room.connect("wss://rooms.test", &SecretString::from("t"))
            .await
            .unwrap();

        assert_eq!(rx.recv().await, Some(RoomEvent::Joined));
        assert!(room.is_connected());
        assert_eq!(room.last_endpoint().as_deref(), Some("wss://rooms.test"));
    }

    #[tokio::test]
    async fn test_unsubscribed_listener_gets_nothing() {
        let room = MockMediaRoom::new();
        let (id, mut rx) = room.subscribe();
        room.unsubscribe(id);

        room.remote_hangup();
        assert_eq!(rx.recv().await, None);
        assert_eq!(room.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_requires_connection() {
        let room = MockMediaRoom::new();
        let err = room
            .publish_data(Bytes::from_static(b"{}"), Reliability::Reliable)
            .await
            .unwrap_err();
        assert_eq!(err, RoomError::NotConnected);
    }
}
