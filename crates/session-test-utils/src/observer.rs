//! Observers and recorders for asserting on side effects.

use common::types::SubjectId;
use interview_session::session::{HostCallback, SessionEvent, SessionObserver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Default wait used by the helpers in this crate.
pub const TEST_WAIT: Duration = Duration::from_secs(2);

/// Observer that records every event.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(SubjectId, SessionEvent)>>,
    notify: Notify,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Recorded events, in emission order.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&SessionEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, event)| predicate(event))
            .count()
    }

    /// Wait until at least `n` recorded events match.
    pub async fn wait_for_count(&self, n: usize, predicate: impl Fn(&SessionEvent) -> bool) {
        let deadline = tokio::time::Instant::now() + TEST_WAIT;
        loop {
            let notified = self.notify.notified();
            if self.count(&predicate) >= n {
                return;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                panic!(
                    "timed out waiting for {n} matching events, recorded: {:#?}",
                    self.events()
                );
            }
        }
    }

    /// Wait until some recorded event matches.
    pub async fn wait_for(&self, predicate: impl Fn(&SessionEvent) -> bool) {
        self.wait_for_count(1, predicate).await;
    }
}

impl SessionObserver for RecordingObserver {
    fn on_event(&self, subject: SubjectId, event: &SessionEvent) {
        self.events.lock().unwrap().push((subject, event.clone()));
        self.notify.notify_waiters();
    }
}

/// Counts host callback invocations.
#[derive(Clone, Default)]
pub struct HostCallbackRecorder {
    calls: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl HostCallbackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that increments this recorder.
    pub fn callback(&self) -> HostCallback {
        let calls = Arc::clone(&self.calls);
        let notify = Arc::clone(&self.notify);
        Box::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            notify.notify_waiters();
        })
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wait until the callback has run at least once.
    pub async fn wait_called(&self) {
        let deadline = tokio::time::Instant::now() + TEST_WAIT;
        loop {
            let notified = self.notify.notified();
            if self.count() > 0 {
                return;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                panic!("timed out waiting for host callback");
            }
        }
    }
}
