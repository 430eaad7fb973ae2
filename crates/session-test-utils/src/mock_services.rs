//! Scripted backend collaborators.

use common::secret::SecretString;
use common::types::{SessionId, SubjectId};
use interview_session::errors::PreJoinFailure;
use interview_session::services::{
    Eligibility, SessionCredentials, TerminationAuthority, TerminationError, TokenService,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Default room endpoint handed out by [`MockTokenService`].
pub const TEST_ROOM_ENDPOINT: &str = "wss://rooms.test.local";

/// Default room token handed out by [`MockTokenService`].
pub const TEST_ROOM_TOKEN: &str = "test-room-token";

/// Mock Token Service.
pub struct MockTokenService {
    eligibility: Result<Eligibility, PreJoinFailure>,
    acquire: Result<(Option<String>, Option<SessionId>), PreJoinFailure>,
    validate_calls: AtomicUsize,
    acquire_calls: AtomicUsize,
    subjects: Mutex<Vec<SubjectId>>,
}

impl MockTokenService {
    /// Eligible, returns credentials with an endpoint and the given session id.
    pub fn granting(session_id: Option<u64>) -> Arc<Self> {
        Self::builder().session_id(session_id).build()
    }

    pub fn builder() -> MockTokenServiceBuilder {
        MockTokenServiceBuilder::default()
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn acquire_calls(&self) -> usize {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    /// Subjects passed to `acquire_session`, in call order.
    pub fn subjects(&self) -> Vec<SubjectId> {
        self.subjects.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TokenService for MockTokenService {
    async fn validate_interview(&self, _subject: SubjectId) -> Result<Eligibility, PreJoinFailure> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        self.eligibility.clone()
    }

    async fn acquire_session(
        &self,
        subject: SubjectId,
    ) -> Result<SessionCredentials, PreJoinFailure> {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        self.subjects.lock().unwrap().push(subject);

        let (endpoint, session_id) = self.acquire.clone()?;
        Ok(SessionCredentials {
            token: SecretString::from(TEST_ROOM_TOKEN),
            endpoint,
            room_name: Some(format!("interview_{subject}")),
            session_id,
        })
    }
}

/// Builder for [`MockTokenService`].
pub struct MockTokenServiceBuilder {
    eligibility: Result<Eligibility, PreJoinFailure>,
    endpoint: Option<String>,
    session_id: Option<SessionId>,
    acquire_error: Option<PreJoinFailure>,
}

impl Default for MockTokenServiceBuilder {
    fn default() -> Self {
        Self {
            eligibility: Ok(Eligibility::allowed()),
            endpoint: Some(TEST_ROOM_ENDPOINT.to_string()),
            session_id: None,
            acquire_error: None,
        }
    }
}

impl MockTokenServiceBuilder {
    pub fn session_id(mut self, session_id: Option<u64>) -> Self {
        self.session_id = session_id.map(SessionId);
        self
    }

    /// Credentials carry no endpoint; the configured fallback applies.
    pub fn without_endpoint(mut self) -> Self {
        self.endpoint = None;
        self
    }

    /// Eligibility check answers "no".
    pub fn not_eligible(mut self, message: Option<&str>) -> Self {
        self.eligibility = Ok(Eligibility::denied(message.map(str::to_string)));
        self
    }

    /// Eligibility check fails.
    pub fn failing_validation(mut self, failure: PreJoinFailure) -> Self {
        self.eligibility = Err(failure);
        self
    }

    /// Credential acquisition fails.
    pub fn failing_acquire(mut self, failure: PreJoinFailure) -> Self {
        self.acquire_error = Some(failure);
        self
    }

    pub fn build(self) -> Arc<MockTokenService> {
        let acquire = match self.acquire_error {
            Some(failure) => Err(failure),
            None => Ok((self.endpoint, self.session_id)),
        };
        Arc::new(MockTokenService {
            eligibility: self.eligibility,
            acquire,
            validate_calls: AtomicUsize::new(0),
            acquire_calls: AtomicUsize::new(0),
            subjects: Mutex::new(Vec::new()),
        })
    }
}

/// Mock Termination Authority.
pub struct MockTerminationAuthority {
    fail: bool,
    delay: Option<Duration>,
    call_count: AtomicUsize,
    ended: Mutex<Vec<SessionId>>,
}

impl MockTerminationAuthority {
    /// Always succeeds.
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            delay: None,
            call_count: AtomicUsize::new(0),
            ended: Mutex::new(Vec::new()),
        })
    }

    /// Always rejects with status 500.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            delay: None,
            call_count: AtomicUsize::new(0),
            ended: Mutex::new(Vec::new()),
        })
    }

    /// Succeeds after `delay`.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            delay: Some(delay),
            call_count: AtomicUsize::new(0),
            ended: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Session ids passed to `force_end_session`, in call order.
    pub fn ended_sessions(&self) -> Vec<SessionId> {
        self.ended.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TerminationAuthority for MockTerminationAuthority {
    async fn force_end_session(&self, session_id: SessionId) -> Result<(), TerminationError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.ended.lock().unwrap().push(session_id);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            Err(TerminationError::Rejected(500))
        } else {
            Ok(())
        }
    }
}
