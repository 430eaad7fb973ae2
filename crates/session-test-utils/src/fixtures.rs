//! Test session harness and common test data.

use crate::mock_room::MockMediaRoom;
use crate::mock_services::{MockTerminationAuthority, MockTokenService};
use crate::observer::{HostCallbackRecorder, RecordingObserver, TEST_WAIT};
use common::types::SubjectId;
use interview_session::errors::InterviewError;
use interview_session::session::{ConnectionState, SessionDeps, SessionSnapshot};
use interview_session::{Config, InterviewSessionActor, InterviewSessionHandle};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Subject id used by default.
pub const TEST_SUBJECT: SubjectId = SubjectId(42);

/// Configuration with defaults and no fallback room endpoint.
pub fn test_config() -> Config {
    Config::default()
}

/// A started session plus every mock behind it.
pub struct TestSession {
    pub handle: InterviewSessionHandle,
    pub task: JoinHandle<()>,
    pub room: Arc<MockMediaRoom>,
    pub tokens: Arc<MockTokenService>,
    pub authority: Arc<MockTerminationAuthority>,
    pub observer: Arc<RecordingObserver>,
    pub host: HostCallbackRecorder,
}

impl TestSession {
    pub fn builder() -> TestSessionBuilder {
        TestSessionBuilder::default()
    }

    /// Wait until the published snapshot satisfies `predicate`.
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        let mut rx = self.handle.subscribe_state();
        let snapshot = tokio::time::timeout(TEST_WAIT, rx.wait_for(predicate))
            .await
            .expect("timed out waiting for session state")
            .expect("session state channel closed");
        snapshot.clone()
    }

    /// Wait until the connection reaches `state`.
    pub async fn wait_for_connection(&self, state: ConnectionState) -> SessionSnapshot {
        self.wait_until(|snapshot| snapshot.connection == state).await
    }

    /// Drop the handle and wait for the actor to stop.
    pub async fn shutdown(self) {
        let TestSession { handle, task, .. } = self;
        drop(handle);
        tokio::time::timeout(TEST_WAIT, task)
            .await
            .expect("actor did not stop")
            .expect("actor panicked");
    }
}

/// Builder for [`TestSession`].
pub struct TestSessionBuilder {
    subject: SubjectId,
    config: Config,
    room: Option<Arc<MockMediaRoom>>,
    tokens: Option<Arc<MockTokenService>>,
    authority: Option<Arc<MockTerminationAuthority>>,
    session_id: Option<u64>,
}

impl Default for TestSessionBuilder {
    fn default() -> Self {
        Self {
            subject: TEST_SUBJECT,
            config: test_config(),
            room: None,
            tokens: None,
            authority: None,
            session_id: Some(1001),
        }
    }
}

impl TestSessionBuilder {
    pub fn subject(mut self, subject: SubjectId) -> Self {
        self.subject = subject;
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Server session id returned with the default token service.
    pub fn session_id(mut self, session_id: Option<u64>) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn room(mut self, room: Arc<MockMediaRoom>) -> Self {
        self.room = Some(room);
        self
    }

    pub fn tokens(mut self, tokens: Arc<MockTokenService>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn authority(mut self, authority: Arc<MockTerminationAuthority>) -> Self {
        self.authority = Some(authority);
        self
    }

    /// Start the session. On a pre-join failure the mocks are returned too.
    pub async fn start(self) -> Result<TestSession, (InterviewError, TestMocks)> {
        let room = self.room.unwrap_or_else(MockMediaRoom::new);
        let tokens = self
            .tokens
            .unwrap_or_else(|| MockTokenService::granting(self.session_id));
        let authority = self
            .authority
            .unwrap_or_else(MockTerminationAuthority::accepting);
        let observer = RecordingObserver::new();
        let host = HostCallbackRecorder::new();

        let deps = SessionDeps {
            token_service: tokens.clone(),
            termination_authority: authority.clone(),
            room: room.clone(),
            observer: observer.clone(),
        };

        match InterviewSessionActor::start(
            self.subject,
            &self.config,
            deps,
            host.callback(),
            CancellationToken::new(),
        )
        .await
        {
            Ok((handle, task)) => Ok(TestSession {
                handle,
                task,
                room,
                tokens,
                authority,
                observer,
                host,
            }),
            Err(e) => Err((
                e,
                TestMocks {
                    room,
                    tokens,
                    authority,
                    observer,
                    host,
                },
            )),
        }
    }
}

/// Mocks of a session that failed to start.
pub struct TestMocks {
    pub room: Arc<MockMediaRoom>,
    pub tokens: Arc<MockTokenService>,
    pub authority: Arc<MockTerminationAuthority>,
    pub observer: Arc<RecordingObserver>,
    pub host: HostCallbackRecorder,
}

impl std::fmt::Debug for TestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSession")
            .field("subject", &self.handle.subject_id())
            .field("snapshot", &self.handle.snapshot())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for TestMocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestMocks")
            .field("events", &self.observer.events())
            .finish_non_exhaustive()
    }
}
