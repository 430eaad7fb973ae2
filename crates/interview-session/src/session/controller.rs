//! `InterviewSessionActor` - owns one interview session.
//!
//! The actor owns the room, the session state and the host callback. It is
//! fed by two channels selected in one loop: user commands from
//! [`InterviewSessionHandle`] and events from the room listener. Each handler
//! runs to completion before the next one is dispatched, so no locks guard
//! the state.
//!
//! Calls that wait on the network (room connect, control message publishes,
//! the backend force-end) are kept as boxed futures on the actor and polled
//! as extra `select!` branches. Commands and room events are still served
//! while they are pending. Local room operations (mute, disconnect) run
//! inline.
//!
//! # Lifecycle
//!
//! 1. `start()` checks eligibility, acquires credentials and resolves the
//!    room endpoint. Failures here never touch the room.
//! 2. The actor registers its room listener, connects and waits for
//!    `Joined`, then sends `start_interview` once.
//! 3. The session ends through termination (user or `interview_complete`),
//!    a remote hangup, or a transport failure.
//! 4. Whatever the exit path, the listener is removed and the room is
//!    disconnected when the actor stops. Calls still in flight at that
//!    point are awaited first rather than dropped.

use super::messages::{MuteOutcome, SessionCommand};
use super::observer::{SessionEvent, SessionObserver};
use super::state::{ConnectionState, MessageEffect, SessionSnapshot, SessionState};
use super::termination::{
    should_force_end, StepOutcome, TerminationOutcome, TerminationPhase, TerminationReport,
    TerminationStep, TerminationTrigger, TERMINATION_SEQUENCE,
};
use crate::config::Config;
use crate::errors::{InterviewError, PreJoinFailure};
use crate::room::{MediaRoom, Reliability, RoomError, RoomEvent, RoomSubscription};
use crate::services::{SessionCredentials, TerminationAuthority, TerminationError, TokenService};

use common::types::SubjectId;
use control_protocol::{decode_message, encode_message, ControlMessage, MessageKind};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Channel buffer size for the session command mailbox.
const SESSION_CHANNEL_BUFFER: usize = 32;

/// Invoked once when the session ends through termination or hangup.
pub type HostCallback = Box<dyn FnOnce() + Send + 'static>;

/// Collaborators injected into a session.
#[derive(Clone)]
pub struct SessionDeps {
    pub token_service: Arc<dyn TokenService>,
    pub termination_authority: Arc<dyn TerminationAuthority>,
    pub room: Arc<dyn MediaRoom>,
    pub observer: Arc<dyn SessionObserver>,
}

/// Handle to an `InterviewSessionActor`.
#[derive(Clone)]
pub struct InterviewSessionHandle {
    sender: mpsc::Sender<SessionCommand>,
    cancel_token: CancellationToken,
    subject_id: SubjectId,
    state: watch::Receiver<SessionSnapshot>,
}

impl InterviewSessionHandle {
    /// Get the subject (resume) id.
    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    /// Flip the local microphone.
    ///
    /// # Errors
    ///
    /// - `InterviewError::Room` if the room rejected the mute call (state unchanged)
    /// - `InterviewError::SessionClosed` once the session is terminal or the actor is gone
    pub async fn toggle_mute(&self) -> Result<MuteOutcome, InterviewError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::ToggleMute { respond_to: tx })
            .await
            .map_err(|_| InterviewError::SessionClosed)?;

        rx.await.map_err(|_| InterviewError::SessionClosed)?
    }

    /// End the interview. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::SessionClosed` if the actor is gone.
    pub async fn end_interview(&self) -> Result<TerminationOutcome, InterviewError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::EndInterview { respond_to: tx })
            .await
            .map_err(|_| InterviewError::SessionClosed)?;

        rx.await.map_err(|_| InterviewError::SessionClosed)
    }

    /// Get the current state from the actor.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::SessionClosed` if the actor is gone.
    pub async fn get_state(&self) -> Result<SessionSnapshot, InterviewError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::GetState { respond_to: tx })
            .await
            .map_err(|_| InterviewError::SessionClosed)?;

        rx.await.map_err(|_| InterviewError::SessionClosed)
    }

    /// Watch channel of state snapshots, updated after every change.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Abandon the session. The room is still released.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// Room or backend call the actor is waiting on without blocking its loop.
type InFlight<T> = BoxFuture<'static, T>;

/// Result of a termination step that suspends.
enum PendingStep {
    ForceEnd(Result<(), TerminationError>),
    SignalEnd(Result<(), RoomError>),
}

/// Immediate or suspended result of starting a step.
enum StepStart {
    Done(StepOutcome),
    Pending(InFlight<PendingStep>),
}

/// Termination sequence in progress.
struct TerminationRun {
    trigger: TerminationTrigger,
    started: Instant,
    report: TerminationReport,
    /// Index into `TERMINATION_SEQUENCE` of the next step to start.
    next: usize,
    /// Caller of `end_interview`, if the user started the sequence.
    respond_to: Option<oneshot::Sender<TerminationOutcome>>,
}

/// The interview session actor.
pub struct InterviewSessionActor {
    subject_id: SubjectId,
    receiver: mpsc::Receiver<SessionCommand>,
    cancel_token: CancellationToken,
    room: Arc<dyn MediaRoom>,
    /// Listener registration, `None` once released.
    subscription: Option<RoomSubscription>,
    room_released: bool,
    termination_authority: Arc<dyn TerminationAuthority>,
    observer: Arc<dyn SessionObserver>,
    credentials: SessionCredentials,
    endpoint: String,
    force_end_on_complete: bool,
    state: SessionState,
    termination: TerminationPhase,
    termination_run: Option<TerminationRun>,
    start_sent: bool,
    connecting: Option<InFlight<Result<(), RoomError>>>,
    announcing: Option<InFlight<Result<(), RoomError>>>,
    step_in_flight: Option<InFlight<PendingStep>>,
    on_end: Option<HostCallback>,
    state_tx: watch::Sender<SessionSnapshot>,
}

impl InterviewSessionActor {
    /// Acquire credentials and spawn the session actor.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::PreJoin` when the subject cannot be
    /// interviewed, credentials cannot be acquired, or no room endpoint is
    /// known. The room is not touched in that case and `on_end` is dropped
    /// without being called.
    #[instrument(skip_all, name = "session.start", fields(subject_id = %subject_id))]
    pub async fn start(
        subject_id: SubjectId,
        config: &Config,
        deps: SessionDeps,
        on_end: HostCallback,
        cancel_token: CancellationToken,
    ) -> Result<(InterviewSessionHandle, JoinHandle<()>), InterviewError> {
        let (credentials, endpoint) = match Self::prepare(subject_id, config, &deps).await {
            Ok(prepared) => prepared,
            Err(failure) => {
                deps.observer.on_event(
                    subject_id,
                    &SessionEvent::PreJoinFailed {
                        failure: failure.clone(),
                    },
                );
                return Err(failure.into());
            }
        };

        deps.observer.on_event(
            subject_id,
            &SessionEvent::CredentialsAcquired {
                has_session_id: credentials.session_id.is_some(),
            },
        );

        Ok(Self::spawn(
            subject_id,
            credentials,
            endpoint,
            config.force_end_on_complete,
            deps,
            on_end,
            cancel_token,
        ))
    }

    async fn prepare(
        subject_id: SubjectId,
        config: &Config,
        deps: &SessionDeps,
    ) -> Result<(SessionCredentials, String), PreJoinFailure> {
        let eligibility = deps.token_service.validate_interview(subject_id).await?;
        if !eligibility.can_interview {
            return Err(PreJoinFailure::NotReady(eligibility.message));
        }

        let credentials = deps.token_service.acquire_session(subject_id).await?;

        let endpoint = credentials
            .endpoint
            .clone()
            .or_else(|| config.room_server_url.clone())
            .ok_or_else(|| PreJoinFailure::Unknown("no room endpoint configured".to_string()))?;

        Ok((credentials, endpoint))
    }

    /// Spawn the actor with already acquired credentials.
    #[must_use]
    pub fn spawn(
        subject_id: SubjectId,
        credentials: SessionCredentials,
        endpoint: String,
        force_end_on_complete: bool,
        deps: SessionDeps,
        on_end: HostCallback,
        cancel_token: CancellationToken,
    ) -> (InterviewSessionHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(SESSION_CHANNEL_BUFFER);
        let state = SessionState::new();
        let (state_tx, state_rx) = watch::channel(state.snapshot(TerminationPhase::NotStarted));

        let actor = Self {
            subject_id,
            receiver,
            cancel_token: cancel_token.clone(),
            room: deps.room,
            subscription: None,
            room_released: false,
            termination_authority: deps.termination_authority,
            observer: deps.observer,
            credentials,
            endpoint,
            force_end_on_complete,
            state,
            termination: TerminationPhase::NotStarted,
            termination_run: None,
            start_sent: false,
            connecting: None,
            announcing: None,
            step_in_flight: None,
            on_end: Some(on_end),
            state_tx,
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = InterviewSessionHandle {
            sender,
            cancel_token,
            subject_id,
            state: state_rx,
        };

        (handle, task_handle)
    }

    #[instrument(skip_all, name = "session.actor", fields(subject_id = %self.subject_id))]
    async fn run(mut self) {
        info!(
            target: "session.controller",
            subject_id = %self.subject_id,
            room_name = ?self.credentials.room_name,
            "InterviewSessionActor started"
        );

        // Listener and room are acquired together on entering `connecting`.
        self.subscription = Some(RoomSubscription::register(Arc::clone(&self.room)));
        self.publish();
        self.begin_connect();

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "session.controller",
                        subject_id = %self.subject_id,
                        "InterviewSessionActor received cancellation signal"
                    );
                    break;
                }

                command = self.receiver.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => {
                            debug!(
                                target: "session.controller",
                                subject_id = %self.subject_id,
                                "All session handles dropped, exiting"
                            );
                            break;
                        }
                    }
                }

                event = next_room_event(&mut self.subscription) => {
                    match event {
                        Some(event) => self.handle_room_event(event).await,
                        None => {
                            debug!(
                                target: "session.controller",
                                subject_id = %self.subject_id,
                                "Room event stream closed"
                            );
                            self.subscription = None;
                        }
                    }
                }

                result = next_completion(&mut self.connecting) => {
                    self.handle_connect_result(result).await;
                }

                result = next_completion(&mut self.announcing) => {
                    self.record_send(MessageKind::StartInterview, &result);
                    self.advance_termination().await;
                }

                result = next_completion(&mut self.step_in_flight) => {
                    self.finish_step(result);
                    self.advance_termination().await;
                }
            }
        }

        self.settle_in_flight().await;
        self.release_room().await;

        info!(
            target: "session.controller",
            subject_id = %self.subject_id,
            connection = %self.state.connection(),
            "InterviewSessionActor stopped"
        );
    }

    fn begin_connect(&mut self) {
        let room = Arc::clone(&self.room);
        let endpoint = self.endpoint.clone();
        let token = self.credentials.token.clone();
        self.connecting = Some(async move { room.connect(&endpoint, &token).await }.boxed());
    }

    async fn handle_connect_result(&mut self, result: Result<(), RoomError>) {
        match result {
            Ok(()) if self.room_released => {
                // Ended while connecting; the late connection is closed again.
                debug!(
                    target: "session.controller",
                    subject_id = %self.subject_id,
                    "Room connected after release, disconnecting"
                );
                self.room.disconnect().await;
            }
            Ok(()) => {
                debug!(
                    target: "session.controller",
                    subject_id = %self.subject_id,
                    "Room connect returned"
                );
            }
            Err(e) if self.room_released => {
                debug!(
                    target: "session.controller",
                    subject_id = %self.subject_id,
                    error = %e,
                    "Room connect failed after release"
                );
            }
            Err(e) => self.fail(e.to_string()).await,
        }
    }

    /// Wait out calls that were in flight when the loop stopped.
    async fn settle_in_flight(&mut self) {
        if let Some(connecting) = self.connecting.take() {
            let result = connecting.await;
            self.handle_connect_result(result).await;
        }
        if let Some(announcing) = self.announcing.take() {
            let result = announcing.await;
            self.record_send(MessageKind::StartInterview, &result);
        }
        if let Some(step) = self.step_in_flight.take() {
            let result = step.await;
            self.finish_step(result);
        }
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::ToggleMute { respond_to } => {
                let result = self.toggle_mute().await;
                let _ = respond_to.send(result);
            }
            SessionCommand::EndInterview { respond_to } => {
                self.terminate(TerminationTrigger::UserRequested, Some(respond_to))
                    .await;
            }
            SessionCommand::GetState { respond_to } => {
                let _ = respond_to.send(self.state.snapshot(self.termination));
            }
        }
    }

    async fn handle_room_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::Joined => {
                if self.transition(ConnectionState::Connected) {
                    self.send_start_interview();
                }
            }
            RoomEvent::Left { reason } => self.handle_left(reason).await,
            RoomEvent::Error { message } => self.fail(message).await,
            RoomEvent::DataReceived { payload, .. } => self.handle_data(&payload).await,
        }
    }

    /// Remote hangup or server close.
    async fn handle_left(&mut self, reason: Option<String>) {
        // Our own disconnect during termination, or the room closing after a failure.
        if self.termination != TerminationPhase::NotStarted || self.state.connection().is_terminal()
        {
            debug!(
                target: "session.controller",
                subject_id = %self.subject_id,
                reason = ?reason,
                "Ignoring room close"
            );
            return;
        }

        info!(
            target: "session.controller",
            subject_id = %self.subject_id,
            reason = ?reason,
            "Room closed by remote"
        );

        self.termination = TerminationPhase::Completed;
        self.transition(ConnectionState::Disconnected);
        self.release_room().await;
        self.notify_host();
    }

    async fn handle_data(&mut self, payload: &[u8]) {
        if self.state.connection().is_terminal() {
            debug!(
                target: "session.protocol",
                subject_id = %self.subject_id,
                "Dropping control message received after session end"
            );
            return;
        }

        let message = match decode_message(payload) {
            Ok(message) => message,
            Err(e) => {
                let event = match e.unrecognized_tag() {
                    Some(tag) => SessionEvent::UnrecognizedMessage {
                        tag: tag.to_string(),
                    },
                    None => SessionEvent::MalformedMessage {
                        error: e.to_string(),
                    },
                };
                self.emit(&event);
                return;
            }
        };

        let effect = self.state.apply_message(&message);
        self.emit(&SessionEvent::MessageReceived {
            kind: message.kind(),
            effect,
        });

        match effect {
            MessageEffect::Applied => self.publish(),
            MessageEffect::Ignored => {}
            MessageEffect::TerminationRequested => {
                self.terminate(TerminationTrigger::InterviewComplete, None)
                    .await;
            }
        }
    }

    async fn toggle_mute(&mut self) -> Result<MuteOutcome, InterviewError> {
        if self.state.connection().is_terminal() {
            return Err(InterviewError::SessionClosed);
        }

        let Some(track) = self.room.local_audio_publication() else {
            self.emit(&SessionEvent::MuteToggled {
                outcome: MuteOutcome::NoAudioTrack,
            });
            return Ok(MuteOutcome::NoAudioTrack);
        };

        let currently_muted = self.state.flags().is_muted;
        let result = if currently_muted {
            self.room.unmute(&track).await
        } else {
            self.room.mute(&track).await
        };

        match result {
            Ok(()) => {
                self.state.set_muted(!currently_muted);
                self.publish();
                let outcome = if currently_muted {
                    MuteOutcome::Unmuted
                } else {
                    MuteOutcome::Muted
                };
                self.emit(&SessionEvent::MuteToggled { outcome });
                Ok(outcome)
            }
            Err(e) => {
                self.emit(&SessionEvent::MuteFailed {
                    error: e.to_string(),
                });
                Err(InterviewError::Room(e))
            }
        }
    }

    /// Start the termination sequence once per session.
    ///
    /// Steps that wait on the network are polled by the actor loop, so
    /// commands and room events keep being served until the sequence ends.
    async fn terminate(
        &mut self,
        trigger: TerminationTrigger,
        respond_to: Option<oneshot::Sender<TerminationOutcome>>,
    ) {
        if self.termination != TerminationPhase::NotStarted {
            self.emit(&SessionEvent::TerminationIgnored { trigger });
            if let Some(respond_to) = respond_to {
                let _ = respond_to.send(TerminationOutcome::AlreadyTerminated);
            }
            return;
        }

        self.termination = TerminationPhase::InProgress;
        self.publish();
        self.emit(&SessionEvent::TerminationStarted { trigger });

        self.termination_run = Some(TerminationRun {
            trigger,
            started: Instant::now(),
            report: TerminationReport::new(trigger),
            next: 0,
            respond_to,
        });
        self.advance_termination().await;
    }

    /// Run steps until one suspends or the sequence is done.
    async fn advance_termination(&mut self) {
        while self.step_in_flight.is_none() {
            let Some(run) = self.termination_run.as_ref() else {
                return;
            };
            let trigger = run.trigger;
            let Some(&step) = TERMINATION_SEQUENCE.get(run.next) else {
                self.finish_termination();
                return;
            };

            // `end_interview` must not overtake `start_interview`.
            if step == TerminationStep::SignalEnd && self.announcing.is_some() {
                return;
            }

            match self.start_step(step, trigger).await {
                StepStart::Done(outcome) => self.record_step(step, outcome),
                StepStart::Pending(future) => self.step_in_flight = Some(future),
            }
        }
    }

    async fn start_step(&mut self, step: TerminationStep, trigger: TerminationTrigger) -> StepStart {
        match step {
            TerminationStep::ForceEnd => {
                match should_force_end(
                    trigger,
                    self.credentials.session_id,
                    self.force_end_on_complete,
                ) {
                    Err(reason) => StepStart::Done(StepOutcome::Skipped(reason)),
                    Ok(session_id) => {
                        let authority = Arc::clone(&self.termination_authority);
                        StepStart::Pending(
                            async move {
                                PendingStep::ForceEnd(authority.force_end_session(session_id).await)
                            }
                            .boxed(),
                        )
                    }
                }
            }
            TerminationStep::SignalEnd => {
                if self.room_released {
                    return StepStart::Done(StepOutcome::Skipped("room already released"));
                }
                let send = self.send_control(&ControlMessage::EndInterview {
                    resume_id: self.subject_id,
                });
                StepStart::Pending(async move { PendingStep::SignalEnd(send.await) }.boxed())
            }
            TerminationStep::MarkDisconnected => {
                StepStart::Done(if self.transition(ConnectionState::Disconnected) {
                    StepOutcome::Completed
                } else {
                    StepOutcome::Skipped("connection already terminal")
                })
            }
            TerminationStep::DisconnectRoom => {
                StepStart::Done(if self.release_room().await {
                    StepOutcome::Completed
                } else {
                    StepOutcome::Skipped("room already released")
                })
            }
            TerminationStep::NotifyHost => StepStart::Done(if self.notify_host() {
                StepOutcome::Completed
            } else {
                StepOutcome::Skipped("host already notified")
            }),
        }
    }

    /// Record the result of a suspended step.
    fn finish_step(&mut self, result: PendingStep) {
        let (step, result) = match result {
            PendingStep::ForceEnd(result) => {
                (TerminationStep::ForceEnd, result.map_err(|e| e.to_string()))
            }
            PendingStep::SignalEnd(result) => {
                self.record_send(MessageKind::EndInterview, &result);
                (TerminationStep::SignalEnd, result.map_err(|e| e.to_string()))
            }
        };
        let outcome = match result {
            Ok(()) => StepOutcome::Completed,
            Err(e) => StepOutcome::Failed(e),
        };
        self.record_step(step, outcome);
    }

    fn record_step(&mut self, step: TerminationStep, outcome: StepOutcome) {
        self.emit(&SessionEvent::TerminationStep {
            step,
            outcome: outcome.clone(),
        });
        if let Some(run) = self.termination_run.as_mut() {
            run.report.steps.push((step, outcome));
            run.next += 1;
        }
    }

    fn finish_termination(&mut self) {
        let Some(run) = self.termination_run.take() else {
            return;
        };

        self.termination = TerminationPhase::Completed;
        self.publish();
        self.emit(&SessionEvent::TerminationCompleted {
            trigger: run.trigger,
            had_failures: run.report.has_failures(),
            duration: run.started.elapsed(),
        });

        if let Some(respond_to) = run.respond_to {
            let _ = respond_to.send(TerminationOutcome::Completed(run.report));
        }
    }

    fn send_start_interview(&mut self) {
        if self.start_sent {
            return;
        }
        // Set before sending: a failed send is not retried.
        self.start_sent = true;

        let send = self.send_control(&ControlMessage::StartInterview {
            resume_id: self.subject_id,
        });
        self.announcing = Some(send);
    }

    /// Encode `message` and return the pending publish.
    fn send_control(&self, message: &ControlMessage) -> InFlight<Result<(), RoomError>> {
        let room = Arc::clone(&self.room);
        let payload = encode_message(message);
        async move {
            let payload = payload.map_err(|e| RoomError::Publish(e.to_string()))?;
            room.publish_data(payload, Reliability::Reliable).await
        }
        .boxed()
    }

    fn record_send(&self, kind: MessageKind, result: &Result<(), RoomError>) {
        match result {
            Ok(()) => self.emit(&SessionEvent::MessageSent { kind }),
            Err(e) => self.emit(&SessionEvent::MessageSendFailed {
                kind,
                error: e.to_string(),
            }),
        }
    }

    /// Move to `Failed` on a transport error, then release the room.
    async fn fail(&mut self, message: String) {
        self.emit(&SessionEvent::TransportError {
            message: message.clone(),
        });

        let from = self.state.connection();
        match self.state.fail(message) {
            Ok(_) => {
                self.emit(&SessionEvent::ConnectionStateChanged {
                    from,
                    to: ConnectionState::Failed,
                });
                self.publish();
                self.release_room().await;
            }
            Err(rejected) => self.emit(&SessionEvent::TransitionRejected {
                from: rejected.from,
                to: rejected.to,
            }),
        }
    }

    /// Returns true if the state moved.
    fn transition(&mut self, to: ConnectionState) -> bool {
        match self.state.transition(to) {
            Ok(from) => {
                self.emit(&SessionEvent::ConnectionStateChanged { from, to });
                self.publish();
                true
            }
            Err(rejected) => {
                self.emit(&SessionEvent::TransitionRejected {
                    from: rejected.from,
                    to: rejected.to,
                });
                false
            }
        }
    }

    /// Drop the listener and disconnect. Returns false if already released.
    async fn release_room(&mut self) -> bool {
        if self.room_released {
            return false;
        }
        self.room_released = true;
        self.subscription = None;
        self.room.disconnect().await;
        self.emit(&SessionEvent::Released);
        true
    }

    /// Invoke the host callback. Returns false if it already ran.
    fn notify_host(&mut self) -> bool {
        match self.on_end.take() {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    fn publish(&self) {
        let _previous = self
            .state_tx
            .send_replace(self.state.snapshot(self.termination));
    }

    fn emit(&self, event: &SessionEvent) {
        self.observer.on_event(self.subject_id, event);
    }
}

/// Next event from the listener, or never if there is none.
async fn next_room_event(subscription: &mut Option<RoomSubscription>) -> Option<RoomEvent> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

/// Output of the call in `slot`, or never if the slot is empty.
///
/// The future stays in the slot until it completes, so losing a `select!`
/// race does not cancel it.
async fn next_completion<T>(slot: &mut Option<InFlight<T>>) -> T {
    let output = match slot.as_mut() {
        Some(future) => future.await,
        None => std::future::pending().await,
    };
    *slot = None;
    output
}
