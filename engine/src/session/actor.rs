use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::Instrument;

use super::commands::{SessionCommand, SessionError};
use super::events::{EngineEvent, UciDirection};
use super::state::SessionState;
use super::SessionConfig;
use crate::correlator::{Correlation, MoveCorrelator};
use crate::search::SearchParameters;
use crate::transport::{ChannelEvent, SubscriptionToken, Transport};
use crate::uci::UciCommand;
use crate::AnalysisRequest;

/// Owns the transport and everything that must agree with it: the state, the
/// output subscription and the correlator.
pub(crate) struct SessionActor<T: Transport> {
    transport: T,
    config: SessionConfig,
    state: SessionState,
    subscription: Option<SubscriptionToken>,
    output_rx: Option<mpsc::Receiver<ChannelEvent>>,
    correlator: MoveCorrelator,
    deadline: Option<Instant>,
    event_tx: mpsc::Sender<EngineEvent>,
}

/// The main session actor loop.
/// Processes commands, engine output and the analysis deadline sequentially.
pub(crate) async fn run_session_actor<T: Transport>(
    actor: SessionActor<T>,
    cmd_rx: mpsc::Receiver<SessionCommand>,
) {
    run_session_actor_inner(actor, cmd_rx)
        .instrument(tracing::info_span!("engine_session"))
        .await;
}

async fn run_session_actor_inner<T: Transport>(
    mut actor: SessionActor<T>,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
) {
    tracing::info!("Engine session started");

    loop {
        let deadline = actor.deadline;
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Shutdown) | None => {
                        tracing::info!("Engine session shutting down");
                        actor.stop().await;
                        break;
                    }
                    Some(cmd) => actor.handle_command(cmd).await,
                }
            }

            event = actor.next_output() => {
                actor.handle_output(event).await;
            }

            _ = deadline_elapsed(deadline) => {
                actor.handle_deadline().await;
            }
        }
    }

    tracing::info!("Engine session exited");
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl<T: Transport> SessionActor<T> {
    pub(crate) fn new(
        transport: T,
        config: SessionConfig,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            transport,
            config,
            state: SessionState::Uninitialized,
            subscription: None,
            output_rx: None,
            correlator: MoveCorrelator::new(),
            deadline: None,
            event_tx,
        }
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Start { reply } => {
                let result = self.start().await;
                let _ = reply.send(result);
            }
            SessionCommand::Analyze { request, reply } => {
                let result = self.analyze(request).await;
                let _ = reply.send(result);
            }
            SessionCommand::Stop { reply } => {
                self.stop().await;
                let _ = reply.send(());
            }
            SessionCommand::GetState { reply } => {
                let _ = reply.send(self.state);
            }
            // Intercepted by the actor loop.
            SessionCommand::Shutdown => {}
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            tracing::debug!("Session state {} -> {}", self.state, state);
            self.state = state;
        }
    }

    async fn start(&mut self) -> Result<(), SessionError> {
        if !self.state.needs_launch() {
            tracing::debug!("Engine already started ({}), skipping handshake", self.state);
            return Ok(());
        }

        self.set_state(SessionState::Starting);
        if let Err(e) = self.transport.launch().await {
            tracing::error!("Failed to launch engine: {}", e);
            self.teardown().await;
            return Err(e.into());
        }

        // Never stack a second listener on top of an old one.
        self.revoke_subscription();
        let (line_tx, line_rx) = mpsc::channel(self.config.output_buffer);
        match self.transport.subscribe(line_tx) {
            Ok(token) => {
                self.subscription = Some(token);
                self.output_rx = Some(line_rx);
            }
            Err(e) => {
                tracing::error!("Failed to subscribe to engine output: {}", e);
                self.teardown().await;
                return Err(e.into());
            }
        }

        self.set_state(SessionState::HandshakeInProgress);
        for cmd in [UciCommand::Uci, UciCommand::IsReady, UciCommand::UciNewGame] {
            if let Err(e) = self.send(cmd).await {
                tracing::error!("Handshake failed: {}", e);
                self.teardown().await;
                return Err(e);
            }
        }

        self.set_state(SessionState::Ready);
        tracing::info!("Engine session ready");
        Ok(())
    }

    async fn analyze(
        &mut self,
        request: AnalysisRequest,
    ) -> Result<SearchParameters, SessionError> {
        if self.state != SessionState::Ready {
            return Err(SessionError::InvalidState {
                operation: "analyze",
                state: self.state,
            });
        }
        let fen = request.fen.trim();
        if fen.is_empty() {
            return Err(SessionError::InvalidRequest("empty position".to_string()));
        }

        let params = SearchParameters::from_skill(request.skill_level);
        tracing::info!(
            skill = params.skill,
            limit = %params.limit,
            "Starting engine search"
        );

        self.set_state(SessionState::Analyzing);
        self.correlator.arm();

        let commands = [
            UciCommand::skill_level(params.skill),
            UciCommand::Position {
                fen: fen.to_string(),
            },
            UciCommand::Go(params.limit),
        ];
        for cmd in commands {
            if let Err(e) = self.send(cmd).await {
                tracing::error!("Failed to issue search: {}", e);
                self.correlator.disarm();
                if self.transport.is_running() {
                    self.set_state(SessionState::Ready);
                } else {
                    self.teardown().await;
                }
                return Err(e);
            }
        }

        self.deadline = self.config.analysis_timeout.map(|t| Instant::now() + t);
        Ok(params)
    }

    async fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            tracing::debug!("Engine session already stopped");
            return;
        }
        self.teardown().await;
        tracing::info!("Engine session stopped");
    }

    /// Release the subscription and the process. Leaves the session `Stopped`.
    async fn teardown(&mut self) {
        self.set_state(SessionState::Stopping);
        self.correlator.reset();
        self.deadline = None;
        self.revoke_subscription();
        if let Err(e) = self.transport.terminate().await {
            tracing::warn!("Failed to terminate engine cleanly: {}", e);
        }
        self.set_state(SessionState::Stopped);
    }

    fn revoke_subscription(&mut self) {
        if let Some(token) = self.subscription.take() {
            self.transport.unsubscribe(token);
        }
        // Lines already queued for the old subscription die with the receiver.
        self.output_rx = None;
    }

    async fn next_output(&mut self) -> ChannelEvent {
        match self.output_rx.as_mut() {
            Some(rx) => rx.recv().await.unwrap_or(ChannelEvent::Closed),
            None => std::future::pending().await,
        }
    }

    async fn handle_output(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Line(line) => {
                self.echo(UciDirection::FromEngine, &line);
                match self.correlator.observe(&line) {
                    Correlation::Ignored => {}
                    Correlation::Decision(decision) => {
                        tracing::info!("Engine decision: {:?}", decision);
                        self.finish_search();
                        self.emit(EngineEvent::Decision(decision)).await;
                    }
                    Correlation::Malformed(e) => {
                        tracing::warn!("Dropping undecodable decision {:?}: {}", line, e);
                        self.finish_search();
                        self.emit(EngineEvent::DecisionDropped {
                            line,
                            reason: e.to_string(),
                        })
                        .await;
                    }
                }
            }
            ChannelEvent::Closed => {
                tracing::warn!("Engine output closed unexpectedly while {}", self.state);
                self.teardown().await;
                self.emit(EngineEvent::Exited).await;
            }
        }
    }

    async fn handle_deadline(&mut self) {
        self.deadline = None;
        if self.state != SessionState::Analyzing {
            return;
        }

        tracing::warn!("Engine search passed its deadline, abandoning it");
        self.correlator.disarm();
        self.correlator.discard_next();
        if let Err(e) = self.send(UciCommand::Stop).await {
            tracing::warn!("Failed to stop overdue search: {}", e);
            self.teardown().await;
        } else {
            self.set_state(SessionState::Ready);
        }
        self.emit(EngineEvent::TimedOut).await;
    }

    fn finish_search(&mut self) {
        self.deadline = None;
        if self.state == SessionState::Analyzing {
            self.set_state(SessionState::Ready);
        }
    }

    async fn send(&mut self, cmd: UciCommand) -> Result<(), SessionError> {
        let line = cmd.to_string();
        tracing::debug!("Sending engine command: {}", line);
        self.transport.send(&line).await?;
        self.echo(UciDirection::ToEngine, &line);
        Ok(())
    }

    async fn emit(&self, event: EngineEvent) {
        if self.event_tx.send(event).await.is_err() {
            tracing::debug!("Nobody is listening for engine events");
        }
    }

    fn echo(&self, direction: UciDirection, line: &str) {
        if !self.config.echo_uci {
            return;
        }
        let event = EngineEvent::Uci {
            direction,
            line: line.to_string(),
        };
        if self.event_tx.try_send(event).is_err() {
            tracing::trace!("Event buffer full, dropping UCI transcript line");
        }
    }
}
