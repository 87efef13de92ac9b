use tokio::sync::{mpsc, oneshot};

use super::commands::{SessionCommand, SessionError};
use super::state::SessionState;
use crate::search::SearchParameters;
use crate::AnalysisRequest;

/// Cheap, cloneable handle to an engine session actor.
///
/// Dropping the last handle shuts the session down and ends the engine
/// process.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl EngineHandle {
    pub(crate) fn new(cmd_tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { cmd_tx }
    }

    /// Launch the engine and run the handshake. A no-op on a started session.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn start(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Start { reply: tx }).await?;
        rx.await.map_err(|_| SessionError::SessionClosed)?
    }

    /// Ask for a move in `fen`. Returns once the search commands are written;
    /// the move itself arrives later as an [`EngineEvent`](super::EngineEvent).
    pub async fn analyze(
        &self,
        fen: impl Into<String>,
        skill_level: i32,
    ) -> Result<SearchParameters, SessionError> {
        self.analyze_request(AnalysisRequest::new(fen, skill_level))
            .await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(fen = %request.fen, skill = request.skill_level))]
    pub async fn analyze_request(
        &self,
        request: AnalysisRequest,
    ) -> Result<SearchParameters, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Analyze { request, reply: tx })
            .await?;
        rx.await.map_err(|_| SessionError::SessionClosed)?
    }

    /// Tear the engine down. Safe to call in any state, any number of times.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn stop(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Stop { reply: tx }).await?;
        rx.await.map_err(|_| SessionError::SessionClosed)
    }

    pub async fn state(&self) -> Result<SessionState, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::GetState { reply: tx }).await?;
        rx.await.map_err(|_| SessionError::SessionClosed)
    }

    /// Stop the engine and end the session task.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Shutdown).await;
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| SessionError::SessionClosed)
    }
}
