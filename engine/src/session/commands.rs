use tokio::sync::oneshot;

use super::state::SessionState;
use crate::search::SearchParameters;
use crate::transport::TransportError;
use crate::AnalysisRequest;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Engine session has shut down")]
    SessionClosed,
}

/// Commands sent to the session actor. Each embeds a oneshot for the reply.
pub(crate) enum SessionCommand {
    Start {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Analyze {
        request: AnalysisRequest,
        reply: oneshot::Sender<Result<SearchParameters, SessionError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    GetState {
        reply: oneshot::Sender<SessionState>,
    },
    Shutdown,
}
