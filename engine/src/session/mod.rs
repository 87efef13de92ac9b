//! Engine session: one engine process, its handshake, and one search at a time.
//!
//! The session runs as an actor task. [`EngineHandle`] sends it commands and
//! waits for their acknowledgement; everything the engine answers later
//! (decisions, deadline expiry, process exit) arrives on the event channel
//! returned by [`EngineSession::spawn`].

mod actor;
mod commands;
mod events;
mod handle;
mod state;

pub use commands::SessionError;
pub use events::{EngineEvent, UciDirection};
pub use handle::EngineHandle;
pub use state::SessionState;

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::transport::{ProcessTransport, Transport};
use actor::{run_session_actor, SessionActor};

/// Default time a search may take before the session gives up on it.
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for an engine session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline for a decision after `analyze()`; `None` waits forever.
    pub analysis_timeout: Option<Duration>,
    /// Emit [`EngineEvent::Uci`] for every line sent and received.
    pub echo_uci: bool,
    /// Capacity of the event channel handed to the caller.
    pub event_buffer: usize,
    /// Capacity of the internal engine output channel.
    pub output_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            analysis_timeout: Some(DEFAULT_ANALYSIS_TIMEOUT),
            echo_uci: false,
            event_buffer: 32,
            output_buffer: 64,
        }
    }
}

pub struct EngineSession;

impl EngineSession {
    /// Spawn a session actor over `transport`. Must be called inside a tokio
    /// runtime. The session starts `Uninitialized`; call
    /// [`EngineHandle::start`] to launch the engine.
    pub fn spawn<T: Transport>(
        transport: T,
        config: SessionConfig,
    ) -> (EngineHandle, mpsc::Receiver<EngineEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer.max(1));
        let actor = SessionActor::new(transport, config, event_tx);
        tokio::spawn(run_session_actor(actor, cmd_rx));
        (EngineHandle::new(cmd_tx), event_rx)
    }

    /// Spawn a session over a local engine binary. `None` discovers the binary
    /// at start time.
    pub fn spawn_process(
        engine_path: Option<PathBuf>,
        config: SessionConfig,
    ) -> (EngineHandle, mpsc::Receiver<EngineEvent>) {
        Self::spawn(ProcessTransport::new(engine_path), config)
    }
}
