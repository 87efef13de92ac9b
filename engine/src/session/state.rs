use std::fmt;

/// Lifecycle of one engine session.
///
/// `Starting`, `HandshakeInProgress` and `Stopping` only exist while the
/// session task is inside `start()` or `stop()`; callers observe the stable
/// states `Uninitialized`, `Ready`, `Analyzing` and `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Uninitialized,
    Starting,
    HandshakeInProgress,
    Ready,
    Analyzing,
    Stopping,
    Stopped,
}

impl SessionState {
    /// Whether `start()` has to launch a process from here.
    pub(crate) fn needs_launch(&self) -> bool {
        matches!(self, SessionState::Uninitialized | SessionState::Stopped)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Starting => "starting",
            SessionState::HandshakeInProgress => "handshake",
            SessionState::Ready => "ready",
            SessionState::Analyzing => "analyzing",
            SessionState::Stopping => "stopping",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
