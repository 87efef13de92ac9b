use crate::Decision;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UciDirection {
    ToEngine,
    FromEngine,
}

/// Notifications from the session to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The answer to the outstanding `analyze()`; sent exactly once per search.
    Decision(Decision),
    /// The engine answered with a decision line that could not be decoded.
    DecisionDropped { line: String, reason: String },
    /// The search ran past the configured deadline and was abandoned.
    TimedOut,
    /// The engine process went away without being stopped.
    Exited,
    /// Transcript of the protocol conversation, when enabled.
    Uci {
        direction: UciDirection,
        line: String,
    },
}
