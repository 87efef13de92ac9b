//! Engine session manager for an external UCI chess engine.
//!
//! The crate is split along the data flow of a single engine turn:
//!
//! - [`transport`] moves text lines to and from the engine process.
//! - [`session`] owns the process lifecycle, the handshake and the per-turn
//!   command sequence.
//! - [`correlator`] watches engine output and picks out the one decision line
//!   that answers the outstanding search.
//! - [`search`] maps a skill level onto protocol-level search limits.
//! - [`uci`] encodes commands and decodes engine output.

pub mod correlator;
pub mod search;
pub mod session;
pub mod transport;
pub mod uci;

pub use correlator::{Correlation, MoveCorrelator};
pub use search::{SearchLimit, SearchParameters};
pub use session::{
    EngineEvent, EngineHandle, EngineSession, SessionConfig, SessionError, SessionState,
    UciDirection,
};
pub use transport::{ChannelEvent, ProcessTransport, SubscriptionToken, Transport, TransportError};
pub use uci::{DecodeError, UciCommand, UciMessage};

#[cfg(any(test, feature = "mock"))]
pub use transport::MockTransport;

use cozy_chess::{Piece, Square};
use std::fmt;

/// A move chosen by the engine, decoded from compact square-pair notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveDecision {
    pub origin: Square,
    pub destination: Square,
    pub promotion: Option<Piece>,
}

impl fmt::Display for MoveDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&uci::format_uci_move(self))
    }
}

/// The engine's answer to one search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Move(MoveDecision),
    /// The engine reported that the position has no legal move.
    NoMove,
}

impl Decision {
    pub fn as_move(&self) -> Option<&MoveDecision> {
        match self {
            Decision::Move(mv) => Some(mv),
            Decision::NoMove => None,
        }
    }
}

/// One request for the engine to pick a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Position in Forsyth-Edwards notation.
    pub fen: String,
    /// Requested strength; clamped to 0..=20 before use.
    pub skill_level: i32,
}

impl AnalysisRequest {
    pub fn new(fen: impl Into<String>, skill_level: i32) -> Self {
        Self {
            fen: fen.into(),
            skill_level,
        }
    }
}
