//! Picks the decision line out of an engine's output stream.

use crate::uci::{parse_uci_message, DecodeError, UciMessage};
use crate::Decision;

/// What one output line means for the outstanding search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation {
    Ignored,
    Decision(Decision),
    /// A decision line whose move could not be decoded.
    Malformed(DecodeError),
}

/// Tracks whether a search is waiting for its answer.
///
/// Each [`arm`](Self::arm) yields at most one non-`Ignored` correlation.
/// Lines seen while disarmed are dropped, never kept for later.
#[derive(Debug, Default)]
pub struct MoveCorrelator {
    awaiting: bool,
    /// Decision lines still owed by searches that were abandoned.
    stale: u32,
}

impl MoveCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self) {
        self.awaiting = true;
    }

    pub fn disarm(&mut self) {
        self.awaiting = false;
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    /// Swallow the next decision line; it answers a search that was stopped.
    pub fn discard_next(&mut self) {
        self.stale += 1;
    }

    /// Forget everything, e.g. when the process goes away.
    pub fn reset(&mut self) {
        self.awaiting = false;
        self.stale = 0;
    }

    pub fn observe(&mut self, line: &str) -> Correlation {
        if line.split_whitespace().next() != Some("bestmove") {
            if let Ok(UciMessage::Info(info)) = parse_uci_message(line) {
                tracing::trace!(depth = ?info.depth, score = ?info.score, "search progress");
            }
            return Correlation::Ignored;
        }

        if self.stale > 0 {
            self.stale -= 1;
            tracing::debug!("Discarding decision of an abandoned search: {}", line);
            return Correlation::Ignored;
        }

        if !self.awaiting {
            tracing::debug!("Decision line with no search outstanding: {}", line);
            return Correlation::Ignored;
        }

        self.awaiting = false;
        match parse_uci_message(line) {
            Ok(UciMessage::BestMove { decision, .. }) => Correlation::Decision(decision),
            Ok(_) => Correlation::Malformed(DecodeError::MalformedMessage(line.to_string())),
            Err(e) => Correlation::Malformed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uci::parse_uci_move;

    #[test]
    fn test_decision_only_when_armed() {
        let mut correlator = MoveCorrelator::new();
        assert_eq!(correlator.observe("bestmove e2e4"), Correlation::Ignored);

        correlator.arm();
        assert_eq!(
            correlator.observe("bestmove e2e4"),
            Correlation::Decision(Decision::Move(parse_uci_move("e2e4").unwrap()))
        );
        assert!(!correlator.is_awaiting());
        assert_eq!(correlator.observe("bestmove e2e4"), Correlation::Ignored);
    }

    #[test]
    fn test_info_lines_are_ignored() {
        let mut correlator = MoveCorrelator::new();
        correlator.arm();
        assert_eq!(
            correlator.observe("info depth 5 score cp 20 pv e2e4"),
            Correlation::Ignored
        );
        assert_eq!(correlator.observe("readyok"), Correlation::Ignored);
        assert!(correlator.is_awaiting());
    }

    #[test]
    fn test_bestmove_prefix_needs_a_whole_word() {
        let mut correlator = MoveCorrelator::new();
        correlator.arm();
        assert_eq!(correlator.observe("bestmoves e2e4"), Correlation::Ignored);
        assert!(correlator.is_awaiting());
    }

    #[test]
    fn test_no_move_is_a_decision() {
        let mut correlator = MoveCorrelator::new();
        correlator.arm();
        assert_eq!(
            correlator.observe("bestmove (none)"),
            Correlation::Decision(Decision::NoMove)
        );
    }

    #[test]
    fn test_malformed_disarms() {
        let mut correlator = MoveCorrelator::new();
        correlator.arm();
        assert!(matches!(
            correlator.observe("bestmove x9x9"),
            Correlation::Malformed(DecodeError::InvalidSquare(_))
        ));
        assert!(!correlator.is_awaiting());
    }

    #[test]
    fn test_stale_decision_is_swallowed() {
        let mut correlator = MoveCorrelator::new();
        correlator.discard_next();
        correlator.arm();
        assert_eq!(correlator.observe("bestmove a2a3"), Correlation::Ignored);
        assert!(correlator.is_awaiting());
        assert!(matches!(
            correlator.observe("bestmove d2d4"),
            Correlation::Decision(_)
        ));
    }
}
