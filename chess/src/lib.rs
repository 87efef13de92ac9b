//! Game state on top of cozy-chess, plus the glue between engine decisions
//! and playable moves.

pub mod fen;
pub mod game;
pub mod narration;
pub mod uci;

pub use fen::{format_fen, parse_fen, FenError, STARTING_FEN};
pub use game::{
    opponent, CastleSide, Game, GameError, GameOutcome, HistoryEntry, MoveFacts, StartPosition,
};
pub use narration::{color_name, describe_move, piece_name};
pub use uci::{decision_to_move, move_to_decision};
