pub mod command;
pub mod parser;

pub use command::UciCommand;
pub use parser::{
    format_square, format_uci_move, parse_square, parse_uci_message, parse_uci_move, Score,
    SearchInfo, UciMessage, NO_MOVE_SENTINELS,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed UCI message: {0}")]
    MalformedMessage(String),
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
}
