use cozy_chess::Board;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a Board
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let fen = fen.trim();
    let fields = fen.split_whitespace().count();
    if fields != 6 {
        return Err(FenError::FieldCount(fields));
    }

    fen.parse().map_err(|_| FenError::InvalidFormat)
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    // cozy-chess's Display implementation writes FEN
    board.to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
    #[error("FEN needs 6 fields, found {0}")]
    FieldCount(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_position_round_trips() {
        let board = parse_fen(STARTING_FEN).unwrap();
        assert_eq!(format_fen(&board), STARTING_FEN);
        assert_eq!(format_fen(&Board::default()), STARTING_FEN);
    }

    #[test]
    fn test_rejects_truncated_fen() {
        assert!(matches!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"),
            Err(FenError::FieldCount(2))
        ));
        assert!(matches!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1"),
            Err(FenError::InvalidFormat)
        ));
    }
}
