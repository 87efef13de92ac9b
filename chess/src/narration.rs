//! Spoken-style descriptions of engine moves.
//!
//! A description has to be built from the position *before* the move is
//! played, since afterwards the origin square is empty and the captured piece
//! is gone.

use cozy_chess::{Color, Piece};
use engine::uci::format_square;
use engine::MoveDecision;

use crate::game::{CastleSide, Game};

pub fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "Pawn",
        Piece::Knight => "Knight",
        Piece::Bishop => "Bishop",
        Piece::Rook => "Rook",
        Piece::Queen => "Queen",
        Piece::King => "King",
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Describe `decision` as a sentence, e.g. "Knight captures Bishop at E5, check".
pub fn describe_move(game: &Game, decision: &MoveDecision) -> String {
    let from = format_square(decision.origin).to_uppercase();
    let to = format_square(decision.destination).to_uppercase();

    if game.position().piece_on(decision.origin).is_none() {
        return format!("Move from {} to {}", from, to);
    }

    let facts = match game.resolve(decision).and_then(|mv| game.inspect(mv)) {
        Ok(facts) => facts,
        Err(_) => return format!("Invalid move from {} to {}", from, to),
    };

    let mut text = match facts.castle {
        Some(CastleSide::Kingside) => format!("{} castles kingside", color_name(facts.color)),
        Some(CastleSide::Queenside) => format!("{} castles queenside", color_name(facts.color)),
        None => match facts.captured {
            Some(captured) => format!(
                "{} captures {} at {}",
                piece_name(facts.piece),
                piece_name(captured),
                to
            ),
            None => format!("{} moves to {}", piece_name(facts.piece), to),
        },
    };

    if facts.checkmate {
        text.push_str(", Checkmate!");
    } else if facts.check {
        text.push_str(", check");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::uci::parse_uci_move;

    fn describe(fen: &str, uci: &str) -> String {
        let game = Game::from_fen(fen).unwrap();
        describe_move(&game, &parse_uci_move(uci).unwrap())
    }

    #[test]
    fn test_quiet_move() {
        let game = Game::new();
        assert_eq!(
            describe_move(&game, &parse_uci_move("g1f3").unwrap()),
            "Knight moves to F3"
        );
    }

    #[test]
    fn test_capture() {
        assert_eq!(
            describe(
                "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2",
                "e4d5"
            ),
            "Pawn captures Pawn at D5"
        );
    }

    #[test]
    fn test_castling() {
        assert_eq!(
            describe("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R b KQkq - 0 1", "e8c8"),
            "Black castles queenside"
        );
    }

    #[test]
    fn test_checkmate_suffix() {
        assert_eq!(
            describe(
                "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2",
                "d8h4"
            ),
            "Queen moves to H4, Checkmate!"
        );
    }

    #[test]
    fn test_promotion_with_check() {
        assert_eq!(
            describe("7k/4P3/8/8/8/8/8/K7 w - - 0 1", "e7e8q"),
            "Pawn moves to E8, check"
        );
    }

    #[test]
    fn test_empty_origin() {
        let game = Game::new();
        assert_eq!(
            describe_move(&game, &parse_uci_move("e4e5").unwrap()),
            "Move from E4 to E5"
        );
    }

    #[test]
    fn test_illegal_move() {
        let game = Game::new();
        assert_eq!(
            describe_move(&game, &parse_uci_move("e2e5").unwrap()),
            "Invalid move from E2 to E5"
        );
    }

    #[test]
    fn test_description_does_not_touch_the_game() {
        let game = Game::new();
        let before = game.to_fen();
        describe_move(&game, &parse_uci_move("e2e4").unwrap());
        assert_eq!(game.to_fen(), before);
    }
}
