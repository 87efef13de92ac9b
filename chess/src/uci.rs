//! Bridging engine move notation and cozy-chess moves.

use cozy_chess::{File, Move, Rank, Square};
use engine::MoveDecision;

/// Convert an engine decision to the matching cozy-chess move.
///
/// UCI writes castling as the king moving two squares (e1g1, e1c1, e8g8,
/// e8c8); cozy-chess writes it as the king capturing its own rook (e1h1,
/// e1a1, e8h8, e8a8). The castling form is only used when it is legal.
pub fn decision_to_move(decision: &MoveDecision, legal_moves: &[Move]) -> Move {
    let mv = Move {
        from: decision.origin,
        to: decision.destination,
        promotion: decision.promotion,
    };

    let is_castling_shape = matches!(mv.from.rank(), Rank::First | Rank::Eighth)
        && mv.from.file() == File::E
        && matches!(mv.to.file(), File::G | File::C)
        && mv.to.rank() == mv.from.rank()
        && mv.promotion.is_none();

    if is_castling_shape {
        let rook_file = if mv.to.file() == File::G {
            File::H
        } else {
            File::A
        };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };
        if legal_moves.contains(&converted) && !legal_moves.contains(&mv) {
            return converted;
        }
    }

    mv
}

/// Convert a cozy-chess move back to engine notation, undoing the castling
/// translation when `is_castle` is set.
pub fn move_to_decision(mv: Move, is_castle: bool) -> MoveDecision {
    let destination = if is_castle {
        let king_file = if mv.to.file() == File::H {
            File::G
        } else {
            File::C
        };
        Square::new(king_file, mv.from.rank())
    } else {
        mv.to
    };
    MoveDecision {
        origin: mv.from,
        destination,
        promotion: mv.promotion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Game;
    use engine::uci::{format_uci_move, parse_uci_move};

    #[test]
    fn test_castling_is_translated_when_legal() {
        let game =
            Game::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let legal = game.legal_moves();

        let kingside = decision_to_move(&parse_uci_move("e1g1").unwrap(), &legal);
        assert_eq!(kingside.to, Square::new(File::H, Rank::First));
        let queenside = decision_to_move(&parse_uci_move("e1c1").unwrap(), &legal);
        assert_eq!(queenside.to, Square::new(File::A, Rank::First));
    }

    #[test]
    fn test_ordinary_king_move_is_untouched() {
        // A king on e1 without castling rights stepping to f1 is not castling.
        let game = Game::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let legal = game.legal_moves();
        let mv = decision_to_move(&parse_uci_move("e1f1").unwrap(), &legal);
        assert_eq!(mv.to, Square::new(File::F, Rank::First));
    }

    #[test]
    fn test_round_trip_castling_notation() {
        let mv = Move {
            from: Square::new(File::E, Rank::Eighth),
            to: Square::new(File::A, Rank::Eighth),
            promotion: None,
        };
        assert_eq!(format_uci_move(&move_to_decision(mv, true)), "e8c8");
    }
}
