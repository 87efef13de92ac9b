use cozy_chess::{Board, Color, GameStatus, Move, Piece, Square};
use engine::MoveDecision;

use crate::uci::{decision_to_move, move_to_decision};

/// Game state wrapper around cozy-chess Board
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
    start_position: StartPosition,
}

/// A move that was played, with what it did
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub mv: Move,
    pub facts: MoveFacts,
    pub san: String,
    pub fen: String, // FEN after this move
}

/// Everything about a legal move that can be read off the position before it
/// is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveFacts {
    pub piece: Piece,
    pub color: Color,
    pub captured: Option<Piece>,
    pub promotion: Option<Piece>,
    pub castle: Option<CastleSide>,
    pub check: bool,
    pub checkmate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

/// Starting position of the game
#[derive(Debug, Clone)]
pub enum StartPosition {
    Standard,
    Fen(String),
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Checkmate { winner: Color },
    Stalemate,
    /// Any other draw cozy-chess detects (fifty-move rule).
    Draw,
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self {
            position: Board::default(),
            history: Vec::new(),
            start_position: StartPosition::Standard,
        }
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let position = crate::fen::parse_fen(fen)?;
        Ok(Self {
            position,
            history: Vec::new(),
            start_position: StartPosition::Fen(fen.trim().to_string()),
        })
    }

    pub fn position(&self) -> &Board {
        &self.position
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Get all legal moves for the current position
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.position.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.position.status() {
            GameStatus::Ongoing => None,
            GameStatus::Won => Some(GameOutcome::Checkmate {
                winner: opponent(self.side_to_move()),
            }),
            GameStatus::Drawn => {
                if self.position.checkers().is_empty() && self.legal_moves().is_empty() {
                    Some(GameOutcome::Stalemate)
                } else {
                    Some(GameOutcome::Draw)
                }
            }
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        crate::fen::format_fen(&self.position)
    }

    /// Map an engine decision onto a legal move of this position.
    pub fn resolve(&self, decision: &MoveDecision) -> Result<Move, GameError> {
        let legal = self.legal_moves();
        let mv = decision_to_move(decision, &legal);
        if legal.contains(&mv) {
            Ok(mv)
        } else {
            Err(GameError::IllegalMove(decision.to_string()))
        }
    }

    /// Read off what a legal move would do, without playing it.
    pub fn inspect(&self, mv: Move) -> Result<MoveFacts, GameError> {
        let illegal = || GameError::IllegalMove(format!("{:?}", mv));
        let piece = self.position.piece_on(mv.from).ok_or_else(illegal)?;
        let color = self.position.color_on(mv.from).ok_or_else(illegal)?;

        let castle = if piece == Piece::King && self.position.color_on(mv.to) == Some(color) {
            if (mv.to.file() as u8) > (mv.from.file() as u8) {
                Some(CastleSide::Kingside)
            } else {
                Some(CastleSide::Queenside)
            }
        } else {
            None
        };

        let captured = match (castle, self.position.piece_on(mv.to)) {
            (Some(_), _) => None,
            (None, Some(target)) => Some(target),
            // A pawn changing file onto an empty square took en passant.
            (None, None) if piece == Piece::Pawn && mv.from.file() != mv.to.file() => {
                Some(Piece::Pawn)
            }
            (None, None) => None,
        };

        let mut after = self.position.clone();
        after.try_play(mv).map_err(|_| illegal())?;
        let check = !after.checkers().is_empty();
        let checkmate = check && after.status() == GameStatus::Won;

        Ok(MoveFacts {
            piece,
            color,
            captured,
            promotion: mv.promotion,
            castle,
            check,
            checkmate,
        })
    }

    /// Make a move on the board
    pub fn make_move(&mut self, mv: Move) -> Result<HistoryEntry, GameError> {
        if !self.legal_moves().contains(&mv) {
            return Err(GameError::IllegalMove(format!("{:?}", mv)));
        }

        // Facts and SAN come from the position before the move
        let facts = self.inspect(mv)?;
        let san = generate_san(mv, &facts);

        self.position.play_unchecked(mv);

        let entry = HistoryEntry {
            mv,
            facts,
            san,
            fen: self.to_fen(),
        };
        self.history.push(entry.clone());
        Ok(entry)
    }

    /// Play an engine decision.
    pub fn apply(&mut self, decision: &MoveDecision) -> Result<HistoryEntry, GameError> {
        let mv = self.resolve(decision)?;
        self.make_move(mv)
    }

    /// Undo the last move
    pub fn undo(&mut self) -> Result<HistoryEntry, GameError> {
        let entry = self.history.pop().ok_or(GameError::NothingToUndo)?;
        self.rebuild_position()?;
        Ok(entry)
    }

    /// The last move in engine notation, if any.
    pub fn last_move(&self) -> Option<MoveDecision> {
        self.history
            .last()
            .map(|entry| move_to_decision(entry.mv, entry.facts.castle.is_some()))
    }

    /// Rebuild position from start + history (for undo)
    fn rebuild_position(&mut self) -> Result<(), GameError> {
        let mut board = match &self.start_position {
            StartPosition::Standard => Board::default(),
            StartPosition::Fen(fen) => crate::fen::parse_fen(fen)?,
        };

        for entry in &self.history {
            board
                .try_play(entry.mv)
                .map_err(|_| GameError::IllegalMove(entry.san.clone()))?;
        }

        self.position = board;
        Ok(())
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

pub fn opponent(color: Color) -> Color {
    match color {
        Color::White => Color::Black,
        Color::Black => Color::White,
    }
}

/// Generate SAN-style notation for a move (no disambiguation)
fn generate_san(mv: Move, facts: &MoveFacts) -> String {
    let mut san = match facts.castle {
        Some(CastleSide::Kingside) => "O-O".to_string(),
        Some(CastleSide::Queenside) => "O-O-O".to_string(),
        None => {
            let mut san = String::new();
            match facts.piece {
                Piece::Pawn => {
                    if facts.captured.is_some() {
                        san.push(file_to_char(mv.from));
                    }
                }
                piece => san.push(piece_letter(piece)),
            }
            if facts.captured.is_some() {
                san.push('x');
            }
            san.push_str(&engine::uci::format_square(mv.to));
            if let Some(promo) = facts.promotion {
                san.push('=');
                san.push(piece_letter(promo));
            }
            san
        }
    };

    if facts.checkmate {
        san.push('#');
    } else if facts.check {
        san.push('+');
    }
    san
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::King => 'K',
        Piece::Queen => 'Q',
        Piece::Rook => 'R',
        Piece::Bishop => 'B',
        Piece::Knight => 'N',
        Piece::Pawn => 'P',
    }
}

fn file_to_char(square: Square) -> char {
    match square.file() {
        cozy_chess::File::A => 'a',
        cozy_chess::File::B => 'b',
        cozy_chess::File::C => 'c',
        cozy_chess::File::D => 'd',
        cozy_chess::File::E => 'e',
        cozy_chess::File::F => 'f',
        cozy_chess::File::G => 'g',
        cozy_chess::File::H => 'h',
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("FEN parse error: {0}")]
    FenError(#[from] crate::fen::FenError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::uci::parse_uci_move;

    fn decision(uci: &str) -> MoveDecision {
        parse_uci_move(uci).unwrap()
    }

    #[test]
    fn test_apply_decision() {
        let mut game = Game::new();
        let entry = game.apply(&decision("g1f3")).unwrap();
        assert_eq!(entry.san, "Nf3");
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(
            game.to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq - 1 1"
        );
    }

    #[test]
    fn test_illegal_decision_is_rejected() {
        let mut game = Game::new();
        assert!(matches!(
            game.apply(&decision("e2e5")),
            Err(GameError::IllegalMove(_))
        ));
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_castling_decision() {
        let mut game =
            Game::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let entry = game.apply(&decision("e1g1")).unwrap();
        assert_eq!(entry.san, "O-O");
        assert_eq!(entry.facts.castle, Some(CastleSide::Kingside));
        assert_eq!(
            game.last_move().map(|mv| mv.to_string()).as_deref(),
            Some("e1g1")
        );
    }

    #[test]
    fn test_promotion_with_check() {
        let mut game = Game::from_fen("7k/4P3/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let entry = game.apply(&decision("e7e8q")).unwrap();
        assert_eq!(entry.san, "e8=Q+");
        assert_eq!(entry.facts.promotion, Some(Piece::Queen));
    }

    #[test]
    fn test_en_passant_counts_as_capture() {
        let game = Game::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        let mv = game.resolve(&decision("e5d6")).unwrap();
        let facts = game.inspect(mv).unwrap();
        assert_eq!(facts.captured, Some(Piece::Pawn));
    }

    #[test]
    fn test_checkmate_outcome() {
        let mut game = Game::new();
        for uci in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            game.apply(&decision(uci)).unwrap();
        }
        assert_eq!(game.history().last().map(|e| e.san.as_str()), Some("Qh4#"));
        assert_eq!(
            game.outcome(),
            Some(GameOutcome::Checkmate {
                winner: Color::Black
            })
        );
    }

    #[test]
    fn test_stalemate_outcome() {
        let game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(game.outcome(), Some(GameOutcome::Stalemate));
    }

    #[test]
    fn test_undo_restores_position() {
        let mut game = Game::new();
        game.apply(&decision("g1f3")).unwrap();
        game.apply(&decision("g8f6")).unwrap();
        game.undo().unwrap();
        assert_eq!(
            game.to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq - 1 1"
        );
        game.undo().unwrap();
        assert!(matches!(game.undo(), Err(GameError::NothingToUndo)));
    }
}
