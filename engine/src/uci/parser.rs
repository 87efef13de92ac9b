use super::DecodeError;
use crate::{Decision, MoveDecision};
use cozy_chess::{File, Piece, Rank, Square};

/// Move tokens an engine uses to say it has nothing to play.
pub const NO_MOVE_SENTINELS: [&str; 2] = ["(none)", "0000"];

/// Incoming message from UCI engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    BestMove {
        decision: Decision,
        ponder: Option<MoveDecision>,
    },
    Info(SearchInfo),
    /// Anything else the engine prints (option lists, banners, strings).
    Other(String),
}

/// The parts of an `info` line worth logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInfo {
    pub depth: Option<u8>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i8), // Negative for being mated
}

/// Parse a UCI message line
pub fn parse_uci_message(line: &str) -> Result<UciMessage, DecodeError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(DecodeError::MalformedMessage(line.to_string()));
            }
            let name = tokens[1].to_string();
            let value = tokens[2..].join(" ");
            Ok(UciMessage::Id { name, value })
        }

        Some(&"bestmove") => {
            let token = tokens
                .get(1)
                .ok_or_else(|| DecodeError::MalformedMessage(line.to_string()))?;
            let decision = if NO_MOVE_SENTINELS.contains(token) {
                Decision::NoMove
            } else {
                Decision::Move(parse_uci_move(token)?)
            };
            // A bad ponder move never spoils the decision itself.
            let ponder = match (tokens.get(2), tokens.get(3)) {
                (Some(&"ponder"), Some(mv)) => parse_uci_move(mv).ok(),
                _ => None,
            };
            Ok(UciMessage::BestMove { decision, ponder })
        }

        Some(&"info") => Ok(UciMessage::Info(parse_info_line(&tokens[1..]))),

        _ => Ok(UciMessage::Other(line.to_string())),
    }
}

fn parse_info_line(tokens: &[&str]) -> SearchInfo {
    let mut info = SearchInfo::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                info.nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let (Some(&kind), Some(value)) = (tokens.get(i), tokens.get(i + 1)) {
                    i += 1;
                    info.score = match kind {
                        "cp" => value.parse().ok().map(Score::Centipawns),
                        "mate" => value.parse().ok().map(Score::Mate),
                        _ => None,
                    };
                }
            }
            // Everything after these runs to the end of the line.
            "pv" | "string" => break,
            _ => {}
        }
        i += 1;
    }

    info
}

/// Parse UCI move format (e2e4, e7e8q)
///
/// A fifth character other than `n`, `b`, `r` or `q` is read as "no
/// promotion" rather than rejected.
pub fn parse_uci_move(s: &str) -> Result<MoveDecision, DecodeError> {
    if !s.is_ascii() || !(4..=5).contains(&s.len()) {
        return Err(DecodeError::InvalidMove(s.to_string()));
    }

    let origin = parse_square(&s[0..2])?;
    let destination = parse_square(&s[2..4])?;
    let promotion = s[4..].chars().next().and_then(promotion_piece);

    Ok(MoveDecision {
        origin,
        destination,
        promotion,
    })
}

fn promotion_piece(c: char) -> Option<Piece> {
    match c {
        'n' => Some(Piece::Knight),
        'b' => Some(Piece::Bishop),
        'r' => Some(Piece::Rook),
        'q' => Some(Piece::Queen),
        _ => None,
    }
}

pub fn parse_square(s: &str) -> Result<Square, DecodeError> {
    let invalid = || DecodeError::InvalidSquare(s.to_string());
    let mut chars = s.chars();

    let file = match chars.next() {
        Some('a') => File::A,
        Some('b') => File::B,
        Some('c') => File::C,
        Some('d') => File::D,
        Some('e') => File::E,
        Some('f') => File::F,
        Some('g') => File::G,
        Some('h') => File::H,
        _ => return Err(invalid()),
    };

    let rank = match chars.next() {
        Some('1') => Rank::First,
        Some('2') => Rank::Second,
        Some('3') => Rank::Third,
        Some('4') => Rank::Fourth,
        Some('5') => Rank::Fifth,
        Some('6') => Rank::Sixth,
        Some('7') => Rank::Seventh,
        Some('8') => Rank::Eighth,
        _ => return Err(invalid()),
    };

    if chars.next().is_some() {
        return Err(invalid());
    }

    Ok(Square::new(file, rank))
}

/// Format a decoded move back to compact notation ("e2e4", "e7e8q")
pub fn format_uci_move(mv: &MoveDecision) -> String {
    let mut s = format!(
        "{}{}",
        format_square(mv.origin),
        format_square(mv.destination)
    );
    match mv.promotion {
        Some(Piece::Queen) => s.push('q'),
        Some(Piece::Rook) => s.push('r'),
        Some(Piece::Bishop) => s.push('b'),
        Some(Piece::Knight) => s.push('n'),
        _ => {}
    }
    s
}

pub fn format_square(sq: Square) -> String {
    let file = match sq.file() {
        File::A => 'a',
        File::B => 'b',
        File::C => 'c',
        File::D => 'd',
        File::E => 'e',
        File::F => 'f',
        File::G => 'g',
        File::H => 'h',
    };
    let rank = match sq.rank() {
        Rank::First => '1',
        Rank::Second => '2',
        Rank::Third => '3',
        Rank::Fourth => '4',
        Rank::Fifth => '5',
        Rank::Sixth => '6',
        Rank::Seventh => '7',
        Rank::Eighth => '8',
    };
    format!("{}{}", file, rank)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        parse_square(s).unwrap()
    }

    fn best(line: &str) -> Decision {
        match parse_uci_message(line).unwrap() {
            UciMessage::BestMove { decision, .. } => decision,
            other => panic!("Wrong message type: {:?}", other),
        }
    }

    #[test]
    fn test_parse_bestmove_with_ponder() {
        let msg = parse_uci_message("bestmove e2e4 ponder e7e5").unwrap();
        match msg {
            UciMessage::BestMove { decision, ponder } => {
                assert_eq!(decision.as_move().map(format_uci_move).as_deref(), Some("e2e4"));
                assert_eq!(ponder.map(|p| format_uci_move(&p)).as_deref(), Some("e7e5"));
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_promotion_decodes() {
        assert_eq!(
            best("bestmove e7e8q"),
            Decision::Move(MoveDecision {
                origin: sq("e7"),
                destination: sq("e8"),
                promotion: Some(Piece::Queen),
            })
        );
    }

    #[test]
    fn test_plain_move_has_no_promotion() {
        assert_eq!(
            best("bestmove e2e4"),
            Decision::Move(MoveDecision {
                origin: sq("e2"),
                destination: sq("e4"),
                promotion: None,
            })
        );
    }

    #[test]
    fn test_unknown_fifth_character_is_not_a_promotion() {
        let mv = parse_uci_move("a7a8k").unwrap();
        assert_eq!(mv.promotion, None);
        let mv = parse_uci_move("a7a8Q").unwrap();
        assert_eq!(mv.promotion, None);
    }

    #[test]
    fn test_no_move_sentinels() {
        assert_eq!(best("bestmove (none)"), Decision::NoMove);
        assert_eq!(best("bestmove 0000"), Decision::NoMove);
    }

    #[test]
    fn test_malformed_bestmove() {
        assert!(matches!(
            parse_uci_message("bestmove"),
            Err(DecodeError::MalformedMessage(_))
        ));
        assert!(matches!(
            parse_uci_message("bestmove z9e4"),
            Err(DecodeError::InvalidSquare(_))
        ));
        assert!(matches!(
            parse_uci_message("bestmove e2e4e5"),
            Err(DecodeError::InvalidMove(_))
        ));
        assert!(matches!(
            parse_uci_message("bestmove e2"),
            Err(DecodeError::InvalidMove(_))
        ));
    }

    #[test]
    fn test_bad_ponder_is_dropped() {
        let msg = parse_uci_message("bestmove g1f3 ponder ???").unwrap();
        assert!(matches!(msg, UciMessage::BestMove { ponder: None, .. }));
    }

    #[test]
    fn test_parse_info() {
        let msg = parse_uci_message("info depth 12 score cp 35 nodes 15234 pv e2e4 e7e5").unwrap();
        match msg {
            UciMessage::Info(info) => {
                assert_eq!(info.depth, Some(12));
                assert_eq!(info.score, Some(Score::Centipawns(35)));
                assert_eq!(info.nodes, Some(15234));
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_handshake_and_unknown_lines() {
        assert_eq!(parse_uci_message("uciok").unwrap(), UciMessage::UciOk);
        assert_eq!(parse_uci_message("readyok").unwrap(), UciMessage::ReadyOk);
        assert_eq!(
            parse_uci_message("id name Stockfish 16").unwrap(),
            UciMessage::Id {
                name: "name".into(),
                value: "Stockfish 16".into()
            }
        );
        assert!(matches!(
            parse_uci_message("option name Hash type spin default 16").unwrap(),
            UciMessage::Other(_)
        ));
    }
}
