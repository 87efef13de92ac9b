use crate::search::SearchLimit;
use std::fmt;

/// Option name Stockfish uses for its strength setting.
pub const SKILL_LEVEL_OPTION: &str = "Skill Level";

/// Outgoing command to a UCI engine. `Display` renders the exact line,
/// without the terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    SetOption { name: String, value: Option<String> },
    Position { fen: String },
    Go(SearchLimit),
    Stop,
    Quit,
}

impl UciCommand {
    pub fn skill_level(level: u8) -> Self {
        UciCommand::SetOption {
            name: SKILL_LEVEL_OPTION.to_string(),
            value: Some(level.to_string()),
        }
    }
}

impl fmt::Display for UciCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciCommand::Uci => f.write_str("uci"),
            UciCommand::IsReady => f.write_str("isready"),
            UciCommand::UciNewGame => f.write_str("ucinewgame"),
            UciCommand::SetOption { name, value } => match value {
                Some(value) => write!(f, "setoption name {} value {}", name, value),
                None => write!(f, "setoption name {}", name),
            },
            UciCommand::Position { fen } => write!(f, "position fen {}", fen),
            UciCommand::Go(SearchLimit::MoveTime(ms)) => write!(f, "go movetime {}", ms),
            UciCommand::Go(SearchLimit::Depth(plies)) => write!(f, "go depth {}", plies),
            UciCommand::Stop => f.write_str("stop"),
            UciCommand::Quit => f.write_str("quit"),
        }
    }
}
