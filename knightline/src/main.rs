//! knightline - play chess against a local UCI engine from the terminal.
//!
//! Two modes:
//!
//! 1. **`play`**: an interactive game on stdin/stdout. The human enters moves
//!    in engine notation (`e2e4`, `e7e8q`); the engine answers and its move is
//!    narrated ("Knight captures Bishop at E5, check").
//! 2. **`bestmove`**: a one-shot search on a given position, printed as text
//!    or JSON.
//!
//! The engine binary, skill level, search deadline and log directory come
//! from the environment (see [`config`]) unless overridden by flags.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chess::{color_name, Game, GameOutcome};
use clap::{Parser, Subcommand, ValueEnum};
use cozy_chess::Color;
use engine::{EngineSession, SessionConfig};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod controller;

use controller::{ControllerError, EngineTurn, GameController};

/// Top-level CLI arguments for knightline.
#[derive(Parser)]
#[command(name = "knightline", about = "Play chess against a local UCI engine")]
struct Cli {
    /// Engine binary to run. Defaults to `KNIGHTLINE_ENGINE_PATH`, then a
    /// `stockfish` found in the usual places.
    #[arg(long, global = true)]
    engine: Option<PathBuf>,

    /// Seconds the engine may think before a search is abandoned (0 waits forever).
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a game against the engine.
    Play {
        /// Engine skill level, 0 to 20.
        #[arg(short, long)]
        skill: Option<i32>,

        /// Start from this position instead of the initial one.
        #[arg(long)]
        fen: Option<String>,

        /// The side you play.
        #[arg(long, value_enum, default_value_t = Side::White)]
        side: Side,

        /// Print only moves, without the board and narration.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Ask the engine for its move in one position and exit.
    Bestmove {
        /// Position to analyse.
        #[arg(long)]
        fen: String,

        /// Engine skill level, 0 to 20.
        #[arg(short, long)]
        skill: Option<i32>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

/// What `bestmove --json` prints.
#[derive(Serialize)]
struct BestMoveReport {
    fen: String,
    skill: u8,
    limit: Option<String>,
    bestmove: Option<String>,
    san: Option<String>,
    narration: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing()?;

    let session_config = SessionConfig {
        analysis_timeout: config::analysis_timeout(
            cli.timeout.unwrap_or_else(config::get_analysis_timeout_secs),
        ),
        ..SessionConfig::default()
    };
    let engine_path = cli.engine.or_else(config::get_engine_path);

    match cli.command {
        Commands::Play {
            skill,
            fen,
            side,
            quiet,
        } => {
            let game = load_game(fen.as_deref())?;
            let skill = skill.unwrap_or_else(config::get_skill_level);
            let (handle, events) = EngineSession::spawn_process(engine_path, session_config);
            let mut controller = GameController::new(game, side.into(), skill, handle, events);

            let result = play(&mut controller, quiet).await;
            controller.shutdown().await;
            result
        }
        Commands::Bestmove { fen, skill, json } => {
            let game = load_game(Some(&fen))?;
            let human = chess::opponent(game.side_to_move());
            let skill = skill.unwrap_or_else(config::get_skill_level);
            let (handle, events) = EngineSession::spawn_process(engine_path, session_config);
            let mut controller = GameController::new(game, human, skill, handle, events);

            let result = controller.engine_turn().await;
            controller.shutdown().await;
            print_bestmove(&fen, skill, result?, json)
        }
    }
}

/// Log to a daily rolling file when a log directory is configured, else to
/// stderr. The returned guard must live until exit so buffered lines are flushed.
fn init_tracing() -> anyhow::Result<Option<WorkerGuard>> {
    match config::get_log_dir() {
        Some(dir) => {
            prepare_log_dir(&dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "knightline");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                .init();
            Ok(Some(guard))
        }
        None => {
            // stderr shares the terminal with the game, keep it quiet by default
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
                .init();
            Ok(None)
        }
    }
}

fn prepare_log_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))
}

fn load_game(fen: Option<&str>) -> anyhow::Result<Game> {
    match fen {
        Some(fen) => Game::from_fen(fen).with_context(|| format!("cannot load position {:?}", fen)),
        None => Ok(Game::new()),
    }
}

async fn play(controller: &mut GameController, quiet: bool) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if !quiet {
        println!(
            "You play {} at skill {}. Enter moves like e2e4, or `undo` / `quit`.",
            color_name(controller.human()),
            controller.skill()
        );
    }

    loop {
        if let Some(outcome) = controller.game().outcome() {
            println!("{}", describe_outcome(outcome));
            return Ok(());
        }

        if controller.is_engine_turn() {
            match controller.engine_turn().await {
                Ok(EngineTurn::Played(play)) => {
                    if quiet {
                        println!("{}", play.decision);
                    } else {
                        println!("Engine: {} ({})", play.narration, play.san);
                    }
                }
                Ok(EngineTurn::NoMove) => {
                    println!("The engine has no move. Game over.");
                    return Ok(());
                }
                Ok(EngineTurn::Idle) => {}
                Err(e @ ControllerError::EngineUnavailable(_)) => {
                    println!("The engine is unavailable, ending the game.");
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
            continue;
        }

        if !quiet {
            println!("{}", controller.game().to_fen());
            print!("Your move: ");
            std::io::stdout().flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        match line.trim() {
            "" => {}
            "quit" => return Ok(()),
            "undo" => match controller.undo_turn() {
                Ok(count) => tracing::debug!("Took back {} moves", count),
                Err(e) => println!("{}", e),
            },
            notation => match controller.human_move(notation) {
                Ok(entry) => {
                    if !quiet {
                        println!("You: {}", entry.san);
                    }
                }
                Err(
                    e @ (ControllerError::Notation(_)
                    | ControllerError::Game(_)
                    | ControllerError::NotYourTurn),
                ) => println!("{}", e),
                Err(e) => return Err(e.into()),
            },
        }
    }
}

fn describe_outcome(outcome: GameOutcome) -> String {
    match outcome {
        GameOutcome::Checkmate { winner } => format!("Checkmate, {} wins.", color_name(winner)),
        GameOutcome::Stalemate => "Stalemate.".to_string(),
        GameOutcome::Draw => "Draw.".to_string(),
    }
}

fn print_bestmove(fen: &str, skill: i32, turn: EngineTurn, json: bool) -> anyhow::Result<()> {
    let play = match turn {
        EngineTurn::Played(play) => Some(play),
        EngineTurn::NoMove | EngineTurn::Idle => None,
    };

    if json {
        let report = BestMoveReport {
            fen: fen.trim().to_string(),
            skill: engine::search::clamp_skill(skill),
            limit: play.as_ref().map(|p| p.params.limit.to_string()),
            bestmove: play.as_ref().map(|p| p.decision.to_string()),
            san: play.as_ref().map(|p| p.san.clone()),
            narration: play.as_ref().map(|p| p.narration.clone()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match play {
            Some(play) => println!("bestmove {} ({})", play.decision, play.narration),
            None => println!("bestmove (none)"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_unusable_log_dir_is_reported() {
        let err = prepare_log_dir(Path::new("/dev/null/knightline")).unwrap_err();
        assert!(err.to_string().contains("/dev/null/knightline"));
    }

    #[test]
    fn test_outcome_text() {
        assert_eq!(
            describe_outcome(GameOutcome::Checkmate {
                winner: Color::Black
            }),
            "Checkmate, Black wins."
        );
        assert_eq!(describe_outcome(GameOutcome::Stalemate), "Stalemate.");
    }
}
