//! Turn-taking between a human player and the engine.

use chess::{describe_move, Game, GameError, HistoryEntry};
use cozy_chess::Color;
use engine::uci::parse_uci_move;
use engine::{
    Decision, DecodeError, EngineEvent, EngineHandle, MoveDecision, SearchParameters,
    SessionError,
};
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("game is over")]
    GameOver,
    #[error("it is the engine's turn")]
    NotYourTurn,
    #[error("could not read move: {0}")]
    Notation(#[from] DecodeError),
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Why a single request for an engine move did not produce one.
#[derive(Debug, thiserror::Error)]
enum TurnFailure {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("engine process exited")]
    Exited,
    #[error("engine did not answer in time")]
    TimedOut,
    #[error("undecodable engine reply {0:?}")]
    Dropped(String),
    #[error("engine session is gone")]
    EventsClosed,
}

/// Result of asking the controller to play the engine's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineTurn {
    /// Nothing was asked of the engine: the game is over or the human is to move.
    Idle,
    Played(EnginePlay),
    /// The engine reported that it has no legal move.
    NoMove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePlay {
    pub decision: MoveDecision,
    pub params: SearchParameters,
    pub san: String,
    pub narration: String,
}

pub struct GameController {
    game: Game,
    human: Color,
    skill: i32,
    engine: EngineHandle,
    events: mpsc::Receiver<EngineEvent>,
}

impl GameController {
    pub fn new(
        game: Game,
        human: Color,
        skill: i32,
        engine: EngineHandle,
        events: mpsc::Receiver<EngineEvent>,
    ) -> Self {
        Self {
            game,
            human,
            skill,
            engine,
            events,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn human(&self) -> Color {
        self.human
    }

    pub fn skill(&self) -> i32 {
        self.skill
    }

    pub fn is_engine_turn(&self) -> bool {
        !self.game.is_over() && self.game.side_to_move() != self.human
    }

    /// Let the engine move if it is its turn.
    ///
    /// A failed request is retried once on a freshly started engine; a second
    /// failure is reported as [`ControllerError::EngineUnavailable`].
    pub async fn engine_turn(&mut self) -> Result<EngineTurn, ControllerError> {
        if !self.is_engine_turn() {
            return Ok(EngineTurn::Idle);
        }

        let fen = self.game.to_fen();
        let (decision, params) = match self.request_decision(&fen).await {
            Ok(answer) => answer,
            Err(first) => {
                tracing::warn!("Engine turn failed ({}), restarting engine", first);
                if let Err(e) = self.engine.stop().await {
                    tracing::debug!("Stopping engine before retry failed: {}", e);
                }
                self.request_decision(&fen).await.map_err(|second| {
                    tracing::error!("Engine turn failed again: {}", second);
                    ControllerError::EngineUnavailable(second.to_string())
                })?
            }
        };

        match decision {
            Decision::NoMove => {
                tracing::info!("Engine has no move in {}", fen);
                Ok(EngineTurn::NoMove)
            }
            Decision::Move(mv) => {
                // Narration needs the board as it was before the move.
                let narration = describe_move(&self.game, &mv);
                let entry = self.game.apply(&mv)?;
                tracing::info!("Engine played {} ({})", entry.san, narration);
                Ok(EngineTurn::Played(EnginePlay {
                    decision: mv,
                    params,
                    san: entry.san,
                    narration,
                }))
            }
        }
    }

    /// Play the human's move, given in engine notation such as `e2e4`.
    pub fn human_move(&mut self, notation: &str) -> Result<HistoryEntry, ControllerError> {
        if self.game.is_over() {
            return Err(ControllerError::GameOver);
        }
        if self.game.side_to_move() != self.human {
            return Err(ControllerError::NotYourTurn);
        }
        let decision = parse_uci_move(notation.trim())?;
        Ok(self.game.apply(&decision)?)
    }

    /// Take back moves until it is the human's turn again, at least one.
    /// Returns how many moves were taken back.
    pub fn undo_turn(&mut self) -> Result<usize, ControllerError> {
        self.game.undo()?;
        let mut undone = 1;
        while self.game.side_to_move() != self.human && !self.game.history().is_empty() {
            self.game.undo()?;
            undone += 1;
        }
        Ok(undone)
    }

    /// Stop the engine process and end the session.
    pub async fn shutdown(self) {
        if let Err(e) = self.engine.stop().await {
            tracing::debug!("Engine stop on shutdown failed: {}", e);
        }
        self.engine.shutdown().await;
    }

    async fn request_decision(
        &mut self,
        fen: &str,
    ) -> Result<(Decision, SearchParameters), TurnFailure> {
        // Anything queued from an earlier search no longer applies.
        while let Ok(stale) = self.events.try_recv() {
            tracing::debug!("Discarding stale engine event: {:?}", stale);
        }

        self.engine.start().await?;
        let params = self.engine.analyze(fen, self.skill).await?;

        loop {
            match self.events.recv().await {
                Some(EngineEvent::Decision(decision)) => return Ok((decision, params)),
                Some(EngineEvent::DecisionDropped { line, .. }) => {
                    return Err(TurnFailure::Dropped(line))
                }
                Some(EngineEvent::TimedOut) => return Err(TurnFailure::TimedOut),
                Some(EngineEvent::Exited) => return Err(TurnFailure::Exited),
                Some(EngineEvent::Uci { direction, line }) => {
                    tracing::trace!("{:?}: {}", direction, line);
                }
                None => return Err(TurnFailure::EventsClosed),
            }
        }
    }
}
