//! Replay recording and verification.
//!
//! A replay stores the engine snapshot taken before the first turn and the
//! two submissions of every turn, timeouts included. Because resolution is
//! deterministic, re-resolving the submissions from the snapshot
//! reproduces the run exactly.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::orders::Submission;

/// Both factions' submissions for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayTurn {
    /// Turn number.
    pub turn: u32,
    /// Blue submission.
    pub blue: Submission,
    /// Red submission.
    pub red: Submission,
}

impl ReplayTurn {
    /// Whether either producer missed its deadline.
    #[must_use]
    pub fn any_timed_out(&self) -> bool {
        matches!(self.blue, Submission::TimedOut) || matches!(self.red, Submission::TimedOut)
    }
}

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Scenario name.
    pub scenario_name: String,
    /// Run seed.
    pub seed: u64,
    /// Engine snapshot before the first recorded turn.
    pub initial_state: Vec<u8>,
    /// Submissions in turn order.
    pub turns: Vec<ReplayTurn>,
    /// Last resolved turn.
    pub final_turn: u32,
    /// State hash after the last resolved turn.
    pub final_hash: u64,
}

impl Replay {
    /// Build a replay from the snapshot taken at the start of the run and
    /// the engine as it stands now.
    ///
    /// Turns already present in the snapshot's history are not repeated.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidState`] if `engine` has a turn open.
    pub fn capture(initial_state: Vec<u8>, engine: &Engine) -> Result<Self> {
        if engine.next_phase().is_some() {
            return Err(EngineError::InvalidState("cannot capture a replay mid-turn".into()));
        }
        let start = Engine::restore(&initial_state, engine.shared_catalog(), engine.config().clone())?.turn();
        let turns = engine
            .history()
            .iter()
            .filter(|t| t.turn > start)
            .cloned()
            .collect();
        Ok(Self {
            version: REPLAY_VERSION,
            scenario_name: engine.rules().name.clone(),
            seed: engine.rules().seed,
            initial_state,
            turns,
            final_turn: engine.turn(),
            final_hash: engine.state_hash(),
        })
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| EngineError::InvalidState(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| EngineError::InvalidState(format!("Failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if file reading or deserialization fails, or the
    /// file was written by another format version.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| EngineError::InvalidState(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| EngineError::InvalidState(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(EngineError::InvalidState(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }

        Ok(replay)
    }

    /// Number of recorded turns.
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Number of recorded turns in which a producer timed out.
    #[must_use]
    pub fn timeout_count(&self) -> usize {
        self.turns.iter().filter(|t| t.any_timed_out()).count()
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    catalog: Arc<Catalog>,
    config: EngineConfig,
    engine: Engine,
    cursor: usize,
}

impl ReplayPlayer {
    /// Create a player positioned before the first recorded turn.
    ///
    /// # Errors
    /// Returns an error if the initial state cannot be restored.
    pub fn new(replay: Replay, catalog: Arc<Catalog>, config: EngineConfig) -> Result<Self> {
        let engine = Engine::restore(&replay.initial_state, Arc::clone(&catalog), config.clone())?;
        Ok(Self {
            replay,
            catalog,
            config,
            engine,
            cursor: 0,
        })
    }

    /// Resolve the next recorded turn.
    ///
    /// Returns `Ok(false)` once every turn has been played.
    ///
    /// # Errors
    /// Returns any error the engine reports while resolving.
    pub fn advance(&mut self) -> Result<bool> {
        let Some(turn) = self.replay.turns.get(self.cursor) else {
            return Ok(false);
        };
        self.engine.resolve_turn(turn.blue.clone(), turn.red.clone())?;
        self.cursor += 1;
        Ok(self.cursor < self.replay.turns.len())
    }

    /// Restart from the initial state and play `turns` recorded turns.
    ///
    /// # Errors
    /// Returns an error if state restoration or resolution fails.
    pub fn seek(&mut self, turns: usize) -> Result<()> {
        self.engine = Engine::restore(
            &self.replay.initial_state,
            Arc::clone(&self.catalog),
            self.config.clone(),
        )?;
        self.cursor = 0;
        while self.cursor < turns.min(self.replay.turns.len()) {
            self.advance()?;
        }
        Ok(())
    }

    /// Recorded turns played so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// The engine in its replayed state.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Whether every recorded turn has been played.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.replay.turns.len()
    }

    /// Progress as a percentage (0-100).
    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        if self.replay.turns.is_empty() {
            100
        } else {
            (self.cursor * 100 / self.replay.turns.len()) as u32
        }
    }

    /// Re-resolve every recorded turn and compare the final state hash.
    ///
    /// Returns the matching hash.
    ///
    /// # Errors
    /// Returns [`EngineError::DesyncDetected`] if the hash differs, or any
    /// error raised while replaying.
    pub fn verify(&mut self) -> Result<u64> {
        self.seek(self.replay.turns.len())?;
        let actual = self.engine.state_hash();
        if actual != self.replay.final_hash {
            return Err(EngineError::DesyncDetected {
                turn: self.engine.turn(),
                expected: self.replay.final_hash,
                actual,
            });
        }
        Ok(actual)
    }
}
