//! Async turn runner.
//!
//! Drives an [`Engine`] with one producer per faction. Each turn both
//! producers get a clone of their own faction view and are awaited
//! together under the same deadline; a late producer's faction stands fast
//! for the turn. The engine itself never awaits anything.

use tokio::time::timeout;
use tracing::{debug, info, warn};
use warsim_core::engine::{CancelHandle, Engine, Termination, TurnResult};
use warsim_core::error::{EngineError, Result};
use warsim_core::events::EventSink;
use warsim_core::factions::FactionId;
use warsim_core::orders::{OrdersPayload, Submission};
use warsim_core::replay::Replay;
use warsim_core::turn::VictoryPoints;

use crate::config::RunnerConfig;
use crate::producers::OrderProducer;

/// How a run driven by [`TurnRunner::run_to_end`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Turns resolved by this call.
    pub turns: u32,
    /// Terminal condition, if one was reached.
    pub termination: Option<Termination>,
    /// Cancellation stopped the run.
    pub cancelled: bool,
    /// Tally at the end.
    pub victory_points: VictoryPoints,
    /// State hash at the end.
    pub state_hash: u64,
}

/// Runs turns with two producers.
#[derive(Debug)]
pub struct TurnRunner<B, R> {
    engine: Engine,
    blue: B,
    red: R,
    config: RunnerConfig,
    initial_state: Vec<u8>,
}

impl<B: OrderProducer, R: OrderProducer> TurnRunner<B, R> {
    /// Take over `engine`. Its current state is kept as the replay start.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be snapshotted.
    pub fn new(engine: Engine, blue: B, red: R, config: RunnerConfig) -> Result<Self> {
        let initial_state = engine.snapshot()?;
        Ok(Self {
            engine,
            blue,
            red,
            config,
            initial_state,
        })
    }

    /// The engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Give the engine back.
    pub fn into_engine(self) -> Engine {
        self.engine
    }

    /// Handle that stops the run before its next turn.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.engine.cancel_handle()
    }

    /// Producer labels, Blue then Red.
    pub fn producer_names(&self) -> (String, String) {
        (self.blue.name(), self.red.name())
    }

    /// Collect both factions' orders and resolve one turn.
    ///
    /// # Errors
    ///
    /// Returns whatever [`Engine::resolve_turn`] returns.
    pub async fn step(&mut self) -> Result<TurnResult> {
        if self.engine.is_terminated() {
            return Err(EngineError::RunTerminated);
        }
        let cancel = self.engine.cancel_handle();
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled {
                turn: self.engine.turn(),
            });
        }

        let turn = self.engine.turn() + 1;
        let blue_view = self.engine.fog_view(FactionId::Blue);
        let red_view = self.engine.fog_view(FactionId::Red);
        let deadline = self.config.timeout();

        let (blue, red) = tokio::join!(
            timeout(deadline, self.blue.produce(blue_view)),
            timeout(deadline, self.red.produce(red_view)),
        );
        let blue = submission(FactionId::Blue, turn, blue.ok());
        let red = submission(FactionId::Red, turn, red.ok());

        let result = self.engine.resolve_turn(blue, red)?;
        debug!(
            turn = result.turn,
            events = result.events.len(),
            blue_vp = result.victory_points.blue,
            red_vp = result.victory_points.red,
            "turn resolved"
        );
        Ok(result)
    }

    /// Play until the run terminates, is cancelled, or reaches the
    /// configured turn cap. Every event goes to `sink` in order.
    ///
    /// # Errors
    ///
    /// Returns the first engine error other than cancellation.
    pub async fn run_to_end<S: EventSink>(&mut self, sink: &mut S) -> Result<RunOutcome> {
        let mut turns = 0;
        let mut cancelled = false;
        while !self.engine.is_terminated() && self.config.max_turns.map_or(true, |cap| turns < cap) {
            match self.step().await {
                Ok(result) => {
                    for event in &result.events {
                        sink.record(event);
                    }
                    turns += 1;
                }
                Err(EngineError::Cancelled { turn }) => {
                    info!(turn, "run cancelled");
                    cancelled = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let outcome = RunOutcome {
            turns,
            termination: self.engine.termination(),
            cancelled,
            victory_points: self.engine.victory_points(),
            state_hash: self.engine.state_hash(),
        };
        if let Some(t) = outcome.termination {
            info!(turn = t.turn, reason = ?t.reason, winner = ?t.winner, "run finished");
        }
        Ok(outcome)
    }

    /// A replay of every turn played since the runner was created.
    ///
    /// # Errors
    ///
    /// Returns an error if the replay cannot be assembled.
    pub fn replay(&self) -> Result<Replay> {
        Replay::capture(self.initial_state.clone(), &self.engine)
    }
}

fn submission(faction: FactionId, turn: u32, produced: Option<OrdersPayload>) -> Submission {
    match produced {
        Some(payload) => payload.into(),
        None => {
            warn!(%faction, turn, "order producer missed its deadline");
            Submission::TimedOut
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::doctrine::Doctrine;
    use crate::producers::{Delayed, DoctrineProducer, IdleProducer};
    use warsim_core::config::EngineConfig;
    use warsim_core::events::{EventKind, EventLog};
    use warsim_core::replay::ReplayPlayer;
    use warsim_test_utils::fixtures::frontline_engine;

    fn doctrine_runner(seed: u64) -> TurnRunner<DoctrineProducer, DoctrineProducer> {
        let engine = frontline_engine(seed, EngineConfig::default());
        let catalog = engine.shared_catalog();
        TurnRunner::new(
            engine,
            DoctrineProducer::new(Doctrine::balanced(), Arc::clone(&catalog)),
            DoctrineProducer::new(Doctrine::offensive(), catalog),
            RunnerConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_step_resolves_one_turn() {
        let mut runner = doctrine_runner(3);
        let result = runner.step().await.unwrap();
        assert_eq!(result.turn, 1);
        assert_eq!(runner.engine().turn(), 1);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.kind, EventKind::OrdersAccepted { faction: FactionId::Red, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_producer_times_out() {
        let engine = frontline_engine(3, EngineConfig::default());
        let mut runner = TurnRunner::new(
            engine,
            IdleProducer,
            Delayed::new(IdleProducer, Duration::from_secs(10)),
            RunnerConfig::default().with_timeout_ms(100),
        )
        .unwrap();

        let result = runner.step().await.unwrap();
        let timed_out: Vec<FactionId> = result
            .events
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::OrdersTimedOut { faction } => Some(faction),
                _ => None,
            })
            .collect();
        assert_eq!(timed_out, vec![FactionId::Red]);
        assert!(runner.engine().history()[0].any_timed_out());
    }

    #[tokio::test]
    async fn test_run_to_end_respects_turn_cap() {
        let mut runner = doctrine_runner(11);
        runner.config = RunnerConfig::default().with_max_turns(3);
        let mut log = EventLog::new();

        let outcome = runner.run_to_end(&mut log).await.unwrap();
        assert!(outcome.turns <= 3);
        assert!(!outcome.cancelled);
        assert_eq!(outcome.state_hash, runner.engine().state_hash());
        assert_eq!(log.events(), runner.engine().events().events());
    }

    #[tokio::test]
    async fn test_cancel_stops_before_next_turn() {
        let mut runner = doctrine_runner(5);
        runner.step().await.unwrap();
        runner.cancel_handle().cancel();

        let mut log = EventLog::new();
        let outcome = runner.run_to_end(&mut log).await.unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.turns, 0);
        assert!(log.is_empty());
        assert_eq!(runner.engine().turn(), 1);
    }

    #[tokio::test]
    async fn test_replay_verifies() {
        let mut runner = doctrine_runner(8);
        runner.config = RunnerConfig::default().with_max_turns(2);
        runner.run_to_end(&mut crate::sink::NullSink).await.unwrap();

        let replay = runner.replay().unwrap();
        assert_eq!(replay.turn_count(), runner.engine().turn() as usize);
        let mut player =
            ReplayPlayer::new(replay, runner.engine().shared_catalog(), EngineConfig::default()).unwrap();
        assert_eq!(player.verify().unwrap(), runner.engine().state_hash());
    }

    #[tokio::test]
    async fn test_same_seed_same_outcome() {
        let mut a = doctrine_runner(21);
        let mut b = doctrine_runner(21);
        a.config = RunnerConfig::default().with_max_turns(3);
        b.config = RunnerConfig::default().with_max_turns(3);
        let first = a.run_to_end(&mut crate::sink::NullSink).await.unwrap();
        let second = b.run_to_end(&mut crate::sink::NullSink).await.unwrap();
        assert_eq!(first, second);
    }
}
