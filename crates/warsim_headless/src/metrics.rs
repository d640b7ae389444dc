//! Per-run metrics gathered from the event stream.
//!
//! [`MetricsCollector`] is an [`EventSink`], so it can sit next to (or
//! instead of) the JSON-lines sink and tally a run as it is played.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use warsim_core::engine::Termination;
use warsim_core::events::{Event, EventKind, EventSink};
use warsim_core::factions::FactionId;

/// What one faction did and suffered during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionMetrics {
    /// Orders staged for resolution.
    pub orders_accepted: u32,
    /// Orders rejected at intake.
    pub orders_rejected: u32,
    /// Rejections by reason.
    pub rejections: BTreeMap<String, u32>,
    /// Turns on which the producer missed its deadline.
    pub timeouts: u32,
    /// Engagements this faction initiated.
    pub engagements: u32,
    /// Engagements by phase tag.
    pub engagements_by_phase: BTreeMap<String, u32>,
    /// Strength lost across all units.
    pub strength_lost: u64,
    /// Own units destroyed.
    pub units_lost: u32,
    /// Reinforcements received.
    pub reinforcements: u32,
    /// Victory points at the end of the run.
    pub victory_points: u32,
}

/// Metrics for a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Run seed.
    pub seed: u64,
    /// Turns resolved.
    pub turns: u32,
    /// How the run ended, if it did.
    pub termination: Option<Termination>,
    /// Producer labels, Blue then Red.
    pub producers: (String, String),
    /// Blue totals.
    pub blue: FactionMetrics,
    /// Red totals.
    pub red: FactionMetrics,
    /// Events observed.
    pub events: u64,
    /// State hash after the last turn.
    pub final_state_hash: u64,
}

impl RunMetrics {
    /// Empty metrics for a new run.
    pub fn new(scenario: impl Into<String>, seed: u64) -> Self {
        Self {
            scenario: scenario.into(),
            seed,
            turns: 0,
            termination: None,
            producers: (String::new(), String::new()),
            blue: FactionMetrics::default(),
            red: FactionMetrics::default(),
            events: 0,
            final_state_hash: 0,
        }
    }

    /// Totals of one faction.
    #[must_use]
    pub fn faction(&self, faction: FactionId) -> &FactionMetrics {
        match faction {
            FactionId::Blue => &self.blue,
            FactionId::Red => &self.red,
        }
    }

    /// Mutable totals of one faction.
    pub fn faction_mut(&mut self, faction: FactionId) -> &mut FactionMetrics {
        match faction {
            FactionId::Blue => &mut self.blue,
            FactionId::Red => &mut self.red,
        }
    }

    /// The winner, if the run ended with one.
    #[must_use]
    pub fn winner(&self) -> Option<FactionId> {
        self.termination.and_then(|t| t.winner)
    }
}

/// Builds [`RunMetrics`] from events.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    metrics: RunMetrics,
    owners: BTreeMap<u32, FactionId>,
}

impl MetricsCollector {
    /// Start collecting for a run.
    pub fn new(scenario: impl Into<String>, seed: u64) -> Self {
        Self {
            metrics: RunMetrics::new(scenario, seed),
            owners: BTreeMap::new(),
        }
    }

    /// Fold one event into the totals.
    pub fn observe(&mut self, event: &Event) {
        let m = &mut self.metrics;
        m.events += 1;
        match &event.kind {
            EventKind::OrdersAccepted {
                faction,
                accepted,
                rejected,
            } => {
                let f = m.faction_mut(*faction);
                f.orders_accepted += accepted;
                f.orders_rejected += rejected;
            }
            EventKind::OrderRejected { faction, reason, .. } => {
                let key = format!("{reason:?}");
                let key = key.split([' ', '{', '(']).next().unwrap_or_default().to_string();
                *m.faction_mut(*faction).rejections.entry(key).or_default() += 1;
            }
            EventKind::OrdersTimedOut { faction } => m.faction_mut(*faction).timeouts += 1,
            EventKind::EngagementResolved(record) => {
                let f = m.faction_mut(record.faction);
                f.engagements += 1;
                *f.engagements_by_phase
                    .entry(record.phase.tag().to_string())
                    .or_default() += 1;
            }
            EventKind::UnitLosses { unit, faction, amount, .. } => {
                self.owners.insert(*unit, *faction);
                m.faction_mut(*faction).strength_lost += u64::from(*amount);
            }
            EventKind::UnitDestroyed { faction, .. } => m.faction_mut(*faction).units_lost += 1,
            EventKind::ReinforcementArrived { faction, .. } => m.faction_mut(*faction).reinforcements += 1,
            EventKind::TurnCompleted {
                blue_vp,
                red_vp,
                state_hash,
            } => {
                m.turns = event.turn;
                m.blue.victory_points = *blue_vp;
                m.red.victory_points = *red_vp;
                m.final_state_hash = *state_hash;
            }
            EventKind::RunTerminated { reason, winner } => {
                m.termination = Some(Termination {
                    turn: event.turn,
                    reason: *reason,
                    winner: *winner,
                });
            }
            _ => {}
        }
    }

    /// Record the producer labels.
    pub fn set_producers(&mut self, blue: impl Into<String>, red: impl Into<String>) {
        self.metrics.producers = (blue.into(), red.into());
    }

    /// Units seen taking losses.
    #[must_use]
    pub fn units_hit(&self) -> usize {
        self.owners.len()
    }

    /// Metrics so far.
    #[must_use]
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Finish collecting.
    #[must_use]
    pub fn finish(self) -> RunMetrics {
        self.metrics
    }
}

impl EventSink for MetricsCollector {
    fn record(&mut self, event: &Event) {
        self.observe(event);
    }
}

/// Tallies over a batch of runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Runs executed.
    pub total_runs: u32,
    /// Runs won, by faction short name.
    pub wins_by_faction: BTreeMap<String, u32>,
    /// Runs ended without a winner.
    pub draws: u32,
    /// Runs stopped before any terminal condition.
    pub unfinished: u32,
    /// Terminations by reason.
    pub terminations: BTreeMap<String, u32>,
    /// Mean turns per run.
    pub avg_turns: f64,
    /// Shortest run.
    pub min_turns: u32,
    /// Longest run.
    pub max_turns: u32,
    /// Producer timeouts across all runs.
    pub total_timeouts: u32,
    /// Rejected orders across all runs.
    pub total_rejections: u32,
}

impl BatchSummary {
    /// Summarize `runs`.
    #[must_use]
    pub fn from_runs(runs: &[RunMetrics]) -> Self {
        if runs.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_runs: runs.len() as u32,
            min_turns: u32::MAX,
            ..Default::default()
        };
        let mut turn_sum = 0u64;

        for run in runs {
            turn_sum += u64::from(run.turns);
            summary.min_turns = summary.min_turns.min(run.turns);
            summary.max_turns = summary.max_turns.max(run.turns);

            match run.termination {
                Some(termination) => {
                    *summary
                        .terminations
                        .entry(format!("{:?}", termination.reason))
                        .or_default() += 1;
                    match termination.winner {
                        Some(winner) => {
                            *summary
                                .wins_by_faction
                                .entry(winner.short_name().to_string())
                                .or_default() += 1;
                        }
                        None => summary.draws += 1,
                    }
                }
                None => summary.unfinished += 1,
            }

            for faction in FactionId::ALL {
                let f = run.faction(faction);
                summary.total_timeouts += f.timeouts;
                summary.total_rejections += f.orders_rejected;
            }
        }

        summary.avg_turns = turn_sum as f64 / runs.len() as f64;
        summary
    }

    /// Wins recorded for `faction`.
    #[must_use]
    pub fn wins(&self, faction: FactionId) -> u32 {
        self.wins_by_faction.get(faction.short_name()).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Runs: {}", self.total_runs)?;
        for (faction, wins) in &self.wins_by_faction {
            writeln!(f, "  {faction} wins: {wins}")?;
        }
        writeln!(f, "  draws: {}", self.draws)?;
        if self.unfinished > 0 {
            writeln!(f, "  unfinished: {}", self.unfinished)?;
        }
        for (reason, count) in &self.terminations {
            writeln!(f, "  ended by {reason}: {count}")?;
        }
        writeln!(
            f,
            "Turns: avg {:.1}, min {}, max {}",
            self.avg_turns, self.min_turns, self.max_turns
        )?;
        write!(
            f,
            "Timeouts: {}, rejected orders: {}",
            self.total_timeouts, self.total_rejections
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warsim_core::events::{EventLog, TerminationReason};
    use warsim_core::intake::RejectionReason;
    use warsim_core::unit::LossCause;

    fn played() -> RunMetrics {
        let mut log = EventLog::new();
        log.push(
            1,
            None,
            EventKind::OrdersAccepted {
                faction: FactionId::Blue,
                accepted: 3,
                rejected: 1,
            },
        );
        log.push(
            1,
            None,
            EventKind::OrderRejected {
                faction: FactionId::Blue,
                unit: Some(4),
                reason: RejectionReason::WrongTurn { expected: 1, got: 2 },
            },
        );
        log.push(1, None, EventKind::OrdersTimedOut { faction: FactionId::Red });
        log.push(
            1,
            None,
            EventKind::UnitLosses {
                unit: 9,
                faction: FactionId::Red,
                amount: 12,
                cause: LossCause::Combat,
                remaining: 88,
            },
        );
        log.push(
            1,
            None,
            EventKind::TurnCompleted {
                blue_vp: 15,
                red_vp: 0,
                state_hash: 42,
            },
        );
        log.push(
            1,
            None,
            EventKind::RunTerminated {
                reason: TerminationReason::VictoryPoints,
                winner: Some(FactionId::Blue),
            },
        );

        let mut collector = MetricsCollector::new("test", 5);
        for event in log.events() {
            collector.record(event);
        }
        assert_eq!(collector.units_hit(), 1);
        collector.finish()
    }

    #[test]
    fn test_collector_tallies_events() {
        let metrics = played();
        assert_eq!(metrics.events, 6);
        assert_eq!(metrics.turns, 1);
        assert_eq!(metrics.blue.orders_accepted, 3);
        assert_eq!(metrics.blue.orders_rejected, 1);
        assert_eq!(metrics.blue.rejections.get("WrongTurn"), Some(&1));
        assert_eq!(metrics.red.timeouts, 1);
        assert_eq!(metrics.red.strength_lost, 12);
        assert_eq!(metrics.blue.victory_points, 15);
        assert_eq!(metrics.final_state_hash, 42);
        assert_eq!(metrics.winner(), Some(FactionId::Blue));
    }

    #[test]
    fn test_batch_summary() {
        let won = played();
        let mut drawn = RunMetrics::new("test", 6);
        drawn.turns = 12;
        drawn.termination = Some(Termination {
            turn: 12,
            reason: TerminationReason::TurnLimit,
            winner: None,
        });
        let unfinished = RunMetrics::new("test", 7);

        let summary = BatchSummary::from_runs(&[won, drawn, unfinished]);
        assert_eq!(summary.total_runs, 3);
        assert_eq!(summary.wins(FactionId::Blue), 1);
        assert_eq!(summary.wins(FactionId::Red), 0);
        assert_eq!(summary.draws, 1);
        assert_eq!(summary.unfinished, 1);
        assert_eq!(summary.terminations.get("TurnLimit"), Some(&1));
        assert_eq!(summary.min_turns, 0);
        assert_eq!(summary.max_turns, 12);
        assert!((summary.avg_turns - 13.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.total_timeouts, 1);
        assert_eq!(summary.total_rejections, 1);
        assert!(summary.to_string().contains("blue wins: 1"));
    }

    #[test]
    fn test_empty_batch_summary() {
        let summary = BatchSummary::from_runs(&[]);
        assert_eq!(summary.total_runs, 0);
        assert_eq!(summary.min_turns, 0);
    }
}
