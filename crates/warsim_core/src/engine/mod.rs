//! Phase scheduler.
//!
//! The [`Engine`] owns the world and resolves one turn at a time: order
//! intake, then the ten phases in fixed order, then terminal checks. Each
//! fighting phase discovers its engagements from the staged orders, groups
//! them into waves of disjoint footprints and resolves every wave
//! sequentially or on the rayon pool. Deltas are always applied in
//! tie-break order, and every engagement draws from its own RNG stream, so
//! both modes produce the same events and the same state hash.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use warsim_core::prelude::*;
//!
//! let mut world = WorldState::new(HexMap::new(8, 8, Terrain::Plains), 6, Weather::Clear);
//! let catalog = Arc::new(Catalog::standard());
//! place(&mut world, &catalog, FactionId::Blue, "infantry_brigade", HexCoord::new(1, 1), None).unwrap();
//! place(&mut world, &catalog, FactionId::Red, "infantry_brigade", HexCoord::new(6, 6), None).unwrap();
//!
//! let mut engine = Engine::new(world, catalog, EngineConfig::default(), RunRules::new("demo", 1, 2));
//! let result = engine
//!     .resolve_turn(OrdersPayload::empty(FactionId::Blue, 1), OrdersPayload::empty(FactionId::Red, 1))
//!     .unwrap();
//! assert_eq!(result.turn, 1);
//! assert!(result.termination.is_none());
//! ```

mod apply;
pub mod schedule;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::catalog::Catalog;
use crate::combat::{
    resolver_for, AirEngagement, CombatOutcome, Engagement, EngagementKind, Resolution,
    ResolveContext, Resolver,
};
use crate::config::EngineConfig;
use crate::effects::ActiveEffects;
use crate::error::{EngineError, Result};
use crate::events::{Event, EventKind, EventLog, TerminationReason, VpReason};
use crate::factions::FactionId;
use crate::fog::{FactionView, FogOfWar, IntelQuality};
use crate::intake::{self, StagedOrders, ValidatedOrders};
use crate::logistics::run_logistics;
use crate::orders::{AirMission, OrdersPayload, Submission};
use crate::replay::ReplayTurn;
use crate::rng::TurnRng;
use crate::scenario::{place, RunRules, Scenario};
use crate::turn::{Phase, VictoryPoints};
use crate::unit::UnitId;
use crate::world::WorldState;

use apply::Applier;

/// Requests a stop between turns. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Ask the engine to stop before the next turn.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How and when a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Termination {
    /// Turn on which the condition was met.
    pub turn: u32,
    /// Condition met.
    pub reason: TerminationReason,
    /// Winning faction, `None` for a draw.
    pub winner: Option<FactionId>,
}

/// Everything a resolved turn produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResult {
    /// Turn number.
    pub turn: u32,
    /// Events of the turn in sequence order.
    pub events: Vec<Event>,
    /// Running tally after the turn.
    pub victory_points: VictoryPoints,
    /// Set when the run ended on this turn.
    pub termination: Option<Termination>,
}

/// A turn between `begin_turn` and `finish_turn`.
#[derive(Debug)]
struct OpenTurn {
    orders: StagedOrders,
    next: Option<Phase>,
    first_seq: u64,
}

/// What happened to one engagement of a wave.
enum Settled {
    Cancelled(UnitId),
    Resolved(Result<Resolution>),
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    world: &'a WorldState,
    rules: &'a RunRules,
    effects: &'a ActiveEffects,
    fog: &'a FogOfWar,
    log: &'a EventLog,
    history: &'a [ReplayTurn],
    termination: &'a Option<Termination>,
}

#[derive(Deserialize)]
struct Snapshot {
    world: WorldState,
    rules: RunRules,
    effects: ActiveEffects,
    fog: FogOfWar,
    log: EventLog,
    history: Vec<ReplayTurn>,
    termination: Option<Termination>,
}

/// The turn resolution engine for one run.
#[derive(Debug)]
pub struct Engine {
    world: WorldState,
    catalog: Arc<Catalog>,
    config: EngineConfig,
    rules: RunRules,
    effects: ActiveEffects,
    fog: FogOfWar,
    log: EventLog,
    history: Vec<ReplayTurn>,
    termination: Option<Termination>,
    open: Option<OpenTurn>,
    cancel: CancelHandle,
}

impl Engine {
    /// Create an engine over a built world.
    #[must_use]
    pub fn new(world: WorldState, catalog: Arc<Catalog>, config: EngineConfig, rules: RunRules) -> Self {
        let mut fog = FogOfWar::default();
        fog.recompute(&world, &catalog, &ActiveEffects::new(), rules.seed);
        Self {
            world,
            catalog,
            config,
            rules,
            effects: ActiveEffects::new(),
            fog,
            log: EventLog::new(),
            history: Vec::new(),
            termination: None,
            open: None,
            cancel: CancelHandle::default(),
        }
    }

    /// Build the scenario and create an engine for it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scenario`] if the scenario does not build
    /// against `catalog`.
    pub fn from_scenario(scenario: &Scenario, catalog: Arc<Catalog>, config: EngineConfig) -> Result<Self> {
        let (world, rules) = scenario.build(&catalog)?;
        Ok(Self::new(world, catalog, config, rules))
    }

    /// True world state.
    #[must_use]
    pub const fn world(&self) -> &WorldState {
        &self.world
    }

    /// Reference catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Shared handle to the catalog.
    #[must_use]
    pub fn shared_catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    /// Engine settings.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run rules.
    #[must_use]
    pub const fn rules(&self) -> &RunRules {
        &self.rules
    }

    /// Active effects.
    #[must_use]
    pub const fn effects(&self) -> &ActiveEffects {
        &self.effects
    }

    /// Both factions' intel reports.
    #[must_use]
    pub const fn fog(&self) -> &FogOfWar {
        &self.fog
    }

    /// Every event recorded so far.
    #[must_use]
    pub const fn events(&self) -> &EventLog {
        &self.log
    }

    /// Submissions of every resolved or open turn.
    #[must_use]
    pub fn history(&self) -> &[ReplayTurn] {
        &self.history
    }

    /// Last completed (or currently open) turn.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.world.clock.turn
    }

    /// Current victory point tally.
    #[must_use]
    pub const fn victory_points(&self) -> VictoryPoints {
        self.world.clock.victory_points
    }

    /// How the run ended, if it has.
    #[must_use]
    pub const fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Whether a terminal condition has been reached.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.termination.is_some()
    }

    /// The phase `run_phase` expects next, `None` between turns or after
    /// Logistics.
    #[must_use]
    pub fn next_phase(&self) -> Option<Phase> {
        self.open.as_ref().and_then(|open| open.next)
    }

    /// Handle for stopping the run between turns.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// What `faction` is allowed to see.
    #[must_use]
    pub fn fog_view(&self, faction: FactionId) -> FactionView {
        self.fog.view(faction, &self.world, self.config.exposure_threshold())
    }

    /// Hash of the world and the active-effects table.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.world.hash(&mut hasher);
        self.effects.hash(&mut hasher);
        hasher.finish()
    }

    /// Resolve a whole turn.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Cancelled`] if cancellation was requested,
    /// [`EngineError::RunTerminated`] after a terminal condition, or an
    /// error from the step-wise API if a turn is already open.
    pub fn resolve_turn(
        &mut self,
        blue: impl Into<Submission>,
        red: impl Into<Submission>,
    ) -> Result<TurnResult> {
        self.begin_turn(blue, red)?;
        for phase in Phase::ALL {
            self.run_phase(phase)?;
        }
        self.finish_turn()
    }

    /// Open the next turn: advance the clock, reset per-turn state and
    /// validate both submissions.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Cancelled`], [`EngineError::RunTerminated`]
    /// or [`EngineError::InvalidState`] when a turn is already open.
    pub fn begin_turn(&mut self, blue: impl Into<Submission>, red: impl Into<Submission>) -> Result<()> {
        if self.termination.is_some() {
            return Err(EngineError::RunTerminated);
        }
        if self.open.is_some() {
            return Err(EngineError::InvalidState(format!(
                "turn {} is still open",
                self.world.clock.turn
            )));
        }
        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled {
                turn: self.world.clock.turn,
            });
        }
        let (blue, red) = (blue.into(), red.into());

        self.world.clock.turn += 1;
        let turn = self.world.clock.turn;
        if let Some(weather) = self.rules.weather.get(&turn) {
            self.world.clock.weather = *weather;
        }
        self.effects.reset(self.config.effect_persistence);
        for unit in self.world.units_mut() {
            unit.reset_turn_flags();
        }

        let first_seq = self.log.len() as u64;
        self.log.push(
            turn,
            None,
            EventKind::TurnStarted {
                weather: self.world.clock.weather,
                time_of_day: self.world.clock.time_of_day(),
            },
        );
        debug!(turn, first_mover = %FactionId::first_mover(turn), "turn started");

        let blue_orders = self.intake(FactionId::Blue, &blue);
        let red_orders = self.intake(FactionId::Red, &red);
        for id in blue_orders.tasked.iter().chain(&red_orders.tasked) {
            if let Some(unit) = self.world.unit_mut(*id) {
                unit.tasked = true;
            }
        }

        self.history.push(ReplayTurn { turn, blue, red });
        self.open = Some(OpenTurn {
            orders: StagedOrders {
                blue: blue_orders,
                red: red_orders,
            },
            next: Some(Phase::Intel),
            first_seq,
        });
        Ok(())
    }

    /// Run `phase`, which must be the next phase of the open turn.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PhaseOutOfSequence`] for any other phase, or
    /// when no turn is open.
    pub fn run_phase(&mut self, phase: Phase) -> Result<()> {
        let expected = self.next_phase();
        if expected != Some(phase) {
            return Err(EngineError::PhaseOutOfSequence {
                expected,
                requested: phase,
            });
        }
        let turn = self.world.clock.turn;
        self.world.clock.phase = Some(phase);
        self.log.push(turn, Some(phase), EventKind::PhaseStarted);

        match phase {
            Phase::Intel => self.run_intel(),
            Phase::Logistics => self.run_logistics(),
            _ => {
                if let Some(resolver) = resolver_for(phase) {
                    self.run_engagements(phase, resolver);
                }
            }
        }

        if let Some(open) = self.open.as_mut() {
            open.next = phase.next();
        }
        Ok(())
    }

    /// Close the open turn after Logistics: check terminal conditions and
    /// record the state hash.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidState`] when no turn is open or a
    /// phase has not run yet.
    pub fn finish_turn(&mut self) -> Result<TurnResult> {
        let Some(open) = self.open.take() else {
            return Err(EngineError::InvalidState("no turn is open".into()));
        };
        if let Some(next) = open.next {
            self.open = Some(open);
            return Err(EngineError::InvalidState(format!("phase {next} has not run")));
        }
        let turn = self.world.clock.turn;
        self.world.clock.phase = None;

        #[cfg(feature = "debug-validation")]
        self.check_invariants(open.first_seq)?;

        let termination = self.terminal_condition();
        let state_hash = self.state_hash();
        #[cfg(debug_assertions)]
        debug!(turn, state_hash, "turn state hash");

        let victory_points = self.world.clock.victory_points;
        self.log.push(
            turn,
            None,
            EventKind::TurnCompleted {
                blue_vp: victory_points.blue,
                red_vp: victory_points.red,
                state_hash,
            },
        );
        if let Some(end) = termination {
            info!(turn, reason = ?end.reason, winner = ?end.winner, "run terminated");
            self.log.push(
                turn,
                None,
                EventKind::RunTerminated {
                    reason: end.reason,
                    winner: end.winner,
                },
            );
            self.termination = Some(end);
        }

        Ok(TurnResult {
            turn,
            events: self.log.since(open.first_seq).to_vec(),
            victory_points,
            termination,
        })
    }

    /// Encode world, log and run state. Only valid between turns.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidState`] while a turn is open or if
    /// encoding fails.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        if self.open.is_some() {
            return Err(EngineError::InvalidState(format!(
                "cannot snapshot while turn {} is open",
                self.world.clock.turn
            )));
        }
        let snapshot = SnapshotRef {
            world: &self.world,
            rules: &self.rules,
            effects: &self.effects,
            fog: &self.fog,
            log: &self.log,
            history: &self.history,
            termination: &self.termination,
        };
        bincode::serialize(&snapshot)
            .map_err(|e| EngineError::InvalidState(format!("failed to encode snapshot: {e}")))
    }

    /// Resume from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidState`] if the bytes do not decode.
    pub fn restore(bytes: &[u8], catalog: Arc<Catalog>, config: EngineConfig) -> Result<Self> {
        let snapshot: Snapshot = bincode::deserialize(bytes)
            .map_err(|e| EngineError::InvalidState(format!("failed to decode snapshot: {e}")))?;
        Ok(Self {
            world: snapshot.world,
            catalog,
            config,
            rules: snapshot.rules,
            effects: snapshot.effects,
            fog: snapshot.fog,
            log: snapshot.log,
            history: snapshot.history,
            termination: snapshot.termination,
            open: None,
            cancel: CancelHandle::default(),
        })
    }

    fn applier(&mut self, phase: Phase) -> Applier<'_> {
        Applier {
            world: &mut self.world,
            catalog: &self.catalog,
            effects: &mut self.effects,
            fog: &mut self.fog,
            log: &mut self.log,
            phase,
            intel_lost: false,
        }
    }

    fn intake(&mut self, faction: FactionId, submission: &Submission) -> ValidatedOrders {
        let turn = self.world.clock.turn;
        let defaults;
        let payload = match submission {
            Submission::Delivered(payload) => payload,
            Submission::TimedOut => {
                warn!(turn, faction = %faction, "orders timed out, standing fast");
                self.log.push(turn, None, EventKind::OrdersTimedOut { faction });
                defaults = OrdersPayload::empty(faction, turn);
                &defaults
            }
        };

        let outcome = intake::validate(&self.world, &self.catalog, faction, payload);
        for rejection in &outcome.rejections {
            warn!(
                turn,
                faction = %faction,
                unit = ?rejection.unit,
                reason = ?rejection.reason,
                "order rejected"
            );
            self.log.push(
                turn,
                None,
                EventKind::OrderRejected {
                    faction,
                    unit: rejection.unit,
                    reason: rejection.reason,
                },
            );
        }
        if matches!(submission, Submission::Delivered(_)) {
            self.log.push(
                turn,
                None,
                EventKind::OrdersAccepted {
                    faction,
                    accepted: outcome.orders.len() as u32,
                    rejected: outcome.rejections.len() as u32,
                },
            );
        }
        outcome.orders
    }

    fn run_intel(&mut self) {
        self.fog
            .recompute(&self.world, &self.catalog, &self.effects, self.rules.seed);
        let threshold = self.config.exposure_threshold();
        let turn = self.world.clock.turn;
        for faction in FactionId::ALL {
            let (contacts, confirmed) = self
                .fog
                .reports(faction)
                .filter(|r| r.confidence >= threshold)
                .fold((0u32, 0u32), |(all, confirmed), r| {
                    (all + 1, confirmed + u32::from(r.quality == IntelQuality::Confirmed))
                });
            self.log.push(
                turn,
                Some(Phase::Intel),
                EventKind::IntelUpdated {
                    faction,
                    contacts,
                    confirmed,
                },
            );
        }
    }

    fn run_engagements(&mut self, phase: Phase, resolver: &'static dyn Resolver) {
        let turn = self.world.clock.turn;
        let engagements = match &self.open {
            Some(open) => schedule::discover(&open.orders, phase, turn),
            None => return,
        };
        let mut intel_lost = false;
        let mut start = 0;
        let mut waves = 0u32;
        while start < engagements.len() {
            let len = schedule::next_wave(&engagements, start, resolver, &self.world, &self.catalog);
            let wave = &engagements[start..start + len];
            let settled = self.resolve_wave(phase, resolver, wave);
            for (engagement, outcome) in wave.iter().zip(settled) {
                intel_lost |= self.settle(phase, engagement, outcome);
            }
            start += len;
            waves += 1;
        }
        debug!(turn, phase = %phase, engagements = engagements.len(), waves, "phase resolved");

        if intel_lost {
            self.refresh_fog(phase);
        }
    }

    /// Re-derive sensor coverage after an intel asset is lost. Same-turn
    /// boosts are kept.
    fn refresh_fog(&mut self, phase: Phase) {
        self.fog
            .refresh(&self.world, &self.catalog, &self.effects, self.rules.seed);
        debug!(turn = self.world.clock.turn, phase = %phase, "fog refreshed after loss of an intel asset");
    }

    fn resolve_wave(&self, phase: Phase, resolver: &dyn Resolver, wave: &[Engagement]) -> Vec<Settled> {
        let ctx = ResolveContext {
            world: &self.world,
            catalog: &self.catalog,
            effects: &self.effects,
            fog: &self.fog,
            env: self.world.clock.environment(),
            phase,
            config: &self.config,
        };
        let seed = self.rules.seed;
        let turn = self.world.clock.turn;
        let run = |engagement: &Engagement| {
            if let Some(lost) = schedule::lost_participant(engagement, ctx.world) {
                return Settled::Cancelled(lost);
            }
            let mut rng = TurnRng::for_engagement(seed, turn, phase.index(), engagement.index);
            Settled::Resolved(resolver.resolve(engagement, &ctx, &mut rng))
        };
        if self.config.parallel_engagements && wave.len() > 1 {
            wave.par_iter().map(&run).collect()
        } else {
            wave.iter().map(&run).collect()
        }
    }

    /// Record one engagement's result. Returns whether an intel asset was
    /// destroyed.
    fn settle(&mut self, phase: Phase, engagement: &Engagement, settled: Settled) -> bool {
        let turn = self.world.clock.turn;
        let faction = engagement.faction;
        let unit = engagement.issuer();
        match settled {
            Settled::Cancelled(destroyed) => {
                debug!(turn, phase = %phase, engagement = engagement.index, unit, destroyed, "engagement cancelled");
                self.log.push(
                    turn,
                    Some(phase),
                    EventKind::EngagementCancelled {
                        faction,
                        unit,
                        destroyed,
                    },
                );
                false
            }
            Settled::Resolved(Err(err)) => {
                error!(turn, phase = %phase, engagement = engagement.index, unit, error = %err, "engagement skipped");
                self.log.push(
                    turn,
                    Some(phase),
                    EventKind::ContractViolation {
                        faction,
                        unit,
                        detail: err.to_string(),
                    },
                );
                false
            }
            Settled::Resolved(Ok(resolution)) => {
                let outcome = resolution.outcome;
                debug!(
                    turn,
                    phase = %phase,
                    engagement = engagement.index,
                    faction = %faction,
                    unit,
                    outcome = ?outcome,
                    "engagement resolved"
                );
                let mut applier = self.applier(phase);
                applier.emit(EventKind::EngagementResolved(resolution.record));
                applier.apply_all(&resolution.deltas);
                let points = outcome.vp() + engagement_bonus(engagement, outcome);
                applier.award(faction, points, VpReason::Engagement(outcome));
                applier.intel_lost
            }
        }
    }

    fn run_logistics(&mut self) {
        let turn = self.world.clock.turn;
        let params = self.config.logistics();
        let produced = run_logistics(&mut self.world, &self.catalog, &self.effects, &params);
        let arrivals: Vec<_> = self.rules.arrivals(turn).cloned().collect();

        let mut applier = self.applier(Phase::Logistics);
        for kind in produced {
            let destroyed = match &kind {
                EventKind::UnitDestroyed {
                    unit,
                    faction,
                    domain,
                    ..
                } => Some((*unit, *faction, domain.destruction_value())),
                _ => None,
            };
            applier.emit(kind);
            if let Some((unit, faction, value)) = destroyed {
                applier.award(faction.opponent(), value, VpReason::UnitDestroyed(unit));
            }
        }

        for arrival in arrivals {
            match place(
                applier.world,
                applier.catalog,
                arrival.faction,
                &arrival.platform,
                arrival.position,
                arrival.name.clone(),
            ) {
                Ok(unit) => applier.emit(EventKind::ReinforcementArrived {
                    unit,
                    faction: arrival.faction,
                    position: arrival.position,
                }),
                Err(err) => warn!(turn, platform = %arrival.platform, error = %err, "reinforcement dropped"),
            }
        }

        let held: Vec<_> = applier
            .world
            .map()
            .objectives()
            .into_iter()
            .filter_map(|(cell, c)| c.control.map(|holder| (cell, holder, c.objective_vp)))
            .collect();
        for (cell, holder, vp) in held {
            applier.award(holder, vp, VpReason::Objective(cell));
        }
    }

    fn terminal_condition(&self) -> Option<Termination> {
        let turn = self.world.clock.turn;
        let vp = self.world.clock.victory_points;
        let end = |reason, winner| {
            Some(Termination {
                turn,
                reason,
                winner,
            })
        };

        let eliminated: Vec<FactionId> = FactionId::ALL
            .into_iter()
            .filter(|f| !self.world.has_combat_power(*f))
            .collect();
        match eliminated.as_slice() {
            [] => {}
            [loser] => return end(TerminationReason::Elimination, Some(loser.opponent())),
            _ => return end(TerminationReason::Elimination, vp.leader()),
        }

        if let Some(threshold) = self.rules.victory_points {
            let reached: Vec<FactionId> = FactionId::ALL
                .into_iter()
                .filter(|f| vp.get(*f) >= threshold)
                .collect();
            match reached.as_slice() {
                [] => {}
                [winner] => return end(TerminationReason::VictoryPoints, Some(*winner)),
                _ => return end(TerminationReason::VictoryPoints, vp.leader()),
            }
        }

        if turn >= self.rules.turn_limit {
            return end(TerminationReason::TurnLimit, vp.leader());
        }
        None
    }

    /// Conservation checks run at the close of every turn.
    #[cfg(feature = "debug-validation")]
    fn check_invariants(&self, first_seq: u64) -> Result<()> {
        use crate::unit::UnitStatus;

        for event in self.log.since(first_seq) {
            if let EventKind::UnitStatusChanged { unit, from, .. } = &event.kind {
                if *from == UnitStatus::Destroyed {
                    return Err(EngineError::InvalidState(format!(
                        "unit {unit} left the destroyed state on turn {}",
                        event.turn
                    )));
                }
            }
        }

        let mut awarded = VictoryPoints::default();
        for event in self.log.events() {
            if let EventKind::VictoryPointsAwarded { faction, amount, .. } = event.kind {
                awarded.award(faction, amount);
            }
        }
        if awarded != self.world.clock.victory_points {
            return Err(EngineError::InvalidState(format!(
                "victory points {:?} do not match awards {awarded:?}",
                self.world.clock.victory_points
            )));
        }
        Ok(())
    }
}

/// Extra points for mission types that reward success.
fn engagement_bonus(engagement: &Engagement, outcome: CombatOutcome) -> u32 {
    if !outcome.is_victory() {
        return 0;
    }
    match &engagement.kind {
        EngagementKind::Air(AirEngagement::Strike(order)) if order.mission == AirMission::Sead => 2,
        EngagementKind::SpecialForces(_) => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::{HexCoord, HexMap, Terrain};
    use crate::orders::{GroundMission, Order, Target};
    use crate::turn::Weather;

    fn engine(turn_limit: u32) -> Engine {
        let catalog = Arc::new(Catalog::standard());
        let mut world = WorldState::new(HexMap::new(10, 10, Terrain::Plains), 6, Weather::Clear);
        place(&mut world, &catalog, FactionId::Blue, "infantry_brigade", HexCoord::new(2, 2), None).unwrap();
        place(&mut world, &catalog, FactionId::Red, "infantry_brigade", HexCoord::new(7, 7), None).unwrap();
        Engine::new(world, catalog, EngineConfig::default(), RunRules::new("test", 11, turn_limit))
    }

    fn empty(turn: u32) -> (OrdersPayload, OrdersPayload) {
        (
            OrdersPayload::empty(FactionId::Blue, turn),
            OrdersPayload::empty(FactionId::Red, turn),
        )
    }

    #[test]
    fn test_phase_out_of_sequence() {
        let mut engine = engine(5);
        let err = engine.run_phase(Phase::Intel).unwrap_err();
        assert!(matches!(
            err,
            EngineError::PhaseOutOfSequence {
                expected: None,
                requested: Phase::Intel
            }
        ));

        let (blue, red) = empty(1);
        engine.begin_turn(blue, red).unwrap();
        let err = engine.run_phase(Phase::Ground).unwrap_err();
        assert!(err.is_contract_violation());
        assert!(matches!(
            err,
            EngineError::PhaseOutOfSequence {
                expected: Some(Phase::Intel),
                ..
            }
        ));
        assert!(engine.finish_turn().is_err());

        for phase in Phase::ALL {
            engine.run_phase(phase).unwrap();
        }
        assert!(engine.run_phase(Phase::Logistics).is_err());
        let result = engine.finish_turn().unwrap();
        assert_eq!(result.turn, 1);
    }

    #[test]
    fn test_turn_limit_terminates() {
        let mut engine = engine(2);
        for turn in 1..=2 {
            let (blue, red) = empty(turn);
            let result = engine.resolve_turn(blue, red).unwrap();
            assert_eq!(result.termination.is_some(), turn == 2);
        }
        assert_eq!(
            engine.termination().map(|t| t.reason),
            Some(TerminationReason::TurnLimit)
        );
        let (blue, red) = empty(3);
        assert!(matches!(engine.resolve_turn(blue, red), Err(EngineError::RunTerminated)));
    }

    #[test]
    fn test_cancel_between_turns() {
        let mut engine = engine(5);
        let (blue, red) = empty(1);
        engine.resolve_turn(blue, red).unwrap();
        engine.cancel_handle().cancel();
        let (blue, red) = empty(2);
        assert!(matches!(
            engine.resolve_turn(blue, red),
            Err(EngineError::Cancelled { turn: 1 })
        ));
        assert_eq!(engine.turn(), 1);
    }

    #[test]
    fn test_timeout_and_rejection_events() {
        let mut engine = engine(5);
        let mut blue = OrdersPayload::empty(FactionId::Blue, 1);
        blue.ground.push(Order::new(99, GroundMission::Defend, Target::Cell(HexCoord::new(2, 2))));
        let result = engine.resolve_turn(blue, Submission::TimedOut).unwrap();

        assert!(result.events.iter().any(|e| matches!(
            e.kind,
            EventKind::OrderRejected {
                faction: FactionId::Blue,
                unit: Some(99),
                ..
            }
        )));
        assert!(result
            .events
            .iter()
            .any(|e| e.kind == EventKind::OrdersTimedOut { faction: FactionId::Red }));
    }

    #[test]
    fn test_snapshot_restore_resumes() {
        let mut engine = engine(5);
        let (blue, red) = empty(1);
        engine.resolve_turn(blue, red).unwrap();
        let bytes = engine.snapshot().unwrap();

        let mut resumed = Engine::restore(&bytes, engine.shared_catalog(), EngineConfig::default()).unwrap();
        assert_eq!(resumed.state_hash(), engine.state_hash());
        assert_eq!(resumed.events(), engine.events());

        let (blue, red) = empty(2);
        let a = engine.resolve_turn(blue.clone(), red.clone()).unwrap();
        let b = resumed.resolve_turn(blue, red).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_snapshot_refused_mid_turn() {
        let mut engine = engine(5);
        let (blue, red) = empty(1);
        engine.begin_turn(blue, red).unwrap();
        assert!(engine.snapshot().is_err());
    }

    #[test]
    fn test_isr_boost_survives_loss_of_sensor_until_next_intel() {
        use crate::catalog::SensorKind;
        use crate::combat::StateDelta;
        use crate::math::pct;
        use crate::unit::LossCause;

        let catalog = Arc::new(Catalog::standard());
        let mut world = WorldState::new(HexMap::new(20, 20, Terrain::Plains), 6, Weather::Clear);
        place(&mut world, &catalog, FactionId::Blue, "infantry_brigade", HexCoord::new(1, 1), None).unwrap();
        let radar = place(&mut world, &catalog, FactionId::Blue, "sam_long_range", HexCoord::new(2, 2), None).unwrap();
        let target = place(&mut world, &catalog, FactionId::Red, "infantry_brigade", HexCoord::new(18, 18), None).unwrap();
        let mut engine = Engine::new(world, catalog, EngineConfig::default(), RunRules::new("test", 4, 5));

        let (blue, red) = empty(1);
        engine.begin_turn(blue, red).unwrap();
        for phase in Phase::ALL {
            engine.run_phase(phase).unwrap();
            match phase {
                Phase::Drone => engine.applier(phase).apply_all(&[StateDelta::IntelBoost {
                    faction: FactionId::Blue,
                    unit: target,
                    confidence: pct(90),
                    sensor: SensorKind::DroneIsr,
                }]),
                Phase::Artillery => {
                    let mut applier = engine.applier(phase);
                    applier.apply_all(&[StateDelta::Casualties {
                        unit: radar,
                        amount: 100,
                        cause: LossCause::Combat,
                    }]);
                    assert!(applier.intel_lost);
                    engine.refresh_fog(phase);
                }
                _ => {}
            }
        }
        engine.finish_turn().unwrap();

        let contact = engine.fog_view(FactionId::Blue).contact(target).cloned().unwrap();
        assert_eq!(contact.confidence, pct(90));
        assert_eq!(contact.sensor, SensorKind::DroneIsr);

        let (blue, red) = empty(2);
        engine.resolve_turn(blue, red).unwrap();
        assert!(engine.fog_view(FactionId::Blue).contact(target).is_none());
    }

    #[test]
    fn test_objective_pays_holder() {
        let mut engine = engine(5);
        if let Some(cell) = engine.world.map_mut().cell_mut(HexCoord::new(5, 5)) {
            cell.objective_vp = 2;
            cell.control = Some(FactionId::Red);
        }
        let (blue, red) = empty(1);
        let result = engine.resolve_turn(blue, red).unwrap();
        assert_eq!(result.victory_points.red, 2);
        assert!(result.events.iter().any(|e| matches!(
            e.kind,
            EventKind::VictoryPointsAwarded {
                reason: VpReason::Objective(_),
                ..
            }
        )));
    }
}
