//! Domain combat resolution.
//!
//! Each phase that fights has one [`Resolver`]. A resolver reads the world
//! through a [`ResolveContext`] and returns a [`Resolution`]: an outcome, a
//! list of [`StateDelta`]s for the scheduler to apply and a structured
//! [`EngagementRecord`]. Resolvers never mutate the world themselves, which
//! lets the scheduler run disjoint engagements in parallel and still apply
//! their effects in a fixed order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, PlatformSpec, SensorKind};
use crate::config::EngineConfig;
use crate::effects::{ActiveEffects, EffectKind};
use crate::error::{EngineError, Result};
use crate::factions::FactionId;
use crate::fog::FogOfWar;
use crate::hex::HexCoord;
use crate::logistics::NodeId;
use crate::math::{pct, Fixed};
use crate::orders::{
    AirMission, ArtilleryMission, DroneMission, EwMission, GroundMission, HelicopterMission,
    MissileMission, Order, SfTask, SpecialForcesMission,
};
use crate::rng::TurnRng;
use crate::turn::{Environment, Phase};
use crate::unit::{Domain, LossCause, Posture, Unit, UnitId, UnitStatus};
use crate::world::WorldState;

pub mod air;
pub mod artillery;
pub mod drone;
pub mod ew;
pub mod ground;
pub mod helicopter;
pub mod missile;
pub mod special_forces;

pub use air::AirResolver;
pub use artillery::ArtilleryResolver;
pub use drone::DroneResolver;
pub use ew::EwResolver;
pub use ground::GroundResolver;
pub use helicopter::HelicopterResolver;
pub use missile::MissileResolver;
pub use special_forces::SpecialForcesResolver;

/// Outcome class of an engagement, from the initiator's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatOutcome {
    /// Overwhelming success.
    DecisiveVictory,
    /// Clear success.
    Victory,
    /// Slight advantage.
    Marginal,
    /// Draw.
    Stalemate,
    /// Clear failure.
    Defeat,
    /// Overwhelming failure.
    DecisiveDefeat,
}

impl CombatOutcome {
    /// Classify a force or exchange ratio.
    #[must_use]
    pub fn from_ratio(ratio: Fixed) -> Self {
        if ratio >= pct(300) {
            Self::DecisiveVictory
        } else if ratio >= pct(150) {
            Self::Victory
        } else if ratio >= pct(110) {
            Self::Marginal
        } else if ratio >= pct(90) {
            Self::Stalemate
        } else if ratio >= pct(67) {
            Self::Defeat
        } else {
            Self::DecisiveDefeat
        }
    }

    /// Ordinal rank, 0 for a decisive defeat up to 5 for a decisive victory.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::DecisiveDefeat => 0,
            Self::Defeat => 1,
            Self::Stalemate => 2,
            Self::Marginal => 3,
            Self::Victory => 4,
            Self::DecisiveVictory => 5,
        }
    }

    /// Victory points earned by the initiator.
    #[must_use]
    pub const fn vp(self) -> u32 {
        match self {
            Self::DecisiveVictory => 5,
            Self::Victory => 3,
            Self::Marginal => 1,
            _ => 0,
        }
    }

    /// Victory or better.
    #[must_use]
    pub const fn is_victory(self) -> bool {
        matches!(self, Self::DecisiveVictory | Self::Victory)
    }
}

/// Outcome class from the fraction of a target's strength destroyed.
#[must_use]
pub fn loss_outcome(fraction: Fixed) -> CombatOutcome {
    if fraction >= pct(30) {
        CombatOutcome::DecisiveVictory
    } else if fraction >= pct(15) {
        CombatOutcome::Victory
    } else if fraction >= pct(5) {
        CombatOutcome::Marginal
    } else if fraction > Fixed::ZERO {
        CombatOutcome::Stalemate
    } else {
        CombatOutcome::Defeat
    }
}

/// Per-domain details of a resolved engagement. Integer fields only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngagementDetail {
    /// Missile strike.
    Missile {
        /// Missiles launched.
        fired: u32,
        /// Inbounds given an intercept attempt.
        engaged: u32,
        /// Inbounds intercepted.
        intercepted: u32,
        /// Leakers that hit.
        hits: u32,
        /// Damage over hardness, percent.
        damage_percent: i64,
    },
    /// Electronic warfare action.
    Ew {
        /// Mission flown.
        mission: EwMission,
        /// Whether the action took effect.
        success: bool,
        /// Degradation inflicted, percent.
        degradation_percent: i64,
        /// Enemy units intercepted (SIGINT).
        intercepts: u32,
    },
    /// Fighter engagement.
    AirCombat {
        /// Initiator aircraft lost.
        attacker_losses: u32,
        /// Opponent aircraft lost.
        defender_losses: u32,
        /// Side that had the first look, if either.
        first_look: Option<FactionId>,
        /// Within-visual-range rounds fought.
        wvr_rounds: u32,
    },
    /// Uncontested patrol.
    AirSuperiority {
        /// Patrolled cell.
        cell: HexCoord,
    },
    /// Air-to-ground sortie.
    AirStrike {
        /// Mission flown.
        mission: AirMission,
        /// Aircraft lost to air defence on ingress.
        aircraft_lost: u32,
        /// Effective hits.
        hits: u32,
        /// Strength destroyed.
        casualties: u32,
    },
    /// Drone attack.
    Drone {
        /// Mission flown.
        mission: DroneMission,
        /// Tracks launched, escorts included.
        launched: u32,
        /// Tracks engaged by air defence.
        engaged: u32,
        /// Tracks shot down.
        intercepted: u32,
        /// Terminal hits.
        hits: u32,
        /// Strength destroyed.
        casualties: u32,
    },
    /// Reconnaissance that fed same-turn intel.
    Reconnaissance {
        /// Sensor used.
        sensor: SensorKind,
        /// Enemy units found.
        contacts: u32,
    },
    /// Artillery fire.
    Artillery {
        /// Mission fired.
        mission: ArtilleryMission,
        /// Whether a counter-battery target was located.
        detected: bool,
        /// Effective hits.
        hits: u32,
        /// Strength destroyed across all targets.
        casualties: u32,
    },
    /// Helicopter attack.
    Helicopter {
        /// Helicopters lost to air defence.
        helicopters_lost: u32,
        /// Effective hits.
        hits: u32,
        /// Strength destroyed.
        casualties: u32,
    },
    /// Heliborne landing.
    AirAssault {
        /// Lifted unit.
        carried: UnitId,
        /// Landing zone.
        landing_zone: HexCoord,
        /// Landing zone risk, percent.
        risk_percent: i64,
        /// Helicopters lost.
        helicopters_lost: u32,
        /// Strength lost by the lifted unit.
        losses: u32,
        /// Whether the unit was put down.
        landed: bool,
    },
    /// Ground attack.
    Ground {
        /// Attacker strength lost.
        attacker_losses: u32,
        /// Defender strength lost.
        defender_losses: u32,
        /// Initial power ratio, percent.
        ratio_percent: i64,
        /// Whether the defender gave ground.
        retreated: bool,
        /// Whether the attacker advanced.
        advanced: bool,
    },
    /// Road march.
    Movement {
        /// Start cell.
        from: HexCoord,
        /// End cell.
        to: HexCoord,
        /// Hexes moved.
        hexes: u32,
    },
    /// Entrenchment.
    Defend {
        /// Dug-in level after the order.
        dug_in: u8,
    },
    /// Special forces mission.
    SpecialForces {
        /// Task.
        task: SfTask,
        /// Whether the team was detected.
        compromised: bool,
        /// Objective achieved, percent.
        objective_percent: i64,
        /// Whether the team got out.
        extracted: bool,
    },
}

/// Structured record of one engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementRecord {
    /// Engagement index within its phase.
    pub engagement: u32,
    /// Phase.
    pub phase: Phase,
    /// Initiating faction.
    pub faction: FactionId,
    /// Ordered unit.
    pub unit: UnitId,
    /// Units engaged.
    pub targets: Vec<UnitId>,
    /// Outcome class.
    pub outcome: CombatOutcome,
    /// Domain details.
    pub detail: EngagementDetail,
}

/// A single change requested by a resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum StateDelta {
    /// Remove strength.
    Casualties {
        /// Unit.
        unit: UnitId,
        /// Strength lost.
        amount: u32,
        /// Cause.
        cause: LossCause,
    },
    /// Change readiness by a signed fraction.
    Readiness {
        /// Unit.
        unit: UnitId,
        /// Change.
        change: Fixed,
    },
    /// Add suppression points (capped at 100).
    Suppress {
        /// Unit.
        unit: UnitId,
        /// Points.
        amount: u32,
    },
    /// Remove organization points.
    Organization {
        /// Unit.
        unit: UnitId,
        /// Points lost.
        loss: u32,
    },
    /// Remove morale points.
    Morale {
        /// Unit.
        unit: UnitId,
        /// Points lost.
        loss: u32,
    },
    /// Set the dug-in level.
    DugIn {
        /// Unit.
        unit: UnitId,
        /// New level.
        level: u8,
    },
    /// Relocate a unit.
    Move {
        /// Unit.
        unit: UnitId,
        /// Destination.
        to: HexCoord,
    },
    /// Take control of a cell.
    Control {
        /// Cell.
        cell: HexCoord,
        /// New controller.
        faction: FactionId,
    },
    /// Spend ammunition.
    ExpendAmmo {
        /// Unit.
        unit: UnitId,
        /// Rounds.
        amount: u32,
    },
    /// Spend missiles, interceptors or drones.
    ExpendMissiles {
        /// Unit.
        unit: UnitId,
        /// Count.
        amount: u32,
    },
    /// Spend fuel.
    ExpendFuel {
        /// Unit.
        unit: UnitId,
        /// Amount.
        amount: u32,
    },
    /// Use air-defense engagement channels for the rest of the turn.
    UseChannels {
        /// Unit.
        unit: UnitId,
        /// Channels.
        amount: u32,
    },
    /// Start a reload cycle.
    SetReload {
        /// Unit.
        unit: UnitId,
        /// Counter value.
        turns: u32,
    },
    /// Record that a firing unit revealed itself this turn.
    MarkFired {
        /// Unit.
        unit: UnitId,
    },
    /// Record that a unit fought this turn.
    MarkInCombat {
        /// Unit.
        unit: UnitId,
    },
    /// Damage a supply node.
    SupplyNodeDamage {
        /// Node.
        node: NodeId,
        /// Status points lost.
        amount: u32,
    },
    /// Raise an active effect against a faction.
    Effect {
        /// Affected faction.
        target: FactionId,
        /// Effect.
        kind: EffectKind,
        /// Level.
        level: Fixed,
    },
    /// Same-turn intelligence on an enemy unit.
    IntelBoost {
        /// Beneficiary.
        faction: FactionId,
        /// Observed unit.
        unit: UnitId,
        /// Confidence.
        confidence: Fixed,
        /// Source.
        sensor: SensorKind,
    },
    /// Set or clear a standing combat air patrol.
    StandingCap {
        /// Unit.
        unit: UnitId,
        /// Patrol cell.
        cell: Option<HexCoord>,
    },
    /// Change ground posture.
    Posture {
        /// Unit.
        unit: UnitId,
        /// Posture.
        posture: Posture,
    },
}

/// What a resolver returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Outcome class.
    pub outcome: CombatOutcome,
    /// Changes to apply, in order.
    pub deltas: Vec<StateDelta>,
    /// Structured record.
    pub record: EngagementRecord,
}

impl Resolution {
    fn new(
        engagement: &Engagement,
        phase: Phase,
        targets: Vec<UnitId>,
        outcome: CombatOutcome,
        detail: EngagementDetail,
        deltas: Vec<StateDelta>,
    ) -> Self {
        Self {
            outcome,
            deltas,
            record: EngagementRecord {
                engagement: engagement.index,
                phase,
                faction: engagement.faction,
                unit: engagement.issuer(),
                targets,
                outcome,
                detail,
            },
        }
    }
}

/// How an air order was matched at discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AirEngagement {
    /// A patrol or sweep meeting an enemy patrol or sweep.
    Duel {
        /// Initiator's order.
        order: Order<AirMission>,
        /// Opponent's order.
        opponent: Order<AirMission>,
    },
    /// A patrol or sweep that met nobody.
    Patrol(Order<AirMission>),
    /// An air-to-ground sortie.
    Strike(Order<AirMission>),
}

impl AirEngagement {
    /// The initiator's order.
    #[must_use]
    pub const fn order(&self) -> &Order<AirMission> {
        match self {
            Self::Duel { order, .. } | Self::Patrol(order) | Self::Strike(order) => order,
        }
    }
}

/// The order behind an engagement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngagementKind {
    /// Missile strike.
    Missile(Order<MissileMission>),
    /// Electronic warfare.
    Ew(Order<EwMission>),
    /// Air.
    Air(AirEngagement),
    /// Drone.
    Drone(Order<DroneMission>),
    /// Artillery.
    Artillery(Order<ArtilleryMission>),
    /// Helicopter.
    Helicopter(Order<HelicopterMission>),
    /// Ground.
    Ground(Order<GroundMission>),
    /// Special forces.
    SpecialForces(Order<SpecialForcesMission>),
}

/// One engagement discovered in a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engagement {
    /// Position in the phase's tie-break order; also the RNG stream index.
    pub index: u32,
    /// Initiating faction.
    pub faction: FactionId,
    /// Submission index of the initiating order.
    pub submission: u32,
    /// The order.
    pub kind: EngagementKind,
}

impl Engagement {
    /// The ordered unit.
    #[must_use]
    pub const fn issuer(&self) -> UnitId {
        match &self.kind {
            EngagementKind::Missile(o) => o.unit,
            EngagementKind::Ew(o) => o.unit,
            EngagementKind::Air(a) => a.order().unit,
            EngagementKind::Drone(o) => o.unit,
            EngagementKind::Artillery(o) => o.unit,
            EngagementKind::Helicopter(o) => o.unit,
            EngagementKind::Ground(o) => o.unit,
            EngagementKind::SpecialForces(o) => o.unit,
        }
    }

    /// Every unit that must still exist for the engagement to go ahead.
    #[must_use]
    pub fn participants(&self) -> Vec<UnitId> {
        let mut units = vec![self.issuer()];
        let target = match &self.kind {
            EngagementKind::Missile(o) => o.target.unit(),
            EngagementKind::Ew(o) => o.target.unit(),
            EngagementKind::Air(AirEngagement::Duel { opponent, .. }) => Some(opponent.unit),
            EngagementKind::Air(a) => a.order().target.unit(),
            EngagementKind::Drone(o) => o.target.unit(),
            EngagementKind::Artillery(o) => o.target.unit(),
            EngagementKind::Helicopter(o) => match o.mission {
                HelicopterMission::AirAssault { carried } => Some(carried),
                _ => o.target.unit(),
            },
            EngagementKind::Ground(o) => o.target.unit(),
            EngagementKind::SpecialForces(o) => o.target.unit(),
        };
        units.extend(target);
        units
    }
}

/// Units an engagement reads or writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footprint {
    /// Units touched.
    pub units: BTreeSet<UnitId>,
    /// Reads or writes the active-effects table or the fog of war.
    pub exclusive: bool,
}

impl Footprint {
    /// A footprint over `units`.
    pub fn of(units: impl IntoIterator<Item = UnitId>) -> Self {
        Self {
            units: units.into_iter().collect(),
            exclusive: false,
        }
    }

    /// Mark the engagement as needing a wave of its own.
    #[must_use]
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    /// Add units.
    pub fn extend(&mut self, units: impl IntoIterator<Item = UnitId>) {
        self.units.extend(units);
    }

    /// Whether two footprints share no unit.
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.units.is_disjoint(&other.units)
    }
}

/// Everything a resolver may read.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// True world state.
    pub world: &'a WorldState,
    /// Reference data.
    pub catalog: &'a Catalog,
    /// Effects in force this turn.
    pub effects: &'a ActiveEffects,
    /// Fog of war; resolvers consult the initiator's view only.
    pub fog: &'a FogOfWar,
    /// Weather and time of day.
    pub env: Environment,
    /// Phase being resolved.
    pub phase: Phase,
    /// Engine settings.
    pub config: &'a EngineConfig,
}

impl<'a> ResolveContext<'a> {
    /// The ordered unit and its platform, checked against `domain`.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the unit is missing, destroyed, of
    /// another domain or of an unknown platform.
    pub fn issuer(&self, engagement: &Engagement, domain: Domain) -> Result<(&'a Unit, &'a PlatformSpec)> {
        let id = engagement.issuer();
        let unit = self
            .world
            .unit(id)
            .ok_or_else(|| EngineError::contract(self.phase, format!("unit {id} does not exist")))?;
        if unit.status == UnitStatus::Destroyed {
            return Err(EngineError::contract(self.phase, format!("unit {id} is destroyed")));
        }
        if unit.domain != domain {
            return Err(EngineError::contract(
                self.phase,
                format!("unit {id} is {:?}, resolver handles {domain:?}", unit.domain),
            ));
        }
        let spec = self.platform(unit)?;
        Ok((unit, spec))
    }

    /// A target unit that must not be destroyed.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the unit is missing or destroyed.
    pub fn target(&self, id: UnitId) -> Result<&'a Unit> {
        match self.world.unit(id) {
            Some(unit) if unit.status != UnitStatus::Destroyed => Ok(unit),
            Some(_) => Err(EngineError::contract(self.phase, format!("target {id} is destroyed"))),
            None => Err(EngineError::contract(self.phase, format!("target {id} does not exist"))),
        }
    }

    /// Platform of a unit.
    ///
    /// # Errors
    ///
    /// Returns a contract violation for an unknown platform key.
    pub fn platform(&self, unit: &Unit) -> Result<&'a PlatformSpec> {
        self.catalog.platform(&unit.platform).ok_or_else(|| {
            EngineError::contract(
                self.phase,
                format!("unit {} has unknown platform '{}'", unit.id, unit.platform),
            )
        })
    }

    /// Concealment points of a unit where it stands.
    #[must_use]
    pub fn concealment(&self, unit: &Unit) -> u32 {
        let terrain = self.catalog.terrain(self.world.map().terrain_at(unit.position));
        (terrain.concealment + u32::from(unit.dug_in) * 15 + self.env.concealment_bonus()).min(95)
    }

    fn wrong_kind(&self, engagement: &Engagement) -> EngineError {
        EngineError::contract(
            self.phase,
            format!("engagement {} is not a {} engagement", engagement.index, self.phase),
        )
    }
}

/// Resolves the engagements of one phase.
pub trait Resolver: Sync {
    /// Units the engagement reads or writes, evaluated against `world`.
    fn footprint(&self, engagement: &Engagement, world: &WorldState, catalog: &Catalog) -> Footprint;

    /// Resolve one engagement.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ContractViolation`] when the engagement does
    /// not belong to this resolver or references a destroyed unit.
    fn resolve(
        &self,
        engagement: &Engagement,
        ctx: &ResolveContext<'_>,
        rng: &mut TurnRng,
    ) -> Result<Resolution>;
}

static MISSILE: MissileResolver = MissileResolver;
static EW: EwResolver = EwResolver;
static AIR: AirResolver = AirResolver;
static DRONE: DroneResolver = DroneResolver;
static ARTILLERY: ArtilleryResolver = ArtilleryResolver;
static HELICOPTER: HelicopterResolver = HelicopterResolver;
static GROUND: GroundResolver = GroundResolver;
static SPECIAL_FORCES: SpecialForcesResolver = SpecialForcesResolver;

/// The resolver for a fighting phase; `None` for Intel and Logistics.
#[must_use]
pub fn resolver_for(phase: Phase) -> Option<&'static dyn Resolver> {
    match phase {
        Phase::Missile => Some(&MISSILE),
        Phase::Ew => Some(&EW),
        Phase::Air => Some(&AIR),
        Phase::Drone => Some(&DRONE),
        Phase::Artillery => Some(&ARTILLERY),
        Phase::Helicopter => Some(&HELICOPTER),
        Phase::Ground => Some(&GROUND),
        Phase::SpecialForces => Some(&SPECIAL_FORCES),
        Phase::Intel | Phase::Logistics => None,
    }
}

/// Air-defense units of `faction` that cover `at`, longest reach first.
///
/// Only units that can still fire are returned.
pub(crate) fn covering_air_defense<'a>(
    world: &'a WorldState,
    catalog: &Catalog,
    faction: FactionId,
    at: HexCoord,
) -> Vec<(&'a Unit, u32)> {
    let mut covering: Vec<(&Unit, u32)> = world
        .units_of(faction)
        .filter(|u| u.domain == Domain::AirDefense && u.is_operational())
        .filter_map(|u| catalog.platform(&u.platform).map(|spec| (u, spec.range)))
        .filter(|(u, range)| u.position.distance(at) <= *range)
        .collect();
    covering.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.id.cmp(&b.0.id)));
    covering
}

/// Engagements an air-defense unit can still take on this turn.
pub(crate) fn interceptor_capacity(unit: &Unit, spec: &PlatformSpec) -> u32 {
    spec.air_defense
        .as_ref()
        .map_or(0, |ad| ad.channels.saturating_sub(unit.channels_used))
        .min(unit.missiles)
}

/// Strength lost when `fraction` of a unit is destroyed.
pub(crate) fn casualties(unit: &Unit, fraction: Fixed) -> u32 {
    crate::math::to_count(Fixed::from_num(unit.strength) * fraction).min(unit.strength)
}

/// Air-defense expenditure deltas for `shots` taken by `unit`.
pub(crate) fn interceptor_use(unit: UnitId, shots: u32, deltas: &mut Vec<StateDelta>) {
    if shots > 0 {
        deltas.push(StateDelta::UseChannels { unit, amount: shots });
        deltas.push(StateDelta::ExpendMissiles { unit, amount: shots });
        deltas.push(StateDelta::MarkInCombat { unit });
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_thresholds() {
        assert_eq!(CombatOutcome::from_ratio(pct(300)), CombatOutcome::DecisiveVictory);
        assert_eq!(CombatOutcome::from_ratio(pct(299)), CombatOutcome::Victory);
        assert_eq!(CombatOutcome::from_ratio(pct(150)), CombatOutcome::Victory);
        assert_eq!(CombatOutcome::from_ratio(pct(110)), CombatOutcome::Marginal);
        assert_eq!(CombatOutcome::from_ratio(pct(100)), CombatOutcome::Stalemate);
        assert_eq!(CombatOutcome::from_ratio(pct(67)), CombatOutcome::Defeat);
        assert_eq!(CombatOutcome::from_ratio(pct(50)), CombatOutcome::DecisiveDefeat);
    }

    #[test]
    fn test_rank_orders_outcomes() {
        assert!(CombatOutcome::DecisiveVictory.rank() > CombatOutcome::Victory.rank());
        assert!(CombatOutcome::Stalemate.rank() > CombatOutcome::Defeat.rank());
        assert_eq!(CombatOutcome::Victory.vp(), 3);
        assert_eq!(CombatOutcome::Stalemate.vp(), 0);
    }

    #[test]
    fn test_loss_outcome() {
        assert_eq!(loss_outcome(pct(40)), CombatOutcome::DecisiveVictory);
        assert_eq!(loss_outcome(pct(1)), CombatOutcome::Stalemate);
        assert_eq!(loss_outcome(Fixed::ZERO), CombatOutcome::Defeat);
    }

    #[test]
    fn test_footprint_disjoint() {
        let a = Footprint::of([1, 2]);
        let b = Footprint::of([3]);
        let c = Footprint::of([2, 5]);
        assert!(a.is_disjoint(&b));
        assert!(!a.is_disjoint(&c));
        assert!(Footprint::of([9]).exclusive().exclusive);
    }

    #[test]
    fn test_every_fighting_phase_has_resolver() {
        for phase in Phase::ALL {
            let expected = !matches!(phase, Phase::Intel | Phase::Logistics);
            assert_eq!(resolver_for(phase).is_some(), expected);
        }
    }
}
