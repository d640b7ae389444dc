//! Fog of war: what each faction believes about the other.
//!
//! Reports are derived from true state at every Intel phase and replaced
//! wholesale; nothing carries over between turns. During a turn, direct
//! observation (SIGINT, drone ISR, helicopter scouting, special forces
//! reconnaissance) can raise confidence in individual contacts. Those
//! boosts survive a mid-turn [`FogOfWar::refresh`] and are discarded by the
//! next [`FogOfWar::recompute`].
//!
//! [`FogOfWar::view`] is the only way information leaves the engine
//! towards an order producer. Resolvers read true state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, SensorKind, SensorSpec};
use crate::effects::{ActiveEffects, EffectKind};
use crate::factions::FactionId;
use crate::hex::HexCoord;
use crate::logistics::SupplyNode;
use crate::math::{fixed_serde, fx, pct, ratio, to_count, unit_clamp, Fixed};
use crate::rng::{TurnRng, INTEL_STREAM};
use crate::turn::{Phase, TimeOfDay, VictoryPoints, Weather};
use crate::unit::{Domain, Unit, UnitId};
use crate::world::WorldState;

/// Eyes-on range of every ground unit, in hexes.
pub const ORGANIC_VISUAL_RANGE: u32 = 2;

/// Detection rating of organic ground observation, percent.
pub const ORGANIC_VISUAL_DETECTION: u32 = 60;

/// How much an observer knows about a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IntelQuality {
    /// Something is there.
    Suspected,
    /// Located and classified by domain.
    Detected,
    /// Platform identified, strength estimated.
    Identified,
    /// Positively confirmed.
    Confirmed,
}

impl IntelQuality {
    /// Tier for a detection confidence; `None` when nothing was seen.
    #[must_use]
    pub fn from_confidence(confidence: Fixed) -> Option<Self> {
        if confidence >= pct(85) {
            Some(Self::Confirmed)
        } else if confidence >= pct(60) {
            Some(Self::Identified)
        } else if confidence >= pct(35) {
            Some(Self::Detected)
        } else if confidence > Fixed::ZERO {
            Some(Self::Suspected)
        } else {
            None
        }
    }
}

/// One faction's belief about one enemy unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntelReport {
    /// Observing faction.
    pub observer: FactionId,
    /// Observed unit.
    pub unit: UnitId,
    /// Probability of detection.
    #[serde(with = "fixed_serde")]
    pub confidence: Fixed,
    /// Sensor that contributed most.
    pub sensor: SensorKind,
    /// Quality tier.
    pub quality: IntelQuality,
    /// Reported cell.
    pub position: Option<HexCoord>,
    /// Reported domain (Detected and better).
    pub domain: Option<Domain>,
    /// Reported platform (Identified and better).
    pub platform: Option<String>,
    /// Estimated strength (Identified and better).
    pub strength_estimate: Option<u32>,
    /// Turn the report was produced.
    pub turn: u32,
}

impl IntelReport {
    fn describe(
        observer: FactionId,
        target: &Unit,
        confidence: Fixed,
        sensor: SensorKind,
        turn: u32,
        strength_estimate: u32,
    ) -> Option<Self> {
        let quality = IntelQuality::from_confidence(confidence)?;
        let identified = quality >= IntelQuality::Identified;
        Some(Self {
            observer,
            unit: target.id,
            confidence,
            sensor,
            quality,
            position: Some(target.position),
            domain: (quality >= IntelQuality::Detected).then_some(target.domain),
            platform: identified.then(|| target.platform.clone()),
            strength_estimate: identified.then_some(strength_estimate),
            turn,
        })
    }
}

/// Per-sensor detection probability against one target.
fn sensor_probability(
    world: &WorldState,
    catalog: &Catalog,
    effects: &ActiveEffects,
    observer: &Unit,
    sensor: &SensorSpec,
    target: &Unit,
) -> Fixed {
    let distance = observer.position.distance(target.position);
    if sensor.range == 0 || distance > sensor.range {
        return Fixed::ZERO;
    }
    let env = world.clock.environment();
    let terrain = catalog.terrain(world.map().terrain_at(target.position));
    let signature = catalog.platform(&target.platform).map_or(100, |s| s.signature);

    let mut p = pct(i64::from(sensor.detection))
        * (Fixed::ONE - ratio(fx(distance), fx(sensor.range)) / 2)
        * pct(i64::from(terrain.detection))
        * (Fixed::ONE - pct(15) * fx(u32::from(target.dug_in)))
        * pct(i64::from(signature));
    if sensor.kind.is_visual() {
        p *= env.visibility();
    }
    if sensor.kind.is_radar() {
        p *= Fixed::ONE - effects.level(observer.faction, EffectKind::RadarJam) / 2;
    }
    unit_clamp(p)
}

/// Every sensor a unit carries, organic observation included.
fn sensors_of(catalog: &Catalog, unit: &Unit) -> Vec<SensorSpec> {
    let mut sensors = catalog
        .platform(&unit.platform)
        .map(|s| s.sensors.clone())
        .unwrap_or_default();
    if unit.domain == Domain::Ground {
        sensors.push(SensorSpec {
            kind: SensorKind::Visual,
            range: ORGANIC_VISUAL_RANGE,
            detection: ORGANIC_VISUAL_DETECTION,
        });
    }
    sensors
}

/// Whether a unit carries a sensor or electronic warfare suite.
#[must_use]
pub fn is_intel_asset(catalog: &Catalog, unit: &Unit) -> bool {
    unit.domain == Domain::ElectronicWarfare
        || catalog.platform(&unit.platform).is_some_and(|s| !s.sensors.is_empty())
}

/// Contact counts by quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntelSummary {
    /// Suspected contacts.
    pub suspected: u32,
    /// Detected contacts.
    pub detected: u32,
    /// Identified contacts.
    pub identified: u32,
    /// Confirmed contacts.
    pub confirmed: u32,
}

impl IntelSummary {
    fn count(&mut self, quality: IntelQuality) {
        match quality {
            IntelQuality::Suspected => self.suspected += 1,
            IntelQuality::Detected => self.detected += 1,
            IntelQuality::Identified => self.identified += 1,
            IntelQuality::Confirmed => self.confirmed += 1,
        }
    }

    /// Contacts of any tier.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.suspected + self.detected + self.identified + self.confirmed
    }
}

/// Everything an order producer is allowed to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionView {
    /// Viewing faction.
    pub faction: FactionId,
    /// Turn about to be ordered.
    pub turn: u32,
    /// Time of day.
    pub time_of_day: TimeOfDay,
    /// Weather.
    pub weather: Weather,
    /// Victory points so far.
    pub victory_points: VictoryPoints,
    /// Full state of own units, destroyed ones excluded.
    pub own_units: Vec<Unit>,
    /// Own supply nodes.
    pub own_nodes: Vec<SupplyNode>,
    /// Enemy contacts at or above the exposure threshold, by unit id.
    pub contacts: Vec<IntelReport>,
    /// Exposed contacts by tier.
    pub summary: IntelSummary,
}

impl FactionView {
    /// An exposed contact.
    #[must_use]
    pub fn contact(&self, unit: UnitId) -> Option<&IntelReport> {
        self.contacts.iter().find(|r| r.unit == unit)
    }

    /// An own unit.
    #[must_use]
    pub fn own(&self, unit: UnitId) -> Option<&Unit> {
        self.own_units.iter().find(|u| u.id == unit)
    }
}

/// A same-turn direct observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Boost {
    #[serde(with = "fixed_serde")]
    confidence: Fixed,
    sensor: SensorKind,
}

/// Intel reports of both factions for the current turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FogOfWar {
    reports: BTreeMap<FactionId, BTreeMap<UnitId, IntelReport>>,
    boosts: BTreeMap<FactionId, BTreeMap<UnitId, Boost>>,
}

impl FogOfWar {
    /// Rebuild every report from true state, dropping same-turn boosts.
    ///
    /// This is the Intel-phase recompute.
    pub fn recompute(&mut self, world: &WorldState, catalog: &Catalog, effects: &ActiveEffects, seed: u64) {
        self.boosts.clear();
        self.rebuild(world, catalog, effects, seed);
    }

    /// Rebuild sensor reports from true state mid-turn, then merge the
    /// turn's boosts back in as max. Boosts on dead units are dropped.
    pub fn refresh(&mut self, world: &WorldState, catalog: &Catalog, effects: &ActiveEffects, seed: u64) {
        self.rebuild(world, catalog, effects, seed);
        let boosts = std::mem::take(&mut self.boosts);
        for (&faction, held) in &boosts {
            for (&unit, boost) in held {
                self.merge(world, faction, unit, *boost);
            }
        }
        self.boosts = boosts;
        for held in self.boosts.values_mut() {
            held.retain(|unit, _| world.unit(*unit).is_some_and(Unit::is_alive));
        }
    }

    fn rebuild(&mut self, world: &WorldState, catalog: &Catalog, effects: &ActiveEffects, seed: u64) {
        let turn = world.clock.turn;
        let mut rng = TurnRng::for_engagement(seed, turn, Phase::Intel.index(), INTEL_STREAM);
        self.reports.clear();

        for observer_faction in FactionId::ALL {
            let observers: Vec<(&Unit, Vec<SensorSpec>)> = world
                .units_of(observer_faction)
                .filter(|u| u.is_operational())
                .map(|u| (u, sensors_of(catalog, u)))
                .filter(|(_, sensors)| !sensors.is_empty())
                .collect();
            let mut held = BTreeMap::new();

            for target in world.units_of(observer_faction.opponent()).filter(|u| u.is_alive()) {
                let mut missed = Fixed::ONE;
                let mut best: Option<(Fixed, SensorKind)> = None;
                for (observer, sensors) in &observers {
                    for sensor in sensors {
                        let p = sensor_probability(world, catalog, effects, observer, sensor, target);
                        if p == Fixed::ZERO {
                            continue;
                        }
                        missed *= Fixed::ONE - p;
                        if best.map_or(true, |(b, _)| p > b) {
                            best = Some((p, sensor.kind));
                        }
                    }
                }
                let Some((_, sensor)) = best else { continue };
                let confidence = Fixed::ONE - missed;
                let error = (Fixed::ONE - confidence) * rng.range_fixed(pct(-30), pct(30));
                let estimate = to_count(fx(target.strength) * (Fixed::ONE + error));
                if let Some(report) =
                    IntelReport::describe(observer_faction, target, confidence, sensor, turn, estimate)
                {
                    held.insert(target.id, report);
                }
            }
            self.reports.insert(observer_faction, held);
        }
    }

    /// Merge a same-turn observation, keeping the higher confidence.
    ///
    /// Direct observation reports true strength.
    pub fn apply_boost(
        &mut self,
        world: &WorldState,
        faction: FactionId,
        unit: UnitId,
        confidence: Fixed,
        sensor: SensorKind,
    ) {
        let boost = Boost {
            confidence: unit_clamp(confidence),
            sensor,
        };
        if !self.merge(world, faction, unit, boost) {
            return;
        }
        let held = self.boosts.entry(faction).or_default();
        if held.get(&unit).map_or(true, |b| b.confidence < boost.confidence) {
            held.insert(unit, boost);
        }
    }

    /// Raise the report on `unit` to `boost` if it is higher. Returns
    /// false when the target is not an alive enemy.
    fn merge(&mut self, world: &WorldState, faction: FactionId, unit: UnitId, boost: Boost) -> bool {
        let Some(target) = world.unit(unit).filter(|u| u.is_alive() && u.faction != faction) else {
            return false;
        };
        let held = self.reports.entry(faction).or_default();
        if held.get(&unit).is_some_and(|r| r.confidence >= boost.confidence) {
            return true;
        }
        if let Some(report) =
            IntelReport::describe(faction, target, boost.confidence, boost.sensor, world.clock.turn, target.strength)
        {
            held.insert(unit, report);
        }
        true
    }

    /// Confidence `faction` holds in `unit`, zero when unseen.
    #[must_use]
    pub fn confidence(&self, faction: FactionId, unit: UnitId) -> Fixed {
        self.report(faction, unit).map_or(Fixed::ZERO, |r| r.confidence)
    }

    /// The report `faction` holds on `unit`, regardless of exposure.
    #[must_use]
    pub fn report(&self, faction: FactionId, unit: UnitId) -> Option<&IntelReport> {
        self.reports.get(&faction).and_then(|held| held.get(&unit))
    }

    /// All reports `faction` holds, by unit id.
    pub fn reports(&self, faction: FactionId) -> impl Iterator<Item = &IntelReport> {
        self.reports.get(&faction).into_iter().flat_map(BTreeMap::values)
    }

    /// Tier counts over every report `faction` holds.
    #[must_use]
    pub fn summary(&self, faction: FactionId) -> IntelSummary {
        let mut summary = IntelSummary::default();
        for report in self.reports(faction) {
            summary.count(report.quality);
        }
        summary
    }

    /// The exposed view for `faction`: own state in full, enemy contacts
    /// at or above `threshold` confidence only.
    #[must_use]
    pub fn view(&self, faction: FactionId, world: &WorldState, threshold: Fixed) -> FactionView {
        let contacts: Vec<IntelReport> = self
            .reports(faction)
            .filter(|r| r.confidence >= threshold)
            .cloned()
            .collect();
        let mut summary = IntelSummary::default();
        for report in &contacts {
            summary.count(report.quality);
        }
        FactionView {
            faction,
            turn: world.clock.turn + 1,
            time_of_day: world.clock.time_of_day(),
            weather: world.clock.weather,
            victory_points: world.clock.victory_points,
            own_units: world.units_of(faction).filter(|u| u.is_alive()).cloned().collect(),
            own_nodes: world.nodes().filter(|n| n.faction == faction).cloned().collect(),
            contacts,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::{HexMap, Terrain};

    fn world() -> (WorldState, Catalog) {
        let mut world = WorldState::new(HexMap::new(20, 20, Terrain::Plains), 12, Weather::Clear);
        world.clock.turn = 1;
        (world, Catalog::standard())
    }

    fn spawn(world: &mut WorldState, catalog: &Catalog, faction: FactionId, key: &str, q: i32, r: i32) -> UnitId {
        let spec = catalog.platform(key).unwrap();
        world.add_unit(Unit::new(0, faction, spec.domain, key, HexCoord::new(q, r), spec.max_strength))
    }

    #[test]
    fn test_quality_tiers() {
        assert_eq!(IntelQuality::from_confidence(pct(90)), Some(IntelQuality::Confirmed));
        assert_eq!(IntelQuality::from_confidence(pct(60)), Some(IntelQuality::Identified));
        assert_eq!(IntelQuality::from_confidence(pct(35)), Some(IntelQuality::Detected));
        assert_eq!(IntelQuality::from_confidence(pct(1)), Some(IntelQuality::Suspected));
        assert_eq!(IntelQuality::from_confidence(Fixed::ZERO), None);
    }

    #[test]
    fn test_organic_observation_sees_adjacent_enemy() {
        let (mut world, catalog) = world();
        spawn(&mut world, &catalog, FactionId::Blue, "infantry_brigade", 5, 5);
        let near = spawn(&mut world, &catalog, FactionId::Red, "infantry_brigade", 6, 5);
        let far = spawn(&mut world, &catalog, FactionId::Red, "infantry_brigade", 15, 15);
        let mut fog = FogOfWar::default();
        fog.recompute(&world, &catalog, &ActiveEffects::new(), 7);
        assert!(fog.confidence(FactionId::Blue, near) > Fixed::ZERO);
        assert_eq!(fog.confidence(FactionId::Blue, far), Fixed::ZERO);
    }

    #[test]
    fn test_multiple_sensors_combine() {
        let (mut world, catalog) = world();
        spawn(&mut world, &catalog, FactionId::Blue, "infantry_brigade", 5, 5);
        let target = spawn(&mut world, &catalog, FactionId::Red, "infantry_brigade", 6, 5);
        let mut fog = FogOfWar::default();
        fog.recompute(&world, &catalog, &ActiveEffects::new(), 7);
        let single = fog.confidence(FactionId::Blue, target);
        spawn(&mut world, &catalog, FactionId::Blue, "infantry_brigade", 7, 5);
        fog.recompute(&world, &catalog, &ActiveEffects::new(), 7);
        assert!(fog.confidence(FactionId::Blue, target) > single);
    }

    #[test]
    fn test_night_reduces_visual_detection() {
        let (mut world, catalog) = world();
        spawn(&mut world, &catalog, FactionId::Blue, "infantry_brigade", 5, 5);
        let target = spawn(&mut world, &catalog, FactionId::Red, "infantry_brigade", 6, 5);
        let mut fog = FogOfWar::default();
        fog.recompute(&world, &catalog, &ActiveEffects::new(), 7);
        let day = fog.confidence(FactionId::Blue, target);
        world.clock.start_hour = 0;
        fog.recompute(&world, &catalog, &ActiveEffects::new(), 7);
        assert!(fog.confidence(FactionId::Blue, target) < day);
    }

    #[test]
    fn test_boost_survives_refresh_until_next_recompute() {
        let (mut world, catalog) = world();
        spawn(&mut world, &catalog, FactionId::Blue, "infantry_brigade", 1, 1);
        let target = spawn(&mut world, &catalog, FactionId::Red, "infantry_brigade", 15, 15);
        let mut fog = FogOfWar::default();
        fog.recompute(&world, &catalog, &ActiveEffects::new(), 1);
        fog.apply_boost(&world, FactionId::Blue, target, pct(90), SensorKind::DroneIsr);

        fog.refresh(&world, &catalog, &ActiveEffects::new(), 1);
        let report = fog.report(FactionId::Blue, target).unwrap();
        assert_eq!(report.confidence, pct(90));
        assert_eq!(report.sensor, SensorKind::DroneIsr);

        fog.recompute(&world, &catalog, &ActiveEffects::new(), 1);
        assert!(fog.report(FactionId::Blue, target).is_none());
    }

    #[test]
    fn test_refresh_drops_boost_on_destroyed_target() {
        let (mut world, catalog) = world();
        spawn(&mut world, &catalog, FactionId::Blue, "infantry_brigade", 1, 1);
        let target = spawn(&mut world, &catalog, FactionId::Red, "infantry_brigade", 15, 15);
        let mut fog = FogOfWar::default();
        fog.apply_boost(&world, FactionId::Blue, target, pct(90), SensorKind::Recon);
        world.unit_mut(target).unwrap().strength = 0;
        world.unit_mut(target).unwrap().status = crate::unit::UnitStatus::Destroyed;
        fog.refresh(&world, &catalog, &ActiveEffects::new(), 1);
        assert!(fog.report(FactionId::Blue, target).is_none());
    }

    #[test]
    fn test_boost_merges_as_max_and_is_dropped_on_recompute() {
        let (mut world, catalog) = world();
        spawn(&mut world, &catalog, FactionId::Blue, "infantry_brigade", 1, 1);
        let target = spawn(&mut world, &catalog, FactionId::Red, "infantry_brigade", 15, 15);
        let mut fog = FogOfWar::default();
        fog.recompute(&world, &catalog, &ActiveEffects::new(), 1);
        fog.apply_boost(&world, FactionId::Blue, target, pct(90), SensorKind::Recon);
        fog.apply_boost(&world, FactionId::Blue, target, pct(40), SensorKind::Sigint);
        let report = fog.report(FactionId::Blue, target).unwrap();
        assert_eq!(report.confidence, pct(90));
        assert_eq!(report.quality, IntelQuality::Confirmed);
        assert_eq!(report.strength_estimate, Some(100));
        fog.recompute(&world, &catalog, &ActiveEffects::new(), 1);
        assert!(fog.report(FactionId::Blue, target).is_none());
    }

    #[test]
    fn test_view_hides_contacts_below_threshold() {
        let (mut world, catalog) = world();
        let own = spawn(&mut world, &catalog, FactionId::Blue, "infantry_brigade", 1, 1);
        let seen = spawn(&mut world, &catalog, FactionId::Red, "infantry_brigade", 10, 10);
        let glimpsed = spawn(&mut world, &catalog, FactionId::Red, "infantry_brigade", 12, 12);
        let mut fog = FogOfWar::default();
        fog.apply_boost(&world, FactionId::Blue, seen, pct(70), SensorKind::DroneIsr);
        fog.apply_boost(&world, FactionId::Blue, glimpsed, pct(20), SensorKind::Sigint);
        let view = fog.view(FactionId::Blue, &world, pct(35));
        assert!(view.own(own).is_some());
        assert!(view.contact(seen).is_some());
        assert!(view.contact(glimpsed).is_none());
        assert_eq!(view.summary.identified, 1);
        assert_eq!(view.summary.total(), 1);
        assert_eq!(fog.summary(FactionId::Blue).total(), 2);
    }
}
