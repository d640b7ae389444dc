//! Doctrines for the bundled order producers.
//!
//! A doctrine is a small set of knobs that turns a [`FactionView`] into an
//! [`OrdersPayload`]. It only ever reads the view, so the orders it writes
//! are ones a fog-respecting commander could have written. Orders a unit
//! cannot carry out still go out and are rejected at intake.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warsim_core::catalog::{Catalog, DroneKind, PlatformSpec};
use warsim_core::fog::{FactionView, IntelReport};
use warsim_core::hex::HexCoord;
use warsim_core::math::pct;
use warsim_core::orders::{
    AirMission, ArtilleryMission, AttackPosture, DroneMission, EwMission, GroundMission,
    HelicopterMission, Insertion, MissileMission, Order, OrdersPayload, SfTask,
    SpecialForcesMission, Target,
};
use warsim_core::unit::{Domain, Unit};

/// Error type for doctrine operations.
#[derive(Error, Debug)]
pub enum DoctrineError {
    /// File not found.
    #[error("Doctrine file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read doctrine file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse doctrine: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// No preset has this name.
    #[error("Unknown doctrine preset: {0}")]
    UnknownPreset(String),
}

/// Which enemy systems electronic warfare units go after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EwFocus {
    /// Jam radars every turn.
    Radar,
    /// Jam communications every turn.
    Comms,
    /// Radars on odd turns, communications on even ones.
    #[default]
    Alternate,
    /// Listen rather than jam.
    Sigint,
}

/// How a faction fights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctrine {
    /// Doctrine name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// First turn on which ground units attack or advance.
    #[serde(default = "default_engage_from")]
    pub engage_from_turn: u32,
    /// Own strength over estimated enemy strength, percent, needed before a
    /// ground unit attacks an adjacent contact.
    #[serde(default = "default_attack_ratio")]
    pub attack_ratio_percent: u32,
    /// Ground units close with the nearest contact when nothing is adjacent.
    #[serde(default)]
    pub advance: bool,
    /// Missiles per strike order.
    #[serde(default = "default_salvo")]
    pub missile_salvo: u32,
    /// Contacts below this confidence, percent, are not targeted.
    #[serde(default)]
    pub min_confidence_percent: u32,
    /// Strike aircraft prefer enemy air defences when they can see one.
    #[serde(default)]
    pub use_sead: bool,
    /// Electronic warfare focus.
    #[serde(default)]
    pub ew_focus: EwFocus,
    /// Send special forces after high-value contacts.
    #[serde(default)]
    pub commit_special_forces: bool,
    /// How special forces go in.
    #[serde(default)]
    pub insertion: Insertion,
}

const fn default_engage_from() -> u32 {
    1
}

const fn default_attack_ratio() -> u32 {
    100
}

const fn default_salvo() -> u32 {
    2
}

impl Default for Doctrine {
    fn default() -> Self {
        Self::balanced()
    }
}

impl Doctrine {
    /// Load a doctrine from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DoctrineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DoctrineError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let doctrine: Doctrine = ron::from_str(&contents)?;
        Ok(doctrine)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, DoctrineError> {
        let doctrine: Doctrine = ron::from_str(ron)?;
        Ok(doctrine)
    }

    /// A preset by name.
    pub fn preset(name: &str) -> Result<Self, DoctrineError> {
        match name.to_ascii_lowercase().as_str() {
            "balanced" => Ok(Self::balanced()),
            "offensive" => Ok(Self::offensive()),
            "defensive" => Ok(Self::defensive()),
            "standoff" => Ok(Self::standoff()),
            _ => Err(DoctrineError::UnknownPreset(name.to_string())),
        }
    }

    /// Names of the presets.
    #[must_use]
    pub fn preset_names() -> &'static [&'static str] {
        &["balanced", "offensive", "defensive", "standoff"]
    }

    /// Attack at parity, advance, use every arm.
    #[must_use]
    pub fn balanced() -> Self {
        Self {
            name: "Balanced".to_string(),
            description: "Combined arms, attacks at parity".to_string(),
            engage_from_turn: 1,
            attack_ratio_percent: 100,
            advance: true,
            missile_salvo: 2,
            min_confidence_percent: 40,
            use_sead: true,
            ew_focus: EwFocus::Alternate,
            commit_special_forces: true,
            insertion: Insertion::Ground,
        }
    }

    /// Attack anything adjacent and keep pushing.
    #[must_use]
    pub fn offensive() -> Self {
        Self {
            name: "Offensive".to_string(),
            description: "Early, heavy attacks at any odds".to_string(),
            engage_from_turn: 1,
            attack_ratio_percent: 50,
            advance: true,
            missile_salvo: 4,
            min_confidence_percent: 0,
            use_sead: false,
            ew_focus: EwFocus::Comms,
            commit_special_forces: true,
            insertion: Insertion::Helicopter,
        }
    }

    /// Hold ground, strike only what is well confirmed.
    #[must_use]
    pub fn defensive() -> Self {
        Self {
            name: "Defensive".to_string(),
            description: "Dig in and only counterattack with a clear edge".to_string(),
            engage_from_turn: 4,
            attack_ratio_percent: 200,
            advance: false,
            missile_salvo: 1,
            min_confidence_percent: 60,
            use_sead: false,
            ew_focus: EwFocus::Radar,
            commit_special_forces: false,
            insertion: Insertion::Ground,
        }
    }

    /// Fight with fires, missiles and air; ground units stay put.
    #[must_use]
    pub fn standoff() -> Self {
        Self {
            name: "Standoff".to_string(),
            description: "Attrit with fires before any ground contact".to_string(),
            engage_from_turn: 6,
            attack_ratio_percent: 150,
            advance: false,
            missile_salvo: 3,
            min_confidence_percent: 50,
            use_sead: true,
            ew_focus: EwFocus::Sigint,
            commit_special_forces: true,
            insertion: Insertion::Halo,
        }
    }

    /// Orders for the turn `view` is about to play.
    #[must_use]
    pub fn orders(&self, view: &FactionView, catalog: &Catalog) -> OrdersPayload {
        let mut orders = OrdersPayload::empty(view.faction, view.turn);
        let floor = pct(i64::from(self.min_confidence_percent));
        let contacts: Vec<&IntelReport> = view
            .contacts
            .iter()
            .filter(|c| c.confidence >= floor && c.position.is_some())
            .collect();

        for unit in view.own_units.iter().filter(|u| u.is_operational()) {
            let Some(spec) = catalog.platform(&unit.platform) else {
                continue;
            };
            let in_range = |c: &IntelReport| c.position.is_some_and(|p| unit.position.distance(p) <= spec.range);
            match unit.domain {
                Domain::Ground => orders.ground.push(self.ground_order(view.turn, unit, &contacts)),
                Domain::Artillery => {
                    if let Some(c) = nearest(unit.position, &contacts, |c| is_surface(c) && in_range(c)) {
                        orders
                            .artillery
                            .push(Order::new(unit.id, ArtilleryMission::FireMission, Target::Unit(c.unit)));
                    } else if spec.artillery.as_ref().is_some_and(|a| a.radar) {
                        orders.artillery.push(Order::new(
                            unit.id,
                            ArtilleryMission::CounterBattery,
                            Target::Area {
                                center: unit.position,
                                radius: spec.range,
                            },
                        ));
                    }
                }
                Domain::Missile if unit.missiles > 0 && unit.reload == 0 => {
                    let high_value = nearest(unit.position, &contacts, |c| {
                        in_range(c) && matches!(c.domain, Some(Domain::Missile | Domain::AirDefense | Domain::Artillery))
                    });
                    let any = || nearest(unit.position, &contacts, |c| is_surface(c) && in_range(c));
                    if let Some(c) = high_value.or_else(any) {
                        orders.missile.push(
                            Order::new(unit.id, MissileMission::Strike, Target::Unit(c.unit))
                                .with_quantity(self.missile_salvo.min(unit.missiles)),
                        );
                    }
                }
                Domain::Air => self.air_order(unit, spec, &contacts, &mut orders),
                Domain::Drone => self.drone_order(unit, spec, &contacts, &mut orders),
                Domain::ElectronicWarfare => {
                    let mission = match self.ew_focus {
                        EwFocus::Radar => EwMission::JamRadar,
                        EwFocus::Comms => EwMission::JamComms,
                        EwFocus::Alternate if view.turn % 2 == 1 => EwMission::JamRadar,
                        EwFocus::Alternate => EwMission::JamComms,
                        EwFocus::Sigint => EwMission::Sigint,
                    };
                    let center = nearest(unit.position, &contacts, in_range)
                        .and_then(|c| c.position)
                        .unwrap_or(unit.position);
                    orders.ew.push(Order::new(
                        unit.id,
                        mission,
                        Target::Area {
                            center,
                            radius: spec.range.min(3),
                        },
                    ));
                }
                Domain::Helicopter => {
                    let scout = spec.helicopter.as_ref().is_some_and(|h| h.attack == 0);
                    if let Some(c) = nearest(unit.position, &contacts, |c| is_surface(c) && in_range(c)) {
                        let mission = if scout {
                            HelicopterMission::Scout
                        } else {
                            HelicopterMission::Attack
                        };
                        orders.helicopter.push(Order::new(unit.id, mission, Target::Unit(c.unit)));
                    }
                }
                Domain::SpecialForces if self.commit_special_forces => {
                    if let Some(c) = nearest(unit.position, &contacts, |c| is_surface(c) && in_range(c)) {
                        let task = match c.domain {
                            Some(Domain::Missile | Domain::AirDefense) => SfTask::DirectAction,
                            Some(Domain::Artillery) => SfTask::Raid,
                            _ => SfTask::Recon,
                        };
                        orders.special_forces.push(Order::new(
                            unit.id,
                            SpecialForcesMission {
                                task,
                                insertion: self.insertion,
                            },
                            Target::Unit(c.unit),
                        ));
                    }
                }
                Domain::Missile | Domain::SpecialForces | Domain::AirDefense | Domain::Isr => {}
            }
        }
        orders
    }

    fn ground_order(&self, turn: u32, unit: &Unit, contacts: &[&IntelReport]) -> Order<GroundMission> {
        let hold = Order::new(unit.id, GroundMission::Defend, Target::Cell(unit.position));
        if turn < self.engage_from_turn {
            return hold;
        }
        let Some(contact) = nearest(unit.position, contacts, is_surface) else {
            return hold;
        };
        let Some(at) = contact.position else {
            return hold;
        };
        let distance = unit.position.distance(at);
        if distance == 1 && unit.ammo > 0 {
            let enemy = contact.strength_estimate.unwrap_or(unit.strength).max(1);
            if u64::from(unit.strength) * 100 >= u64::from(enemy) * u64::from(self.attack_ratio_percent) {
                let posture = if u64::from(unit.strength) >= u64::from(enemy) * 2 {
                    AttackPosture::Assault
                } else {
                    AttackPosture::Probe
                };
                return Order::new(unit.id, GroundMission::Attack(posture), Target::Unit(contact.unit));
            }
            return hold;
        }
        if distance > 1 && self.advance {
            return Order::new(unit.id, GroundMission::Move, Target::Cell(at));
        }
        hold
    }

    fn air_order(&self, unit: &Unit, spec: &PlatformSpec, contacts: &[&IntelReport], orders: &mut OrdersPayload) {
        let Some(air) = spec.air.as_ref() else {
            return;
        };
        if air.awacs {
            return;
        }
        let in_range = |c: &IntelReport| c.position.is_some_and(|p| unit.position.distance(p) <= spec.range);
        if air.ground_attack == 0 {
            let patrol = unit.standing_cap.unwrap_or(unit.position);
            orders.air.push(Order::new(unit.id, AirMission::Cap, Target::Cell(patrol)));
            return;
        }
        let defences = if self.use_sead {
            nearest(unit.position, contacts, |c| c.domain == Some(Domain::AirDefense) && in_range(c))
        } else {
            None
        };
        if let Some(c) = defences {
            orders.air.push(Order::new(unit.id, AirMission::Sead, Target::Unit(c.unit)));
        } else if let Some(c) = nearest(unit.position, contacts, |c| c.domain == Some(Domain::Ground) && in_range(c)) {
            orders.air.push(Order::new(unit.id, AirMission::Cas, Target::Unit(c.unit)));
        } else if let Some(c) = nearest(unit.position, contacts, |c| is_surface(c) && in_range(c)) {
            orders.air.push(Order::new(unit.id, AirMission::Strike, Target::Unit(c.unit)));
        }
    }

    fn drone_order(&self, unit: &Unit, spec: &PlatformSpec, contacts: &[&IntelReport], orders: &mut OrdersPayload) {
        let Some(drone) = spec.drone.as_ref() else {
            return;
        };
        let in_range = |c: &IntelReport| c.position.is_some_and(|p| unit.position.distance(p) <= spec.range);
        match drone.kind {
            DroneKind::Isr => {
                let center = nearest(unit.position, contacts, in_range)
                    .and_then(|c| c.position)
                    .unwrap_or(unit.position);
                orders
                    .drone
                    .push(Order::new(unit.id, DroneMission::Isr, Target::Area { center, radius: 2 }));
            }
            DroneKind::Swarm => {
                if let Some(c) = nearest(unit.position, contacts, |c| c.domain == Some(Domain::AirDefense) && in_range(c)) {
                    orders
                        .drone
                        .push(Order::new(unit.id, DroneMission::Swarm, Target::Unit(c.unit)));
                }
            }
            DroneKind::Loitering | DroneKind::Ucav => {
                if let Some(c) = nearest(unit.position, contacts, |c| is_surface(c) && in_range(c)) {
                    let quantity = if self.use_sead { 4 } else { 6 };
                    orders.drone.push(
                        Order::new(unit.id, DroneMission::Strike, Target::Unit(c.unit))
                            .with_quantity(quantity.min(unit.missiles.max(1))),
                    );
                }
            }
        }
    }
}

/// The nearest accepted contact, ties broken by unit id.
fn nearest<'a>(
    from: HexCoord,
    contacts: &[&'a IntelReport],
    accept: impl Fn(&IntelReport) -> bool,
) -> Option<&'a IntelReport> {
    contacts
        .iter()
        .copied()
        .filter(|c| accept(c))
        .filter_map(|c| c.position.map(|p| (c, from.distance(p))))
        .min_by_key(|(c, d)| (*d, c.unit))
        .map(|(c, _)| c)
}

fn is_surface(contact: &IntelReport) -> bool {
    contact
        .domain
        .is_some_and(|d| !matches!(d, Domain::Air | Domain::Helicopter | Domain::Drone))
}

#[cfg(test)]
mod tests {
    use super::*;
    use warsim_core::factions::FactionId;
    use warsim_core::fog::IntelQuality;
    use warsim_core::catalog::SensorKind;

    fn view_with(units: Vec<Unit>, contacts: Vec<IntelReport>, turn: u32) -> FactionView {
        FactionView {
            faction: FactionId::Blue,
            turn,
            time_of_day: warsim_core::turn::TimeOfDay::Day,
            weather: warsim_core::turn::Weather::Clear,
            victory_points: warsim_core::turn::VictoryPoints::default(),
            own_units: units,
            own_nodes: Vec::new(),
            contacts,
            summary: warsim_core::fog::IntelSummary::default(),
        }
    }

    fn infantry(id: u32, at: HexCoord) -> Unit {
        let mut unit = Unit::new(id, FactionId::Blue, Domain::Ground, "infantry_brigade", at, 100);
        unit.ammo = 300;
        unit
    }

    fn contact(unit: u32, at: HexCoord, strength: Option<u32>, confidence: i64) -> IntelReport {
        IntelReport {
            observer: FactionId::Blue,
            unit,
            confidence: pct(confidence),
            sensor: SensorKind::Radar,
            quality: IntelQuality::Identified,
            position: Some(at),
            domain: Some(Domain::Ground),
            platform: Some("infantry_brigade".into()),
            strength_estimate: strength,
            turn: 1,
        }
    }

    #[test]
    fn test_presets_by_name() {
        for name in Doctrine::preset_names() {
            let doctrine = Doctrine::preset(name).unwrap();
            assert_eq!(doctrine.name.to_ascii_lowercase(), *name);
        }
        assert!(matches!(Doctrine::preset("berserk"), Err(DoctrineError::UnknownPreset(_))));
    }

    #[test]
    fn test_from_ron_defaults() {
        let doctrine = Doctrine::from_ron_str("(name: \"Minimal\")").unwrap();
        assert_eq!(doctrine.engage_from_turn, 1);
        assert_eq!(doctrine.attack_ratio_percent, 100);
        assert_eq!(doctrine.missile_salvo, 2);
        assert_eq!(doctrine.ew_focus, EwFocus::Alternate);
        assert!(!doctrine.advance);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Doctrine::load("/nonexistent/doctrine.ron"),
            Err(DoctrineError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_attacks_only_with_the_odds() {
        let catalog = Catalog::standard();
        let view = view_with(
            vec![infantry(1, HexCoord::new(2, 2))],
            vec![contact(9, HexCoord::new(3, 2), Some(60), 90)],
            1,
        );

        let balanced = Doctrine::balanced().orders(&view, &catalog);
        assert_eq!(balanced.ground.len(), 1);
        assert!(matches!(balanced.ground[0].mission, GroundMission::Attack(AttackPosture::Probe)));
        assert_eq!(balanced.ground[0].target, Target::Unit(9));

        let defensive = Doctrine::defensive().orders(&view, &catalog);
        assert_eq!(defensive.ground[0].mission, GroundMission::Defend);
    }

    #[test]
    fn test_low_confidence_contacts_are_ignored() {
        let catalog = Catalog::standard();
        let view = view_with(
            vec![infantry(1, HexCoord::new(2, 2))],
            vec![contact(9, HexCoord::new(5, 2), None, 20)],
            3,
        );

        let balanced = Doctrine::balanced().orders(&view, &catalog);
        assert_eq!(balanced.ground[0].mission, GroundMission::Defend);

        let offensive = Doctrine::offensive().orders(&view, &catalog);
        assert_eq!(offensive.ground[0].mission, GroundMission::Move);
        assert_eq!(offensive.ground[0].target, Target::Cell(HexCoord::new(5, 2)));
    }

    #[test]
    fn test_holds_before_engage_turn() {
        let catalog = Catalog::standard();
        let view = view_with(
            vec![infantry(1, HexCoord::new(2, 2))],
            vec![contact(9, HexCoord::new(3, 2), Some(10), 90)],
            2,
        );
        let orders = Doctrine::standoff().orders(&view, &catalog);
        assert_eq!(orders.turn, 2);
        assert_eq!(orders.ground[0].mission, GroundMission::Defend);
    }

    #[test]
    fn test_destroyed_units_get_no_orders() {
        let catalog = Catalog::standard();
        let mut dead = infantry(1, HexCoord::new(2, 2));
        dead.strength = 0;
        dead.status = warsim_core::unit::UnitStatus::Destroyed;
        let view = view_with(vec![dead], Vec::new(), 1);
        assert!(Doctrine::balanced().orders(&view, &catalog).is_empty());
    }
}
