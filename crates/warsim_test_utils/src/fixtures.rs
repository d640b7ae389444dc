//! Test fixtures and helpers.
//!
//! Pre-built scenarios and a simple order generator for consistent
//! testing.

use std::sync::Arc;

use warsim_core::catalog::Catalog;
use warsim_core::config::EngineConfig;
use warsim_core::engine::Engine;
use warsim_core::factions::FactionId;
use warsim_core::fog::{FactionView, IntelReport};
use warsim_core::hex::{HexCoord, HexMap, Terrain};
use warsim_core::math::Fixed;
use warsim_core::orders::{
    AirMission, ArtilleryMission, AttackPosture, DroneMission, EwMission, GroundMission,
    HelicopterMission, Insertion, MissileMission, Order, OrdersPayload, SfTask, SpecialForcesMission, Target,
};
use warsim_core::scenario::Scenario;
use warsim_core::turn::Weather;
use warsim_core::unit::{Domain, Unit};
use warsim_core::world::WorldState;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real resolution code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// A combined-arms front with every domain represented on both sides.
pub const FRONTLINE: &str = r#"(
    name: "frontline",
    seed: 1,
    turn_limit: 8,
    victory_points: Some(120),
    map: (
        width: 16,
        height: 12,
        terrain_overrides: [
            ((q: 7, r: 4), Forest), ((q: 8, r: 4), Forest),
            ((q: 7, r: 7), Urban), ((q: 8, r: 7), Urban),
            ((q: 3, r: 9), Hills), ((q: 12, r: 2), Hills),
        ],
        rivers: [(q: 8, r: 5), (q: 8, r: 6)],
        objectives: [
            (cell: (q: 7, r: 7), vp: 2),
            (cell: (q: 8, r: 4), vp: 1),
            (cell: (q: 2, r: 5), vp: 1, holder: Some(Blue)),
            (cell: (q: 13, r: 5), vp: 1, holder: Some(Red)),
        ],
    ),
    deployments: [
        (faction: Blue, platform: "infantry_brigade", position: (q: 6, r: 4), name: Some("1st Rifles")),
        (faction: Blue, platform: "mech_brigade", position: (q: 6, r: 6)),
        (faction: Blue, platform: "armoured_brigade", position: (q: 5, r: 8)),
        (faction: Blue, platform: "sp_artillery_regiment", position: (q: 4, r: 5)),
        (faction: Blue, platform: "mlrs_battalion", position: (q: 3, r: 6)),
        (faction: Blue, platform: "srbm_brigade", position: (q: 1, r: 5)),
        (faction: Blue, platform: "sam_long_range", position: (q: 2, r: 4)),
        (faction: Blue, platform: "bmd_battery", position: (q: 2, r: 6)),
        (faction: Blue, platform: "shorad_battery", position: (q: 5, r: 5)),
        (faction: Blue, platform: "fighter_squadron", position: (q: 1, r: 3)),
        (faction: Blue, platform: "strike_squadron", position: (q: 1, r: 7)),
        (faction: Blue, platform: "isr_drone_flight", position: (q: 3, r: 3)),
        (faction: Blue, platform: "loitering_munition_battery", position: (q: 4, r: 7)),
        (faction: Blue, platform: "ew_battalion", position: (q: 3, r: 5)),
        (faction: Blue, platform: "radar_station", position: (q: 2, r: 5)),
        (faction: Blue, platform: "attack_helicopter_squadron", position: (q: 4, r: 4)),
        (faction: Blue, platform: "special_forces_group", position: (q: 5, r: 3)),
        (faction: Red, platform: "infantry_brigade", position: (q: 9, r: 4), dug_in: 1),
        (faction: Red, platform: "mech_brigade", position: (q: 9, r: 6)),
        (faction: Red, platform: "armoured_brigade", position: (q: 10, r: 8)),
        (faction: Red, platform: "sp_artillery_regiment", position: (q: 11, r: 5)),
        (faction: Red, platform: "mlrs_battalion", position: (q: 12, r: 6)),
        (faction: Red, platform: "srbm_brigade", position: (q: 14, r: 5)),
        (faction: Red, platform: "cruise_missile_battery", position: (q: 14, r: 7)),
        (faction: Red, platform: "sam_long_range", position: (q: 13, r: 4)),
        (faction: Red, platform: "bmd_battery", position: (q: 13, r: 6)),
        (faction: Red, platform: "shorad_battery", position: (q: 10, r: 5)),
        (faction: Red, platform: "fighter_squadron", position: (q: 14, r: 3)),
        (faction: Red, platform: "ucav_squadron", position: (q: 12, r: 3)),
        (faction: Red, platform: "swarm_drone_company", position: (q: 11, r: 7)),
        (faction: Red, platform: "ew_battalion", position: (q: 12, r: 5)),
        (faction: Red, platform: "radar_station", position: (q: 13, r: 5)),
        (faction: Red, platform: "attack_helicopter_squadron", position: (q: 11, r: 4)),
        (faction: Red, platform: "special_forces_group", position: (q: 10, r: 3)),
    ],
    nodes: [
        (id: 1, faction: Blue, position: (q: 0, r: 5), source: true, ammo: 800, fuel: 800, generation_per_turn: 300),
        (id: 2, faction: Blue, position: (q: 3, r: 4), ammo: 300, fuel: 300),
        (id: 3, faction: Blue, position: (q: 4, r: 8), ammo: 300, fuel: 300),
        (id: 11, faction: Red, position: (q: 15, r: 5), source: true, ammo: 800, fuel: 800, generation_per_turn: 300),
        (id: 12, faction: Red, position: (q: 12, r: 4), ammo: 300, fuel: 300),
        (id: 13, faction: Red, position: (q: 11, r: 8), ammo: 300, fuel: 300),
    ],
    routes: [
        (from: 1, to: 2, capacity: 200),
        (from: 1, to: 3, capacity: 200),
        (from: 11, to: 12, capacity: 200),
        (from: 11, to: 13, capacity: 200),
    ],
    weather_schedule: [(4, Cloudy), (6, Rain)],
    reinforcements: [
        (turn: 3, faction: Blue, platform: "infantry_brigade", position: (q: 1, r: 8)),
        (turn: 3, faction: Red, platform: "infantry_brigade", position: (q: 14, r: 8)),
    ],
)"#;

/// The built-in reference catalog.
#[must_use]
pub fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::standard())
}

/// The [`FRONTLINE`] scenario with another seed.
///
/// # Panics
///
/// Panics if the embedded scenario does not parse.
#[must_use]
pub fn frontline(seed: u64) -> Scenario {
    Scenario::from_ron_str(FRONTLINE)
        .expect("frontline scenario parses")
        .with_seed(seed)
}

/// An engine over [`frontline`].
///
/// # Panics
///
/// Panics if the scenario does not build.
#[must_use]
pub fn frontline_engine(seed: u64, config: EngineConfig) -> Engine {
    Engine::from_scenario(&frontline(seed), catalog(), config).expect("frontline scenario builds")
}

/// An empty world of open plains at noon in clear weather.
#[must_use]
pub fn open_world(width: u32, height: u32) -> WorldState {
    WorldState::new(HexMap::new(width, height, Terrain::Plains), 12, Weather::Clear)
}

fn nearest<'a>(
    from: HexCoord,
    contacts: &'a [IntelReport],
    accept: impl Fn(&IntelReport) -> bool,
) -> Option<(&'a IntelReport, HexCoord, u32)> {
    contacts
        .iter()
        .filter(|c| accept(c))
        .filter_map(|c| c.position.map(|p| (c, p, from.distance(p))))
        .min_by_key(|(c, _, d)| (*d, c.unit))
}

fn surface(domain: Option<Domain>) -> bool {
    domain.is_some_and(|d| !matches!(d, Domain::Air | Domain::Helicopter | Domain::Drone))
}

/// Orders that push every unit at the nearest visible enemy.
///
/// Only what `view` shows is used, so the orders are what a fog-respecting
/// producer could have written. Orders a unit cannot carry out are still
/// possible and end up rejected at intake.
#[must_use]
pub fn pressing_orders(view: &FactionView, catalog: &Catalog) -> OrdersPayload {
    let mut orders = OrdersPayload::empty(view.faction, view.turn);
    let contacts = &view.contacts;
    for unit in view.own_units.iter().filter(|u| u.is_operational()) {
        let Some(spec) = catalog.platform(&unit.platform) else {
            continue;
        };
        let range = spec.range;
        let in_range = |c: &IntelReport| c.position.is_some_and(|p| unit.position.distance(p) <= range);
        match unit.domain {
            Domain::Ground => orders.ground.push(ground_order(unit, contacts)),
            Domain::Artillery => {
                if let Some((c, _, _)) = nearest(unit.position, contacts, |c| surface(c.domain) && in_range(c)) {
                    orders
                        .artillery
                        .push(Order::new(unit.id, ArtilleryMission::FireMission, Target::Unit(c.unit)));
                }
            }
            Domain::Missile if unit.missiles > 0 && unit.reload == 0 => {
                if let Some((c, _, _)) = nearest(unit.position, contacts, |c| surface(c.domain) && in_range(c)) {
                    orders.missile.push(
                        Order::new(unit.id, MissileMission::Strike, Target::Unit(c.unit)).with_quantity(2),
                    );
                }
            }
            Domain::Air if unit.platform.contains("fighter") => {
                orders
                    .air
                    .push(Order::new(unit.id, AirMission::Cap, Target::Cell(unit.position)));
            }
            Domain::Air if unit.platform.contains("strike") => {
                let sead = nearest(unit.position, contacts, |c| {
                    c.domain == Some(Domain::AirDefense) && in_range(c)
                });
                let ground = nearest(unit.position, contacts, |c| surface(c.domain) && in_range(c));
                if let Some((c, _, _)) = sead {
                    orders
                        .air
                        .push(Order::new(unit.id, AirMission::Sead, Target::Unit(c.unit)));
                } else if let Some((c, _, _)) = ground {
                    orders
                        .air
                        .push(Order::new(unit.id, AirMission::Strike, Target::Unit(c.unit)));
                }
            }
            Domain::Drone if unit.platform.contains("isr") => {
                let center = nearest(unit.position, contacts, in_range).map_or(unit.position, |(_, p, _)| p);
                orders.drone.push(Order::new(
                    unit.id,
                    DroneMission::Isr,
                    Target::Area { center, radius: 2 },
                ));
            }
            Domain::Drone if unit.platform.contains("swarm") => {
                if let Some((c, _, _)) = nearest(unit.position, contacts, |c| {
                    c.domain == Some(Domain::AirDefense) && in_range(c)
                }) {
                    orders
                        .drone
                        .push(Order::new(unit.id, DroneMission::Swarm, Target::Unit(c.unit)).with_quantity(12));
                }
            }
            Domain::Drone => {
                if let Some((c, _, _)) = nearest(unit.position, contacts, |c| surface(c.domain) && in_range(c)) {
                    orders
                        .drone
                        .push(Order::new(unit.id, DroneMission::Strike, Target::Unit(c.unit)).with_quantity(6));
                }
            }
            Domain::ElectronicWarfare => {
                let mission = if view.turn % 2 == 1 {
                    EwMission::JamRadar
                } else {
                    EwMission::JamComms
                };
                orders.ew.push(Order::new(
                    unit.id,
                    mission,
                    Target::Area {
                        center: unit.position,
                        radius: range,
                    },
                ));
            }
            Domain::Helicopter => {
                if let Some((c, _, _)) = nearest(unit.position, contacts, |c| surface(c.domain) && in_range(c)) {
                    orders
                        .helicopter
                        .push(Order::new(unit.id, HelicopterMission::Attack, Target::Unit(c.unit)));
                }
            }
            Domain::SpecialForces => {
                if let Some((c, _, _)) = nearest(unit.position, contacts, |c| surface(c.domain) && in_range(c)) {
                    let task = if c.domain == Some(Domain::Missile) {
                        SfTask::DirectAction
                    } else {
                        SfTask::Recon
                    };
                    orders.special_forces.push(Order::new(
                        unit.id,
                        SpecialForcesMission {
                            task,
                            insertion: Insertion::Ground,
                        },
                        Target::Unit(c.unit),
                    ));
                }
            }
            Domain::Missile | Domain::Air | Domain::AirDefense | Domain::Isr => {}
        }
    }
    orders
}

fn ground_order(unit: &Unit, contacts: &[IntelReport]) -> Order<GroundMission> {
    match nearest(unit.position, contacts, |c| surface(c.domain)) {
        Some((c, _, 1)) if unit.ammo > 0 => Order::new(
            unit.id,
            GroundMission::Attack(AttackPosture::Assault),
            Target::Unit(c.unit),
        ),
        Some((_, at, d)) if d > 1 => Order::new(unit.id, GroundMission::Move, Target::Cell(at)),
        _ => Order::new(unit.id, GroundMission::Defend, Target::Cell(unit.position)),
    }
}

/// Pressing orders for both factions from the engine's current views.
#[must_use]
pub fn pressing_pair(engine: &Engine) -> (OrdersPayload, OrdersPayload) {
    (
        pressing_orders(&engine.fog_view(FactionId::Blue), engine.catalog()),
        pressing_orders(&engine.fog_view(FactionId::Red), engine.catalog()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontline_builds() {
        let engine = frontline_engine(3, EngineConfig::default());
        assert_eq!(engine.rules().seed, 3);
        assert_eq!(engine.world().unit_ids().len(), 34);
        assert!(engine.world().has_combat_power(FactionId::Blue));
        assert!(engine.world().has_combat_power(FactionId::Red));
    }

    #[test]
    fn test_pressing_orders_are_for_the_coming_turn() {
        let engine = frontline_engine(3, EngineConfig::default());
        let (blue, red) = pressing_pair(&engine);
        assert_eq!(blue.turn, 1);
        assert_eq!(red.faction, FactionId::Red);
        assert!(!blue.ground.is_empty());
    }
}
