//! Severed supply lines.
//!
//! A unit whose only nearby depot is cut from the source loses readiness
//! every turn, faster the longer it is cut off, and recovers once the
//! route is repaired.

use warsim_core::config::EngineConfig;
use warsim_core::effects::ActiveEffects;
use warsim_core::engine::Engine;
use warsim_core::events::{EventKind, SupplyState};
use warsim_core::factions::FactionId;
use warsim_core::hex::HexCoord;
use warsim_core::logistics::{run_logistics, Route, SupplyNode};
use warsim_core::math::Fixed;
use warsim_core::orders::OrdersPayload;
use warsim_core::scenario::{place, RunRules};
use warsim_core::unit::UnitId;
use warsim_core::world::WorldState;
use warsim_test_utils::fixtures::{catalog, open_world};

/// Blue infantry beside a stocked depot whose only route to the source
/// has no capacity. Red sits far away with no network at all.
fn severed() -> (WorldState, UnitId) {
    let catalog = catalog();
    let mut world = open_world(12, 6);

    let mut source = SupplyNode::new(1, FactionId::Blue, HexCoord::new(0, 2));
    source.source = true;
    source.ammo = 1000;
    source.fuel = 1000;
    source.generation_per_turn = 100;
    world.add_node(source).unwrap();

    let mut depot = SupplyNode::new(2, FactionId::Blue, HexCoord::new(6, 2));
    depot.ammo = 500;
    depot.fuel = 500;
    world.add_node(depot).unwrap();
    world.add_route(Route::new(1, 2, 0)).unwrap();

    let unit = place(&mut world, &catalog, FactionId::Blue, "infantry_brigade", HexCoord::new(6, 3), None).unwrap();
    place(&mut world, &catalog, FactionId::Red, "infantry_brigade", HexCoord::new(11, 0), None).unwrap();
    (world, unit)
}

fn readiness(world: &WorldState, unit: UnitId) -> Fixed {
    world.unit(unit).unwrap().readiness
}

fn status_of(events: &[EventKind], unit: UnitId) -> (SupplyState, i64, u32) {
    events
        .iter()
        .find_map(|e| match *e {
            EventKind::SupplyStatus {
                unit: u,
                state,
                readiness,
                cut_off_turns,
            } if u == unit => Some((state, readiness, cut_off_turns)),
            _ => None,
        })
        .unwrap()
}

#[test]
fn test_readiness_falls_until_route_restored() {
    let catalog = catalog();
    let params = EngineConfig::default().logistics();
    let effects = ActiveEffects::new();
    let (mut world, unit) = severed();

    let mut last = readiness(&world, unit);
    let mut last_loss = Fixed::ZERO;
    for turn in 1..=4 {
        let events = run_logistics(&mut world, &catalog, &effects, &params);
        let (state, _, cut_off) = status_of(&events, unit);
        assert_eq!(state, SupplyState::CutOff, "turn {turn}");
        assert_eq!(cut_off, turn);

        let now = readiness(&world, unit);
        assert!(now < last, "turn {turn}: readiness {now} not below {last}");
        let loss = last - now;
        assert!(loss > last_loss, "turn {turn}: loss {loss} did not grow past {last_loss}");
        last = now;
        last_loss = loss;
    }

    world.route_mut(1, 2).unwrap().capacity = 200;
    let events = run_logistics(&mut world, &catalog, &effects, &params);
    let (state, _, cut_off) = status_of(&events, unit);
    assert_eq!(state, SupplyState::Supplied);
    assert_eq!(cut_off, 0);
    assert!(readiness(&world, unit) > last);
    assert!(events
        .iter()
        .any(|e| matches!(e, EventKind::SupplyDelivered { unit: u, node: 2, .. } if *u == unit)));
}

#[test]
fn test_engine_reports_cut_off_units() {
    let (world, unit) = severed();
    let mut engine = Engine::new(world, catalog(), EngineConfig::default(), RunRules::new("severed", 3, 10));

    let mut percents = Vec::new();
    for turn in 1..=3 {
        let result = engine
            .resolve_turn(OrdersPayload::empty(FactionId::Blue, turn), OrdersPayload::empty(FactionId::Red, turn))
            .unwrap();
        let kinds: Vec<EventKind> = result.events.into_iter().map(|e| e.kind).collect();
        let (state, percent, cut_off) = status_of(&kinds, unit);
        assert_eq!(state, SupplyState::CutOff);
        assert_eq!(cut_off, turn);
        percents.push(percent);
    }
    assert!(percents.windows(2).all(|w| w[1] < w[0]), "{percents:?}");
    assert!(percents[0] < 100);
}
