//! Turns resolve whatever the producers deliver: nothing, too late, the
//! wrong payload, or a mix of good and bad orders.

use warsim_core::config::EngineConfig;
use warsim_core::engine::{Engine, TurnResult};
use warsim_core::events::EventKind;
use warsim_core::factions::FactionId;
use warsim_core::hex::HexCoord;
use warsim_core::intake::RejectionReason;
use warsim_core::orders::{AirMission, GroundMission, Order, OrdersPayload, Submission, Target};
use warsim_core::scenario::{place, RunRules};
use warsim_core::turn::Phase;
use warsim_core::unit::UnitId;
use warsim_test_utils::fixtures::{catalog, open_world};

struct Setup {
    engine: Engine,
    blue_infantry: UnitId,
    blue_fighter: UnitId,
    red_infantry: UnitId,
}

fn setup() -> Setup {
    let catalog = catalog();
    let mut world = open_world(10, 8);
    let blue_infantry = place(&mut world, &catalog, FactionId::Blue, "infantry_brigade", HexCoord::new(2, 2), None).unwrap();
    let blue_fighter = place(&mut world, &catalog, FactionId::Blue, "fighter_squadron", HexCoord::new(1, 1), None).unwrap();
    let red_infantry = place(&mut world, &catalog, FactionId::Red, "infantry_brigade", HexCoord::new(7, 5), None).unwrap();
    let engine = Engine::new(world, catalog, EngineConfig::default(), RunRules::new("partial", 12, 20));
    Setup {
        engine,
        blue_infantry,
        blue_fighter,
        red_infantry,
    }
}

fn accepted(result: &TurnResult, faction: FactionId) -> (u32, u32) {
    result
        .events
        .iter()
        .find_map(|e| match e.kind {
            EventKind::OrdersAccepted {
                faction: f,
                accepted,
                rejected,
            } if f == faction => Some((accepted, rejected)),
            _ => None,
        })
        .unwrap()
}

fn rejections(result: &TurnResult, faction: FactionId) -> Vec<(Option<UnitId>, RejectionReason)> {
    result
        .events
        .iter()
        .filter_map(|e| match e.kind {
            EventKind::OrderRejected {
                faction: f,
                unit,
                reason,
            } if f == faction => Some((unit, reason)),
            _ => None,
        })
        .collect()
}

fn moved(result: &TurnResult, unit: UnitId) -> bool {
    result
        .events
        .iter()
        .any(|e| matches!(e.kind, EventKind::UnitMoved { unit: u, .. } if u == unit))
}

// =============================================================================
// Nothing delivered
// =============================================================================

#[test]
fn test_empty_payloads_resolve() {
    let Setup { mut engine, blue_infantry, .. } = setup();
    let start = engine.world().unit(blue_infantry).unwrap().position;
    for turn in 1..=3 {
        let result = engine
            .resolve_turn(OrdersPayload::empty(FactionId::Blue, turn), OrdersPayload::empty(FactionId::Red, turn))
            .unwrap();
        assert_eq!(result.turn, turn);
        assert_eq!(accepted(&result, FactionId::Blue), (0, 0));
        assert_eq!(accepted(&result, FactionId::Red), (0, 0));
        assert!(!result
            .events
            .iter()
            .any(|e| matches!(e.kind, EventKind::EngagementResolved(_))));
    }
    assert_eq!(engine.world().unit(blue_infantry).unwrap().position, start);
}

#[test]
fn test_both_producers_time_out() {
    let Setup { mut engine, .. } = setup();
    let result = engine.resolve_turn(Submission::TimedOut, Submission::TimedOut).unwrap();

    let late: Vec<FactionId> = result
        .events
        .iter()
        .filter_map(|e| match e.kind {
            EventKind::OrdersTimedOut { faction } => Some(faction),
            _ => None,
        })
        .collect();
    assert_eq!(late, vec![FactionId::Blue, FactionId::Red]);
    assert!(!result
        .events
        .iter()
        .any(|e| matches!(e.kind, EventKind::OrdersAccepted { .. })));
    assert_eq!(engine.history().len(), 1);
    assert!(engine.history()[0].any_timed_out());
}

// =============================================================================
// Whole payload refused
// =============================================================================

#[test]
fn test_wrong_turn_payload_stands_fast() {
    let Setup {
        mut engine,
        blue_infantry,
        ..
    } = setup();
    let mut stale = OrdersPayload::empty(FactionId::Blue, 5);
    stale
        .ground
        .push(Order::new(blue_infantry, GroundMission::Move, Target::Cell(HexCoord::new(3, 2))));

    let result = engine.resolve_turn(stale, OrdersPayload::empty(FactionId::Red, 1)).unwrap();

    assert_eq!(
        rejections(&result, FactionId::Blue),
        vec![(None, RejectionReason::WrongTurn { expected: 1, got: 5 })]
    );
    assert!(!moved(&result, blue_infantry));
    assert_eq!(engine.world().unit(blue_infantry).unwrap().position, HexCoord::new(2, 2));
}

#[test]
fn test_payload_for_other_faction_refused() {
    let Setup { mut engine, .. } = setup();
    let result = engine
        .resolve_turn(OrdersPayload::empty(FactionId::Red, 1), OrdersPayload::empty(FactionId::Red, 1))
        .unwrap();
    assert_eq!(
        rejections(&result, FactionId::Blue),
        vec![(None, RejectionReason::WrongFaction)]
    );
    assert!(rejections(&result, FactionId::Red).is_empty());
}

// =============================================================================
// Mixed payloads
// =============================================================================

#[test]
fn test_valid_orders_survive_bad_neighbours() {
    let Setup {
        mut engine,
        blue_infantry,
        red_infantry,
        ..
    } = setup();
    let mut orders = OrdersPayload::empty(FactionId::Blue, 1);
    orders
        .ground
        .push(Order::new(blue_infantry, GroundMission::Move, Target::Cell(HexCoord::new(3, 2))));
    orders
        .ground
        .push(Order::new(999, GroundMission::Defend, Target::Cell(HexCoord::new(0, 0))));
    orders
        .ground
        .push(Order::new(red_infantry, GroundMission::Defend, Target::Cell(HexCoord::new(7, 5))));

    let result = engine.resolve_turn(orders, OrdersPayload::empty(FactionId::Red, 1)).unwrap();

    assert_eq!(accepted(&result, FactionId::Blue), (1, 2));
    assert_eq!(
        rejections(&result, FactionId::Blue),
        vec![
            (Some(999), RejectionReason::UnknownUnit),
            (Some(red_infantry), RejectionReason::NotOwned),
        ]
    );
    assert!(moved(&result, blue_infantry));
    assert_eq!(engine.world().unit(blue_infantry).unwrap().position, HexCoord::new(3, 2));
}

#[test]
fn test_second_order_for_same_unit_refused() {
    let Setup {
        mut engine,
        blue_infantry,
        ..
    } = setup();
    let mut orders = OrdersPayload::empty(FactionId::Blue, 1);
    orders
        .ground
        .push(Order::new(blue_infantry, GroundMission::Defend, Target::Cell(HexCoord::new(2, 2))));
    orders
        .ground
        .push(Order::new(blue_infantry, GroundMission::Move, Target::Cell(HexCoord::new(3, 2))));

    let result = engine.resolve_turn(orders, OrdersPayload::empty(FactionId::Red, 1)).unwrap();

    assert_eq!(accepted(&result, FactionId::Blue), (1, 1));
    assert_eq!(
        rejections(&result, FactionId::Blue),
        vec![(Some(blue_infantry), RejectionReason::AlreadyTasked)]
    );
    assert!(!moved(&result, blue_infantry));
}

// =============================================================================
// Standing patrols
// =============================================================================

#[test]
fn test_standing_patrol_outlives_a_timeout() {
    let Setup {
        mut engine,
        blue_fighter,
        ..
    } = setup();
    let mut orders = OrdersPayload::empty(FactionId::Blue, 1);
    orders
        .air
        .push(Order::new(blue_fighter, AirMission::Cap, Target::Cell(HexCoord::new(3, 3))));
    engine.resolve_turn(orders, OrdersPayload::empty(FactionId::Red, 1)).unwrap();
    assert_eq!(
        engine.world().unit(blue_fighter).unwrap().standing_cap,
        Some(HexCoord::new(3, 3))
    );

    let result = engine
        .resolve_turn(Submission::TimedOut, OrdersPayload::empty(FactionId::Red, 2))
        .unwrap();
    let patrolled = result.events.iter().any(|e| match &e.kind {
        EventKind::EngagementResolved(record) => record.unit == blue_fighter && e.phase == Some(Phase::Air),
        _ => false,
    });
    assert!(patrolled);
}
