//! A two-missile salvo into a single interceptor battery.
//!
//! Each inbound missile is engaged exactly once with a kill probability of
//! 0.6, so across many seeds the number intercepted follows
//! Binomial(2, 0.6): 0.16 / 0.48 / 0.36.

use warsim_core::combat::EngagementDetail;
use warsim_core::config::EngineConfig;
use warsim_core::engine::Engine;
use warsim_core::events::EventKind;
use warsim_core::factions::FactionId;
use warsim_core::hex::HexCoord;
use warsim_core::orders::{MissileMission, Order, OrdersPayload, Target};
use warsim_core::scenario::{place, RunRules};
use warsim_core::turn::Phase;
use warsim_test_utils::fixtures::{catalog, open_world};

const TRIALS: u64 = 1000;
const TOLERANCE: f64 = 0.06;

/// `(fired, engaged, intercepted)` of the salvo under `seed`.
fn salvo(seed: u64) -> (u32, u32, u32) {
    let catalog = catalog();
    let mut world = open_world(12, 6);
    let battery = place(&mut world, &catalog, FactionId::Blue, "srbm_brigade", HexCoord::new(2, 2), None).unwrap();
    let target = place(&mut world, &catalog, FactionId::Red, "infantry_brigade", HexCoord::new(8, 2), None).unwrap();
    place(&mut world, &catalog, FactionId::Red, "bmd_battery", HexCoord::new(9, 2), None).unwrap();
    let mut engine = Engine::new(world, catalog, EngineConfig::default(), RunRules::new("salvo", seed, 4));

    let mut orders = OrdersPayload::empty(FactionId::Blue, 1);
    orders
        .missile
        .push(Order::new(battery, MissileMission::Strike, Target::Unit(target)).with_quantity(2));
    let result = engine.resolve_turn(orders, OrdersPayload::empty(FactionId::Red, 1)).unwrap();

    result
        .events
        .iter()
        .find_map(|e| match &e.kind {
            EventKind::EngagementResolved(record) if e.phase == Some(Phase::Missile) => match record.detail {
                EngagementDetail::Missile {
                    fired,
                    engaged,
                    intercepted,
                    ..
                } => Some((fired, engaged, intercepted)),
                _ => None,
            },
            _ => None,
        })
        .unwrap()
}

#[test]
fn test_intercepts_follow_binomial() {
    let mut counts = [0u32; 3];
    for seed in 0..TRIALS {
        let (fired, engaged, intercepted) = salvo(seed);
        assert_eq!(fired, 2, "seed {seed}");
        assert_eq!(engaged, 2, "seed {seed}");
        counts[intercepted as usize] += 1;
    }

    let expected = [0.16, 0.48, 0.36];
    for (k, (&count, p)) in counts.iter().zip(expected).enumerate() {
        let observed = f64::from(count) / TRIALS as f64;
        assert!(
            (observed - p).abs() <= TOLERANCE,
            "{k} intercepted: observed {observed:.3}, expected {p:.2} (counts {counts:?})"
        );
    }
}

#[test]
fn test_salvo_is_repeatable() {
    assert_eq!(salvo(77), salvo(77));
}
