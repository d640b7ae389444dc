//! Effects written by one phase are read by later phases of the same turn.

use warsim_core::prelude::*;
use warsim_test_utils::fixtures::{catalog, open_world};

struct Setup {
    engine: Engine,
    blue_fighter: UnitId,
    red_fighter: UnitId,
    red_ew: UnitId,
}

fn setup(persistence: EffectPersistence) -> Setup {
    let catalog = catalog();
    let mut world = open_world(12, 10);
    place(&mut world, &catalog, FactionId::Blue, "infantry_brigade", HexCoord::new(1, 4), None).unwrap();
    let blue_fighter = place(&mut world, &catalog, FactionId::Blue, "fighter_squadron", HexCoord::new(2, 2), None).unwrap();
    place(&mut world, &catalog, FactionId::Red, "infantry_brigade", HexCoord::new(10, 4), None).unwrap();
    let red_fighter = place(&mut world, &catalog, FactionId::Red, "fighter_squadron", HexCoord::new(9, 2), None).unwrap();
    let red_ew = place(&mut world, &catalog, FactionId::Red, "ew_battalion", HexCoord::new(9, 6), None).unwrap();
    let config = EngineConfig {
        effect_persistence: persistence,
        ..EngineConfig::default()
    };
    Setup {
        engine: Engine::new(world, catalog, config, RunRules::new("cross-phase", 17, 10)),
        blue_fighter,
        red_fighter,
        red_ew,
    }
}

fn patrols(setup: &Setup, turn: u32, jam: bool) -> (OrdersPayload, OrdersPayload) {
    let cell = HexCoord::new(6, 2);
    let mut blue = OrdersPayload::empty(FactionId::Blue, turn);
    blue.air.push(Order::new(setup.blue_fighter, AirMission::Cap, Target::Cell(cell)));
    let mut red = OrdersPayload::empty(FactionId::Red, turn);
    red.air.push(Order::new(setup.red_fighter, AirMission::Cap, Target::Cell(cell)));
    if jam {
        red.ew.push(Order::new(
            setup.red_ew,
            EwMission::JamRadar,
            Target::Area {
                center: HexCoord::new(9, 6),
                radius: 2,
            },
        ));
    }
    (blue, red)
}

fn first_look(result: &TurnResult) -> Option<FactionId> {
    result.events.iter().find_map(|e| match &e.kind {
        EventKind::EngagementResolved(record) if e.phase == Some(Phase::Air) => match record.detail {
            EngagementDetail::AirCombat { first_look, .. } => first_look,
            _ => None,
        },
        _ => None,
    })
}

const POLICIES: [EffectPersistence; 2] = [
    EffectPersistence::CurrentTurn,
    EffectPersistence::Decay { retain_percent: 50 },
];

#[test]
fn test_radar_jamming_hands_first_look_to_the_jammer() {
    for persistence in POLICIES {
        let mut clean = setup(persistence);
        let (blue, red) = patrols(&clean, 1, false);
        let result = clean.engine.resolve_turn(blue, red).unwrap();
        // Equal fighters: the initiator keeps first look.
        assert_eq!(first_look(&result), Some(FactionId::Blue), "{persistence:?}");

        let mut jammed = setup(persistence);
        let (blue, red) = patrols(&jammed, 1, true);
        let result = jammed.engine.resolve_turn(blue, red).unwrap();
        assert!(jammed.engine.effects().level(FactionId::Blue, EffectKind::RadarJam) > Fixed::ZERO);
        assert_eq!(first_look(&result), Some(FactionId::Red), "{persistence:?}");
    }
}

#[test]
fn test_jamming_outlives_its_turn_only_when_decaying() {
    for persistence in POLICIES {
        let mut setup = setup(persistence);
        let (blue, red) = patrols(&setup, 1, true);
        setup.engine.resolve_turn(blue, red).unwrap();
        let jammed = setup.engine.effects().level(FactionId::Blue, EffectKind::RadarJam);
        assert!(jammed > Fixed::ZERO);

        setup
            .engine
            .resolve_turn(OrdersPayload::empty(FactionId::Blue, 2), OrdersPayload::empty(FactionId::Red, 2))
            .unwrap();
        let residual = setup.engine.effects().level(FactionId::Blue, EffectKind::RadarJam);
        match persistence {
            EffectPersistence::CurrentTurn => assert_eq!(residual, Fixed::ZERO),
            EffectPersistence::Decay { .. } => assert!(residual > Fixed::ZERO && residual < jammed),
        }
    }
}
