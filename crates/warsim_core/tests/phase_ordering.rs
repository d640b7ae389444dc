//! Phases run in fixed order and every event lands inside its phase.

use warsim_core::config::EngineConfig;
use warsim_core::error::EngineError;
use warsim_core::events::{Event, EventKind};
use warsim_core::factions::FactionId;
use warsim_core::orders::OrdersPayload;
use warsim_core::turn::Phase;
use warsim_test_utils::fixtures::{frontline_engine, pressing_pair};

fn phases_started(events: &[Event]) -> Vec<Phase> {
    events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::PhaseStarted))
        .filter_map(|e| e.phase)
        .collect()
}

#[test]
fn test_every_turn_runs_all_phases_in_order() {
    let mut engine = frontline_engine(31, EngineConfig::default());
    while engine.turn() < 5 && !engine.is_terminated() {
        let (blue, red) = pressing_pair(&engine);
        let result = engine.resolve_turn(blue, red).unwrap();
        assert_eq!(phases_started(&result.events), Phase::ALL.to_vec(), "turn {}", result.turn);
    }
}

#[test]
fn test_event_phases_never_go_backwards() {
    let mut engine = frontline_engine(32, EngineConfig::default());
    while engine.turn() < 5 && !engine.is_terminated() {
        let (blue, red) = pressing_pair(&engine);
        let result = engine.resolve_turn(blue, red).unwrap();

        let indices: Vec<u8> = result.events.iter().filter_map(|e| e.phase).map(Phase::index).collect();
        assert!(indices.windows(2).all(|w| w[0] <= w[1]), "turn {}", result.turn);
        assert!(result.events.iter().all(|e| e.turn == result.turn));
    }
}

#[test]
fn test_turn_is_bracketed() {
    let mut engine = frontline_engine(33, EngineConfig::default());
    let (blue, red) = pressing_pair(&engine);
    let result = engine.resolve_turn(blue, red).unwrap();

    let first = result.events.first().unwrap();
    assert!(matches!(first.kind, EventKind::TurnStarted { .. }));
    assert_eq!(first.phase, None);

    let completed = result
        .events
        .iter()
        .position(|e| matches!(e.kind, EventKind::TurnCompleted { .. }))
        .unwrap();
    assert!(completed >= result.events.len() - 2);
    assert!(result.events[completed + 1..]
        .iter()
        .all(|e| matches!(e.kind, EventKind::RunTerminated { .. })));
}

#[test]
fn test_sequence_numbers_are_contiguous() {
    let mut engine = frontline_engine(34, EngineConfig::default());
    for _ in 0..3 {
        let (blue, red) = pressing_pair(&engine);
        engine.resolve_turn(blue, red).unwrap();
    }
    let seqs: Vec<u64> = engine.events().events().iter().map(|e| e.seq).collect();
    assert!(seqs.windows(2).all(|w| w[1] == w[0] + 1));
}

#[test]
fn test_stepwise_matches_whole_turn() {
    let mut whole = frontline_engine(35, EngineConfig::default());
    let mut stepped = frontline_engine(35, EngineConfig::default());

    let (blue, red) = pressing_pair(&whole);
    whole.resolve_turn(blue.clone(), red.clone()).unwrap();

    stepped.begin_turn(blue, red).unwrap();
    for phase in Phase::ALL {
        assert_eq!(stepped.next_phase(), Some(phase));
        stepped.run_phase(phase).unwrap();
    }
    stepped.finish_turn().unwrap();

    assert_eq!(whole.events(), stepped.events());
    assert_eq!(whole.state_hash(), stepped.state_hash());
}

#[test]
fn test_skipping_a_phase_is_refused() {
    let mut engine = frontline_engine(36, EngineConfig::default());
    engine
        .begin_turn(OrdersPayload::empty(FactionId::Blue, 1), OrdersPayload::empty(FactionId::Red, 1))
        .unwrap();
    engine.run_phase(Phase::Intel).unwrap();
    let err = engine.run_phase(Phase::Air).unwrap_err();
    assert!(matches!(err, EngineError::PhaseOutOfSequence { .. }));
    assert!(err.is_contract_violation());
    assert_eq!(engine.next_phase(), Some(Phase::Missile));
}
