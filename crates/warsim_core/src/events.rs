//! Structured event log.
//!
//! Every observable consequence of resolution is an [`Event`]: a turn, a
//! sequence number, an optional phase tag and a typed payload. Events carry
//! data only; rendering them as prose is a consumer concern.

use serde::{Deserialize, Serialize};

use crate::combat::{CombatOutcome, EngagementRecord};
use crate::effects::EffectKind;
use crate::factions::FactionId;
use crate::hex::HexCoord;
use crate::intake::RejectionReason;
use crate::logistics::NodeId;
use crate::turn::{Phase, TimeOfDay, Weather};
use crate::unit::{Domain, LossCause, UnitId, UnitStatus};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationReason {
    /// The scenario turn limit was reached.
    TurnLimit,
    /// A faction reached the victory point threshold.
    VictoryPoints,
    /// A faction has no combat units left.
    Elimination,
}

/// Why victory points were awarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VpReason {
    /// A favourable engagement outcome.
    Engagement(CombatOutcome),
    /// An enemy unit was destroyed.
    UnitDestroyed(UnitId),
    /// An objective cell was held at turn end.
    Objective(HexCoord),
}

/// Supply state of a unit after the logistics pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplyState {
    /// At least three quarters of the need was met.
    Supplied,
    /// A reachable node could not meet the need.
    Short,
    /// No reachable node within range.
    CutOff,
}

/// Event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A turn began.
    TurnStarted {
        /// Weather in force.
        weather: Weather,
        /// Time of day.
        time_of_day: TimeOfDay,
    },
    /// A phase began.
    PhaseStarted,
    /// A faction's orders were accepted.
    OrdersAccepted {
        /// Issuing faction.
        faction: FactionId,
        /// Orders staged for resolution.
        accepted: u32,
        /// Orders rejected.
        rejected: u32,
    },
    /// An order was rejected at intake.
    OrderRejected {
        /// Issuing faction.
        faction: FactionId,
        /// Ordered unit, when the order named one.
        unit: Option<UnitId>,
        /// Why.
        reason: RejectionReason,
    },
    /// A producer missed its deadline; default orders were used.
    OrdersTimedOut {
        /// Late faction.
        faction: FactionId,
    },
    /// Fog of war was recomputed for a faction.
    IntelUpdated {
        /// Observing faction.
        faction: FactionId,
        /// Contacts held.
        contacts: u32,
        /// Contacts at confirmed quality.
        confirmed: u32,
    },
    /// An engagement was resolved.
    EngagementResolved(EngagementRecord),
    /// An engagement was dropped because a participant was already destroyed.
    EngagementCancelled {
        /// Initiating faction.
        faction: FactionId,
        /// Ordered unit.
        unit: UnitId,
        /// The destroyed participant.
        destroyed: UnitId,
    },
    /// A resolver refused an engagement; it was skipped.
    ContractViolation {
        /// Initiating faction.
        faction: FactionId,
        /// Ordered unit.
        unit: UnitId,
        /// Error description.
        detail: String,
    },
    /// A unit lost strength.
    UnitLosses {
        /// Unit.
        unit: UnitId,
        /// Owner.
        faction: FactionId,
        /// Strength lost.
        amount: u32,
        /// Cause.
        cause: LossCause,
        /// Strength remaining.
        remaining: u32,
    },
    /// A unit changed status.
    UnitStatusChanged {
        /// Unit.
        unit: UnitId,
        /// Previous status.
        from: UnitStatus,
        /// New status.
        to: UnitStatus,
    },
    /// A unit was destroyed.
    UnitDestroyed {
        /// Unit.
        unit: UnitId,
        /// Owner.
        faction: FactionId,
        /// Domain.
        domain: Domain,
        /// Cause of the final loss.
        cause: LossCause,
    },
    /// A unit moved.
    UnitMoved {
        /// Unit.
        unit: UnitId,
        /// Origin.
        from: HexCoord,
        /// Destination.
        to: HexCoord,
    },
    /// A cell changed hands.
    ControlChanged {
        /// Cell.
        cell: HexCoord,
        /// Previous controller.
        from: Option<FactionId>,
        /// New controller.
        to: FactionId,
    },
    /// An effect was raised against a faction.
    EffectApplied {
        /// Affected faction.
        target: FactionId,
        /// Effect kind.
        effect: EffectKind,
        /// Level now in force, percent.
        level: i64,
    },
    /// A supply node was damaged.
    SupplyNodeDamaged {
        /// Node.
        node: NodeId,
        /// Status after damage.
        status: u32,
    },
    /// A unit drew supply.
    SupplyDelivered {
        /// Unit.
        unit: UnitId,
        /// Serving node.
        node: NodeId,
        /// Ammunition delivered.
        ammo: u32,
        /// Fuel delivered.
        fuel: u32,
    },
    /// Supply status of a unit after the logistics pass.
    SupplyStatus {
        /// Unit.
        unit: UnitId,
        /// Supply state.
        state: SupplyState,
        /// Readiness after the pass, percent.
        readiness: i64,
        /// Consecutive turns cut off.
        cut_off_turns: u32,
    },
    /// A unit's readiness fell below the degradation threshold.
    UnitDegraded {
        /// Unit.
        unit: UnitId,
    },
    /// A withdrawn unit returned to the line.
    UnitRecovered {
        /// Unit.
        unit: UnitId,
    },
    /// A scheduled reinforcement arrived.
    ReinforcementArrived {
        /// New unit.
        unit: UnitId,
        /// Owner.
        faction: FactionId,
        /// Arrival cell.
        position: HexCoord,
    },
    /// Victory points were awarded.
    VictoryPointsAwarded {
        /// Recipient.
        faction: FactionId,
        /// Points.
        amount: u32,
        /// Why.
        reason: VpReason,
    },
    /// A turn completed.
    TurnCompleted {
        /// Blue victory points.
        blue_vp: u32,
        /// Red victory points.
        red_vp: u32,
        /// World state hash after the turn.
        state_hash: u64,
    },
    /// The run ended.
    RunTerminated {
        /// Why.
        reason: TerminationReason,
        /// Winner, if any.
        winner: Option<FactionId>,
    },
}

/// A recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Turn the event belongs to.
    pub turn: u32,
    /// Position in the run-wide log.
    pub seq: u64,
    /// Phase tag (`None` for turn bookkeeping).
    pub phase: Option<Phase>,
    /// Payload.
    pub kind: EventKind,
}

/// Something that accepts events as they are produced.
pub trait EventSink {
    /// Record one event.
    fn record(&mut self, event: &Event);
}

/// In-memory event log with run-wide sequence numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new event, assigning the next sequence number.
    pub fn push(&mut self, turn: u32, phase: Option<Phase>, kind: EventKind) -> &Event {
        let seq = self.events.len() as u64;
        self.events.push(Event {
            turn,
            seq,
            phase,
            kind,
        });
        &self.events[self.events.len() - 1]
    }

    /// All events in order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events of one turn.
    pub fn turn(&self, turn: u32) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.turn == turn)
    }

    /// Events recorded at or after sequence number `seq`.
    #[must_use]
    pub fn since(&self, seq: u64) -> &[Event] {
        let start = (seq as usize).min(self.events.len());
        &self.events[start..]
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for EventLog {
    fn record(&mut self, event: &Event) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbers() {
        let mut log = EventLog::new();
        log.push(1, None, EventKind::PhaseStarted);
        log.push(1, Some(Phase::Intel), EventKind::PhaseStarted);
        log.push(2, None, EventKind::PhaseStarted);
        let seqs: Vec<u64> = log.events().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(log.turn(1).count(), 2);
        assert_eq!(log.since(2).len(), 1);
        assert!(log.since(10).is_empty());
    }

    #[test]
    fn test_sink_copies_events() {
        let mut source = EventLog::new();
        let event = source
            .push(3, Some(Phase::Ground), EventKind::OrdersTimedOut { faction: FactionId::Red })
            .clone();
        let mut sink = EventLog::new();
        sink.record(&event);
        assert_eq!(sink.events(), source.events());
    }
}
