//! Engagement discovery and wave planning.
//!
//! A phase's engagements are listed in tie-break order: the first mover's
//! orders and its opponent's alternate, each side in submission order.
//! Consecutive engagements with disjoint footprints form a wave; an
//! exclusive engagement is always a wave of one.

use std::collections::BTreeSet;

use crate::catalog::Catalog;
use crate::combat::{AirEngagement, Engagement, EngagementKind, Footprint, Resolver};
use crate::factions::FactionId;
use crate::intake::{Staged, StagedOrders, ValidatedOrders};
use crate::orders::Order;
use crate::turn::Phase;
use crate::unit::UnitId;
use crate::world::WorldState;

/// Interleave two ordered lists, starting with `first`.
fn alternate<T>(first: Vec<T>, second: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(first.len() + second.len());
    let mut a = first.into_iter();
    let mut b = second.into_iter();
    loop {
        match (a.next(), b.next()) {
            (None, None) => break,
            (x, y) => out.extend(x.into_iter().chain(y)),
        }
    }
    out
}

/// Staged orders of one phase for one faction, as engagement kinds.
fn slice(orders: &ValidatedOrders, phase: Phase) -> Vec<(u32, EngagementKind)> {
    fn wrap<M: Clone>(
        list: &[Staged<M>],
        kind: impl Fn(Order<M>) -> EngagementKind,
    ) -> Vec<(u32, EngagementKind)> {
        list.iter().map(|s| (s.index, kind(s.order.clone()))).collect()
    }
    match phase {
        Phase::Missile => wrap(&orders.missile, EngagementKind::Missile),
        Phase::Ew => wrap(&orders.ew, EngagementKind::Ew),
        Phase::Drone => wrap(&orders.drone, EngagementKind::Drone),
        Phase::Artillery => wrap(&orders.artillery, EngagementKind::Artillery),
        Phase::Helicopter => wrap(&orders.helicopter, EngagementKind::Helicopter),
        Phase::Ground => wrap(&orders.ground, EngagementKind::Ground),
        Phase::SpecialForces => wrap(&orders.special_forces, EngagementKind::SpecialForces),
        Phase::Air | Phase::Intel | Phase::Logistics => Vec::new(),
    }
}

/// The engagements of `phase` in tie-break order, indexed from zero.
#[must_use]
pub fn discover(staged: &StagedOrders, phase: Phase, turn: u32) -> Vec<Engagement> {
    let first = FactionId::first_mover(turn);
    let second = first.opponent();
    let ordered: Vec<(FactionId, u32, EngagementKind)> = if phase == Phase::Air {
        pair_air(staged, first)
    } else {
        let tag = |faction: FactionId| {
            slice(staged.of(faction), phase)
                .into_iter()
                .map(move |(submission, kind)| (faction, submission, kind))
                .collect::<Vec<_>>()
        };
        alternate(tag(first), tag(second))
    };
    ordered
        .into_iter()
        .enumerate()
        .map(|(index, (faction, submission, kind))| Engagement {
            index: u32::try_from(index).unwrap_or(u32::MAX),
            faction,
            submission,
            kind,
        })
        .collect()
}

/// Air orders in tie-break order, with each patrol or sweep paired against
/// the opponent's first unmatched patrol or sweep.
fn pair_air(staged: &StagedOrders, first: FactionId) -> Vec<(FactionId, u32, EngagementKind)> {
    let tag = |faction: FactionId| {
        staged
            .of(faction)
            .air
            .iter()
            .map(|s| (faction, s))
            .collect::<Vec<_>>()
    };
    let sequence = alternate(tag(first), tag(first.opponent()));
    let mut matched: BTreeSet<(FactionId, u32)> = BTreeSet::new();
    let mut out = Vec::new();

    for &(faction, staged_order) in &sequence {
        if matched.contains(&(faction, staged_order.index)) {
            continue;
        }
        let order = staged_order.order.clone();
        if !order.mission.is_counter_air() {
            out.push((faction, staged_order.index, EngagementKind::Air(AirEngagement::Strike(order))));
            continue;
        }
        let rival = sequence.iter().find(|(f, s)| {
            *f != faction && s.order.mission.is_counter_air() && !matched.contains(&(*f, s.index))
        });
        let kind = match rival {
            Some(&(rival_faction, rival_order)) => {
                matched.insert((rival_faction, rival_order.index));
                AirEngagement::Duel {
                    order,
                    opponent: rival_order.order.clone(),
                }
            }
            None => AirEngagement::Patrol(order),
        };
        matched.insert((faction, staged_order.index));
        out.push((faction, staged_order.index, EngagementKind::Air(kind)));
    }
    out
}

/// The first participant of `engagement` that no longer exists or is
/// destroyed.
#[must_use]
pub fn lost_participant(engagement: &Engagement, world: &WorldState) -> Option<UnitId> {
    engagement
        .participants()
        .into_iter()
        .find(|id| !world.unit(*id).is_some_and(|u| u.is_alive()))
}

/// Take the next wave starting at `start`, evaluating footprints against
/// `world` as it stands.
///
/// Returns the number of engagements in the wave, at least one when
/// `start` is in range.
#[must_use]
pub fn next_wave(
    engagements: &[Engagement],
    start: usize,
    resolver: &dyn Resolver,
    world: &WorldState,
    catalog: &Catalog,
) -> usize {
    let Some(head) = engagements.get(start) else {
        return 0;
    };
    let first: Footprint = resolver.footprint(head, world, catalog);
    if first.exclusive {
        return 1;
    }
    let mut claimed = first.units;
    let mut len = 1;
    for engagement in &engagements[start + 1..] {
        let footprint = resolver.footprint(engagement, world, catalog);
        if footprint.exclusive || !claimed.is_disjoint(&footprint.units) {
            break;
        }
        claimed.extend(footprint.units);
        len += 1;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::resolver_for;
    use crate::hex::{HexCoord, HexMap, Terrain};
    use crate::orders::{AirMission, GroundMission, Target};
    use crate::turn::Weather;
    use crate::unit::{Domain, Unit};

    fn staged(faction: FactionId) -> ValidatedOrders {
        ValidatedOrders::empty(faction)
    }

    fn ground(index: u32, unit: UnitId, at: HexCoord) -> Staged<GroundMission> {
        Staged {
            index,
            order: Order::new(unit, GroundMission::Defend, Target::Cell(at)),
        }
    }

    fn air(index: u32, unit: UnitId, mission: AirMission) -> Staged<AirMission> {
        Staged {
            index,
            order: Order::new(unit, mission, Target::Cell(HexCoord::new(3, 3))),
        }
    }

    #[test]
    fn test_alternation_follows_first_mover() {
        let mut blue = staged(FactionId::Blue);
        let mut red = staged(FactionId::Red);
        blue.ground = vec![ground(0, 1, HexCoord::new(0, 0)), ground(1, 2, HexCoord::new(0, 1))];
        red.ground = vec![ground(0, 3, HexCoord::new(5, 5))];
        let orders = StagedOrders { blue, red };

        let odd: Vec<(FactionId, UnitId)> = discover(&orders, Phase::Ground, 1)
            .iter()
            .map(|e| (e.faction, e.issuer()))
            .collect();
        assert_eq!(odd, vec![(FactionId::Blue, 1), (FactionId::Red, 3), (FactionId::Blue, 2)]);

        let even = discover(&orders, Phase::Ground, 2);
        assert_eq!(even[0].faction, FactionId::Red);
        assert_eq!(even.iter().map(|e| e.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_counter_air_pairs_first_unmatched() {
        let mut blue = staged(FactionId::Blue);
        let mut red = staged(FactionId::Red);
        blue.air = vec![air(0, 1, AirMission::Cap), air(1, 2, AirMission::Cap)];
        red.air = vec![air(0, 3, AirMission::Strike), air(1, 4, AirMission::Sweep)];
        let orders = StagedOrders { blue, red };

        let engagements = discover(&orders, Phase::Air, 1);
        assert_eq!(engagements.len(), 3);
        assert!(matches!(
            &engagements[0].kind,
            EngagementKind::Air(AirEngagement::Duel { order, opponent }) if order.unit == 1 && opponent.unit == 4
        ));
        assert!(matches!(&engagements[1].kind, EngagementKind::Air(AirEngagement::Strike(o)) if o.unit == 3));
        assert!(matches!(&engagements[2].kind, EngagementKind::Air(AirEngagement::Patrol(o)) if o.unit == 2));
    }

    #[test]
    fn test_intel_and_logistics_have_no_engagements() {
        let orders = StagedOrders {
            blue: staged(FactionId::Blue),
            red: staged(FactionId::Red),
        };
        assert!(discover(&orders, Phase::Intel, 1).is_empty());
        assert!(discover(&orders, Phase::Logistics, 1).is_empty());
    }

    #[test]
    fn test_waves_split_on_shared_units() {
        let mut world = WorldState::new(HexMap::new(10, 10, Terrain::Plains), 12, Weather::Clear);
        for q in 0..3 {
            world.add_unit(Unit::new(
                0,
                FactionId::Blue,
                Domain::Ground,
                "infantry_brigade",
                HexCoord::new(q * 3, 0),
                100,
            ));
        }
        let mut blue = staged(FactionId::Blue);
        blue.ground = vec![
            ground(0, 1, HexCoord::new(0, 0)),
            ground(1, 2, HexCoord::new(3, 0)),
            ground(2, 2, HexCoord::new(3, 0)),
            ground(3, 3, HexCoord::new(6, 0)),
        ];
        let orders = StagedOrders {
            blue,
            red: staged(FactionId::Red),
        };
        let engagements = discover(&orders, Phase::Ground, 1);
        let resolver = resolver_for(Phase::Ground).unwrap();
        let catalog = Catalog::standard();

        assert_eq!(next_wave(&engagements, 0, resolver, &world, &catalog), 2);
        assert_eq!(next_wave(&engagements, 2, resolver, &world, &catalog), 2);
        assert_eq!(next_wave(&engagements, 4, resolver, &world, &catalog), 0);
    }

    #[test]
    fn test_lost_participant() {
        let mut world = WorldState::new(HexMap::new(4, 4, Terrain::Plains), 12, Weather::Clear);
        let id = world.add_unit(Unit::new(
            0,
            FactionId::Blue,
            Domain::Ground,
            "infantry_brigade",
            HexCoord::new(0, 0),
            100,
        ));
        let engagement = Engagement {
            index: 0,
            faction: FactionId::Blue,
            submission: 0,
            kind: EngagementKind::Ground(Order::new(id, GroundMission::Defend, Target::Unit(9))),
        };
        assert_eq!(lost_participant(&engagement, &world), Some(9));
        if let Some(u) = world.unit_mut(id) {
            u.status = crate::unit::UnitStatus::Destroyed;
        }
        assert_eq!(lost_participant(&engagement, &world), Some(id));
    }
}
