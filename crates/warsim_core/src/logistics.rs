//! Supply network and the end-of-turn logistics pass.
//!
//! Each faction's network is a set of nodes joined by routes. Source nodes
//! generate stock; other nodes are fed through routes whose usable flow is
//! `capacity * status / 100`. A node is reachable when some path of usable
//! routes links it to a source, and the flow it can pass on is the
//! narrowest route on the widest such path.
//!
//! The pass runs per faction in four steps: consumption, resupply,
//! readiness and recovery. Units are always visited in id order and nodes
//! serve them until their per-turn budget is spent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::effects::{ActiveEffects, EffectKind};
use crate::events::{EventKind, SupplyState};
use crate::factions::FactionId;
use crate::hex::HexCoord;
use crate::math::{fx, pct, percent_of, powi, ratio, scale_count, to_count, unit_clamp, Fixed};
use crate::orders::CyberTarget;
use crate::unit::{LossCause, UnitId, UnitStatus};
use crate::world::WorldState;

/// Supply node identifier.
pub type NodeId = u32;

/// Minimum status for a route or node to pass supply.
pub const MIN_OPERABLE_STATUS: u32 = 20;

/// Beyond this distance from its node a unit's consumption rises.
const DISTANCE_PENALTY_FREE: u32 = 5;

/// A depot, railhead or forward supply point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplyNode {
    /// Identifier.
    pub id: NodeId,
    /// Owner.
    pub faction: FactionId,
    /// Location.
    pub position: HexCoord,
    /// Maximum stock of each commodity.
    pub capacity: u32,
    /// Ammunition held.
    pub ammo: u32,
    /// Fuel held.
    pub fuel: u32,
    /// Total commodity the node can issue per turn at full status.
    pub throughput: u32,
    /// Condition, 0-100.
    pub status: u32,
    /// Generates stock and feeds the network.
    pub source: bool,
    /// Stock generated per turn by a source.
    pub generation_per_turn: u32,
}

impl SupplyNode {
    /// Create an empty forward node at full status.
    #[must_use]
    pub fn new(id: NodeId, faction: FactionId, position: HexCoord) -> Self {
        Self {
            id,
            faction,
            position,
            capacity: 1000,
            ammo: 0,
            fuel: 0,
            throughput: 200,
            status: 100,
            source: false,
            generation_per_turn: 0,
        }
    }

    /// Throughput scaled by condition.
    #[must_use]
    pub fn effective_throughput(&self) -> u32 {
        percent_of(self.throughput, self.status.min(100))
    }

    fn operable(&self) -> bool {
        self.status >= MIN_OPERABLE_STATUS
    }
}

/// A road, rail or pipeline link between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// One end.
    pub from: NodeId,
    /// Other end.
    pub to: NodeId,
    /// Commodity per turn at full status.
    pub capacity: u32,
    /// Condition, 0-100.
    pub status: u32,
}

impl Route {
    /// Create a route at full status.
    #[must_use]
    pub const fn new(from: NodeId, to: NodeId, capacity: u32) -> Self {
        Self {
            from,
            to,
            capacity,
            status: 100,
        }
    }

    /// Usable flow per turn (zero when impassable).
    #[must_use]
    pub fn flow(&self) -> u32 {
        if self.capacity == 0 || self.status < MIN_OPERABLE_STATUS {
            0
        } else {
            percent_of(self.capacity, self.status.min(100))
        }
    }
}

/// Tunables for the logistics pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogisticsParams {
    /// Hexes within which a node can serve a unit.
    pub supply_radius: u32,
    /// Readiness below which a unit is marked degraded.
    pub degraded_threshold: Fixed,
}

/// Widest-path flow from any source to every reachable node of `faction`.
///
/// Sources map to `u32::MAX`. Unreachable nodes are absent.
#[must_use]
pub fn reachable_flow(world: &WorldState, faction: FactionId) -> BTreeMap<NodeId, u32> {
    let mut best: BTreeMap<NodeId, u32> = world
        .nodes()
        .filter(|n| n.faction == faction && n.source && n.operable())
        .map(|n| (n.id, u32::MAX))
        .collect();

    // Relax until stable; networks are small.
    let node_count = world.nodes().count();
    for _ in 0..node_count {
        let mut changed = false;
        for route in world.routes() {
            let flow = route.flow();
            if flow == 0 {
                continue;
            }
            for (a, b) in [(route.from, route.to), (route.to, route.from)] {
                let Some(&upstream) = best.get(&a) else {
                    continue;
                };
                let Some(node) = world.node(b) else {
                    continue;
                };
                if node.faction != faction || !node.operable() {
                    continue;
                }
                let candidate = upstream.min(flow);
                let current = best.get(&b).copied().unwrap_or(0);
                if candidate > current {
                    best.insert(b, candidate);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    best
}

/// Run the end-of-turn pass for both factions.
///
/// Returns the events produced, in order.
pub fn run_logistics(
    world: &mut WorldState,
    catalog: &Catalog,
    effects: &ActiveEffects,
    params: &LogisticsParams,
) -> Vec<EventKind> {
    let mut events = Vec::new();
    for faction in FactionId::ALL {
        supply_faction(world, catalog, effects, params, faction, &mut events);
    }
    recover_nodes(world);
    events
}

/// Per-turn budget of each reachable node.
fn node_budgets(
    world: &WorldState,
    effects: &ActiveEffects,
    faction: FactionId,
) -> BTreeMap<NodeId, u32> {
    let cyber = effects.level(faction, EffectKind::Cyber(CyberTarget::Logistics));
    let remaining = Fixed::ONE - unit_clamp(cyber);
    reachable_flow(world, faction)
        .into_iter()
        .filter_map(|(id, flow)| {
            let node = world.node(id)?;
            let route_cap = if node.source {
                u32::MAX
            } else {
                scale_count(flow, remaining)
            };
            let budget = node
                .effective_throughput()
                .min(route_cap)
                .min(node.ammo.saturating_add(node.fuel));
            Some((id, budget))
        })
        .collect()
}

fn supply_faction(
    world: &mut WorldState,
    catalog: &Catalog,
    effects: &ActiveEffects,
    params: &LogisticsParams,
    faction: FactionId,
    events: &mut Vec<EventKind>,
) {
    let mut budgets = node_budgets(world, effects, faction);
    let reachable: Vec<(NodeId, HexCoord)> = budgets
        .keys()
        .filter_map(|id| world.node(*id).map(|n| (n.id, n.position)))
        .collect();

    let ids: Vec<UnitId> = world
        .units_of(faction)
        .filter(|u| u.is_alive())
        .map(|u| u.id)
        .collect();

    let mut supplied_count = 0u32;
    let mut cut_off_count = 0u32;

    for id in ids {
        let Some(unit) = world.unit(id) else {
            continue;
        };
        let Some(spec) = catalog.platform(&unit.platform) else {
            continue;
        };

        // Nearest reachable node at any distance sets the consumption penalty;
        // only nodes inside the radius can actually serve.
        let nearest = reachable
            .iter()
            .map(|(nid, pos)| (unit.position.distance(*pos), *nid))
            .min();

        let mut mult = unit.strength_fraction();
        if unit.in_combat {
            mult *= Fixed::from_num(3);
        }
        if let Some((distance, _)) = nearest {
            if distance > DISTANCE_PENALTY_FREE {
                mult *= Fixed::ONE + pct(10) * fx(distance - DISTANCE_PENALTY_FREE);
            }
        }
        let need_ammo = to_count(fx(spec.supply.ammo) * mult);
        let need_fuel = to_count(fx(spec.supply.fuel) * mult);
        let (cap_ammo, cap_fuel) = (spec.ammo, spec.fuel);

        let serving = nearest.filter(|(d, _)| *d <= params.supply_radius);

        // Consumption.
        let Some(unit) = world.unit_mut(id) else {
            continue;
        };
        unit.ammo = unit.ammo.saturating_sub(need_ammo);
        unit.fuel = unit.fuel.saturating_sub(need_fuel);

        let state = if let Some((_, node_id)) = serving {
            // Resupply towards capacity from the node budget.
            let want_ammo = cap_ammo.saturating_sub(unit.ammo);
            let want_fuel = cap_fuel.saturating_sub(unit.fuel);
            let budget = budgets.entry(node_id).or_insert(0);
            let (mut got_ammo, mut got_fuel) = (0, 0);
            if let Some(node) = world.node_mut(node_id) {
                got_ammo = want_ammo.min(node.ammo).min(*budget);
                node.ammo -= got_ammo;
                *budget -= got_ammo;
                got_fuel = want_fuel.min(node.fuel).min(*budget);
                node.fuel -= got_fuel;
                *budget -= got_fuel;
            }
            let Some(unit) = world.unit_mut(id) else {
                continue;
            };
            unit.ammo += got_ammo;
            unit.fuel += got_fuel;
            if got_ammo.saturating_add(got_fuel) > 0 {
                events.push(EventKind::SupplyDelivered {
                    unit: id,
                    node: node_id,
                    ammo: got_ammo,
                    fuel: got_fuel,
                });
            }

            let need = need_ammo.saturating_add(need_fuel);
            let fraction = if need == 0 {
                Fixed::ONE
            } else {
                unit_clamp(ratio(fx(got_ammo.saturating_add(got_fuel)), fx(need)))
            };
            unit.cut_off_turns = 0;
            if fraction >= pct(75) {
                unit.readiness = (unit.readiness + pct(10)).min(Fixed::ONE);
                SupplyState::Supplied
            } else {
                let shortage = Fixed::ONE - fraction;
                unit.readiness = (unit.readiness - pct(20) * shortage).max(Fixed::ZERO);
                SupplyState::Short
            }
        } else {
            unit.cut_off_turns += 1;
            let loss = pct(5) * powi(pct(150), unit.cut_off_turns - 1);
            unit.readiness = (unit.readiness - loss).max(Fixed::ZERO);
            SupplyState::CutOff
        };

        match state {
            SupplyState::Supplied => supplied_count += 1,
            SupplyState::CutOff => cut_off_count += 1,
            SupplyState::Short => {}
        }

        if state == SupplyState::CutOff {
            attrition(world, id, events);
        }
        readiness_and_recovery(world, id, state, params, events);
    }

    debug!(
        faction = %faction,
        supplied = supplied_count,
        cut_off = cut_off_count,
        "logistics pass"
    );
}

/// Cut-off units at very low readiness bleed strength.
fn attrition(world: &mut WorldState, id: UnitId, events: &mut Vec<EventKind>) {
    let Some(unit) = world.unit_mut(id) else {
        return;
    };
    if unit.readiness >= pct(25) || unit.strength == 0 {
        return;
    }
    let amount = to_count(fx(unit.strength) * pct(5)).max(1).min(unit.strength);
    unit.strength -= amount;
    events.push(EventKind::UnitLosses {
        unit: id,
        faction: unit.faction,
        amount,
        cause: LossCause::Attrition,
        remaining: unit.strength,
    });
    let before = unit.status;
    let after = unit.derived_status();
    if before != after {
        unit.status = after;
        events.push(EventKind::UnitStatusChanged {
            unit: id,
            from: before,
            to: after,
        });
        if after == UnitStatus::Destroyed {
            events.push(EventKind::UnitDestroyed {
                unit: id,
                faction: unit.faction,
                domain: unit.domain,
                cause: LossCause::Attrition,
            });
        }
    }
}

fn readiness_and_recovery(
    world: &mut WorldState,
    id: UnitId,
    state: SupplyState,
    params: &LogisticsParams,
    events: &mut Vec<EventKind>,
) {
    let Some(unit) = world.unit_mut(id) else {
        return;
    };
    if !unit.is_alive() {
        return;
    }

    let was_degraded = unit.degraded;
    unit.degraded = unit.readiness < params.degraded_threshold;
    if unit.degraded && !was_degraded {
        events.push(EventKind::UnitDegraded { unit: id });
    }

    unit.suppression = unit.suppression.saturating_sub(20);
    if !unit.in_combat {
        unit.organization = (unit.organization + 5).min(100);
    }
    if state == SupplyState::Supplied {
        unit.morale = (unit.morale + 2).min(100);
    }
    unit.reload = unit.reload.saturating_sub(1);
    unit.channels_used = 0;

    if unit.status == UnitStatus::Withdrawn && unit.organization >= 30 && unit.morale >= 30 {
        unit.status = UnitStatus::Damaged;
        events.push(EventKind::UnitStatusChanged {
            unit: id,
            from: UnitStatus::Withdrawn,
            to: UnitStatus::Damaged,
        });
        events.push(EventKind::UnitRecovered { unit: id });
    }

    events.push(EventKind::SupplyStatus {
        unit: id,
        state,
        readiness: crate::math::as_percent(unit.readiness),
        cut_off_turns: unit.cut_off_turns,
    });
}

/// Sources regenerate stock and every node repairs a little.
fn recover_nodes(world: &mut WorldState) {
    for node in world.nodes_mut() {
        if node.source {
            node.ammo = node.ammo.saturating_add(node.generation_per_turn).min(node.capacity);
            node.fuel = node.fuel.saturating_add(node.generation_per_turn).min(node.capacity);
        }
        node.status = node.status.saturating_add(5).min(100);
    }
}
