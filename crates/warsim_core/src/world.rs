//! Authoritative world state.
//!
//! # Determinism
//!
//! Units and supply nodes live in ordered maps keyed by dense ids, so every
//! iteration visits them in ascending id order. The state hash covers the
//! whole structure.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::factions::FactionId;
use crate::hex::{HexCoord, HexMap};
use crate::logistics::{NodeId, Route, SupplyNode};
use crate::turn::{TurnState, Weather};
use crate::unit::{Domain, Unit, UnitId, UnitStatus};

/// Everything that changes during a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldState {
    /// Turn clock.
    pub clock: TurnState,
    map: HexMap,
    units: BTreeMap<UnitId, Unit>,
    nodes: BTreeMap<NodeId, SupplyNode>,
    routes: Vec<Route>,
    next_unit_id: UnitId,
}

impl WorldState {
    /// Create an empty world on `map`.
    #[must_use]
    pub fn new(map: HexMap, start_hour: u32, weather: Weather) -> Self {
        Self {
            clock: TurnState::new(start_hour, weather),
            map,
            units: BTreeMap::new(),
            nodes: BTreeMap::new(),
            routes: Vec::new(),
            next_unit_id: 1,
        }
    }

    /// The theatre map.
    #[must_use]
    pub const fn map(&self) -> &HexMap {
        &self.map
    }

    /// The theatre map, mutably.
    pub fn map_mut(&mut self) -> &mut HexMap {
        &mut self.map
    }

    /// Add a unit, assigning it the next free id.
    pub fn add_unit(&mut self, mut unit: Unit) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id += 1;
        unit.id = id;
        self.units.insert(id, unit);
        id
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Look up a unit mutably.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Look up a unit, failing if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnitNotFound`].
    pub fn require_unit(&self, id: UnitId) -> Result<&Unit> {
        self.unit(id).ok_or(EngineError::UnitNotFound(id))
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// All units in id order, mutably.
    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.values_mut()
    }

    /// Units of one faction in id order.
    pub fn units_of(&self, faction: FactionId) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.faction == faction)
    }

    /// Sorted ids of every unit.
    #[must_use]
    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    /// Operational units of `faction` within `radius` of `center`.
    pub fn operational_within(
        &self,
        faction: FactionId,
        center: HexCoord,
        radius: u32,
    ) -> impl Iterator<Item = &Unit> {
        self.units_of(faction)
            .filter(move |u| u.is_operational() && u.position.distance(center) <= radius)
    }

    /// Whether an operational unit of `faction` occupies `cell`.
    #[must_use]
    pub fn occupied_by(&self, cell: HexCoord, faction: FactionId) -> bool {
        self.operational_within(faction, cell, 0).next().is_some()
    }

    /// Number of units of `faction` that are not destroyed.
    #[must_use]
    pub fn surviving_units(&self, faction: FactionId) -> usize {
        self.units_of(faction).filter(|u| u.is_alive()).count()
    }

    /// Whether `faction` still fields a combat unit that is neither
    /// destroyed nor withdrawn.
    #[must_use]
    pub fn has_combat_power(&self, faction: FactionId) -> bool {
        self.units_of(faction).any(|u| {
            u.domain.is_combat() && !matches!(u.status, UnitStatus::Destroyed | UnitStatus::Withdrawn)
        })
    }

    /// Whether `faction` has an operational unit of `domain` matching `pred`.
    pub fn any_operational(
        &self,
        faction: FactionId,
        domain: Domain,
        mut pred: impl FnMut(&Unit) -> bool,
    ) -> bool {
        self.units_of(faction)
            .any(|u| u.domain == domain && u.is_operational() && pred(u))
    }

    /// Add a supply node. Its id must be unique.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scenario`] on a duplicate id.
    pub fn add_node(&mut self, node: SupplyNode) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(EngineError::Scenario(format!(
                "duplicate supply node id {}",
                node.id
            )));
        }
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Look up a supply node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SupplyNode> {
        self.nodes.get(&id)
    }

    /// Look up a supply node mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SupplyNode> {
        self.nodes.get_mut(&id)
    }

    /// All supply nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &SupplyNode> {
        self.nodes.values()
    }

    /// All supply nodes in id order, mutably.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut SupplyNode> {
        self.nodes.values_mut()
    }

    /// Connect two nodes of the same faction.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scenario`] if either node is unknown, the
    /// route is a loop, or the nodes belong to different factions.
    pub fn add_route(&mut self, route: Route) -> Result<()> {
        let (from, to) = match (self.node(route.from), self.node(route.to)) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(EngineError::Scenario(format!(
                    "route {} -> {} references an unknown node",
                    route.from, route.to
                )))
            }
        };
        if route.from == route.to {
            return Err(EngineError::Scenario(format!(
                "route from node {} to itself",
                route.from
            )));
        }
        if from.faction != to.faction {
            return Err(EngineError::Scenario(format!(
                "route {} -> {} crosses factions",
                route.from, route.to
            )));
        }
        self.routes.push(route);
        Ok(())
    }

    /// All routes.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The route joining two nodes in either direction.
    pub fn route_mut(&mut self, a: NodeId, b: NodeId) -> Option<&mut Route> {
        self.routes
            .iter_mut()
            .find(|r| (r.from == a && r.to == b) || (r.from == b && r.to == a))
    }

    /// Deterministic hash of the full world state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Terrain;

    fn world() -> WorldState {
        let mut world = WorldState::new(HexMap::new(8, 8, Terrain::Plains), 6, Weather::Clear);
        world.add_unit(Unit::new(
            0,
            FactionId::Blue,
            Domain::Ground,
            "infantry_brigade",
            HexCoord::new(1, 1),
            100,
        ));
        world.add_unit(Unit::new(
            0,
            FactionId::Red,
            Domain::Ground,
            "infantry_brigade",
            HexCoord::new(2, 1),
            100,
        ));
        world
    }

    fn node(id: NodeId, faction: FactionId) -> SupplyNode {
        SupplyNode::new(id, faction, HexCoord::new(0, 0))
    }

    #[test]
    fn test_ids_assigned_in_order() {
        let world = world();
        assert_eq!(world.unit_ids(), vec![1, 2]);
        assert_eq!(world.unit(2).map(|u| u.faction), Some(FactionId::Red));
    }

    #[test]
    fn test_occupancy() {
        let world = world();
        assert!(world.occupied_by(HexCoord::new(2, 1), FactionId::Red));
        assert!(!world.occupied_by(HexCoord::new(2, 1), FactionId::Blue));
    }

    #[test]
    fn test_hash_tracks_changes() {
        let mut world = world();
        let before = world.state_hash();
        assert_eq!(before, world.clone().state_hash());
        if let Some(u) = world.unit_mut(1) {
            u.strength -= 1;
        }
        assert_ne!(before, world.state_hash());
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut world = world();
        assert!(world.add_node(node(1, FactionId::Blue)).is_ok());
        assert!(world.add_node(node(1, FactionId::Blue)).is_err());
    }

    #[test]
    fn test_bad_routes_rejected() {
        let mut world = world();
        world.add_node(node(1, FactionId::Blue)).unwrap();
        world.add_node(node(2, FactionId::Red)).unwrap();
        world.add_node(node(3, FactionId::Blue)).unwrap();
        assert!(world.add_route(Route::new(1, 9, 100)).is_err());
        assert!(world.add_route(Route::new(1, 1, 100)).is_err());
        assert!(world.add_route(Route::new(1, 2, 100)).is_err());
        assert!(world.add_route(Route::new(1, 3, 100)).is_ok());
        assert!(world.route_mut(3, 1).is_some());
    }

    #[test]
    fn test_combat_power() {
        let mut world = world();
        assert!(world.has_combat_power(FactionId::Red));
        if let Some(u) = world.unit_mut(2) {
            u.status = UnitStatus::Withdrawn;
        }
        assert!(!world.has_combat_power(FactionId::Red));
        assert_eq!(world.surviving_units(FactionId::Red), 1);
    }
}
