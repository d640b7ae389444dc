//! Scenario documents.
//!
//! A scenario is a RON document describing the theatre, both orders of
//! battle, the supply networks and the run rules. [`Scenario::build`] checks
//! it against a catalog and produces the initial [`WorldState`] plus the
//! [`RunRules`] the engine enforces. Any problem is an
//! [`EngineError::Scenario`] and no world is produced.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::{EngineError, Result};
use crate::factions::FactionId;
use crate::hex::{HexCoord, HexMap, Terrain};
use crate::logistics::{NodeId, Route, SupplyNode};
use crate::turn::Weather;
use crate::unit::{Unit, UnitId};
use crate::world::WorldState;

/// Map section of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSpec {
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
    /// Terrain of every cell not listed in `terrain_overrides`.
    #[serde(default)]
    pub default_terrain: Terrain,
    /// Per-cell terrain.
    #[serde(default)]
    pub terrain_overrides: Vec<(HexCoord, Terrain)>,
    /// Cells with a river.
    #[serde(default)]
    pub rivers: Vec<HexCoord>,
    /// Objective cells.
    #[serde(default)]
    pub objectives: Vec<Objective>,
}

/// A cell worth victory points to whoever holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    /// Cell.
    pub cell: HexCoord,
    /// Points paid per turn.
    pub vp: u32,
    /// Initial holder.
    #[serde(default)]
    pub holder: Option<FactionId>,
}

/// One unit placed at scenario start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Owning faction.
    pub faction: FactionId,
    /// Catalog key.
    pub platform: String,
    /// Starting cell.
    pub position: HexCoord,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Starting strength, full when absent.
    #[serde(default)]
    pub strength: Option<u32>,
    /// Starting entrenchment.
    #[serde(default)]
    pub dug_in: u8,
}

/// A supply node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Node id, unique across the scenario.
    pub id: NodeId,
    /// Owning faction.
    pub faction: FactionId,
    /// Cell.
    pub position: HexCoord,
    /// Generates stock every turn.
    #[serde(default)]
    pub source: bool,
    /// Stock capacity.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// Ammunition in stock.
    #[serde(default)]
    pub ammo: u32,
    /// Fuel in stock.
    #[serde(default)]
    pub fuel: u32,
    /// Supply issued per turn.
    #[serde(default = "default_throughput")]
    pub throughput: u32,
    /// Stock added per turn at a source.
    #[serde(default)]
    pub generation_per_turn: u32,
}

const fn default_capacity() -> u32 {
    1000
}

const fn default_throughput() -> u32 {
    200
}

const fn default_start_hour() -> u32 {
    6
}

/// A route between two nodes of the same faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// One end.
    pub from: NodeId,
    /// Other end.
    pub to: NodeId,
    /// Flow per turn at full status.
    pub capacity: u32,
}

/// A unit scheduled to arrive during the logistics phase of `turn`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reinforcement {
    /// Arrival turn.
    pub turn: u32,
    /// Owning faction.
    pub faction: FactionId,
    /// Catalog key.
    pub platform: String,
    /// Arrival cell.
    pub position: HexCoord,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Rules the engine enforces for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRules {
    /// Scenario name.
    pub name: String,
    /// Run seed.
    pub seed: u64,
    /// Last turn of the run.
    pub turn_limit: u32,
    /// Points at which a faction wins outright.
    pub victory_points: Option<u32>,
    /// Weather changes by turn.
    pub weather: BTreeMap<u32, Weather>,
    /// Scheduled arrivals.
    pub reinforcements: Vec<Reinforcement>,
}

impl RunRules {
    /// Rules with no victory threshold, no weather changes and no
    /// reinforcements.
    #[must_use]
    pub fn new(name: impl Into<String>, seed: u64, turn_limit: u32) -> Self {
        Self {
            name: name.into(),
            seed,
            turn_limit,
            victory_points: None,
            weather: BTreeMap::new(),
            reinforcements: Vec::new(),
        }
    }

    /// Reinforcements due on `turn`, in scenario order.
    pub fn arrivals(&self, turn: u32) -> impl Iterator<Item = &Reinforcement> {
        self.reinforcements.iter().filter(move |r| r.turn == turn)
    }
}

/// A complete scenario document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Name.
    pub name: String,
    /// Run seed.
    #[serde(default)]
    pub seed: u64,
    /// Last turn of the run.
    pub turn_limit: u32,
    /// Outright victory threshold.
    #[serde(default)]
    pub victory_points: Option<u32>,
    /// Hour of day at which turn 1 begins.
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    /// Weather on turn 1.
    #[serde(default)]
    pub weather: Weather,
    /// Theatre.
    pub map: MapSpec,
    /// Orders of battle.
    #[serde(default)]
    pub deployments: Vec<Deployment>,
    /// Supply nodes.
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    /// Supply routes.
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
    /// Weather changes as `(turn, weather)`.
    #[serde(default)]
    pub weather_schedule: Vec<(u32, Weather)>,
    /// Scheduled arrivals.
    #[serde(default)]
    pub reinforcements: Vec<Reinforcement>,
}

impl Scenario {
    /// Parse a scenario from RON text. The result is not yet checked.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scenario`] if the text does not parse.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| EngineError::Scenario(format!("parse error: {e}")))
    }

    /// Serialize to pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scenario`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| EngineError::Scenario(format!("serialize error: {e}")))
    }

    /// Same scenario with another seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the scenario against `catalog` and build the initial world.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scenario`] for an empty map, a zero turn
    /// limit, an unknown platform, anything placed off the map, duplicate
    /// node ids or a bad route.
    pub fn build(&self, catalog: &Catalog) -> Result<(WorldState, RunRules)> {
        if self.map.width == 0 || self.map.height == 0 {
            return Err(EngineError::Scenario("map has no cells".into()));
        }
        if self.turn_limit == 0 {
            return Err(EngineError::Scenario("turn limit must be at least 1".into()));
        }

        let mut map = HexMap::new(self.map.width, self.map.height, self.map.default_terrain);
        for (cell, terrain) in &self.map.terrain_overrides {
            map.cell_mut(*cell)
                .ok_or_else(|| off_map("terrain override", *cell))?
                .terrain = *terrain;
        }
        for cell in &self.map.rivers {
            map.cell_mut(*cell).ok_or_else(|| off_map("river", *cell))?.river = true;
        }
        for objective in &self.map.objectives {
            let cell = map
                .cell_mut(objective.cell)
                .ok_or_else(|| off_map("objective", objective.cell))?;
            cell.objective_vp = objective.vp;
            cell.control = objective.holder;
        }

        let mut world = WorldState::new(map, self.start_hour, self.weather);
        for deployment in &self.deployments {
            let id = place(
                &mut world,
                catalog,
                deployment.faction,
                &deployment.platform,
                deployment.position,
                deployment.name.clone(),
            )?;
            if let Some(unit) = world.unit_mut(id) {
                if let Some(strength) = deployment.strength {
                    unit.strength = strength.min(unit.max_strength);
                }
                unit.dug_in = deployment.dug_in.min(3);
                unit.status = unit.derived_status();
            }
        }

        for spec in &self.nodes {
            if !world.map().contains(spec.position) {
                return Err(off_map(&format!("supply node {}", spec.id), spec.position));
            }
            let mut node = SupplyNode::new(spec.id, spec.faction, spec.position);
            node.source = spec.source;
            node.capacity = spec.capacity;
            node.ammo = spec.ammo.min(spec.capacity);
            node.fuel = spec.fuel.min(spec.capacity);
            node.throughput = spec.throughput;
            node.generation_per_turn = spec.generation_per_turn;
            world.add_node(node)?;
        }
        for route in &self.routes {
            world.add_route(Route::new(route.from, route.to, route.capacity))?;
        }

        let mut weather = BTreeMap::new();
        for (turn, w) in &self.weather_schedule {
            if weather.insert(*turn, *w).is_some() {
                return Err(EngineError::Scenario(format!(
                    "weather scheduled twice for turn {turn}"
                )));
            }
        }
        for arrival in &self.reinforcements {
            if catalog.platform(&arrival.platform).is_none() {
                return Err(unknown_platform(&arrival.platform));
            }
            if !world.map().contains(arrival.position) {
                return Err(off_map("reinforcement", arrival.position));
            }
        }
        check_names(&self.deployments)?;

        let rules = RunRules {
            name: self.name.clone(),
            seed: self.seed,
            turn_limit: self.turn_limit,
            victory_points: self.victory_points,
            weather,
            reinforcements: self.reinforcements.clone(),
        };
        Ok((world, rules))
    }
}

fn check_names(deployments: &[Deployment]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for name in deployments.iter().filter_map(|d| d.name.as_deref()) {
        if !seen.insert(name) {
            return Err(EngineError::Scenario(format!("duplicate unit name '{name}'")));
        }
    }
    Ok(())
}

fn off_map(what: &str, cell: HexCoord) -> EngineError {
    EngineError::Scenario(format!("{what} at ({}, {}) is off the map", cell.q, cell.r))
}

fn unknown_platform(key: &str) -> EngineError {
    EngineError::Scenario(format!("unknown platform '{key}'"))
}

/// Add a fully stocked unit of `platform` to the world.
///
/// # Errors
///
/// Returns [`EngineError::Scenario`] for an unknown platform or an off-map
/// position.
pub fn place(
    world: &mut WorldState,
    catalog: &Catalog,
    faction: FactionId,
    platform: &str,
    position: HexCoord,
    name: Option<String>,
) -> Result<UnitId> {
    let spec = catalog.platform(platform).ok_or_else(|| unknown_platform(platform))?;
    if !world.map().contains(position) {
        return Err(off_map(platform, position));
    }
    let mut unit = Unit::new(0, faction, spec.domain, platform, position, spec.max_strength);
    unit.ammo = spec.ammo;
    unit.fuel = spec.fuel;
    unit.missiles = spec.missiles;
    let id = world.add_unit(unit);
    if let Some(unit) = world.unit_mut(id) {
        unit.name = name.unwrap_or_else(|| format!("{} {platform} {id}", faction.short_name()));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitStatus;

    const SMALL: &str = r#"(
        name: "small",
        seed: 7,
        turn_limit: 4,
        victory_points: Some(30),
        map: (
            width: 6,
            height: 6,
            terrain_overrides: [((q: 2, r: 2), Forest)],
            rivers: [(q: 3, r: 3)],
            objectives: [(cell: (q: 3, r: 3), vp: 2, holder: Some(Red))],
        ),
        deployments: [
            (faction: Blue, platform: "infantry_brigade", position: (q: 1, r: 1), name: Some("1st Rifles")),
            (faction: Red, platform: "mech_brigade", position: (q: 4, r: 4), strength: Some(40), dug_in: 2),
        ],
        nodes: [
            (id: 1, faction: Blue, position: (q: 0, r: 0), source: true, ammo: 500, fuel: 500),
            (id: 2, faction: Blue, position: (q: 1, r: 0)),
        ],
        routes: [(from: 1, to: 2, capacity: 100)],
        weather_schedule: [(3, Rain)],
        reinforcements: [(turn: 2, faction: Red, platform: "infantry_brigade", position: (q: 5, r: 5))],
    )"#;

    #[test]
    fn test_build_small_scenario() {
        let scenario = Scenario::from_ron_str(SMALL).unwrap();
        let (world, rules) = scenario.build(&Catalog::standard()).unwrap();

        assert_eq!(world.unit_ids(), vec![1, 2]);
        assert_eq!(world.unit(1).map(|u| u.name.as_str()), Some("1st Rifles"));
        let red = world.unit(2).unwrap();
        assert_eq!(red.strength, 40);
        assert_eq!(red.dug_in, 2);
        assert_eq!(red.status, UnitStatus::Damaged);
        assert_eq!(world.map().terrain_at(HexCoord::new(2, 2)), Terrain::Forest);
        let objective = world.map().cell(HexCoord::new(3, 3)).unwrap();
        assert!(objective.river);
        assert_eq!(objective.control, Some(FactionId::Red));
        assert_eq!(world.routes().len(), 1);

        assert_eq!(rules.seed, 7);
        assert_eq!(rules.victory_points, Some(30));
        assert_eq!(rules.weather.get(&3), Some(&Weather::Rain));
        assert_eq!(rules.arrivals(2).count(), 1);
        assert_eq!(rules.arrivals(3).count(), 0);
    }

    #[test]
    fn test_unknown_platform_is_fatal() {
        let mut scenario = Scenario::from_ron_str(SMALL).unwrap();
        scenario.deployments[0].platform = "battleship".into();
        let err = scenario.build(&Catalog::standard()).unwrap_err();
        assert!(matches!(err, EngineError::Scenario(msg) if msg.contains("battleship")));
    }

    #[test]
    fn test_off_map_deployment_is_fatal() {
        let mut scenario = Scenario::from_ron_str(SMALL).unwrap();
        scenario.deployments[1].position = HexCoord::new(9, 9);
        assert!(scenario.build(&Catalog::standard()).is_err());
    }

    #[test]
    fn test_duplicate_node_and_bad_route() {
        let catalog = Catalog::standard();
        let mut scenario = Scenario::from_ron_str(SMALL).unwrap();
        scenario.nodes[1].id = 1;
        assert!(scenario.build(&catalog).is_err());

        let mut scenario = Scenario::from_ron_str(SMALL).unwrap();
        scenario.routes.push(RouteSpec {
            from: 1,
            to: 9,
            capacity: 10,
        });
        assert!(scenario.build(&catalog).is_err());
    }

    #[test]
    fn test_ron_round_trip() {
        let scenario = Scenario::from_ron_str(SMALL).unwrap();
        let text = scenario.to_ron_string().unwrap();
        assert_eq!(Scenario::from_ron_str(&text).unwrap(), scenario);
    }
}
