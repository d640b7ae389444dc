//! Typed orders submitted by each faction every turn.
//!
//! Each domain has its own closed mission enum; a payload carries one list
//! per domain. Payloads are plain serde data so they travel as JSON or RON.

use serde::{Deserialize, Serialize};

use crate::factions::FactionId;
use crate::hex::HexCoord;
use crate::logistics::NodeId;
use crate::math::{pct, Fixed};
use crate::unit::{Domain, UnitId};
use crate::world::WorldState;

/// What an order is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// A specific unit.
    Unit(UnitId),
    /// A single cell.
    Cell(HexCoord),
    /// Every cell within `radius` of `center`.
    Area {
        /// Centre cell.
        center: HexCoord,
        /// Radius in hexes.
        radius: u32,
    },
    /// A supply node.
    SupplyNode(NodeId),
}

impl Target {
    /// The targeted unit, if any.
    #[must_use]
    pub const fn unit(&self) -> Option<UnitId> {
        match self {
            Self::Unit(id) => Some(*id),
            _ => None,
        }
    }

    /// Area radius (zero for point targets).
    #[must_use]
    pub const fn radius(&self) -> u32 {
        match self {
            Self::Area { radius, .. } => *radius,
            _ => 0,
        }
    }

    /// Where the target is now, if it can be located.
    #[must_use]
    pub fn location(&self, world: &WorldState) -> Option<HexCoord> {
        match self {
            Self::Unit(id) => world.unit(*id).map(|u| u.position),
            Self::Cell(cell) | Self::Area { center: cell, .. } => Some(*cell),
            Self::SupplyNode(id) => world.node(*id).map(|n| n.position),
        }
    }

    /// Whether the target is a map location rather than an object.
    #[must_use]
    pub const fn is_place(&self) -> bool {
        matches!(self, Self::Cell(_) | Self::Area { .. })
    }
}

/// A single order for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order<M> {
    /// Issuing unit.
    pub unit: UnitId,
    /// Mission type.
    pub mission: M,
    /// Objective.
    pub target: Target,
    /// Allocation (missiles, drones, aircraft); zero means the platform default.
    #[serde(default)]
    pub quantity: u32,
}

impl<M> Order<M> {
    /// Create an order with the default allocation.
    pub const fn new(unit: UnitId, mission: M, target: Target) -> Self {
        Self {
            unit,
            mission,
            target,
            quantity: 0,
        }
    }

    /// Set an explicit allocation.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// The explicit allocation, or `default` when none was given.
    #[must_use]
    pub const fn quantity_or(&self, default: u32) -> u32 {
        if self.quantity == 0 {
            default
        } else {
            self.quantity
        }
    }
}

/// Surface-to-surface missile missions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissileMission {
    /// Strike a unit or supply node.
    Strike,
}

/// Cyber attack target systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CyberTarget {
    /// Command and control networks.
    C2,
    /// Air-defense networks.
    AirDefense,
    /// Logistics management systems.
    Logistics,
    /// Communications.
    Comms,
}

impl CyberTarget {
    /// Damage range in percent for a successful attack.
    #[must_use]
    pub const fn damage_range(self) -> (u32, u32) {
        match self {
            Self::C2 => (30, 60),
            Self::AirDefense => (20, 50),
            Self::Logistics => (25, 55),
            Self::Comms => (35, 65),
        }
    }
}

/// Electronic warfare missions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EwMission {
    /// Jam enemy radars.
    JamRadar,
    /// Jam enemy communications.
    JamComms,
    /// Attack an enemy network.
    Cyber(CyberTarget),
    /// Intercept enemy emissions in an area.
    Sigint,
    /// Deny satellite navigation.
    GpsDenial,
}

/// Fixed-wing missions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AirMission {
    /// Combat air patrol over a cell.
    Cap,
    /// Offensive fighter sweep.
    Sweep,
    /// Offensive counter-air against enemy aircraft on the ground.
    Oca,
    /// Interdiction strike.
    Strike,
    /// Suppression of enemy air defences.
    Sead,
    /// Close air support.
    Cas,
}

impl AirMission {
    /// Air-to-air missions that can be paired against each other.
    #[must_use]
    pub const fn is_counter_air(self) -> bool {
        matches!(self, Self::Cap | Self::Sweep)
    }
}

/// Drone missions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DroneMission {
    /// Reconnaissance over an area.
    Isr,
    /// Attack a unit.
    Strike,
    /// Saturate an air-defense unit.
    Swarm,
}

/// Artillery missions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtilleryMission {
    /// Bombard a unit or cell.
    FireMission,
    /// Locate and engage an enemy battery that has fired.
    CounterBattery,
}

/// Helicopter missions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HelicopterMission {
    /// Attack or close support against a unit.
    Attack,
    /// Lift a friendly ground unit to a landing zone.
    AirAssault {
        /// The ground unit carried.
        carried: UnitId,
    },
    /// Armed reconnaissance.
    Scout,
}

/// Ground attack postures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackPosture {
    /// Full-weight attack.
    Assault,
    /// Limited probing attack.
    Probe,
    /// Pursuit.
    Exploitation,
}

impl AttackPosture {
    /// Combat power multiplier.
    #[must_use]
    pub fn multiplier(self) -> Fixed {
        pct(match self {
            Self::Assault => 120,
            Self::Probe => 80,
            Self::Exploitation => 100,
        })
    }
}

/// Ground missions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroundMission {
    /// Attack an adjacent enemy unit.
    Attack(AttackPosture),
    /// Move towards a cell.
    Move,
    /// Hold and entrench.
    Defend,
}

/// Special forces tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SfTask {
    /// Covert reconnaissance.
    Recon,
    /// Sabotage a node or unit.
    Sabotage,
    /// Hit-and-run raid.
    Raid,
    /// Direct action against a high-value unit.
    DirectAction,
}

impl SfTask {
    /// Execution difficulty divisor.
    #[must_use]
    pub fn difficulty(self) -> Fixed {
        pct(match self {
            Self::Raid => 120,
            Self::Recon => 70,
            Self::Sabotage => 100,
            Self::DirectAction => 130,
        })
    }
}

/// Special forces insertion methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Insertion {
    /// Overland.
    #[default]
    Ground,
    /// By helicopter.
    Helicopter,
    /// High-altitude parachute.
    Halo,
    /// From the water.
    Water,
}

impl Insertion {
    /// Detection risk multiplier.
    #[must_use]
    pub fn risk(self) -> Fixed {
        pct(match self {
            Self::Ground => 100,
            Self::Helicopter => 130,
            Self::Halo => 70,
            Self::Water => 80,
        })
    }
}

/// Special forces mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecialForcesMission {
    /// What the team is to do.
    pub task: SfTask,
    /// How it gets in.
    #[serde(default)]
    pub insertion: Insertion,
}

/// One faction's orders for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersPayload {
    /// Issuing faction.
    pub faction: FactionId,
    /// Turn the orders are for.
    pub turn: u32,
    /// Missile orders.
    #[serde(default)]
    pub missile: Vec<Order<MissileMission>>,
    /// Electronic warfare orders.
    #[serde(default)]
    pub ew: Vec<Order<EwMission>>,
    /// Fixed-wing orders.
    #[serde(default)]
    pub air: Vec<Order<AirMission>>,
    /// Drone orders.
    #[serde(default)]
    pub drone: Vec<Order<DroneMission>>,
    /// Artillery orders.
    #[serde(default)]
    pub artillery: Vec<Order<ArtilleryMission>>,
    /// Helicopter orders.
    #[serde(default)]
    pub helicopter: Vec<Order<HelicopterMission>>,
    /// Ground orders.
    #[serde(default)]
    pub ground: Vec<Order<GroundMission>>,
    /// Special forces orders.
    #[serde(default)]
    pub special_forces: Vec<Order<SpecialForcesMission>>,
}

impl OrdersPayload {
    /// A payload with no orders: every unit stands fast.
    #[must_use]
    pub const fn empty(faction: FactionId, turn: u32) -> Self {
        Self {
            faction,
            turn,
            missile: Vec::new(),
            ew: Vec::new(),
            air: Vec::new(),
            drone: Vec::new(),
            artillery: Vec::new(),
            helicopter: Vec::new(),
            ground: Vec::new(),
            special_forces: Vec::new(),
        }
    }

    /// Total number of orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.missile.len()
            + self.ew.len()
            + self.air.len()
            + self.drone.len()
            + self.artillery.len()
            + self.helicopter.len()
            + self.ground.len()
            + self.special_forces.len()
    }

    /// Whether the payload carries no orders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What a faction delivered for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Submission {
    /// Orders arrived in time.
    Delivered(OrdersPayload),
    /// The producer missed its deadline.
    TimedOut,
}

impl From<OrdersPayload> for Submission {
    fn from(payload: OrdersPayload) -> Self {
        Self::Delivered(payload)
    }
}

/// The domain expected of units in each order list.
pub(crate) const fn list_domain(list: OrderList) -> Domain {
    match list {
        OrderList::Missile => Domain::Missile,
        OrderList::Ew => Domain::ElectronicWarfare,
        OrderList::Air => Domain::Air,
        OrderList::Drone => Domain::Drone,
        OrderList::Artillery => Domain::Artillery,
        OrderList::Helicopter => Domain::Helicopter,
        OrderList::Ground => Domain::Ground,
        OrderList::SpecialForces => Domain::SpecialForces,
    }
}

/// The per-domain order lists of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderList {
    /// Missile orders.
    Missile,
    /// Electronic warfare orders.
    Ew,
    /// Fixed-wing orders.
    Air,
    /// Drone orders.
    Drone,
    /// Artillery orders.
    Artillery,
    /// Helicopter orders.
    Helicopter,
    /// Ground orders.
    Ground,
    /// Special forces orders.
    SpecialForces,
}
