//! Order validation and staging.
//!
//! [`validate`] checks every order of a payload against the current world
//! and catalog. Valid orders are staged with their submission index; the
//! rest become [`OrderRejection`]s. A rejected order never reaches a
//! resolver, and a rejection never aborts the turn.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, DroneKind, PlatformSpec};
use crate::factions::FactionId;
use crate::hex::HexCoord;
use crate::orders::{
    list_domain, AirMission, ArtilleryMission, DroneMission, EwMission, GroundMission,
    HelicopterMission, MissileMission, Order, OrderList, OrdersPayload, SfTask,
    SpecialForcesMission, Target,
};
use crate::unit::{Domain, Unit, UnitId, UnitStatus};
use crate::world::WorldState;

/// Why an order was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The ordered unit does not exist.
    UnknownUnit,
    /// The ordered unit belongs to the other faction.
    NotOwned,
    /// The ordered unit is destroyed.
    UnitDestroyed,
    /// The ordered unit is withdrawn from the line.
    UnitWithdrawn,
    /// The order was filed under the wrong domain.
    WrongDomain {
        /// Domain of the order list.
        expected: Domain,
        /// Domain of the unit.
        actual: Domain,
    },
    /// The unit already has an order this turn.
    AlreadyTasked,
    /// Not enough ammunition.
    InsufficientAmmo,
    /// Not enough fuel.
    InsufficientFuel,
    /// No missiles, interceptors or drones left.
    InsufficientMissiles,
    /// A missile battery is still reloading.
    Reloading,
    /// The target does not exist.
    UnknownTarget,
    /// The target is friendly.
    FriendlyTarget,
    /// The target is already destroyed.
    TargetDestroyed,
    /// The target cell is off the map.
    TargetOffMap,
    /// The target is beyond the unit's reach.
    OutOfRange {
        /// Distance in hexes.
        distance: u32,
        /// Reach in hexes.
        range: u32,
    },
    /// The mission cannot be flown against this kind of target.
    InvalidTargetKind,
    /// The unit to be carried cannot be lifted.
    InvalidCarriedUnit,
    /// The payload was submitted for another faction.
    WrongFaction,
    /// The payload was submitted for another turn.
    WrongTurn {
        /// Current turn.
        expected: u32,
        /// Turn in the payload.
        got: u32,
    },
}

/// A refused order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRejection {
    /// Issuing faction.
    pub faction: FactionId,
    /// Ordered unit, absent for whole-payload rejections.
    pub unit: Option<UnitId>,
    /// The list the order came from.
    pub list: Option<OrderList>,
    /// Why.
    pub reason: RejectionReason,
}

/// An accepted order with its submission index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staged<M> {
    /// Position in the faction's submission, across all lists.
    pub index: u32,
    /// The order.
    pub order: Order<M>,
}

/// One faction's accepted orders, grouped by domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedOrders {
    /// Issuing faction.
    pub faction: FactionId,
    /// Missile orders.
    pub missile: Vec<Staged<MissileMission>>,
    /// Electronic warfare orders.
    pub ew: Vec<Staged<EwMission>>,
    /// Fixed-wing orders, including continued standing patrols.
    pub air: Vec<Staged<AirMission>>,
    /// Drone orders.
    pub drone: Vec<Staged<DroneMission>>,
    /// Artillery orders.
    pub artillery: Vec<Staged<ArtilleryMission>>,
    /// Helicopter orders.
    pub helicopter: Vec<Staged<HelicopterMission>>,
    /// Ground orders.
    pub ground: Vec<Staged<GroundMission>>,
    /// Special forces orders.
    pub special_forces: Vec<Staged<SpecialForcesMission>>,
    /// Every unit committed by these orders, including carried units.
    pub tasked: BTreeSet<UnitId>,
}

impl ValidatedOrders {
    /// No orders.
    #[must_use]
    pub fn empty(faction: FactionId) -> Self {
        Self {
            faction,
            missile: Vec::new(),
            ew: Vec::new(),
            air: Vec::new(),
            drone: Vec::new(),
            artillery: Vec::new(),
            helicopter: Vec::new(),
            ground: Vec::new(),
            special_forces: Vec::new(),
            tasked: BTreeSet::new(),
        }
    }

    /// Number of staged orders.
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

    /// Whether nothing was staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Both factions' staged orders for the turn in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedOrders {
    /// Blue orders.
    pub blue: ValidatedOrders,
    /// Red orders.
    pub red: ValidatedOrders,
}

impl StagedOrders {
    /// Orders of one faction.
    #[must_use]
    pub const fn of(&self, faction: FactionId) -> &ValidatedOrders {
        match faction {
            FactionId::Blue => &self.blue,
            FactionId::Red => &self.red,
        }
    }
}

/// Result of validating one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeOutcome {
    /// Accepted orders.
    pub orders: ValidatedOrders,
    /// Refused orders.
    pub rejections: Vec<OrderRejection>,
}

type Check = std::result::Result<(), RejectionReason>;

/// Shared lookup state for one payload.
struct Intake<'a> {
    world: &'a WorldState,
    catalog: &'a Catalog,
    faction: FactionId,
    tasked: BTreeSet<UnitId>,
    rejections: Vec<OrderRejection>,
    next_index: u32,
}

/// Mission-specific rules.
trait MissionRules: Clone {
    const LIST: OrderList;

    fn check(&self, intake: &Intake<'_>, unit: &Unit, spec: &PlatformSpec, target: &Target)
        -> Check;

    /// Additional units committed by this order.
    fn carried(&self) -> Option<UnitId> {
        None
    }
}

impl<'a> Intake<'a> {
    fn new(world: &'a WorldState, catalog: &'a Catalog, faction: FactionId) -> Self {
        Self {
            world,
            catalog,
            faction,
            tasked: BTreeSet::new(),
            rejections: Vec::new(),
            next_index: 0,
        }
    }

    fn reject(&mut self, unit: Option<UnitId>, list: Option<OrderList>, reason: RejectionReason) {
        self.rejections.push(OrderRejection {
            faction: self.faction,
            unit,
            list,
            reason,
        });
    }

    fn stage<M: MissionRules>(&mut self, orders: &[Order<M>]) -> Vec<Staged<M>> {
        let mut staged = Vec::new();
        for order in orders {
            let index = self.next_index;
            self.next_index += 1;
            match self.check_order(order) {
                Ok(()) => {
                    self.tasked.insert(order.unit);
                    if let Some(carried) = order.mission.carried() {
                        self.tasked.insert(carried);
                    }
                    staged.push(Staged {
                        index,
                        order: order.clone(),
                    });
                }
                Err(reason) => self.reject(Some(order.unit), Some(M::LIST), reason),
            }
        }
        staged
    }

    fn check_order<M: MissionRules>(&self, order: &Order<M>) -> Check {
        let unit = self.own_unit(order.unit)?;
        let expected = list_domain(M::LIST);
        if unit.domain != expected {
            return Err(RejectionReason::WrongDomain {
                expected,
                actual: unit.domain,
            });
        }
        if self.tasked.contains(&unit.id) {
            return Err(RejectionReason::AlreadyTasked);
        }
        let spec = self
            .catalog
            .platform(&unit.platform)
            .ok_or(RejectionReason::UnknownUnit)?;
        order.mission.check(self, unit, spec, &order.target)
    }

    fn own_unit(&self, id: UnitId) -> std::result::Result<&'a Unit, RejectionReason> {
        let unit = self.world.unit(id).ok_or(RejectionReason::UnknownUnit)?;
        if unit.faction != self.faction {
            return Err(RejectionReason::NotOwned);
        }
        match unit.status {
            UnitStatus::Destroyed => Err(RejectionReason::UnitDestroyed),
            UnitStatus::Withdrawn => Err(RejectionReason::UnitWithdrawn),
            UnitStatus::Active | UnitStatus::Damaged => Ok(unit),
        }
    }

    /// Locate a hostile target.
    fn locate(&self, target: &Target) -> std::result::Result<HexCoord, RejectionReason> {
        match target {
            Target::Unit(id) => {
                let t = self.world.unit(*id).ok_or(RejectionReason::UnknownTarget)?;
                if t.status == UnitStatus::Destroyed {
                    return Err(RejectionReason::TargetDestroyed);
                }
                if t.faction == self.faction {
                    return Err(RejectionReason::FriendlyTarget);
                }
                Ok(t.position)
            }
            Target::Cell(cell) | Target::Area { center: cell, .. } => {
                if self.world.map().contains(*cell) {
                    Ok(*cell)
                } else {
                    Err(RejectionReason::TargetOffMap)
                }
            }
            Target::SupplyNode(id) => {
                let node = self.world.node(*id).ok_or(RejectionReason::UnknownTarget)?;
                if node.faction == self.faction {
                    return Err(RejectionReason::FriendlyTarget);
                }
                Ok(node.position)
            }
        }
    }

    /// Locate a hostile target within the platform's range.
    fn in_range(&self, unit: &Unit, spec: &PlatformSpec, target: &Target) -> Check {
        let at = self.locate(target)?;
        let distance = unit.position.distance(at);
        if distance > spec.range {
            return Err(RejectionReason::OutOfRange {
                distance,
                range: spec.range,
            });
        }
        Ok(())
    }

    fn target_domain(&self, target: &Target) -> Option<Domain> {
        target.unit().and_then(|id| self.world.unit(id)).map(|u| u.domain)
    }
}

fn require(condition: bool, reason: RejectionReason) -> Check {
    if condition {
        Ok(())
    } else {
        Err(reason)
    }
}

fn is_airborne(domain: Domain) -> bool {
    matches!(domain, Domain::Air | Domain::Helicopter | Domain::Drone)
}

impl MissionRules for MissileMission {
    const LIST: OrderList = OrderList::Missile;

    fn check(&self, intake: &Intake<'_>, unit: &Unit, spec: &PlatformSpec, target: &Target) -> Check {
        require(
            matches!(target, Target::Unit(_) | Target::SupplyNode(_)),
            RejectionReason::InvalidTargetKind,
        )?;
        require(unit.missiles > 0, RejectionReason::InsufficientMissiles)?;
        require(unit.reload == 0, RejectionReason::Reloading)?;
        intake.in_range(unit, spec, target)
    }
}

impl MissionRules for EwMission {
    const LIST: OrderList = OrderList::Ew;

    fn check(&self, intake: &Intake<'_>, unit: &Unit, spec: &PlatformSpec, target: &Target) -> Check {
        require(target.is_place(), RejectionReason::InvalidTargetKind)?;
        match self {
            // Network attacks are not range-limited.
            EwMission::Cyber(_) => intake.locate(target).map(|_| ()),
            _ => intake.in_range(unit, spec, target),
        }
    }
}

impl MissionRules for AirMission {
    const LIST: OrderList = OrderList::Air;

    fn check(&self, intake: &Intake<'_>, unit: &Unit, spec: &PlatformSpec, target: &Target) -> Check {
        require(unit.fuel > 0, RejectionReason::InsufficientFuel)?;
        match self {
            AirMission::Cap => require(target.is_place(), RejectionReason::InvalidTargetKind)?,
            AirMission::Sweep => {
                require(target.is_place(), RejectionReason::InvalidTargetKind)?;
                require(unit.ammo > 0, RejectionReason::InsufficientAmmo)?;
            }
            AirMission::Strike | AirMission::Oca | AirMission::Sead | AirMission::Cas => {
                let domain = intake
                    .target_domain(target)
                    .ok_or(RejectionReason::InvalidTargetKind)?;
                let fits = match self {
                    AirMission::Oca => is_airborne(domain),
                    AirMission::Sead => domain == Domain::AirDefense,
                    AirMission::Cas => matches!(domain, Domain::Ground | Domain::Artillery),
                    _ => !is_airborne(domain),
                };
                require(fits, RejectionReason::InvalidTargetKind)?;
                require(unit.ammo > 0, RejectionReason::InsufficientAmmo)?;
            }
        }
        intake.in_range(unit, spec, target)
    }
}

impl MissionRules for DroneMission {
    const LIST: OrderList = OrderList::Drone;

    fn check(&self, intake: &Intake<'_>, unit: &Unit, spec: &PlatformSpec, target: &Target) -> Check {
        let kind = spec.drone.as_ref().map(|d| d.kind);
        match kind {
            Some(DroneKind::Loitering | DroneKind::Swarm) => {
                require(unit.missiles > 0, RejectionReason::InsufficientMissiles)?;
            }
            _ => require(unit.fuel > 0, RejectionReason::InsufficientFuel)?,
        }
        match self {
            DroneMission::Isr => require(target.is_place(), RejectionReason::InvalidTargetKind)?,
            DroneMission::Strike => {
                let domain = intake
                    .target_domain(target)
                    .ok_or(RejectionReason::InvalidTargetKind)?;
                require(!is_airborne(domain), RejectionReason::InvalidTargetKind)?;
                if kind == Some(DroneKind::Ucav) {
                    require(unit.ammo > 0, RejectionReason::InsufficientAmmo)?;
                }
            }
            DroneMission::Swarm => require(
                intake.target_domain(target) == Some(Domain::AirDefense),
                RejectionReason::InvalidTargetKind,
            )?,
        }
        intake.in_range(unit, spec, target)
    }
}

impl MissionRules for ArtilleryMission {
    const LIST: OrderList = OrderList::Artillery;

    fn check(&self, intake: &Intake<'_>, unit: &Unit, spec: &PlatformSpec, target: &Target) -> Check {
        require(unit.ammo > 0, RejectionReason::InsufficientAmmo)?;
        match self {
            ArtilleryMission::FireMission => require(
                matches!(target, Target::Unit(_) | Target::Cell(_) | Target::Area { .. }),
                RejectionReason::InvalidTargetKind,
            )?,
            ArtilleryMission::CounterBattery => require(
                target.is_place() || intake.target_domain(target) == Some(Domain::Artillery),
                RejectionReason::InvalidTargetKind,
            )?,
        }
        if let Some(domain) = intake.target_domain(target) {
            require(!is_airborne(domain), RejectionReason::InvalidTargetKind)?;
        }
        intake.in_range(unit, spec, target)
    }
}

impl MissionRules for HelicopterMission {
    const LIST: OrderList = OrderList::Helicopter;

    fn check(&self, intake: &Intake<'_>, unit: &Unit, spec: &PlatformSpec, target: &Target) -> Check {
        require(unit.fuel > 0, RejectionReason::InsufficientFuel)?;
        match self {
            HelicopterMission::Attack => {
                let domain = intake
                    .target_domain(target)
                    .ok_or(RejectionReason::InvalidTargetKind)?;
                require(!is_airborne(domain), RejectionReason::InvalidTargetKind)?;
                require(unit.ammo > 0, RejectionReason::InsufficientAmmo)?;
            }
            HelicopterMission::AirAssault { carried } => {
                require(
                    matches!(target, Target::Cell(_)),
                    RejectionReason::InvalidTargetKind,
                )?;
                require(
                    spec.helicopter.as_ref().is_some_and(|h| h.lift),
                    RejectionReason::InvalidTargetKind,
                )?;
                let troops = intake
                    .own_unit(*carried)
                    .map_err(|_| RejectionReason::InvalidCarriedUnit)?;
                require(
                    troops.domain == Domain::Ground
                        && !intake.tasked.contains(carried)
                        && troops.position.distance(unit.position) <= 1,
                    RejectionReason::InvalidCarriedUnit,
                )?;
            }
            HelicopterMission::Scout => {
                require(target.is_place(), RejectionReason::InvalidTargetKind)?;
            }
        }
        intake.in_range(unit, spec, target)
    }

    fn carried(&self) -> Option<UnitId> {
        match self {
            HelicopterMission::AirAssault { carried } => Some(*carried),
            _ => None,
        }
    }
}

impl MissionRules for GroundMission {
    const LIST: OrderList = OrderList::Ground;

    fn check(&self, intake: &Intake<'_>, unit: &Unit, spec: &PlatformSpec, target: &Target) -> Check {
        match self {
            GroundMission::Attack(_) => {
                let domain = intake
                    .target_domain(target)
                    .ok_or(RejectionReason::InvalidTargetKind)?;
                require(!is_airborne(domain), RejectionReason::InvalidTargetKind)?;
                require(unit.ammo > 0, RejectionReason::InsufficientAmmo)?;
                let at = intake.locate(target)?;
                let distance = unit.position.distance(at);
                require(
                    distance <= 1,
                    RejectionReason::OutOfRange { distance, range: 1 },
                )
            }
            GroundMission::Move => {
                require(
                    matches!(target, Target::Cell(_)),
                    RejectionReason::InvalidTargetKind,
                )?;
                require(
                    spec.supply.fuel == 0 || unit.fuel > 0,
                    RejectionReason::InsufficientFuel,
                )?;
                intake.locate(target).map(|_| ())
            }
            GroundMission::Defend => {
                require(target.is_place(), RejectionReason::InvalidTargetKind)?;
                intake.locate(target).map(|_| ())
            }
        }
    }
}

impl MissionRules for SpecialForcesMission {
    const LIST: OrderList = OrderList::SpecialForces;

    fn check(&self, intake: &Intake<'_>, unit: &Unit, spec: &PlatformSpec, target: &Target) -> Check {
        let fits = match self.task {
            SfTask::Recon => !matches!(target, Target::SupplyNode(_)),
            SfTask::Sabotage => matches!(target, Target::SupplyNode(_) | Target::Unit(_)),
            SfTask::Raid | SfTask::DirectAction => matches!(target, Target::Unit(_)),
        };
        require(fits, RejectionReason::InvalidTargetKind)?;
        if let Some(domain) = intake.target_domain(target) {
            require(
                !matches!(domain, Domain::Air | Domain::Drone),
                RejectionReason::InvalidTargetKind,
            )?;
        }
        intake.in_range(unit, spec, target)
    }
}

/// Validate one faction's payload for the current turn.
///
/// The payload must be for `faction` and for the world's current turn;
/// otherwise it is rejected as a whole and the faction stands fast. Air
/// units flying a standing patrol continue it when they received no new
/// order and can still fly.
#[must_use]
pub fn validate(
    world: &WorldState,
    catalog: &Catalog,
    faction: FactionId,
    payload: &OrdersPayload,
) -> IntakeOutcome {
    let mut intake = Intake::new(world, catalog, faction);
    let mut orders = ValidatedOrders::empty(faction);
    let current = world.clock.turn;

    if payload.faction != faction {
        intake.reject(None, None, RejectionReason::WrongFaction);
    } else if payload.turn != current {
        intake.reject(
            None,
            None,
            RejectionReason::WrongTurn {
                expected: current,
                got: payload.turn,
            },
        );
    } else {
        orders.missile = intake.stage(&payload.missile);
        orders.ew = intake.stage(&payload.ew);
        orders.air = intake.stage(&payload.air);
        orders.drone = intake.stage(&payload.drone);
        orders.artillery = intake.stage(&payload.artillery);
        orders.helicopter = intake.stage(&payload.helicopter);
        orders.ground = intake.stage(&payload.ground);
        orders.special_forces = intake.stage(&payload.special_forces);
    }

    // Standing patrols continue for untasked aircraft.
    let continuing: Vec<(UnitId, HexCoord)> = world
        .units_of(faction)
        .filter(|u| u.domain == Domain::Air && u.is_operational() && u.fuel > 0)
        .filter(|u| !intake.tasked.contains(&u.id))
        .filter_map(|u| u.standing_cap.map(|cell| (u.id, cell)))
        .collect();
    for (unit, cell) in continuing {
        let index = intake.next_index;
        intake.next_index += 1;
        intake.tasked.insert(unit);
        orders.air.push(Staged {
            index,
            order: Order::new(unit, AirMission::Cap, Target::Cell(cell)),
        });
    }

    orders.tasked = intake.tasked;
    IntakeOutcome {
        orders,
        rejections: intake.rejections,
    }
}
