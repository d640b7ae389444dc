//! Units: identity, domain, position and combat condition.

use serde::{Deserialize, Serialize};

use crate::factions::FactionId;
use crate::hex::HexCoord;
use crate::math::{fixed_serde, Fixed};

/// Dense unit identifier.
pub type UnitId = u32;

/// Operational domain of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// Fixed-wing aircraft.
    Air,
    /// Manoeuvre formations.
    Ground,
    /// Surface-to-surface missile batteries.
    Missile,
    /// Surface-to-air defences.
    AirDefense,
    /// Unmanned aircraft.
    Drone,
    /// Rotary-wing aircraft.
    Helicopter,
    /// Tube and rocket artillery.
    Artillery,
    /// Special operations teams.
    SpecialForces,
    /// Electronic warfare and cyber units.
    ElectronicWarfare,
    /// Dedicated sensor installations.
    Isr,
}

impl Domain {
    /// Whether units of this domain count towards the elimination check.
    #[must_use]
    pub const fn is_combat(self) -> bool {
        !matches!(self, Self::ElectronicWarfare | Self::Isr)
    }

    /// Victory points the opponent earns when a unit of this domain is destroyed.
    #[must_use]
    pub const fn destruction_value(self) -> u32 {
        match self {
            Self::Air => 5,
            Self::AirDefense => 4,
            Self::Missile | Self::Helicopter | Self::SpecialForces => 3,
            _ => 2,
        }
    }
}

/// Operational status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    /// Fully operational.
    Active,
    /// Below half strength but operational.
    Damaged,
    /// Permanently out of the run.
    Destroyed,
    /// Combat-ineffective and out of the line until it recovers.
    Withdrawn,
}

/// Ground posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Posture {
    /// Holding position.
    #[default]
    Defend,
    /// Committed attack.
    Assault,
    /// Limited attack.
    Probe,
    /// Pursuit of a broken enemy.
    Exploitation,
    /// In movement.
    Moving,
}

/// Why a unit lost strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossCause {
    /// Enemy action.
    Combat,
    /// Sustained lack of supply.
    Attrition,
    /// Munitions or one-way drones used up.
    Expended,
    /// Personnel taken prisoner.
    Captured,
}

/// A unit on the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier.
    pub id: UnitId,
    /// Owning faction.
    pub faction: FactionId,
    /// Operational domain.
    pub domain: Domain,
    /// Catalog platform key.
    pub platform: String,
    /// Display designation.
    pub name: String,
    /// Current cell.
    pub position: HexCoord,
    /// Current platform or personnel count.
    pub strength: u32,
    /// Full-establishment count.
    pub max_strength: u32,
    /// Fraction of rated capability available.
    #[serde(with = "fixed_serde")]
    pub readiness: Fixed,
    /// Ammunition on hand.
    pub ammo: u32,
    /// Fuel on hand.
    pub fuel: u32,
    /// Missiles, interceptors or one-way drones on hand.
    pub missiles: u32,
    /// Operational status.
    pub status: UnitStatus,
    /// Cohesion, 0-100.
    pub organization: u32,
    /// Will to fight, 0-100.
    pub morale: u32,
    /// Suppression, 0-100.
    pub suppression: u32,
    /// Entrenchment level, 0-3.
    pub dug_in: u8,
    /// Ground posture.
    pub posture: Posture,
    /// Turns until a missile battery can fire again.
    pub reload: u32,
    /// Air-defense engagement channels used this turn.
    pub channels_used: u32,
    /// Fired this turn (counter-battery cue).
    pub fired_this_turn: bool,
    /// Took part in combat this turn.
    pub in_combat: bool,
    /// Received an order this turn.
    pub tasked: bool,
    /// Consecutive turns without a reachable supply node.
    pub cut_off_turns: u32,
    /// Patrol cell of a standing combat air patrol.
    pub standing_cap: Option<HexCoord>,
    /// Readiness fell below the degradation threshold at the last logistics pass.
    pub degraded: bool,
}

impl Unit {
    /// Create a unit at full strength and readiness.
    #[must_use]
    pub fn new(
        id: UnitId,
        faction: FactionId,
        domain: Domain,
        platform: impl Into<String>,
        position: HexCoord,
        max_strength: u32,
    ) -> Self {
        let platform = platform.into();
        Self {
            id,
            faction,
            domain,
            name: format!("{platform}-{id}"),
            platform,
            position,
            strength: max_strength,
            max_strength,
            readiness: Fixed::ONE,
            ammo: 0,
            fuel: 0,
            missiles: 0,
            status: UnitStatus::Active,
            organization: 100,
            morale: 100,
            suppression: 0,
            dug_in: 0,
            posture: Posture::Defend,
            reload: 0,
            channels_used: 0,
            fired_this_turn: false,
            in_combat: false,
            tasked: false,
            cut_off_turns: 0,
            standing_cap: None,
            degraded: false,
        }
    }

    /// Whether the unit is still on the board (not destroyed).
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status != UnitStatus::Destroyed
    }

    /// Whether the unit can accept orders and fight.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        matches!(self.status, UnitStatus::Active | UnitStatus::Damaged)
    }

    /// Fraction of establishment strength remaining.
    #[must_use]
    pub fn strength_fraction(&self) -> Fixed {
        crate::math::ratio(Fixed::from_num(self.strength), Fixed::from_num(self.max_strength))
    }

    /// Status implied by the current strength, organization and morale.
    ///
    /// A destroyed unit stays destroyed; a withdrawn unit stays withdrawn
    /// until the logistics pass recovers it.
    #[must_use]
    pub fn derived_status(&self) -> UnitStatus {
        if self.status == UnitStatus::Destroyed || self.strength == 0 {
            UnitStatus::Destroyed
        } else if self.status == UnitStatus::Withdrawn || self.morale < 10 || self.organization < 10
        {
            UnitStatus::Withdrawn
        } else if self.strength * 2 < self.max_strength {
            UnitStatus::Damaged
        } else {
            UnitStatus::Active
        }
    }

    /// Clear the per-turn flags at the start of a turn.
    pub fn reset_turn_flags(&mut self) {
        self.fired_this_turn = false;
        self.in_combat = false;
        self.tasked = false;
    }
}
