//! Turn clock, phases and environmental conditions.

use serde::{Deserialize, Serialize};

use crate::factions::FactionId;
use crate::math::{pct, Fixed};

/// Hours of game time covered by one turn.
pub const HOURS_PER_TURN: u32 = 6;

/// One phase of turn resolution, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Fog-of-war recomputation.
    Intel,
    /// Ballistic and cruise missile strikes.
    Missile,
    /// Jamming, cyber and signals intelligence.
    Ew,
    /// Fixed-wing air operations.
    Air,
    /// Unmanned aircraft.
    Drone,
    /// Tube and rocket artillery.
    Artillery,
    /// Rotary-wing operations.
    Helicopter,
    /// Manoeuvre and ground combat.
    Ground,
    /// Special forces raids and reconnaissance.
    SpecialForces,
    /// Consumption, resupply and recovery.
    Logistics,
}

impl Phase {
    /// Every phase in execution order.
    pub const ALL: [Phase; 10] = [
        Phase::Intel,
        Phase::Missile,
        Phase::Ew,
        Phase::Air,
        Phase::Drone,
        Phase::Artillery,
        Phase::Helicopter,
        Phase::Ground,
        Phase::SpecialForces,
        Phase::Logistics,
    ];

    /// Position of this phase in the turn sequence.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// The phase that follows this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Phase> {
        Self::ALL.get(self.index() as usize + 1).copied()
    }

    /// Short lowercase tag used in logs.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Intel => "intel",
            Self::Missile => "missile",
            Self::Ew => "ew",
            Self::Air => "air",
            Self::Drone => "drone",
            Self::Artillery => "artillery",
            Self::Helicopter => "helicopter",
            Self::Ground => "ground",
            Self::SpecialForces => "special_forces",
            Self::Logistics => "logistics",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Weather over the theatre for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Weather {
    /// Clear skies.
    #[default]
    Clear,
    /// Overcast.
    Cloudy,
    /// Rain.
    Rain,
    /// Thunderstorms.
    Storm,
    /// Fog.
    Fog,
    /// Sandstorm.
    Sandstorm,
}

impl Weather {
    /// Visibility multiplier for visual sensors and fires.
    #[must_use]
    pub fn visibility(self) -> Fixed {
        pct(match self {
            Self::Clear => 100,
            Self::Cloudy => 80,
            Self::Rain => 50,
            Self::Storm => 20,
            Self::Fog | Self::Sandstorm => 10,
        })
    }

    /// Multiplier on air operations.
    #[must_use]
    pub fn air_ops(self) -> Fixed {
        pct(match self {
            Self::Clear => 100,
            Self::Cloudy => 90,
            Self::Rain => 50,
            Self::Storm | Self::Sandstorm => 10,
            Self::Fog => 20,
        })
    }

    /// Multiplier on ground movement allowance.
    #[must_use]
    pub fn movement(self) -> Fixed {
        pct(match self {
            Self::Clear | Self::Cloudy => 100,
            Self::Rain => 80,
            Self::Storm => 50,
            Self::Fog => 90,
            Self::Sandstorm => 60,
        })
    }
}

/// Time of day, four turns per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    /// 06:00 turn.
    Dawn,
    /// 12:00 turn.
    Day,
    /// 18:00 turn.
    Dusk,
    /// 00:00 turn.
    Night,
}

impl TimeOfDay {
    /// Derive the time of day from an hour of the clock.
    #[must_use]
    pub const fn from_hour(hour: u32) -> Self {
        match hour % 24 {
            4..=9 => Self::Dawn,
            10..=15 => Self::Day,
            16..=21 => Self::Dusk,
            _ => Self::Night,
        }
    }
}

/// Conditions in force for a turn, as seen by resolvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Current weather.
    pub weather: Weather,
    /// Current time of day.
    pub time_of_day: TimeOfDay,
}

impl Environment {
    /// Whether it is night.
    #[must_use]
    pub fn is_night(&self) -> bool {
        self.time_of_day == TimeOfDay::Night
    }

    /// Combined visibility multiplier.
    #[must_use]
    pub fn visibility(&self) -> Fixed {
        let base = self.weather.visibility();
        if self.is_night() {
            base * pct(30)
        } else {
            base
        }
    }

    /// Combined air-operations multiplier.
    #[must_use]
    pub fn air_ops(&self) -> Fixed {
        let base = self.weather.air_ops();
        if self.is_night() {
            base * pct(70)
        } else {
            base
        }
    }

    /// Ground movement multiplier.
    #[must_use]
    pub fn movement(&self) -> Fixed {
        self.weather.movement()
    }

    /// Extra concealment points granted by darkness.
    #[must_use]
    pub fn concealment_bonus(&self) -> u32 {
        if self.is_night() {
            25
        } else {
            0
        }
    }
}

/// Victory points accumulated by each faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct VictoryPoints {
    /// Blue total.
    pub blue: u32,
    /// Red total.
    pub red: u32,
}

impl VictoryPoints {
    /// Points held by `faction`.
    #[must_use]
    pub const fn get(&self, faction: FactionId) -> u32 {
        match faction {
            FactionId::Blue => self.blue,
            FactionId::Red => self.red,
        }
    }

    /// Award points to `faction`.
    pub fn award(&mut self, faction: FactionId, amount: u32) {
        match faction {
            FactionId::Blue => self.blue = self.blue.saturating_add(amount),
            FactionId::Red => self.red = self.red.saturating_add(amount),
        }
    }

    /// The faction with strictly more points, if any.
    #[must_use]
    pub fn leader(&self) -> Option<FactionId> {
        match self.blue.cmp(&self.red) {
            std::cmp::Ordering::Greater => Some(FactionId::Blue),
            std::cmp::Ordering::Less => Some(FactionId::Red),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Turn clock. Turn 0 is the state before the first turn resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnState {
    /// Index of the current (or last completed) turn.
    pub turn: u32,
    /// Hour of day at which turn 1 begins.
    pub start_hour: u32,
    /// Weather in force.
    pub weather: Weather,
    /// Phase being resolved, `None` between turns.
    pub phase: Option<Phase>,
    /// Accumulated victory points.
    pub victory_points: VictoryPoints,
}

impl TurnState {
    /// Create the pre-game clock.
    #[must_use]
    pub fn new(start_hour: u32, weather: Weather) -> Self {
        Self {
            turn: 0,
            start_hour,
            weather,
            phase: None,
            victory_points: VictoryPoints::default(),
        }
    }

    /// Elapsed game hours at the start of the current turn.
    #[must_use]
    pub fn timestamp_hours(&self) -> u32 {
        self.start_hour + HOURS_PER_TURN * self.turn.saturating_sub(1)
    }

    /// Day number, starting at 1.
    #[must_use]
    pub fn day(&self) -> u32 {
        self.timestamp_hours() / 24 + 1
    }

    /// Time of day for the current turn.
    #[must_use]
    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_hour(self.timestamp_hours())
    }

    /// Conditions for the current turn.
    #[must_use]
    pub fn environment(&self) -> Environment {
        Environment {
            weather: self.weather,
            time_of_day: self.time_of_day(),
        }
    }
}
