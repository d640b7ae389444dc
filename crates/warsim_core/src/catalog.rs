//! Read-only reference data: platforms, sensors and terrain.
//!
//! All ratings are authored as integer percentages or points so that a
//! catalog can be written by hand in RON. Resolvers convert them to
//! [`Fixed`](crate::math::Fixed) with [`pct`](crate::math::pct).
//!
//! # Example RON
//!
//! ```ron
//! Catalog(
//!     platforms: {
//!         "shorad_battery": PlatformSpec(
//!             name: "Short-range air defence battery",
//!             domain: AirDefense,
//!             max_strength: 6,
//!             missiles: 24,
//!             range: 2,
//!             air_defense: Some((class: Shorad, interceptor_pk: 50, channels: 4, radar: 60)),
//!         ),
//!     },
//! )
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::hex::Terrain;
use crate::math::{pct, Fixed};
use crate::unit::Domain;

/// Target classes used for vulnerability and ground matchups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TargetClass {
    /// Dismounted infantry.
    Infantry,
    /// Mechanized infantry.
    Mechanized,
    /// Tanks.
    Armour,
    /// Guns and rocket launchers.
    Artillery,
    /// Logistics and support vehicles.
    Logistics,
    /// Hardened installations.
    Fortified,
    /// Anything else.
    #[default]
    Other,
}

impl TargetClass {
    /// Vulnerability to fires, accounting for entrenchment.
    #[must_use]
    pub fn vulnerability(self, dug_in: u8) -> Fixed {
        if dug_in >= 3 || self == Self::Fortified {
            return pct(50);
        }
        if dug_in >= 1 && matches!(self, Self::Infantry | Self::Mechanized) {
            return pct(60);
        }
        pct(match self {
            Self::Infantry => 150,
            Self::Mechanized => 80,
            Self::Armour => 40,
            Self::Artillery => 120,
            Self::Logistics => 130,
            Self::Fortified => 50,
            Self::Other => 100,
        })
    }

    /// Ground combat matchup of `self` attacking or defending against `other`.
    #[must_use]
    pub fn matchup(self, other: TargetClass, close_terrain: bool) -> Fixed {
        let base = match (self, other) {
            (Self::Armour, Self::Infantry) => 130,
            (Self::Armour, Self::Mechanized) | (Self::Mechanized, Self::Infantry) => 110,
            (Self::Infantry, Self::Armour) => 80,
            (Self::Infantry, Self::Mechanized) => 90,
            _ => 100,
        };
        if close_terrain && self == Self::Armour {
            pct(base) * pct(80)
        } else {
            pct(base)
        }
    }
}

/// Sensor families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Ground or airborne radar.
    Radar,
    /// Airborne early warning.
    Awacs,
    /// Signals intelligence.
    Sigint,
    /// Eyes and optics.
    Visual,
    /// Drone-borne reconnaissance.
    DroneIsr,
    /// Helicopter scouting.
    Scout,
    /// Special forces ground reconnaissance.
    Recon,
}

impl SensorKind {
    /// Affected by weather and darkness.
    #[must_use]
    pub const fn is_visual(self) -> bool {
        matches!(self, Self::Visual | Self::DroneIsr | Self::Scout | Self::Recon)
    }

    /// Affected by radar jamming.
    #[must_use]
    pub const fn is_radar(self) -> bool {
        matches!(self, Self::Radar | Self::Awacs)
    }
}

/// A sensor carried by a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorSpec {
    /// Sensor family.
    pub kind: SensorKind,
    /// Range in hexes.
    pub range: u32,
    /// Detection rating, percent.
    pub detection: u32,
}

/// Per-turn supply requirement at full strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SupplyUse {
    /// Ammunition per turn.
    #[serde(default)]
    pub ammo: u32,
    /// Fuel per turn.
    #[serde(default)]
    pub fuel: u32,
}

/// Fixed-wing combat ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirStats {
    /// Radar rating.
    pub radar: u32,
    /// Dogfighting agility rating.
    pub agility: u32,
    /// Ground attack rating.
    #[serde(default)]
    pub ground_attack: u32,
    /// Self-protection electronic warfare suite.
    #[serde(default)]
    pub ew_suite: u32,
    /// Airborne early warning aircraft.
    #[serde(default)]
    pub awacs: bool,
    /// Carries standoff weapons that avoid SAM ingress.
    #[serde(default)]
    pub standoff: bool,
}

/// Surface-to-surface missile ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissileStats {
    /// Warhead damage points.
    pub warhead: u32,
    /// Terminal accuracy, percent.
    pub accuracy: u32,
    /// Detectability by defending radars, percent.
    pub detectability: u32,
    /// Uses satellite guidance (vulnerable to GPS denial).
    #[serde(default)]
    pub gps_guided: bool,
    /// Missiles fired per launch when the order leaves the quantity open.
    #[serde(default = "default_salvo")]
    pub salvo: u32,
    /// Turns the battery needs to reload after firing.
    #[serde(default = "default_reload")]
    pub reload_turns: u32,
}

/// Air-defense system classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdClass {
    /// Man-portable systems.
    Manpads,
    /// Short-range air defence.
    Shorad,
    /// Medium and long-range surface-to-air missiles.
    Sam,
    /// Ballistic missile defence.
    Bmd,
}

impl AdClass {
    /// Effectiveness against low-flying helicopters.
    #[must_use]
    pub fn versus_helicopter(self) -> Fixed {
        match self {
            Self::Manpads | Self::Shorad => pct(120),
            Self::Sam => pct(70),
            Self::Bmd => Fixed::ZERO,
        }
    }
}

/// Surface-to-air ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirDefenseStats {
    /// System class.
    pub class: AdClass,
    /// Single-shot kill probability, percent.
    pub interceptor_pk: u32,
    /// Simultaneous engagements per turn.
    pub channels: u32,
    /// Fire-control radar rating (SEAD target quality).
    #[serde(default)]
    pub radar: u32,
}

/// Drone airframe families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DroneKind {
    /// Reconnaissance.
    Isr,
    /// One-way loitering munition.
    Loitering,
    /// Armed, recoverable combat drone.
    Ucav,
    /// Massed small drones.
    Swarm,
}

/// Drone ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroneStats {
    /// Airframe family.
    pub kind: DroneKind,
    /// Terminal kill probability, percent.
    #[serde(default)]
    pub terminal_pk: u32,
    /// Sensor rating for ISR, percent.
    #[serde(default)]
    pub sensor: u32,
    /// Decoy escorts launched alongside a swarm.
    #[serde(default)]
    pub escorts: u32,
}

/// Electronic warfare ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EwStats {
    /// Jamming power.
    pub power: u32,
    /// Counter-countermeasures.
    #[serde(default)]
    pub eccm: u32,
    /// Offensive cyber sophistication.
    #[serde(default)]
    pub cyber: u32,
    /// Network defence.
    #[serde(default)]
    pub cyber_defense: u32,
    /// Signals intelligence capability.
    #[serde(default)]
    pub sigint: u32,
    /// Communications security.
    #[serde(default)]
    pub comsec: u32,
}

/// Artillery ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtilleryStats {
    /// Rounds fired per turn at full strength.
    pub rounds: u32,
    /// Accuracy, percent.
    pub accuracy: u32,
    /// Damage points per hit.
    pub damage: u32,
    /// Multiple rocket launcher (area salvo).
    #[serde(default)]
    pub mlrs: bool,
    /// Has a counter-battery radar.
    #[serde(default)]
    pub radar: bool,
    /// Shoot-and-scoot capable.
    #[serde(default)]
    pub mobile: bool,
}

/// Helicopter ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelicopterStats {
    /// Attack rating.
    #[serde(default)]
    pub attack: u32,
    /// Defensive aids suite, percent.
    #[serde(default)]
    pub defensive_suite: u32,
    /// Can lift a ground unit for air assault.
    #[serde(default)]
    pub lift: bool,
    /// Scouting sensor rating, percent.
    #[serde(default)]
    pub scout: u32,
}

/// Special forces ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialForcesStats {
    /// Training and skill, percent.
    pub skill: u32,
    /// Stealth, percent.
    pub stealth: u32,
}

/// A platform definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSpec {
    /// Display name.
    pub name: String,
    /// Operational domain.
    pub domain: Domain,
    /// Establishment strength.
    pub max_strength: u32,
    /// Target class for vulnerability and matchups.
    #[serde(default)]
    pub target_class: TargetClass,
    /// Training and equipment quality, percent.
    #[serde(default = "default_hundred")]
    pub quality: u32,
    /// Sensor signature, percent.
    #[serde(default = "default_hundred")]
    pub signature: u32,
    /// Stealth rating, 0-100.
    #[serde(default)]
    pub stealth: u32,
    /// Damage points a missile needs to deliver for full effect.
    #[serde(default = "default_hardness")]
    pub hardness: u32,
    /// Movement allowance in hexes per turn.
    #[serde(default = "default_one")]
    pub movement: u32,
    /// Weapon or operating range in hexes.
    #[serde(default = "default_one")]
    pub range: u32,
    /// Ammunition capacity.
    #[serde(default)]
    pub ammo: u32,
    /// Fuel capacity.
    #[serde(default)]
    pub fuel: u32,
    /// Missile, interceptor or drone stock.
    #[serde(default)]
    pub missiles: u32,
    /// Per-turn supply requirement.
    #[serde(default)]
    pub supply: SupplyUse,
    /// Carried sensors.
    #[serde(default)]
    pub sensors: Vec<SensorSpec>,
    /// Fixed-wing ratings.
    #[serde(default)]
    pub air: Option<AirStats>,
    /// Missile ratings.
    #[serde(default)]
    pub missile: Option<MissileStats>,
    /// Air-defense ratings.
    #[serde(default)]
    pub air_defense: Option<AirDefenseStats>,
    /// Drone ratings.
    #[serde(default)]
    pub drone: Option<DroneStats>,
    /// Electronic warfare ratings.
    #[serde(default)]
    pub ew: Option<EwStats>,
    /// Artillery ratings.
    #[serde(default)]
    pub artillery: Option<ArtilleryStats>,
    /// Helicopter ratings.
    #[serde(default)]
    pub helicopter: Option<HelicopterStats>,
    /// Special forces ratings.
    #[serde(default)]
    pub special_forces: Option<SpecialForcesStats>,
}

const fn default_hundred() -> u32 {
    100
}

const fn default_one() -> u32 {
    1
}

const fn default_hardness() -> u32 {
    1000
}

const fn default_salvo() -> u32 {
    4
}

const fn default_reload() -> u32 {
    1
}

impl PlatformSpec {
    /// A bare platform with every optional rating at its default.
    #[must_use]
    pub fn new(name: impl Into<String>, domain: Domain, max_strength: u32) -> Self {
        Self {
            name: name.into(),
            domain,
            max_strength,
            target_class: TargetClass::Other,
            quality: 100,
            signature: 100,
            stealth: 0,
            hardness: default_hardness(),
            movement: 1,
            range: 1,
            ammo: 0,
            fuel: 0,
            missiles: 0,
            supply: SupplyUse::default(),
            sensors: Vec::new(),
            air: None,
            missile: None,
            air_defense: None,
            drone: None,
            ew: None,
            artillery: None,
            helicopter: None,
            special_forces: None,
        }
    }

    fn check(&self, key: &str) -> Result<()> {
        let missing = |section: &str| {
            EngineError::Catalog(format!(
                "platform '{key}' ({:?}) is missing its '{section}' ratings",
                self.domain
            ))
        };
        match self.domain {
            Domain::Air if self.air.is_none() => return Err(missing("air")),
            Domain::Missile if self.missile.is_none() => return Err(missing("missile")),
            Domain::AirDefense if self.air_defense.is_none() => {
                return Err(missing("air_defense"))
            }
            Domain::Drone if self.drone.is_none() => return Err(missing("drone")),
            Domain::ElectronicWarfare if self.ew.is_none() => return Err(missing("ew")),
            Domain::Artillery if self.artillery.is_none() => return Err(missing("artillery")),
            Domain::Helicopter if self.helicopter.is_none() => return Err(missing("helicopter")),
            Domain::SpecialForces if self.special_forces.is_none() => {
                return Err(missing("special_forces"))
            }
            _ => {}
        }

        if self.max_strength == 0 {
            return Err(EngineError::Catalog(format!(
                "platform '{key}' has zero establishment strength"
            )));
        }

        let mut percents = vec![("stealth", self.stealth)];
        if let Some(m) = &self.missile {
            percents.push(("accuracy", m.accuracy));
        }
        if let Some(ad) = &self.air_defense {
            percents.push(("interceptor_pk", ad.interceptor_pk));
            if ad.channels == 0 {
                return Err(EngineError::Catalog(format!(
                    "platform '{key}' has no engagement channels"
                )));
            }
        }
        if let Some(d) = &self.drone {
            percents.push(("terminal_pk", d.terminal_pk));
        }
        if let Some(a) = &self.artillery {
            percents.push(("accuracy", a.accuracy));
        }
        for (field, value) in percents {
            if value > 100 {
                return Err(EngineError::Catalog(format!(
                    "platform '{key}' has {field} {value} above 100"
                )));
            }
        }

        if let Some(sensor) = self.sensors.iter().find(|s| s.range == 0) {
            return Err(EngineError::Catalog(format!(
                "platform '{key}' has a {:?} sensor with zero range",
                sensor.kind
            )));
        }
        Ok(())
    }
}

/// Terrain ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainSpec {
    /// Defensive multiplier, percent.
    pub defense: u32,
    /// Concealment points.
    pub concealment: u32,
    /// Detection multiplier, percent.
    pub detection: u32,
    /// Movement cost per hex, percent of one allowance point.
    pub movement_cost: u32,
}

fn default_terrain() -> BTreeMap<Terrain, TerrainSpec> {
    let spec = |defense, concealment, detection, movement_cost| TerrainSpec {
        defense,
        concealment,
        detection,
        movement_cost,
    };
    BTreeMap::from([
        (Terrain::Plains, spec(100, 10, 100, 100)),
        (Terrain::Hills, spec(140, 30, 80, 150)),
        (Terrain::Mountain, spec(250, 50, 50, 300)),
        (Terrain::Forest, spec(150, 60, 50, 200)),
        (Terrain::Urban, spec(200, 50, 60, 150)),
        (Terrain::Desert, spec(90, 5, 110, 120)),
        (Terrain::Marsh, spec(120, 30, 80, 250)),
    ])
}

/// The reference catalog, shared read-only between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Platforms by key.
    pub platforms: BTreeMap<String, PlatformSpec>,
    /// Terrain ratings.
    #[serde(default = "default_terrain")]
    pub terrain: BTreeMap<Terrain, TerrainSpec>,
}

impl Catalog {
    /// Parse and check a catalog from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] if the text does not parse or a
    /// platform is inconsistent with its domain.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let catalog: Self =
            ron::from_str(text).map_err(|e| EngineError::Catalog(format!("parse error: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Serialize to pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| EngineError::Catalog(format!("serialize error: {e}")))
    }

    /// Check every platform and the terrain table.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.platforms.is_empty() {
            return Err(EngineError::Catalog("no platforms defined".into()));
        }
        for (key, platform) in &self.platforms {
            platform.check(key)?;
        }
        if let Some(missing) = Terrain::ALL.iter().find(|t| !self.terrain.contains_key(t)) {
            return Err(EngineError::Catalog(format!(
                "terrain table has no entry for {missing:?}"
            )));
        }
        Ok(())
    }

    /// Look up a platform.
    #[must_use]
    pub fn platform(&self, key: &str) -> Option<&PlatformSpec> {
        self.platforms.get(key)
    }

    /// Terrain ratings, falling back to plains.
    #[must_use]
    pub fn terrain(&self, terrain: Terrain) -> TerrainSpec {
        self.terrain
            .get(&terrain)
            .or_else(|| self.terrain.get(&Terrain::Plains))
            .copied()
            .unwrap_or(TerrainSpec {
                defense: 100,
                concealment: 10,
                detection: 100,
                movement_cost: 100,
            })
    }

    /// The built-in reference catalog.
    #[must_use]
    pub fn standard() -> Self {
        let mut platforms = BTreeMap::new();
        let mut add = |key: &str, spec: PlatformSpec| {
            platforms.insert(key.to_string(), spec);
        };
        let sensor = |kind, range, detection| SensorSpec {
            kind,
            range,
            detection,
        };

        // Ground manoeuvre.
        add(
            "infantry_brigade",
            PlatformSpec {
                target_class: TargetClass::Infantry,
                quality: 80,
                signature: 70,
                movement: 2,
                ammo: 300,
                fuel: 100,
                supply: SupplyUse { ammo: 30, fuel: 10 },
                ..PlatformSpec::new("Infantry brigade", Domain::Ground, 100)
            },
        );
        add(
            "mech_brigade",
            PlatformSpec {
                target_class: TargetClass::Mechanized,
                quality: 100,
                signature: 90,
                hardness: 1200,
                movement: 3,
                ammo: 400,
                fuel: 300,
                supply: SupplyUse { ammo: 40, fuel: 40 },
                ..PlatformSpec::new("Mechanized brigade", Domain::Ground, 100)
            },
        );
        add(
            "armoured_brigade",
            PlatformSpec {
                target_class: TargetClass::Armour,
                quality: 130,
                signature: 110,
                hardness: 1500,
                movement: 3,
                ammo: 400,
                fuel: 400,
                supply: SupplyUse { ammo: 40, fuel: 60 },
                ..PlatformSpec::new("Armoured brigade", Domain::Ground, 90)
            },
        );

        // Fires.
        add(
            "sp_artillery_regiment",
            PlatformSpec {
                target_class: TargetClass::Artillery,
                signature: 90,
                range: 4,
                movement: 2,
                ammo: 600,
                fuel: 150,
                supply: SupplyUse { ammo: 60, fuel: 10 },
                artillery: Some(ArtilleryStats {
                    rounds: 108,
                    accuracy: 40,
                    damage: 10,
                    mlrs: false,
                    radar: true,
                    mobile: true,
                }),
                ..PlatformSpec::new("Self-propelled artillery regiment", Domain::Artillery, 18)
            },
        );
        add(
            "mlrs_battalion",
            PlatformSpec {
                target_class: TargetClass::Artillery,
                signature: 100,
                range: 6,
                movement: 2,
                ammo: 300,
                fuel: 150,
                supply: SupplyUse { ammo: 50, fuel: 10 },
                artillery: Some(ArtilleryStats {
                    rounds: 144,
                    accuracy: 50,
                    damage: 12,
                    mlrs: true,
                    radar: false,
                    mobile: true,
                }),
                ..PlatformSpec::new("Multiple rocket launcher battalion", Domain::Artillery, 12)
            },
        );
        add(
            "srbm_brigade",
            PlatformSpec {
                target_class: TargetClass::Artillery,
                hardness: 800,
                range: 12,
                missiles: 24,
                fuel: 100,
                supply: SupplyUse { ammo: 0, fuel: 5 },
                missile: Some(MissileStats {
                    warhead: 500,
                    accuracy: 80,
                    detectability: 70,
                    gps_guided: true,
                    salvo: 4,
                    reload_turns: 1,
                }),
                ..PlatformSpec::new("Short-range ballistic missile brigade", Domain::Missile, 12)
            },
        );
        add(
            "cruise_missile_battery",
            PlatformSpec {
                target_class: TargetClass::Artillery,
                hardness: 800,
                range: 14,
                missiles: 16,
                fuel: 100,
                supply: SupplyUse { ammo: 0, fuel: 5 },
                missile: Some(MissileStats {
                    warhead: 450,
                    accuracy: 85,
                    detectability: 30,
                    gps_guided: true,
                    salvo: 4,
                    reload_turns: 1,
                }),
                ..PlatformSpec::new("Ground-launched cruise missile battery", Domain::Missile, 8)
            },
        );

        // Air defence.
        add(
            "sam_long_range",
            PlatformSpec {
                hardness: 600,
                range: 8,
                missiles: 32,
                fuel: 80,
                supply: SupplyUse { ammo: 0, fuel: 5 },
                sensors: vec![sensor(SensorKind::Radar, 10, 80)],
                air_defense: Some(AirDefenseStats {
                    class: AdClass::Sam,
                    interceptor_pk: 70,
                    channels: 6,
                    radar: 90,
                }),
                ..PlatformSpec::new("Long-range SAM battalion", Domain::AirDefense, 8)
            },
        );
        add(
            "bmd_battery",
            PlatformSpec {
                hardness: 600,
                range: 6,
                missiles: 16,
                fuel: 80,
                supply: SupplyUse { ammo: 0, fuel: 5 },
                sensors: vec![sensor(SensorKind::Radar, 12, 85)],
                air_defense: Some(AirDefenseStats {
                    class: AdClass::Bmd,
                    interceptor_pk: 60,
                    channels: 4,
                    radar: 95,
                }),
                ..PlatformSpec::new("Ballistic missile defence battery", Domain::AirDefense, 4)
            },
        );
        add(
            "shorad_battery",
            PlatformSpec {
                hardness: 500,
                range: 2,
                movement: 2,
                missiles: 24,
                fuel: 60,
                supply: SupplyUse { ammo: 0, fuel: 5 },
                sensors: vec![sensor(SensorKind::Radar, 4, 65)],
                air_defense: Some(AirDefenseStats {
                    class: AdClass::Shorad,
                    interceptor_pk: 50,
                    channels: 4,
                    radar: 60,
                }),
                ..PlatformSpec::new("Short-range air defence battery", Domain::AirDefense, 6)
            },
        );

        // Air.
        add(
            "fighter_squadron",
            PlatformSpec {
                signature: 90,
                stealth: 20,
                range: 10,
                ammo: 64,
                fuel: 400,
                supply: SupplyUse { ammo: 8, fuel: 60 },
                sensors: vec![sensor(SensorKind::Radar, 6, 70)],
                air: Some(AirStats {
                    radar: 80,
                    agility: 80,
                    ground_attack: 30,
                    ew_suite: 40,
                    awacs: false,
                    standoff: false,
                }),
                ..PlatformSpec::new("Air superiority squadron", Domain::Air, 16)
            },
        );
        add(
            "strike_squadron",
            PlatformSpec {
                signature: 100,
                stealth: 10,
                range: 10,
                ammo: 48,
                fuel: 400,
                supply: SupplyUse { ammo: 12, fuel: 60 },
                air: Some(AirStats {
                    radar: 60,
                    agility: 50,
                    ground_attack: 80,
                    ew_suite: 50,
                    awacs: false,
                    standoff: true,
                }),
                ..PlatformSpec::new("Strike squadron", Domain::Air, 16)
            },
        );
        add(
            "awacs_flight",
            PlatformSpec {
                signature: 150,
                range: 4,
                fuel: 200,
                supply: SupplyUse { ammo: 0, fuel: 30 },
                sensors: vec![sensor(SensorKind::Awacs, 14, 85)],
                air: Some(AirStats {
                    radar: 100,
                    agility: 10,
                    ground_attack: 0,
                    ew_suite: 30,
                    awacs: true,
                    standoff: false,
                }),
                ..PlatformSpec::new("Airborne early warning flight", Domain::Air, 2)
            },
        );

        // Drones.
        add(
            "ucav_squadron",
            PlatformSpec {
                signature: 50,
                stealth: 20,
                range: 10,
                ammo: 48,
                fuel: 100,
                supply: SupplyUse { ammo: 6, fuel: 10 },
                sensors: vec![sensor(SensorKind::DroneIsr, 3, 70)],
                drone: Some(DroneStats {
                    kind: DroneKind::Ucav,
                    terminal_pk: 70,
                    sensor: 70,
                    escorts: 0,
                }),
                ..PlatformSpec::new("Armed drone squadron", Domain::Drone, 12)
            },
        );
        add(
            "loitering_munition_battery",
            PlatformSpec {
                signature: 30,
                stealth: 30,
                range: 6,
                missiles: 48,
                drone: Some(DroneStats {
                    kind: DroneKind::Loitering,
                    terminal_pk: 60,
                    sensor: 40,
                    escorts: 0,
                }),
                ..PlatformSpec::new("Loitering munition battery", Domain::Drone, 48)
            },
        );
        add(
            "isr_drone_flight",
            PlatformSpec {
                signature: 40,
                stealth: 20,
                range: 8,
                fuel: 60,
                supply: SupplyUse { ammo: 0, fuel: 6 },
                drone: Some(DroneStats {
                    kind: DroneKind::Isr,
                    terminal_pk: 0,
                    sensor: 80,
                    escorts: 0,
                }),
                ..PlatformSpec::new("Reconnaissance drone flight", Domain::Drone, 8)
            },
        );
        add(
            "swarm_drone_company",
            PlatformSpec {
                signature: 20,
                stealth: 40,
                range: 6,
                missiles: 60,
                drone: Some(DroneStats {
                    kind: DroneKind::Swarm,
                    terminal_pk: 40,
                    sensor: 30,
                    escorts: 10,
                }),
                ..PlatformSpec::new("Drone swarm company", Domain::Drone, 60)
            },
        );

        // Electronic warfare and sensors.
        add(
            "ew_battalion",
            PlatformSpec {
                signature: 120,
                hardness: 600,
                range: 8,
                fuel: 80,
                supply: SupplyUse { ammo: 0, fuel: 8 },
                sensors: vec![sensor(SensorKind::Sigint, 8, 60)],
                ew: Some(EwStats {
                    power: 70,
                    eccm: 50,
                    cyber: 60,
                    cyber_defense: 50,
                    sigint: 60,
                    comsec: 50,
                }),
                ..PlatformSpec::new("Electronic warfare battalion", Domain::ElectronicWarfare, 6)
            },
        );
        add(
            "radar_station",
            PlatformSpec {
                target_class: TargetClass::Fortified,
                signature: 130,
                hardness: 700,
                movement: 0,
                sensors: vec![sensor(SensorKind::Radar, 10, 75)],
                ..PlatformSpec::new("Surveillance radar station", Domain::Isr, 1)
            },
        );

        // Rotary wing.
        add(
            "attack_helicopter_squadron",
            PlatformSpec {
                signature: 80,
                range: 4,
                ammo: 96,
                fuel: 150,
                supply: SupplyUse { ammo: 12, fuel: 25 },
                helicopter: Some(HelicopterStats {
                    attack: 70,
                    defensive_suite: 50,
                    lift: false,
                    scout: 60,
                }),
                ..PlatformSpec::new("Attack helicopter squadron", Domain::Helicopter, 12)
            },
        );
        add(
            "utility_helicopter_squadron",
            PlatformSpec {
                signature: 90,
                range: 5,
                ammo: 10,
                fuel: 150,
                supply: SupplyUse { ammo: 1, fuel: 25 },
                helicopter: Some(HelicopterStats {
                    attack: 10,
                    defensive_suite: 30,
                    lift: true,
                    scout: 30,
                }),
                ..PlatformSpec::new("Utility helicopter squadron", Domain::Helicopter, 16)
            },
        );

        // Special forces.
        add(
            "special_forces_group",
            PlatformSpec {
                target_class: TargetClass::Infantry,
                signature: 20,
                stealth: 80,
                range: 6,
                movement: 2,
                ammo: 40,
                supply: SupplyUse { ammo: 4, fuel: 0 },
                special_forces: Some(SpecialForcesStats {
                    skill: 85,
                    stealth: 80,
                }),
                ..PlatformSpec::new("Special forces group", Domain::SpecialForces, 40)
            },
        );

        Self {
            platforms,
            terrain: default_terrain(),
        }
    }
}
