//! # Warsim Core
//!
//! Deterministic turn resolution for a two-faction operational war game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond replay save/load
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! Each six-hour turn runs ten phases in fixed order (Intel, Missile, EW,
//! Air, Drone, Artillery, Helicopter, Ground, Special Forces, Logistics).
//! Producers submit orders per turn; the engine validates them, resolves
//! every engagement with a seeded per-engagement RNG stream and records
//! everything in an append-only event log.
//!
//! ## Crate Structure
//!
//! - [`engine`] - Turn loop, phase scheduler and snapshots
//! - [`combat`] - One resolver per fighting phase
//! - [`intake`] - Order validation
//! - [`fog`] - Per-faction intel derived from true state
//! - [`logistics`] - Supply network and end-of-turn upkeep
//! - [`catalog`] - Platform and terrain reference data
//! - [`scenario`] - Scenario files and world construction
//! - [`events`] - Event log
//! - [`replay`] - Replay recording and verification
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod catalog;
pub mod combat;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod events;
pub mod factions;
pub mod fog;
pub mod hex;
pub mod intake;
pub mod logistics;
pub mod math;
pub mod orders;
pub mod replay;
pub mod rng;
pub mod scenario;
pub mod turn;
pub mod unit;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{Catalog, PlatformSpec};
    pub use crate::combat::{CombatOutcome, EngagementDetail, EngagementRecord};
    pub use crate::config::EngineConfig;
    pub use crate::effects::{ActiveEffects, EffectKind, EffectPersistence};
    pub use crate::engine::{CancelHandle, Engine, Termination, TurnResult};
    pub use crate::error::{EngineError, Result};
    pub use crate::events::{Event, EventKind, EventLog, TerminationReason, VpReason};
    pub use crate::factions::FactionId;
    pub use crate::fog::{FactionView, IntelQuality, IntelReport};
    pub use crate::hex::{HexCoord, HexMap, Terrain};
    pub use crate::logistics::{NodeId, Route, SupplyNode};
    pub use crate::math::Fixed;
    pub use crate::orders::{
        AirMission, ArtilleryMission, AttackPosture, CyberTarget, DroneMission, EwMission,
        GroundMission, HelicopterMission, Insertion, MissileMission, Order, OrdersPayload, SfTask,
        SpecialForcesMission, Submission, Target,
    };
    pub use crate::replay::{Replay, ReplayPlayer};
    pub use crate::scenario::{place, RunRules, Scenario};
    pub use crate::turn::{Phase, VictoryPoints, Weather};
    pub use crate::unit::{Domain, Unit, UnitId, UnitStatus};
    pub use crate::world::WorldState;
}
