//! Applying resolver deltas to the world.
//!
//! Deltas are applied one at a time in the order the resolver listed them,
//! and every observable change is written to the event log. Deltas aimed at
//! a destroyed unit are dropped.

use crate::catalog::Catalog;
use crate::combat::StateDelta;
use crate::effects::ActiveEffects;
use crate::events::{EventKind, EventLog, VpReason};
use crate::fog::{is_intel_asset, FogOfWar};
use crate::math::{as_percent, unit_clamp};
use crate::turn::Phase;
use crate::unit::{LossCause, UnitId, UnitStatus};
use crate::world::WorldState;

/// Mutable engine state a phase may touch.
pub(crate) struct Applier<'a> {
    pub world: &'a mut WorldState,
    pub catalog: &'a Catalog,
    pub effects: &'a mut ActiveEffects,
    pub fog: &'a mut FogOfWar,
    pub log: &'a mut EventLog,
    pub phase: Phase,
    /// Set when a sensor or EW unit is destroyed.
    pub intel_lost: bool,
}

impl Applier<'_> {
    pub(crate) fn emit(&mut self, kind: EventKind) {
        let turn = self.world.clock.turn;
        self.log.push(turn, Some(self.phase), kind);
    }

    /// Award points and record why.
    pub(crate) fn award(&mut self, faction: crate::factions::FactionId, amount: u32, reason: VpReason) {
        if amount == 0 {
            return;
        }
        self.world.clock.victory_points.award(faction, amount);
        self.emit(EventKind::VictoryPointsAwarded {
            faction,
            amount,
            reason,
        });
    }

    pub(crate) fn apply_all(&mut self, deltas: &[StateDelta]) {
        for delta in deltas {
            self.apply(delta);
        }
    }

    fn apply(&mut self, delta: &StateDelta) {
        match *delta {
            StateDelta::Casualties { unit, amount, cause } => self.casualties(unit, amount, cause),
            StateDelta::Readiness { unit, change } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.readiness = unit_clamp(u.readiness + change);
                }
            }
            StateDelta::Suppress { unit, amount } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.suppression = (u.suppression + amount).min(100);
                }
            }
            StateDelta::Organization { unit, loss } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.organization = u.organization.saturating_sub(loss);
                }
                self.refresh_status(unit, LossCause::Combat);
            }
            StateDelta::Morale { unit, loss } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.morale = u.morale.saturating_sub(loss);
                }
                self.refresh_status(unit, LossCause::Combat);
            }
            StateDelta::DugIn { unit, level } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.dug_in = level.min(3);
                }
            }
            StateDelta::Move { unit, to } => {
                if !self.world.map().contains(to) {
                    return;
                }
                let Some(u) = self.alive_mut(unit) else { return };
                let from = u.position;
                if from != to {
                    u.position = to;
                    self.emit(EventKind::UnitMoved { unit, from, to });
                }
            }
            StateDelta::Control { cell, faction } => {
                let Some(current) = self.world.map().cell(cell).map(|c| c.control) else {
                    return;
                };
                if current != Some(faction) {
                    self.world.map_mut().set_control(cell, faction);
                    self.emit(EventKind::ControlChanged {
                        cell,
                        from: current,
                        to: faction,
                    });
                }
            }
            StateDelta::ExpendAmmo { unit, amount } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.ammo = u.ammo.saturating_sub(amount);
                }
            }
            StateDelta::ExpendMissiles { unit, amount } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.missiles = u.missiles.saturating_sub(amount);
                }
            }
            StateDelta::ExpendFuel { unit, amount } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.fuel = u.fuel.saturating_sub(amount);
                }
            }
            StateDelta::UseChannels { unit, amount } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.channels_used = u.channels_used.saturating_add(amount);
                }
            }
            StateDelta::SetReload { unit, turns } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.reload = turns;
                }
            }
            StateDelta::MarkFired { unit } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.fired_this_turn = true;
                }
            }
            StateDelta::MarkInCombat { unit } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.in_combat = true;
                }
            }
            StateDelta::SupplyNodeDamage { node, amount } => {
                if let Some(n) = self.world.node_mut(node) {
                    n.status = n.status.saturating_sub(amount);
                    let status = n.status;
                    self.emit(EventKind::SupplyNodeDamaged { node, status });
                }
            }
            StateDelta::Effect { target, kind, level } => {
                let now = self.effects.apply(target, kind, level);
                self.emit(EventKind::EffectApplied {
                    target,
                    effect: kind,
                    level: as_percent(now),
                });
            }
            StateDelta::IntelBoost {
                faction,
                unit,
                confidence,
                sensor,
            } => self.fog.apply_boost(self.world, faction, unit, confidence, sensor),
            StateDelta::StandingCap { unit, cell } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.standing_cap = cell;
                }
            }
            StateDelta::Posture { unit, posture } => {
                if let Some(u) = self.alive_mut(unit) {
                    u.posture = posture;
                }
            }
        }
    }

    fn alive_mut(&mut self, unit: UnitId) -> Option<&mut crate::unit::Unit> {
        self.world.unit_mut(unit).filter(|u| u.is_alive())
    }

    fn casualties(&mut self, unit: UnitId, amount: u32, cause: LossCause) {
        let Some(u) = self.alive_mut(unit) else { return };
        let amount = amount.min(u.strength);
        if amount == 0 {
            return;
        }
        u.strength -= amount;
        let (faction, remaining) = (u.faction, u.strength);
        self.emit(EventKind::UnitLosses {
            unit,
            faction,
            amount,
            cause,
            remaining,
        });
        self.refresh_status(unit, cause);
    }

    /// Re-derive a unit's status, recording the transition and paying the
    /// opponent for a destroyed unit.
    fn refresh_status(&mut self, unit: UnitId, cause: LossCause) {
        let Some(u) = self.world.unit_mut(unit) else { return };
        let before = u.status;
        let after = u.derived_status();
        if before == after {
            return;
        }
        u.status = after;
        if after == UnitStatus::Destroyed {
            u.standing_cap = None;
        }
        let (faction, domain) = (u.faction, u.domain);
        self.emit(EventKind::UnitStatusChanged {
            unit,
            from: before,
            to: after,
        });
        if after == UnitStatus::Destroyed {
            self.emit(EventKind::UnitDestroyed {
                unit,
                faction,
                domain,
                cause,
            });
            self.award(faction.opponent(), domain.destruction_value(), VpReason::UnitDestroyed(unit));
            if self.world.unit(unit).is_some_and(|u| is_intel_asset(self.catalog, u)) {
                self.intel_lost = true;
            }
        }
    }
}
