//! Per-turn active effects: jamming and cyber damage.
//!
//! Effects are written by electronic warfare resolution against a target
//! faction and read by every later resolver that turn. A new write never
//! lowers an existing level.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::factions::FactionId;
use crate::math::{fixed_serde, pct, unit_clamp, Fixed};
use crate::orders::CyberTarget;

/// Kinds of degradation a faction can suffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Radar jamming.
    RadarJam,
    /// Communications jamming.
    CommsJam,
    /// Satellite navigation denial.
    GpsJam,
    /// Cyber damage to a network.
    Cyber(CyberTarget),
}

/// How effects carry over from one turn to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EffectPersistence {
    /// Effects last for the turn in which they were applied.
    #[default]
    CurrentTurn,
    /// Effects are scaled down at each turn start.
    Decay {
        /// Percentage of each level kept.
        retain_percent: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct Level(#[serde(with = "fixed_serde")] Fixed);

/// The active-effects table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct ActiveEffects {
    levels: BTreeMap<(FactionId, EffectKind), Level>,
}

impl ActiveEffects {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of `kind` against `target`, 0 when absent.
    #[must_use]
    pub fn level(&self, target: FactionId, kind: EffectKind) -> Fixed {
        self.levels
            .get(&(target, kind))
            .map_or(Fixed::ZERO, |l| l.0)
    }

    /// Raise `kind` against `target` to at least `level`.
    ///
    /// Returns the level now in force.
    pub fn apply(&mut self, target: FactionId, kind: EffectKind, level: Fixed) -> Fixed {
        let level = unit_clamp(level);
        let entry = self.levels.entry((target, kind)).or_insert(Level(Fixed::ZERO));
        if level > entry.0 {
            entry.0 = level;
        }
        entry.0
    }

    /// Communications disruption: the worse of jamming and comms cyber damage.
    #[must_use]
    pub fn comms_disruption(&self, target: FactionId) -> Fixed {
        self.level(target, EffectKind::CommsJam)
            .max(self.level(target, EffectKind::Cyber(CyberTarget::Comms)))
    }

    /// Whether no effect is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Every active effect in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (FactionId, EffectKind, Fixed)> + '_ {
        self.levels.iter().map(|(&(f, k), l)| (f, k, l.0))
    }

    /// Prepare the table for a new turn.
    pub fn reset(&mut self, persistence: EffectPersistence) {
        match persistence {
            EffectPersistence::CurrentTurn => self.levels.clear(),
            EffectPersistence::Decay { retain_percent } => {
                let keep = pct(i64::from(retain_percent.min(100)));
                for level in self.levels.values_mut() {
                    level.0 *= keep;
                }
                let floor = pct(1);
                self.levels.retain(|_, l| l.0 >= floor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_takes_max() {
        let mut effects = ActiveEffects::new();
        effects.apply(FactionId::Red, EffectKind::RadarJam, pct(40));
        effects.apply(FactionId::Red, EffectKind::RadarJam, pct(20));
        assert_eq!(effects.level(FactionId::Red, EffectKind::RadarJam), pct(40));
        effects.apply(FactionId::Red, EffectKind::RadarJam, pct(70));
        assert_eq!(effects.level(FactionId::Red, EffectKind::RadarJam), pct(70));
        assert_eq!(effects.level(FactionId::Blue, EffectKind::RadarJam), Fixed::ZERO);
    }

    #[test]
    fn test_current_turn_clears() {
        let mut effects = ActiveEffects::new();
        effects.apply(FactionId::Blue, EffectKind::GpsJam, pct(50));
        effects.reset(EffectPersistence::CurrentTurn);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_decay_scales() {
        let mut effects = ActiveEffects::new();
        effects.apply(FactionId::Blue, EffectKind::CommsJam, pct(60));
        effects.reset(EffectPersistence::Decay { retain_percent: 50 });
        assert_eq!(effects.level(FactionId::Blue, EffectKind::CommsJam), pct(30));
    }

    #[test]
    fn test_comms_disruption_uses_worse() {
        let mut effects = ActiveEffects::new();
        effects.apply(FactionId::Red, EffectKind::CommsJam, pct(20));
        effects.apply(FactionId::Red, EffectKind::Cyber(CyberTarget::Comms), pct(45));
        assert_eq!(effects.comms_disruption(FactionId::Red), pct(45));
    }
}
