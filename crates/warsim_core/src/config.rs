//! Engine settings.
//!
//! Every field has a default, so a RON file only needs to name the values
//! it changes:
//!
//! ```ron
//! EngineConfig(
//!     parallel_engagements: true,
//!     effect_persistence: Decay(retain_percent: 50),
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::effects::EffectPersistence;
use crate::error::{EngineError, Result};
use crate::logistics::LogisticsParams;
use crate::math::{pct, Fixed};

/// Tunables for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Resolve disjoint engagements of a wave on the rayon pool.
    #[serde(default)]
    pub parallel_engagements: bool,
    /// How active effects carry into the next turn.
    #[serde(default)]
    pub effect_persistence: EffectPersistence,
    /// Minimum confidence, percent, for a contact to appear in a faction view.
    #[serde(default = "default_exposure")]
    pub intel_exposure_threshold_percent: u32,
    /// Readiness, percent, below which a unit is degraded.
    #[serde(default = "default_degraded")]
    pub degraded_readiness_threshold_percent: u32,
    /// Hexes from a reachable node within which a unit can draw supply.
    #[serde(default = "default_supply_radius")]
    pub supply_radius: u32,
    /// One-hour sub-steps integrated per ground battle.
    #[serde(default = "default_substeps")]
    pub ground_substeps: u32,
}

const fn default_exposure() -> u32 {
    35
}

const fn default_degraded() -> u32 {
    50
}

const fn default_supply_radius() -> u32 {
    3
}

const fn default_substeps() -> u32 {
    6
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_engagements: false,
            effect_persistence: EffectPersistence::default(),
            intel_exposure_threshold_percent: default_exposure(),
            degraded_readiness_threshold_percent: default_degraded(),
            supply_radius: default_supply_radius(),
            ground_substeps: default_substeps(),
        }
    }
}

impl EngineConfig {
    /// Parse from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidState`] if the text does not parse.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| EngineError::InvalidState(format!("engine config: {e}")))
    }

    /// Same settings with parallel engagement resolution switched on or off.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel_engagements = parallel;
        self
    }

    /// Exposure threshold as a fraction.
    #[must_use]
    pub fn exposure_threshold(&self) -> Fixed {
        pct(i64::from(self.intel_exposure_threshold_percent))
    }

    /// Parameters for the end-of-turn logistics pass.
    #[must_use]
    pub fn logistics(&self) -> LogisticsParams {
        LogisticsParams {
            supply_radius: self.supply_radius,
            degraded_threshold: pct(i64::from(self.degraded_readiness_threshold_percent)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(!config.parallel_engagements);
        assert_eq!(config.effect_persistence, EffectPersistence::CurrentTurn);
        assert_eq!(config.exposure_threshold(), pct(35));
        assert_eq!(config.ground_substeps, 6);
    }

    #[test]
    fn test_partial_ron() {
        let config = EngineConfig::from_ron_str(
            "(parallel_engagements: true, effect_persistence: Decay(retain_percent: 50))",
        )
        .unwrap();
        assert!(config.parallel_engagements);
        assert_eq!(config.effect_persistence, EffectPersistence::Decay { retain_percent: 50 });
        assert_eq!(config.supply_radius, 3);
    }

    #[test]
    fn test_bad_ron_is_an_error() {
        assert!(EngineConfig::from_ron_str("(ground_substeps: \"six\")").is_err());
    }
}
