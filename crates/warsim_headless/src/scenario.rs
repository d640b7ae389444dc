//! Scenario and catalog loading for headless runs.
//!
//! Scenarios come either from RON files on disk or from the built-in set
//! compiled into the binary.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use warsim_core::catalog::Catalog;
use warsim_core::error::EngineError;
use warsim_core::scenario::Scenario;

/// Built-in scenarios by name.
const BUILTIN: &[(&str, &str)] = &[("border_clash", include_str!("../scenarios/border_clash.ron"))];

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// No built-in scenario has this name.
    #[error("Unknown built-in scenario: {0}")]
    UnknownBuiltin(String),
    /// The scenario or catalog does not describe a valid world.
    #[error(transparent)]
    Invalid(#[from] EngineError),
}

/// Where a scenario comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioSource {
    /// A compiled-in scenario.
    Builtin(String),
    /// A RON file.
    File(std::path::PathBuf),
}

impl ScenarioSource {
    /// Interpret a CLI argument: an existing path, or else a built-in name.
    #[must_use]
    pub fn parse(arg: &str) -> Self {
        let path = Path::new(arg);
        if path.exists() || arg.ends_with(".ron") {
            Self::File(path.to_path_buf())
        } else {
            Self::Builtin(arg.to_string())
        }
    }

    /// Load the scenario.
    pub fn load(&self) -> Result<Scenario, ScenarioError> {
        match self {
            Self::Builtin(name) => builtin(name),
            Self::File(path) => load_scenario(path),
        }
    }
}

impl Default for ScenarioSource {
    fn default() -> Self {
        Self::Builtin(BUILTIN[0].0.to_string())
    }
}

/// Names of the built-in scenarios.
#[must_use]
pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN.iter().map(|(name, _)| *name).collect()
}

/// A built-in scenario by name.
pub fn builtin(name: &str) -> Result<Scenario, ScenarioError> {
    let (_, text) = BUILTIN
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| ScenarioError::UnknownBuiltin(name.to_string()))?;
    from_ron_str(text)
}

/// Load a scenario from a RON file.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    from_ron_str(&contents)
}

/// Parse a scenario from RON text.
pub fn from_ron_str(ron: &str) -> Result<Scenario, ScenarioError> {
    Ok(ron::from_str(ron)?)
}

/// Load a catalog from a RON file, or the standard catalog when no path is
/// given. The result is validated.
pub fn load_catalog(path: Option<&Path>) -> Result<Arc<Catalog>, ScenarioError> {
    let catalog = match path {
        None => Catalog::standard(),
        Some(path) => {
            if !path.exists() {
                return Err(ScenarioError::FileNotFound(path.display().to_string()));
            }
            Catalog::from_ron_str(&std::fs::read_to_string(path)?)?
        }
    };
    catalog.validate()?;
    Ok(Arc::new(catalog))
}

/// Check that `scenario` builds a world against `catalog`.
///
/// Returns the number of deployed units.
pub fn validate(scenario: &Scenario, catalog: &Catalog) -> Result<usize, ScenarioError> {
    let (world, _) = scenario.build(catalog)?;
    Ok(world.unit_ids().len())
}
