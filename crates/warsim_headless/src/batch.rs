//! Batch runner.
//!
//! Runs one scenario over a range of seeds in parallel using rayon. Runs
//! share only the read-only catalog; each gets its own engine, producers
//! and single-threaded tokio runtime for order production.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use warsim_core::catalog::Catalog;
use warsim_core::config::EngineConfig;
use warsim_core::engine::Engine;
use warsim_core::error::EngineError;
use warsim_core::factions::FactionId;
use warsim_core::scenario::Scenario;

use crate::config::RunnerConfig;
use crate::metrics::{BatchSummary, MetricsCollector, RunMetrics};
use crate::producers::AnyProducer;
use crate::runner::TurnRunner;
use crate::scenario::{load_catalog, ScenarioError, ScenarioSource};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Built-in scenario name or path to a scenario file.
    pub scenario: String,
    /// Catalog file; the standard catalog when unset.
    pub catalog: Option<PathBuf>,
    /// Number of runs.
    pub run_count: u32,
    /// Worker threads (0 = rayon default).
    pub parallel_runs: u32,
    /// Seed of the first run; run `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Output directory for results.
    pub output_dir: PathBuf,
    /// Blue producer preset.
    pub blue: String,
    /// Red producer preset.
    pub red: String,
    /// Engine settings for every run.
    pub engine: EngineConfig,
    /// Runner settings for every run.
    pub runner: RunnerConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "border_clash".to_string(),
            catalog: None,
            run_count: 20,
            parallel_runs: 0,
            seed_start: 0,
            output_dir: PathBuf::from("results"),
            blue: "balanced".to_string(),
            red: "offensive".to_string(),
            engine: EngineConfig::default(),
            runner: RunnerConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario.
    pub fn new(scenario: &str, run_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            run_count,
            ..Default::default()
        }
    }

    /// Set output directory.
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set producer presets.
    #[must_use]
    pub fn with_producers(mut self, blue: &str, red: &str) -> Self {
        self.blue = blue.to_string();
        self.red = red.to_string();
        self
    }

    /// Cap turns per run.
    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.runner.max_turns = Some(max_turns);
        self
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Per-run metrics, in seed order.
    pub runs: Vec<RunMetrics>,
    /// Aggregate tallies.
    pub summary: BatchSummary,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
    /// Runs that failed.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// A run that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Run index.
    pub run_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Finished-run tally shared by the batch workers.
#[derive(Debug, Default)]
struct Progress {
    completed: AtomicU32,
    blue_wins: AtomicU32,
    red_wins: AtomicU32,
}

impl Progress {
    /// Count a finished run; returns the runs finished so far.
    fn record(&self, winner: Option<FactionId>) -> u32 {
        match winner {
            Some(FactionId::Blue) => self.blue_wins.fetch_add(1, Ordering::Relaxed),
            Some(FactionId::Red) => self.red_wins.fetch_add(1, Ordering::Relaxed),
            None => 0,
        };
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn wins(&self, faction: FactionId) -> u32 {
        match faction {
            FactionId::Blue => self.blue_wins.load(Ordering::Relaxed),
            FactionId::Red => self.red_wins.load(Ordering::Relaxed),
        }
    }
}

/// Play one seed of `scenario` to the end.
pub fn run_single(
    scenario: &Scenario,
    catalog: &Arc<Catalog>,
    seed: u64,
    config: &BatchConfig,
) -> Result<RunMetrics, String> {
    let engine = Engine::from_scenario(&scenario.clone().with_seed(seed), Arc::clone(catalog), config.engine.clone())
        .map_err(|e| e.to_string())?;
    let blue = AnyProducer::from_preset(&config.blue, catalog).map_err(|e| e.to_string())?;
    let red = AnyProducer::from_preset(&config.red, catalog).map_err(|e| e.to_string())?;
    let mut runner = TurnRunner::new(engine, blue, red, config.runner.clone()).map_err(|e| e.to_string())?;

    let mut collector = MetricsCollector::new(scenario.name.clone(), seed);
    let (blue_name, red_name) = runner.producer_names();
    collector.set_producers(blue_name, red_name);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| e.to_string())?;
    let outcome = runtime
        .block_on(runner.run_to_end(&mut collector))
        .map_err(|e| e.to_string())?;

    let mut metrics = collector.finish();
    metrics.turns = runner.engine().turn();
    metrics.final_state_hash = outcome.state_hash;
    Ok(metrics)
}

/// Run a batch.
///
/// # Errors
///
/// Returns an error if the scenario or catalog cannot be loaded; failures
/// of individual runs are collected in [`BatchResults::errors`].
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let start = Instant::now();
    let scenario = ScenarioSource::parse(&config.scenario).load()?;
    let catalog = load_catalog(config.catalog.as_deref())?;
    crate::scenario::validate(&scenario, &catalog)?;

    info!(
        runs = config.run_count,
        scenario = %scenario.name,
        blue = %config.blue,
        red = %config.red,
        "starting batch"
    );
    let progress = Progress::default();

    let play = || -> Vec<Result<RunMetrics, BatchError>> {
        (0..config.run_count)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add(u64::from(i));
                match run_single(&scenario, &catalog, seed, &config) {
                    Ok(metrics) => {
                        let completed = progress.record(metrics.winner());
                        if completed % 100 == 0 {
                            info!(
                                completed,
                                total = config.run_count,
                                blue_wins = progress.wins(FactionId::Blue),
                                red_wins = progress.wins(FactionId::Red),
                                "batch progress"
                            );
                        } else {
                            debug!(run = i, seed, turns = metrics.turns, "run finished");
                        }
                        Ok(metrics)
                    }
                    Err(message) => {
                        warn!(run = i, seed, %message, "run failed");
                        Err(BatchError {
                            run_index: i,
                            seed,
                            message,
                        })
                    }
                }
            })
            .collect()
    };

    let results = if config.parallel_runs > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_runs as usize)
            .build()
        {
            Ok(pool) => pool.install(play),
            Err(e) => {
                warn!(error = %e, "could not build thread pool, using the global one");
                play()
            }
        }
    } else {
        play()
    };

    let (runs, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let runs: Vec<RunMetrics> = runs.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_runs(&runs);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        runs = runs.len(),
        errors = errors.len(),
        seconds = duration_seconds,
        "batch complete"
    );

    Ok(BatchResults {
        config,
        runs,
        summary,
        duration_seconds,
        errors,
    })
}

/// Play the same seed `runs` times and check every run ends identically.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded or a run fails.
pub fn verify_determinism(config: &BatchConfig, seed: u64, runs: u32) -> Result<bool, ScenarioError> {
    let scenario = ScenarioSource::parse(&config.scenario).load()?;
    let catalog = load_catalog(config.catalog.as_deref())?;

    let mut first: Option<RunMetrics> = None;
    for _ in 0..runs {
        let metrics = run_single(&scenario, &catalog, seed, config)
            .map_err(|e| ScenarioError::Invalid(EngineError::InvalidState(e)))?;
        match &first {
            None => first = Some(metrics),
            Some(expected) if *expected != metrics => {
                warn!(seed, expected = expected.final_state_hash, actual = metrics.final_state_hash, "runs diverged");
                return Ok(false);
            }
            Some(_) => {}
        }
    }
    Ok(true)
}
