//! Headless warsim runner.
//!
//! Plays scenarios with bundled order producers, runs seed batches and
//! checks replays. Events and results go to files; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Play one run, writing every event as a JSON line
//! cargo run -p warsim_headless -- run --scenario border_clash --events events.jsonl --replay run.replay
//!
//! # Run a batch of seeds
//! cargo run -p warsim_headless -- batch --count 100 --output results/
//!
//! # Check that a seed always plays out the same way
//! cargo run -p warsim_headless -- verify --seed 12345 --runs 5
//!
//! # Validate scenario and catalog files
//! cargo run -p warsim_headless -- validate --scenario my_scenario.ron
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use warsim_core::config::EngineConfig;
use warsim_core::engine::Engine;
use warsim_core::events::EventSink;
use warsim_core::factions::FactionId;
use warsim_core::replay::{Replay, ReplayPlayer};
use warsim_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    config::{load_engine_config, RunnerConfig},
    metrics::MetricsCollector,
    producers::{default_preset, AnyProducer},
    runner::{RunOutcome, TurnRunner},
    scenario::{builtin_names, load_catalog, validate, ScenarioSource},
    sink::{JsonLinesSink, NullSink},
};

#[derive(Parser)]
#[command(name = "warsim")]
#[command(about = "Headless turn resolution runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that play runs.
#[derive(Args, Clone)]
struct PlayArgs {
    /// Built-in scenario name or scenario file
    #[arg(short, long, default_value = "border_clash")]
    scenario: String,

    /// Catalog file (defaults to the standard catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Engine config file (RON)
    #[arg(long)]
    engine_config: Option<PathBuf>,

    /// Runner config file (RON)
    #[arg(long)]
    runner_config: Option<PathBuf>,

    /// Blue producer: idle, a doctrine preset or a doctrine file
    #[arg(long)]
    blue: Option<String>,

    /// Red producer: idle, a doctrine preset or a doctrine file
    #[arg(long)]
    red: Option<String>,

    /// Per-turn producer timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Stop after this many turns
    #[arg(long)]
    max_turns: Option<u32>,

    /// Resolve disjoint engagements in parallel
    #[arg(long)]
    parallel: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single run
    Run {
        #[command(flatten)]
        play: PlayArgs,

        /// Seed override
        #[arg(long)]
        seed: Option<u64>,

        /// Write events as JSON lines to this file
        #[arg(short, long)]
        events: Option<PathBuf>,

        /// Write a replay to this file
        #[arg(short, long)]
        replay: Option<PathBuf>,
    },

    /// Play many seeds of one scenario
    Batch {
        #[command(flatten)]
        play: PlayArgs,

        /// Number of runs
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Worker threads (0 = auto)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Seed of the first run
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Verify determinism by playing the same seed several times
    Verify {
        #[command(flatten)]
        play: PlayArgs,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Load a replay and optionally re-resolve it
    Replay {
        /// Replay file
        #[arg(short, long)]
        file: PathBuf,

        /// Catalog the run was played with
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Engine config the run was played with
        #[arg(long)]
        engine_config: Option<PathBuf>,

        /// Re-resolve every turn and compare the final state hash
        #[arg(long)]
        verify: bool,
    },

    /// Check catalog and scenario files
    Validate {
        /// Scenario files or built-in names (all built-ins when omitted)
        #[arg(short, long)]
        scenario: Vec<String>,

        /// Catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .init();

    let result = match cli.command {
        Commands::Run {
            play,
            seed,
            events,
            replay,
        } => cmd_run(&play, seed, events, replay),
        Commands::Batch {
            play,
            count,
            jobs,
            output,
            seed,
        } => cmd_batch(&play, count, jobs, output, seed),
        Commands::Verify { play, seed, runs } => cmd_verify(&play, seed, runs),
        Commands::Replay {
            file,
            catalog,
            engine_config,
            verify,
        } => cmd_replay(&file, catalog.as_deref(), engine_config.as_deref(), verify),
        Commands::Validate { scenario, catalog } => cmd_validate(&scenario, catalog.as_deref()),
    };

    if let Err(message) = result {
        eprintln!("Error: {message}");
        std::process::exit(1);
    }
}

fn engine_config(play: &PlayArgs) -> Result<EngineConfig, String> {
    let config = match &play.engine_config {
        Some(path) => load_engine_config(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    let parallel = play.parallel || config.parallel_engagements;
    Ok(config.with_parallel(parallel))
}

fn runner_config(play: &PlayArgs) -> Result<RunnerConfig, String> {
    let mut config = match &play.runner_config {
        Some(path) => RunnerConfig::load(path).map_err(|e| e.to_string())?,
        None => RunnerConfig::default(),
    };
    if let Some(timeout_ms) = play.timeout_ms {
        config = config.with_timeout_ms(timeout_ms.max(1));
    }
    if let Some(max_turns) = play.max_turns {
        config = config.with_max_turns(max_turns);
    }
    Ok(config)
}

fn preset(play: &PlayArgs, faction: FactionId) -> String {
    let chosen = match faction {
        FactionId::Blue => play.blue.as_deref(),
        FactionId::Red => play.red.as_deref(),
    };
    chosen.unwrap_or(default_preset(faction)).to_string()
}

fn batch_config(play: &PlayArgs, count: u32) -> Result<BatchConfig, String> {
    let mut config = BatchConfig::new(&play.scenario, count)
        .with_producers(&preset(play, FactionId::Blue), &preset(play, FactionId::Red));
    config.catalog = play.catalog.clone();
    config.engine = engine_config(play)?;
    config.runner = runner_config(play)?;
    Ok(config)
}

/// Play a single run
fn cmd_run(play: &PlayArgs, seed: Option<u64>, events: Option<PathBuf>, replay: Option<PathBuf>) -> Result<(), String> {
    let catalog = load_catalog(play.catalog.as_deref()).map_err(|e| e.to_string())?;
    let mut scenario = ScenarioSource::parse(&play.scenario)
        .load()
        .map_err(|e| e.to_string())?;
    if let Some(seed) = seed {
        scenario = scenario.with_seed(seed);
    }
    let engine = Engine::from_scenario(&scenario, Arc::clone(&catalog), engine_config(play)?).map_err(|e| e.to_string())?;
    let blue = AnyProducer::from_preset(&preset(play, FactionId::Blue), &catalog).map_err(|e| e.to_string())?;
    let red = AnyProducer::from_preset(&preset(play, FactionId::Red), &catalog).map_err(|e| e.to_string())?;
    let mut runner = TurnRunner::new(engine, blue, red, runner_config(play)?).map_err(|e| e.to_string())?;
    let (blue_name, red_name) = runner.producer_names();

    tracing::info!(
        scenario = %scenario.name,
        seed = scenario.seed,
        blue = %blue_name,
        red = %red_name,
        "starting run"
    );

    let runtime = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
    let outcome = match &events {
        Some(path) => {
            let mut sink = JsonLinesSink::create(path).map_err(|e| e.to_string())?;
            let outcome = play_out(&runtime, &mut runner, &mut sink)?;
            let written = sink.written();
            sink.finish().map_err(|e| e.to_string())?;
            eprintln!("Wrote {written} events to {}", path.display());
            outcome
        }
        None => play_out(&runtime, &mut runner, &mut NullSink)?,
    };

    if let Some(path) = &replay {
        let replay = runner.replay().map_err(|e| e.to_string())?;
        replay.save(path).map_err(|e| e.to_string())?;
        eprintln!("Saved replay of {} turns to {}", replay.turn_count(), path.display());
    }

    let mut collector = MetricsCollector::new(scenario.name.clone(), scenario.seed);
    collector.set_producers(blue_name, red_name);
    for event in runner.engine().events().events() {
        collector.record(event);
    }
    let metrics = collector.finish();

    eprintln!("\n=== Run Complete ===");
    eprintln!("Scenario: {} (seed {})", metrics.scenario, metrics.seed);
    eprintln!("Turns: {}", runner.engine().turn());
    match outcome.termination {
        Some(t) => eprintln!(
            "Result: {:?} on turn {}, winner {}",
            t.reason,
            t.turn,
            t.winner.map_or("none".to_string(), |w| w.display_name().to_string())
        ),
        None if outcome.cancelled => eprintln!("Result: cancelled"),
        None => eprintln!("Result: stopped at turn cap"),
    }
    eprintln!(
        "Victory points: blue {} / red {}",
        outcome.victory_points.blue, outcome.victory_points.red
    );
    for faction in FactionId::ALL {
        let f = metrics.faction(faction);
        eprintln!(
            "{:<5} engagements {:>4}  units lost {:>3}  rejected {:>3}  timeouts {:>2}",
            faction.short_name(),
            f.engagements,
            f.units_lost,
            f.orders_rejected,
            f.timeouts
        );
    }
    eprintln!("Final state hash: {:016x}", outcome.state_hash);
    Ok(())
}

fn play_out<S: EventSink>(
    runtime: &tokio::runtime::Runtime,
    runner: &mut TurnRunner<AnyProducer, AnyProducer>,
    sink: &mut S,
) -> Result<RunOutcome, String> {
    runtime.block_on(runner.run_to_end(sink)).map_err(|e| e.to_string())
}

/// Run a batch of seeds
fn cmd_batch(play: &PlayArgs, count: u32, jobs: u32, output: PathBuf, seed: u64) -> Result<(), String> {
    let mut config = batch_config(play, count)?.with_output(output.clone()).with_seed(seed);
    config.parallel_runs = jobs;

    let results = run_batch(config).map_err(|e| e.to_string())?;
    let path = output.join(format!("batch_{seed}_{count}.json"));
    results.save(&path).map_err(|e| e.to_string())?;

    eprintln!("\n=== Batch Complete ===");
    eprintln!("{}", results.summary);
    if !results.errors.is_empty() {
        eprintln!("Failed runs: {}", results.errors.len());
        for error in results.errors.iter().take(5) {
            eprintln!("  run {} (seed {}): {}", error.run_index, error.seed, error.message);
        }
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("Results saved to {}", path.display());
    Ok(())
}

/// Verify determinism
fn cmd_verify(play: &PlayArgs, seed: u64, runs: u32) -> Result<(), String> {
    let config = batch_config(play, 1)?;
    eprintln!("Verifying determinism: {} seed {seed}, {runs} runs", play.scenario);
    if verify_determinism(&config, seed, runs.max(2)).map_err(|e| e.to_string())? {
        eprintln!("PASS: all runs identical");
        Ok(())
    } else {
        Err("runs diverged".to_string())
    }
}

/// Load and optionally verify a replay
fn cmd_replay(file: &Path, catalog: Option<&Path>, engine_config: Option<&Path>, verify: bool) -> Result<(), String> {
    let replay = Replay::load(file).map_err(|e| e.to_string())?;
    eprintln!("Replay: {} (seed {})", replay.scenario_name, replay.seed);
    eprintln!("Turns: {} ({} with timeouts)", replay.turn_count(), replay.timeout_count());
    eprintln!("Final hash: {:016x}", replay.final_hash);

    if verify {
        let catalog = load_catalog(catalog).map_err(|e| e.to_string())?;
        let config = match engine_config {
            Some(path) => load_engine_config(path).map_err(|e| e.to_string())?,
            None => EngineConfig::default(),
        };
        let mut player = ReplayPlayer::new(replay, catalog, config).map_err(|e| e.to_string())?;
        let hash = player.verify().map_err(|e| e.to_string())?;
        eprintln!("PASS: replay reproduces hash {hash:016x}");
    }
    Ok(())
}

/// Validate catalog and scenarios
fn cmd_validate(scenarios: &[String], catalog: Option<&Path>) -> Result<(), String> {
    let catalog = load_catalog(catalog).map_err(|e| e.to_string())?;
    eprintln!("Catalog OK");

    let names: Vec<String> = if scenarios.is_empty() {
        builtin_names().into_iter().map(str::to_string).collect()
    } else {
        scenarios.to_vec()
    };

    let mut failures = 0;
    for name in &names {
        let checked = ScenarioSource::parse(name)
            .load()
            .and_then(|scenario| validate(&scenario, &catalog).map(|units| (scenario, units)));
        match checked {
            Ok((scenario, units)) => eprintln!("{name}: OK ({}, {units} units)", scenario.name),
            Err(e) => {
                eprintln!("{name}: {e}");
                failures += 1;
            }
        }
    }

    if failures == 0 {
        Ok(())
    } else {
        Err(format!("{failures} scenario(s) failed validation"))
    }
}
