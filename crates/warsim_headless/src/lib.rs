//! Headless runs of the warsim engine.
//!
//! This crate drives [`warsim_core`] without any UI:
//!
//! - **Producers**: order producers per faction, awaited concurrently with
//!   a deadline by the [`runner::TurnRunner`]
//! - **Batch**: many seeds of one scenario in parallel with rayon
//! - **Output**: JSON-lines event streams, replays and JSON batch results
//!
//! # Example
//!
//! ```bash
//! # Play the built-in scenario with the default doctrines
//! cargo run -p warsim_headless -- run --scenario border_clash --events events.jsonl
//!
//! # Run 200 seeds
//! cargo run -p warsim_headless -- batch --count 200 --output results/
//!
//! # Check a replay
//! cargo run -p warsim_headless -- replay --file run.replay --verify
//! ```

pub mod batch;
pub mod config;
pub mod doctrine;
pub mod metrics;
pub mod producers;
pub mod runner;
pub mod scenario;
pub mod sink;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use config::{load_engine_config, ConfigError, RunnerConfig};
pub use doctrine::{Doctrine, DoctrineError};
pub use metrics::{BatchSummary, MetricsCollector, RunMetrics};
pub use producers::{AnyProducer, DoctrineProducer, IdleProducer, OrderProducer, ScriptedProducer};
pub use runner::{RunOutcome, TurnRunner};
pub use scenario::{ScenarioError, ScenarioSource};
pub use sink::JsonLinesSink;
