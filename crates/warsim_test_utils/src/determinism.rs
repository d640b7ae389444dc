//! Determinism testing utilities.
//!
//! Provides a harness for verifying that turn resolution produces
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and batch comparisons only mean something if resolution is
//! 100% deterministic. Sources of non-determinism include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`warsim_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The engine keeps ordered maps and iterates in id order.
//!
//! - **Scheduling**: Engagements of one wave may resolve on any worker.
//!   Each engagement draws from its own stream and deltas are applied in
//!   tie-break order, so the parallel mode must match the sequential one.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual resolvers with fixed streams
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Whole runs are reproducible byte for byte
//! 4. **Parallel tests**: Running N engines on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use warsim_core::engine::Engine;
use warsim_core::events::Event;
use warsim_core::orders::OrdersPayload;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of turns resolved.
    pub turns: u32,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic resolution).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that resolution was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Resolution is non-deterministic!\n\
                 Runs: {}\n\
                 Turns: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `turns` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one step
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    turns: u32,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..turns {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        turns,
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTrace {
    /// Final state hash.
    pub state_hash: u64,
    /// The event log, bincode-encoded.
    pub event_bytes: Vec<u8>,
    /// Turns resolved before the run ended or `turns` was reached.
    pub turns: u32,
}

/// Resolve up to `turns` turns, ordering both factions with `orders`.
///
/// Stops early when the run terminates.
///
/// # Panics
///
/// Panics if the engine reports an error.
pub fn run_engine<F>(engine: &mut Engine, turns: u32, orders: F) -> RunTrace
where
    F: Fn(&Engine) -> (OrdersPayload, OrdersPayload),
{
    let mut resolved = 0;
    while resolved < turns && !engine.is_terminated() {
        let (blue, red) = orders(engine);
        engine.resolve_turn(blue, red).expect("turn resolves");
        resolved += 1;
    }
    RunTrace {
        state_hash: engine.state_hash(),
        event_bytes: encode_events(engine.events().events()),
        turns: resolved,
    }
}

/// Encode events for byte-wise comparison.
///
/// # Panics
///
/// Panics if encoding fails.
#[must_use]
pub fn encode_events(events: &[Event]) -> Vec<u8> {
    bincode::serialize(events).expect("events encode")
}

/// Build two engines with `setup`, run both and compare them turn by turn,
/// finding the first divergence.
///
/// # Returns
///
/// `None` if the runs match throughout, `Some(turn)` for the first turn
/// after which their state hashes differ (0 for the initial state).
///
/// # Panics
///
/// Panics if either engine reports an error.
pub fn find_first_divergence<S, F>(setup: S, turns: u32, orders: F) -> Option<u32>
where
    S: Fn() -> Engine,
    F: Fn(&Engine) -> (OrdersPayload, OrdersPayload),
{
    let mut a = setup();
    let mut b = setup();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for turn in 1..=turns {
        if a.is_terminated() || b.is_terminated() {
            break;
        }
        let (blue, red) = orders(&a);
        a.resolve_turn(blue, red).expect("turn resolves");
        let (blue, red) = orders(&b);
        b.resolve_turn(blue, red).expect("turn resolves");

        if a.state_hash() != b.state_hash() {
            return Some(turn);
        }
    }

    None
}

/// Result of parallel runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Trace of each run.
    pub traces: Vec<RunTrace>,
}

impl ParallelRunResult {
    /// Check if all runs produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.traces.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all runs matched.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different hashes or event logs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let hashes: Vec<u64> = self.traces.iter().map(|t| t.state_hash).collect();
            panic!(
                "Parallel runs diverged!\n\
                 Runs: {}\n\
                 All hashes: {:?}",
                self.traces.len(),
                hashes
            );
        }
    }
}

/// Run N engines on scoped threads and collect their traces.
///
/// Catches non-determinism that only shows up under thread scheduling
/// variations or memory layout differences.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_engines<S, F>(setup: S, runs: usize, turns: u32, orders: F) -> ParallelRunResult
where
    S: Fn() -> Engine + Sync,
    F: Fn(&Engine) -> (OrdersPayload, OrdersPayload) + Sync,
{
    let traces = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| {
                s.spawn(|| {
                    let mut engine = setup();
                    run_engine(&mut engine, turns, &orders)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("worker thread"))
            .collect()
    });

    ParallelRunResult { traces }
}

/// Verify that a snapshot round trip preserves engine state exactly.
pub fn verify_snapshot_determinism(engine: &Engine) -> bool {
    let Ok(bytes) = engine.snapshot() else {
        return false;
    };
    let Ok(restored) = Engine::restore(&bytes, engine.shared_catalog(), engine.config().clone()) else {
        return false;
    };
    restored.state_hash() == engine.state_hash() && restored.events() == engine.events()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
