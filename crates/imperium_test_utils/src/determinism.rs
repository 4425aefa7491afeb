//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! The same save must yield the same economy on every machine and every
//! reload. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Every map in the core is a `BTreeMap`.
//!
//! - **Wall clock reads**: the core never reads time; hosts pass `dt` and
//!   timestamps explicitly.
//!
//! - **Float summation order**: production and conversion run in
//!   definition order, so rounding happens in the same order every run.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual systems (generators, converters, market)
//! 2. **Property tests**: random action scripts still replay identically
//! 3. **Integration tests**: full sessions with catch-up are reproducible
//! 4. **Parallel tests**: running N simulations on threads all match

use std::thread;

use imperium_core::actions::{ActionQueue, PlayerAction};
use imperium_core::simulation::Simulation;
use imperium_core::snapshot::Snapshot;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for tick in 0..ticks {
            step(&mut state, tick);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Play `script(tick)` through the action queue for `ticks` ticks of `dt`.
pub fn run_script<F>(sim: &mut Simulation, ticks: u64, dt: f64, script: F)
where
    F: Fn(u64) -> Vec<PlayerAction>,
{
    let mut queue = ActionQueue::new();
    for tick in 0..ticks {
        queue.extend(script(tick));
        sim.step(dt, &mut queue);
    }
}

/// Run the same scripted session twice and compare final hashes.
pub fn verify_simulation_determinism<Setup, Script>(setup: Setup, script: Script, ticks: u64) -> bool
where
    Setup: Fn() -> Simulation,
    Script: Fn(u64) -> Vec<PlayerAction>,
{
    let result = verify_determinism(
        2,
        ticks,
        &setup,
        |sim, tick| {
            let mut queue = ActionQueue::new();
            queue.extend(script(tick));
            sim.step(1.0, &mut queue);
        },
        |sim| sim.state_hash(),
    );
    result.is_deterministic
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 All hashes: {:?}",
                self.num_sims, self.ticks, self.hashes
            );
        }
    }
}

/// Run N independent simulations on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick(1.0);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick(1.0);
        sim2.tick(1.0);

        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that the binary round-trip preserves simulation state exactly.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();

    for _ in 0..num_ticks {
        sim.tick(1.0);
    }

    let hash_before = sim.state_hash();

    let Ok(bytes) = sim.to_bytes() else {
        return false;
    };
    let Ok(restored) = Simulation::from_bytes(&bytes) else {
        return false;
    };

    hash_before == restored.state_hash()
}

/// Verify that a JSON snapshot reloads into the same state.
///
/// Display rates are recomputed on load, so they are not compared
/// separately; the state hash covers everything persisted.
pub fn verify_snapshot_round_trip(sim: &Simulation) -> bool {
    let Ok(json) = sim.to_json(0.0) else {
        return false;
    };
    let Ok(snapshot) = Snapshot::from_json(&json) else {
        return false;
    };
    let mut restored = sim.clone();
    let report = restored.restore(&snapshot);
    report.is_clean() && restored.state_hash() == sim.state_hash()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the simulation.
pub mod strategies {
    use imperium_core::actions::PlayerAction;
    use imperium_core::resources::ResourceKind;
    use proptest::prelude::*;

    const GENERATORS: &[&str] = &["woodcutter", "miner", "iron_miner", "copper_miner", "market", "bank"];
    const CONVERTERS: &[&str] = &["sawmill", "brickmaker", "toolsmith", "jeweler"];
    const UPGRADES: &[&str] = &[
        "better_axe",
        "stone_pickaxe",
        "iron_pickaxe",
        "copper_pickaxe",
        "efficient_woodcutters",
        "efficient_miners",
        "fast_sawmill",
        "fast_brickmaker",
    ];
    const RESOURCES: &[&str] = &["coins", "wood", "stone", "iron", "copper", "planks", "bricks", "tools", "jewelry"];

    fn arb_id(ids: &'static [&'static str]) -> impl Strategy<Value = String> {
        prop::sample::select(ids).prop_map(ToString::to_string)
    }

    /// Generate a resource kind of the built-in balance.
    pub fn arb_resource() -> impl Strategy<Value = ResourceKind> {
        prop::sample::select(RESOURCES).prop_map(ResourceKind::from)
    }

    /// Generate a tick length, including degenerate ones.
    pub fn arb_dt() -> impl Strategy<Value = f64> {
        prop_oneof![
            4 => 0.0f64..5.0,
            1 => Just(0.0),
            1 => Just(-1.0),
            1 => Just(f64::NAN),
        ]
    }

    /// Generate any action, with ids valid for the built-in balance.
    ///
    /// Prestige is left out so long scripts keep their progress.
    pub fn arb_player_action() -> impl Strategy<Value = PlayerAction> {
        prop_oneof![
            4 => Just(PlayerAction::Collect),
            3 => arb_id(GENERATORS).prop_map(PlayerAction::PurchaseGenerator),
            2 => arb_id(CONVERTERS).prop_map(PlayerAction::PurchaseConverter),
            1 => (arb_id(CONVERTERS), proptest::option::of(any::<bool>()))
                .prop_map(|(id, active)| PlayerAction::ToggleConverter { id, active }),
            1 => arb_id(UPGRADES).prop_map(PlayerAction::PurchaseUpgrade),
            1 => arb_resource().prop_map(PlayerAction::UpgradeStorage),
            1 => (arb_resource(), any::<bool>())
                .prop_map(|(resource, enabled)| PlayerAction::SetMarketSale { resource, enabled }),
        ]
    }

    /// Generate a script: one list of actions per tick.
    pub fn arb_action_script(max_ticks: usize) -> impl Strategy<Value = Vec<Vec<PlayerAction>>> {
        proptest::collection::vec(proptest::collection::vec(arb_player_action(), 0..4), 1..max_ticks)
    }

    /// Generate starting amounts for the raw resources.
    pub fn arb_starting_amounts() -> impl Strategy<Value = Vec<(&'static str, f64)>> {
        (0.0f64..5000.0, 0.0f64..1000.0, 0.0f64..1000.0, 0.0f64..1000.0).prop_map(|(coins, wood, stone, iron)| {
            vec![("coins", coins), ("wood", wood), ("stone", stone), ("iron", iron)]
        })
    }
}
