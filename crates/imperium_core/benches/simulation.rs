//! Simulation benchmarks for imperium_core.
//!
//! Run with: `cargo bench -p imperium_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use imperium_core::actions::PlayerAction;
use imperium_core::data::GameData;
use imperium_core::simulation::Simulation;

/// A late-game economy: every generator and converter owned and running.
fn late_game() -> Simulation {
    let mut data = GameData::imperium();
    for resource in &mut data.resources {
        resource.starting_amount = resource.base_cap.unwrap_or(1_000_000.0);
    }
    let mut sim = Simulation::new(data).expect("built-in data is valid");

    let generators: Vec<String> = sim.data().generators.iter().map(|g| g.id.clone()).collect();
    let converters: Vec<String> = sim.data().converters.iter().map(|c| c.id.clone()).collect();
    for _ in 0..5 {
        for id in &generators {
            let _ = sim.apply_action(&PlayerAction::PurchaseGenerator(id.clone()));
        }
        for id in &converters {
            let _ = sim.apply_action(&PlayerAction::PurchaseConverter(id.clone()));
        }
    }
    let _ = sim.set_market_sale("planks", true);
    sim
}

/// Runs simulation benchmarks for the imperium_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("tick_late_game", |b| {
        let mut sim = late_game();
        b.iter(|| black_box(sim.tick(black_box(1.0))));
    });

    c.bench_function("offline_12h", |b| {
        let sim = late_game();
        b.iter(|| black_box(sim.compute_offline_progress(black_box(43_200.0))));
    });

    c.bench_function("state_hash", |b| {
        let sim = late_game();
        b.iter(|| black_box(sim.state_hash()));
    });

    c.bench_function("snapshot_json", |b| {
        let sim = late_game();
        b.iter(|| black_box(sim.to_json(0.0)));
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
