//! End-to-end checks of the core production rules.
//!
//! Each test builds the smallest state that shows one rule and runs the
//! public tick functions on it.

use imperium_core::converters::{self, Converter};
use imperium_core::data::{cost, GameData, GeneratorData};
use imperium_core::error::ActionError;
use imperium_core::generators::{self, Generator};
use imperium_core::offline::{self, OfflineRules};
use imperium_core::resources::{ResourceKind, ResourceStore};
use imperium_core::scarcity::Scarcity;
use imperium_test_utils::fixtures;

fn uncapped_store(entries: &[(&str, f64)]) -> ResourceStore {
    let mut store = ResourceStore::new();
    for (kind, amount) in entries {
        let kind = ResourceKind::from(*kind);
        store.register(kind.clone(), None);
        store.set(&kind, *amount);
    }
    store
}

fn sawmill(owned: u32) -> Converter {
    let data = GameData::imperium();
    let mut converter = Converter::from_data(data.get_converter("sawmill").unwrap());
    converter.owned = owned;
    converter.active = owned > 0;
    converter
}

// =============================================================================
// Generators
// =============================================================================

#[test]
fn test_two_woodcutters_make_one_wood_per_second() {
    let data = GameData::imperium();
    let mut woodcutter = Generator::from_data(data.get_generator("woodcutter").unwrap());
    woodcutter.owned = 2;
    let mut store = uncapped_store(&[("wood", 0.0)]);

    let events = generators::tick_generators(&[woodcutter], 1.0, 1.0, &mut store, 10.0, 2, &mut Scarcity::default());

    assert_eq!(store.get("wood"), 1.0);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].amount, 1.0);
}

#[test]
fn test_dependent_generator_waits_for_threshold() {
    let data = GameData::imperium();
    let mut iron_miner = Generator::from_data(data.get_generator("iron_miner").unwrap());
    iron_miner.owned = 5;
    let mut store = uncapped_store(&[("stone", 9.99), ("iron", 0.0)]);

    generators::tick_generators(std::slice::from_ref(&iron_miner), 1.0, 1.0, &mut store, 10.0, 2, &mut Scarcity::default());
    assert_eq!(store.get("iron"), 0.0);

    store.set(&ResourceKind::from("stone"), 10.0);
    generators::tick_generators(&[iron_miner], 1.0, 1.0, &mut store, 10.0, 2, &mut Scarcity::default());
    assert_eq!(store.get("iron"), 1.0);
}

#[test]
fn test_output_stops_at_cap() {
    let mut sim = fixtures::with_starting(&[("coins", 100.0), ("wood", 999.8)]);
    sim.purchase_generator("woodcutter").unwrap();

    sim.tick(1.0);

    assert_eq!(sim.amount("wood"), 1000.0);
}

// =============================================================================
// Converters
// =============================================================================

#[test]
fn test_starved_converter_keeps_its_credit() {
    let mut converters = vec![sawmill(1)];
    let mut store = uncapped_store(&[("wood", 1.0), ("planks", 0.0)]);

    for _ in 0..10 {
        converters::tick_converters(&mut converters, 1.0, 1.0, &mut store, 10_000);
    }

    assert_eq!(store.get("wood"), 1.0);
    assert_eq!(store.get("planks"), 0.0);
    assert!((converters[0].accumulator - 2.0).abs() < 1e-9);
}

#[test]
fn test_converter_runs_one_operation_after_five_ticks() {
    let mut converters = vec![sawmill(1)];
    let mut store = uncapped_store(&[("wood", 100.0), ("planks", 0.0)]);

    for _ in 0..4 {
        converters::tick_converters(&mut converters, 1.0, 1.0, &mut store, 10_000);
    }
    assert_eq!(store.get("planks"), 0.0);

    let events = converters::tick_converters(&mut converters, 1.0, 1.0, &mut store, 10_000);

    assert_eq!(events[0].operations, 1);
    assert_eq!(store.get("wood"), 98.0);
    assert_eq!(store.get("planks"), 1.0);
    assert!(converters[0].accumulator.abs() < 1e-9);
}

#[test]
fn test_converter_never_partially_consumes() {
    let data = GameData::imperium();
    let mut toolsmith = Converter::from_data(data.get_converter("toolsmith").unwrap());
    toolsmith.owned = 10;
    toolsmith.active = true;
    let mut store = uncapped_store(&[("iron", 100.0), ("planks", 0.0), ("tools", 0.0)]);

    converters::tick_converters(std::slice::from_mut(&mut toolsmith), 1.0, 1.0, &mut store, 10_000);

    assert_eq!(store.get("iron"), 100.0);
    assert_eq!(store.get("tools"), 0.0);
}

// =============================================================================
// Offline progress
// =============================================================================

#[test]
fn test_one_hour_offline_at_one_per_second() {
    let mut generator = Generator::from_data(&GeneratorData {
        id: "well".to_string(),
        name: String::new(),
        produces: Some(ResourceKind::from("water")),
        base_output: 1.0,
        base_cost: cost(&[("coins", 1.0)]),
        unlocked: true,
        unlock_when: Default::default(),
        requires: Vec::new(),
        sells: false,
    });
    generator.owned = 1;
    let store = uncapped_store(&[("water", 0.0)]);

    let report = offline::compute_offline_progress(&[generator], &[], &store, 1.0, 3600.0, &OfflineRules::default(), 10.0, &Scarcity::default());

    assert_eq!(report.delta("water"), 3600.0);
    assert_eq!(store.get("water"), 0.0);
}

// =============================================================================
// Purchases
// =============================================================================

#[test]
fn test_failed_purchase_changes_nothing() {
    let mut sim = fixtures::with_starting(&[("coins", 49.0), ("wood", 100.0)]);
    let amounts = sim.store().amounts();

    let result = sim.purchase_generator("miner");

    assert!(matches!(result, Err(ActionError::InsufficientResources { .. })));
    assert_eq!(sim.generator("miner").unwrap().owned, 0);
    assert_eq!(sim.store().amounts(), amounts);
}

#[test]
fn test_generator_costs_grow_per_unit() {
    let mut sim = fixtures::with_starting(&[("coins", 1000.0)]);
    let first = sim.purchase_generator("woodcutter").unwrap();
    let second = sim.purchase_generator("woodcutter").unwrap();
    let third = sim.purchase_generator("woodcutter").unwrap();

    assert_eq!(first.paid[&ResourceKind::from("coins")], 10.0);
    assert_eq!(second.paid[&ResourceKind::from("coins")], 11.0);
    assert_eq!(third.paid[&ResourceKind::from("coins")], 13.0);
}
