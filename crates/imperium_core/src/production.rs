//! Production aggregator.
//!
//! Recomputes the net per-second rate of every resource for display. Rates
//! are an estimate: converters are counted as if their inputs were
//! available, and nothing here changes an amount.

use std::collections::BTreeMap;

use crate::converters::Converter;
use crate::generators::Generator;
use crate::resources::{ResourceKind, ResourceStore};
use crate::scarcity::Scarcity;

/// Net per-second rate per resource.
pub type RateMap = BTreeMap<ResourceKind, f64>;

/// Net rates from generators and running converters.
///
/// Generators below their dependency threshold contribute nothing, the
/// same way they are skipped during a tick.
#[must_use]
pub fn aggregate_rates(
    generators: &[Generator],
    converters: &[Converter],
    global_multiplier: f64,
    store: &ResourceStore,
    threshold: f64,
    scarcity: &Scarcity,
) -> RateMap {
    let mut rates = RateMap::new();

    for generator in generators {
        if !generator.is_producing(store, threshold) {
            continue;
        }
        if let Some(kind) = &generator.produces {
            *rates.entry(kind.clone()).or_default() += generator.current_output(global_multiplier, scarcity);
        }
    }

    for converter in converters.iter().filter(|c| c.is_running()) {
        let ops = converter.ops_per_second(global_multiplier);
        for (kind, amount) in &converter.input {
            *rates.entry(kind.clone()).or_default() -= amount * ops;
        }
        for (kind, amount) in &converter.output {
            *rates.entry(kind.clone()).or_default() += amount * ops;
        }
    }

    rates
}

/// Write `rates` into the store. Tracked kinds missing from `rates` get 0.
pub fn write_rates(store: &mut ResourceStore, rates: &RateMap) {
    let kinds: Vec<ResourceKind> = store.kinds().cloned().collect();
    for kind in kinds {
        let rate = rates.get(&kind).copied().unwrap_or(0.0);
        store.set_production_rate(&kind, rate);
    }
    for (kind, rate) in rates {
        if !store.contains(kind.as_str()) {
            store.set_production_rate(kind, *rate);
        }
    }
}
