//! Offline-progress calculator.
//!
//! Replays the time a game was closed in one bulk step instead of ticking.
//! The computation is pure: it works on a copy of the store and returns a
//! report that the caller applies. Converter accumulators are not touched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::converters::{self, Converter};
use crate::generators::Generator;
use crate::resources::{ResourceKind, ResourceStore};
use crate::scarcity::Scarcity;

/// Offline catch-up tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfflineRules {
    /// Longest absence credited, in seconds.
    #[serde(default = "default_max_seconds")]
    pub max_seconds: f64,
    /// Absences up to this many seconds are ignored.
    #[serde(default = "default_min_threshold_seconds")]
    pub min_threshold_seconds: f64,
    /// Fraction of normal output earned while away.
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
    /// Most whole operations one converter may run in a catch-up.
    #[serde(default = "default_max_operations_per_converter")]
    pub max_operations_per_converter: u64,
}

const fn default_max_seconds() -> f64 {
    43_200.0
}

const fn default_min_threshold_seconds() -> f64 {
    30.0
}

const fn default_efficiency() -> f64 {
    1.0
}

const fn default_max_operations_per_converter() -> u64 {
    1_000_000
}

impl Default for OfflineRules {
    fn default() -> Self {
        Self {
            max_seconds: default_max_seconds(),
            min_threshold_seconds: default_min_threshold_seconds(),
            efficiency: default_efficiency(),
            max_operations_per_converter: default_max_operations_per_converter(),
        }
    }
}

/// Seconds of offline progress owed between two epoch-millisecond stamps.
///
/// Whole seconds, capped at `max_seconds`. A missing or future save stamp
/// yields 0, as does an absence at or below the threshold.
#[must_use]
pub fn elapsed_offline_seconds(now_ms: f64, last_save_ms: Option<f64>, rules: &OfflineRules) -> f64 {
    let Some(last) = last_save_ms else {
        return 0.0;
    };
    if !now_ms.is_finite() || !last.is_finite() || last > now_ms {
        return 0.0;
    }

    let elapsed = ((now_ms - last) / 1000.0).floor().min(rules.max_seconds);
    if elapsed <= rules.min_threshold_seconds {
        0.0
    } else {
        elapsed
    }
}

/// What an offline catch-up would change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfflineReport {
    /// Seconds credited.
    pub elapsed_seconds: f64,
    /// Net change per resource.
    pub resource_deltas: BTreeMap<ResourceKind, f64>,
    /// Whole operations run per converter.
    pub converter_operations: BTreeMap<String, u64>,
    /// Net change per resource deposit.
    #[serde(default)]
    pub deposit_deltas: BTreeMap<ResourceKind, f64>,
}

impl OfflineReport {
    /// Net change of `kind`, 0 when untouched.
    #[must_use]
    pub fn delta(&self, kind: &str) -> f64 {
        self.resource_deltas.get(kind).copied().unwrap_or(0.0)
    }

    /// Whether applying the report would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resource_deltas.values().all(|d| *d == 0.0) && self.deposit_deltas.values().all(|d| *d == 0.0)
    }

    /// Add every delta to `store`.
    pub fn apply(&self, store: &mut ResourceStore) {
        for (kind, delta) in &self.resource_deltas {
            store.add(kind, *delta);
        }
    }
}

/// Compute the progress of `elapsed_seconds` away.
///
/// Generators produce in bulk first, their dependencies and deposit
/// efficiency judged against the state at the start. Each running
/// converter then runs as many whole operations as its speed, the stock
/// and the per-converter bound allow. Deposits lose what generators added
/// and regenerate over the whole absence.
#[must_use]
pub fn compute_offline_progress(
    generators: &[Generator],
    converters: &[Converter],
    store: &ResourceStore,
    global_multiplier: f64,
    elapsed_seconds: f64,
    rules: &OfflineRules,
    threshold: f64,
    scarcity: &Scarcity,
) -> OfflineReport {
    let mut report = OfflineReport::default();
    if !elapsed_seconds.is_finite() || elapsed_seconds <= 0.0 {
        return report;
    }
    report.elapsed_seconds = elapsed_seconds;

    let effective = elapsed_seconds * rules.efficiency;
    let mut working = store.clone();

    let mut extracted: BTreeMap<ResourceKind, f64> = BTreeMap::new();
    for generator in generators {
        if !generator.is_producing(store, threshold) {
            continue;
        }
        if let Some(kind) = &generator.produces {
            let added = working.add(kind, generator.current_output(global_multiplier, scarcity) * effective);
            *extracted.entry(kind.clone()).or_default() += added;
        }
    }

    let bound = rules.max_operations_per_converter as f64;
    for converter in converters.iter().filter(|c| c.is_running()) {
        let by_time = converters::whole_operations(converter.ops_per_second(global_multiplier) * effective);
        let operations = by_time.min(converter.sustainable_operations(&working)).min(bound);
        if operations >= 1.0 {
            converter.run_operations(&mut working, operations);
            report
                .converter_operations
                .insert(converter.id.clone(), operations as u64);
        }
    }

    for (kind, resource) in working.iter() {
        let delta = resource.amount - store.get(kind.as_str());
        if delta != 0.0 {
            report.resource_deltas.insert(kind.clone(), delta);
        }
    }
    report.deposit_deltas = scarcity.bulk_deltas(&extracted, elapsed_seconds);

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{cost, ConverterData, GeneratorData};

    fn generator(id: &str, produces: &str, output: f64, owned: u32) -> Generator {
        let mut g = Generator::from_data(&GeneratorData {
            id: id.to_string(),
            name: String::new(),
            produces: Some(ResourceKind::from(produces)),
            base_output: output,
            base_cost: cost(&[("coins", 10.0)]),
            unlocked: true,
            unlock_when: cost(&[]),
            requires: Vec::new(),
            sells: false,
        });
        g.owned = owned;
        g
    }

    fn sawmill() -> Converter {
        let mut c = Converter::from_data(&ConverterData {
            id: "sawmill".to_string(),
            name: String::new(),
            input: cost(&[("wood", 2.0)]),
            output: cost(&[("planks", 1.0)]),
            base_speed: 0.2,
            base_cost: cost(&[("coins", 100.0)]),
            unlocked: true,
            unlock_when: cost(&[]),
        });
        c.owned = 1;
        c.active = true;
        c
    }

    #[test]
    fn test_one_hour_of_one_per_second() {
        let gens = [generator("bank", "coins", 1.0, 1)];
        let report = compute_offline_progress(
            &gens,
            &[],
            &ResourceStore::new(),
            1.0,
            3600.0,
            &OfflineRules::default(),
            10.0,
            &Scarcity::default(),
        );
        assert_eq!(report.delta("coins"), 3600.0);
    }

    #[test]
    fn test_zero_elapsed_is_empty() {
        let gens = [generator("bank", "coins", 1.0, 3)];
        let report = compute_offline_progress(
            &gens,
            &[sawmill()],
            &ResourceStore::new(),
            1.0,
            0.0,
            &OfflineRules::default(),
            10.0,
            &Scarcity::default(),
        );
        assert!(report.is_empty());
        assert!(report.converter_operations.is_empty());
    }

    #[test]
    fn test_converter_limited_by_stock() {
        let mut store = ResourceStore::new();
        store.add(&ResourceKind::from("wood"), 7.0);

        // 100 s at 0.2/s allows 20 operations, 7 wood only 3
        let report = compute_offline_progress(&[], &[sawmill()], &store, 1.0, 100.0, &OfflineRules::default(), 10.0, &Scarcity::default());

        assert_eq!(report.converter_operations["sawmill"], 3);
        assert_eq!(report.delta("wood"), -6.0);
        assert_eq!(report.delta("planks"), 3.0);
    }

    #[test]
    fn test_converter_uses_generator_output() {
        let gens = [generator("woodcutter", "wood", 0.5, 2)];
        let report = compute_offline_progress(
            &gens,
            &[sawmill()],
            &ResourceStore::new(),
            1.0,
            100.0,
            &OfflineRules::default(),
            10.0,
            &Scarcity::default(),
        );

        assert_eq!(report.converter_operations["sawmill"], 20);
        assert_eq!(report.delta("wood"), 60.0);
        assert_eq!(report.delta("planks"), 20.0);
    }

    #[test]
    fn test_efficiency_scales_output() {
        let rules = OfflineRules {
            efficiency: 0.5,
            ..OfflineRules::default()
        };
        let gens = [generator("bank", "coins", 2.0, 1)];
        let report = compute_offline_progress(&gens, &[], &ResourceStore::new(), 1.0, 100.0, &rules, 10.0, &Scarcity::default());
        assert_eq!(report.delta("coins"), 100.0);
    }

    #[test]
    fn test_operation_bound() {
        let rules = OfflineRules {
            max_operations_per_converter: 5,
            ..OfflineRules::default()
        };
        let mut store = ResourceStore::new();
        store.add(&ResourceKind::from("wood"), 1000.0);
        let report = compute_offline_progress(&[], &[sawmill()], &store, 1.0, 1000.0, &rules, 10.0, &Scarcity::default());
        assert_eq!(report.converter_operations["sawmill"], 5);
    }

    #[test]
    fn test_operation_count_matches_live_ticks() {
        let mill = Converter {
            base_speed: 0.29,
            ..sawmill()
        };
        let mut store = ResourceStore::new();
        store.add(&ResourceKind::from("wood"), 1000.0);

        let report = compute_offline_progress(
            &[],
            std::slice::from_ref(&mill),
            &store,
            1.0,
            100.0,
            &OfflineRules::default(),
            10.0,
            &Scarcity::default(),
        );

        let mut live = vec![mill];
        let mut live_store = store.clone();
        let live_ops: u32 = (0..100)
            .flat_map(|_| converters::tick_converters(&mut live, 1.0, 1.0, &mut live_store, 10_000))
            .map(|e| e.operations)
            .sum();

        assert_eq!(live_ops, 29);
        assert_eq!(report.converter_operations["sawmill"], u64::from(live_ops));
    }

    #[test]
    fn test_stock_bound_matches_live_ticks() {
        let mill = Converter {
            input: cost(&[("wood", 0.2)]),
            ..sawmill()
        };
        let mut store = ResourceStore::new();
        store.add(&ResourceKind::from("wood"), 0.6);

        let report = compute_offline_progress(&[], &[mill], &store, 1.0, 100.0, &OfflineRules::default(), 10.0, &Scarcity::default());
        assert_eq!(report.converter_operations["sawmill"], 3);
        assert_eq!(report.delta("planks"), 3.0);
    }

    #[test]
    fn test_scarce_deposit_limits_output() {
        use crate::scarcity::{DepositData, ScarcityRules};

        let rules = ScarcityRules {
            deposits: vec![DepositData::new("wood", 1000.0, 0.006)],
            ..ScarcityRules::default()
        };
        let mut scarcity = Scarcity::new(&rules);
        scarcity.deplete("wood", 750.0);
        let gens = [generator("woodcutter", "wood", 0.5, 2)];

        let report = compute_offline_progress(
            &gens,
            &[],
            &ResourceStore::new(),
            1.0,
            100.0,
            &OfflineRules::default(),
            10.0,
            &scarcity,
        );

        // efficiency 0.6 at a quarter left, regeneration 0.1 per second
        assert!((report.delta("wood") - 60.0).abs() < 1e-9);
        assert!((report.deposit_deltas[&ResourceKind::from("wood")] + 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_clock_anomalies() {
        let rules = OfflineRules::default();
        assert_eq!(elapsed_offline_seconds(10_000.0, None, &rules), 0.0);
        assert_eq!(elapsed_offline_seconds(10_000.0, Some(20_000.0), &rules), 0.0);
        assert_eq!(elapsed_offline_seconds(f64::NAN, Some(0.0), &rules), 0.0);
    }

    #[test]
    fn test_elapsed_threshold_and_cap() {
        let rules = OfflineRules::default();
        assert_eq!(elapsed_offline_seconds(30_000.0, Some(0.0), &rules), 0.0);
        assert_eq!(elapsed_offline_seconds(31_500.0, Some(0.0), &rules), 31.0);
        assert_eq!(elapsed_offline_seconds(1e12, Some(0.0), &rules), 43_200.0);
    }
}
