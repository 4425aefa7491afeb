//! Persisted save-game shape and tolerant restore.
//!
//! A [`Snapshot`] is plain data meant for JSON storage. Every field has a
//! default and unknown fields are ignored, so old or hand-edited saves
//! load. Numbers are read leniently: `null`, strings or any other
//! non-number where a number belongs decode as NaN and get clamped on
//! restore. Restore always starts from a fresh game and copies over what
//! it recognises; anything it cannot use is reported in a [`RestoreReport`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cost::CostMap;
use crate::error::{GameError, Result};
use crate::resources::ResourceKind;
use crate::simulation::Simulation;
use crate::statistics::Statistics;
use crate::upgrades::{self, EffectTargets};

/// Snapshot format version written by this crate.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Saved state of one generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorSnapshot {
    /// Generator id.
    pub id: String,
    /// Units owned.
    #[serde(deserialize_with = "lenient::number")]
    pub owned_count: f64,
    /// Cost of the next unit when saved. Informational only.
    #[serde(deserialize_with = "lenient::numbers")]
    pub cost: CostMap,
    /// Unlock state, `None` keeps the configured default.
    pub unlocked: Option<bool>,
}

/// Saved state of one converter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConverterSnapshot {
    /// Converter id.
    pub id: String,
    /// Units owned.
    #[serde(deserialize_with = "lenient::number")]
    pub owned_count: f64,
    /// On/off switch.
    pub active: bool,
    /// Fractional operation credit.
    #[serde(deserialize_with = "lenient::number")]
    pub accumulator: f64,
    /// Cost of the next unit when saved. Informational only.
    #[serde(deserialize_with = "lenient::numbers")]
    pub cost: CostMap,
    /// Unlock state, `None` keeps the configured default.
    pub unlocked: Option<bool>,
}

/// Saved state of one upgrade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpgradeSnapshot {
    /// Upgrade id.
    pub id: String,
    /// Whether it was bought.
    pub purchased: bool,
    /// Unlock state, `None` keeps the configured default.
    pub unlocked: Option<bool>,
}

/// Saved lifetime statistics. Counters are plain numbers so that bad
/// values can be clamped instead of failing the load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatisticsSnapshot {
    /// Manual collections.
    #[serde(deserialize_with = "lenient::number")]
    pub total_clicks: f64,
    /// Amount gained per resource.
    #[serde(deserialize_with = "lenient::numbers")]
    pub resources_gained: BTreeMap<String, f64>,
    /// Amount spent per resource.
    #[serde(deserialize_with = "lenient::numbers")]
    pub resources_spent: BTreeMap<String, f64>,
    /// Peak displayed rate per resource.
    #[serde(deserialize_with = "lenient::numbers")]
    pub highest_production: BTreeMap<String, f64>,
    /// Generator units bought.
    #[serde(deserialize_with = "lenient::number")]
    pub generators_purchased: f64,
    /// Converter units bought.
    #[serde(deserialize_with = "lenient::number")]
    pub converters_purchased: f64,
    /// Upgrades bought.
    #[serde(deserialize_with = "lenient::number")]
    pub upgrades_purchased: f64,
    /// Storage levels bought.
    #[serde(deserialize_with = "lenient::number")]
    pub storage_upgrades: f64,
    /// Whole converter operations run.
    #[serde(deserialize_with = "lenient::number")]
    pub converter_operations: f64,
    /// Currency earned on the market.
    #[serde(deserialize_with = "lenient::number")]
    pub market_earned: f64,
    /// Ticks simulated.
    #[serde(deserialize_with = "lenient::number")]
    pub ticks: f64,
    /// Seconds credited by offline catch-up.
    #[serde(deserialize_with = "lenient::number")]
    pub offline_seconds: f64,
}

impl From<&Statistics> for StatisticsSnapshot {
    fn from(stats: &Statistics) -> Self {
        let named = |map: &BTreeMap<ResourceKind, f64>| map.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        Self {
            total_clicks: stats.total_clicks as f64,
            resources_gained: named(&stats.resources_gained),
            resources_spent: named(&stats.resources_spent),
            highest_production: named(&stats.highest_production),
            generators_purchased: stats.generators_purchased as f64,
            converters_purchased: stats.converters_purchased as f64,
            upgrades_purchased: stats.upgrades_purchased as f64,
            storage_upgrades: stats.storage_upgrades as f64,
            converter_operations: stats.converter_operations as f64,
            market_earned: stats.market_earned,
            ticks: stats.ticks as f64,
            offline_seconds: stats.offline_seconds,
        }
    }
}

/// Saved deposit state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScarcitySnapshot {
    /// Switch state, `None` keeps the configured default.
    pub enabled: Option<bool>,
    /// Remaining units per deposit.
    #[serde(deserialize_with = "lenient::numbers")]
    pub deposits: BTreeMap<String, f64>,
}

/// Complete save game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,
    /// Amount per resource kind.
    #[serde(deserialize_with = "lenient::numbers")]
    pub resources: BTreeMap<String, f64>,
    /// Generators.
    pub generators: Vec<GeneratorSnapshot>,
    /// Converters.
    pub converters: Vec<ConverterSnapshot>,
    /// Upgrades.
    pub upgrades: Vec<UpgradeSnapshot>,
    /// Global multiplier.
    #[serde(deserialize_with = "lenient::number")]
    pub prestige_multiplier: f64,
    /// Prestige points.
    #[serde(deserialize_with = "lenient::number")]
    pub prestige_points: f64,
    /// Prestige resets.
    #[serde(deserialize_with = "lenient::number")]
    pub prestige_resets: f64,
    /// Click value per resource. Empty keeps the values implied by upgrades.
    #[serde(deserialize_with = "lenient::numbers")]
    pub click_values: BTreeMap<String, f64>,
    /// Storage level per resource.
    #[serde(deserialize_with = "lenient::numbers")]
    pub storage_levels: BTreeMap<String, f64>,
    /// Resources being sold.
    pub market_sales: Vec<String>,
    /// Awarded achievements.
    pub achievements: Vec<String>,
    /// Lifetime statistics.
    pub statistics: StatisticsSnapshot,
    /// Deposits.
    pub scarcity: ScarcitySnapshot,
    /// Tick counter.
    #[serde(deserialize_with = "lenient::number")]
    pub tick: f64,
    /// Save time in epoch milliseconds. Anything but a finite number reads
    /// as missing.
    #[serde(deserialize_with = "lenient::timestamp")]
    pub last_save_timestamp: Option<f64>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            resources: BTreeMap::new(),
            generators: Vec::new(),
            converters: Vec::new(),
            upgrades: Vec::new(),
            prestige_multiplier: 1.0,
            prestige_points: 0.0,
            prestige_resets: 0.0,
            click_values: BTreeMap::new(),
            storage_levels: BTreeMap::new(),
            market_sales: Vec::new(),
            achievements: Vec::new(),
            statistics: StatisticsSnapshot::default(),
            scarcity: ScarcitySnapshot::default(),
            tick: 0.0,
            last_save_timestamp: None,
        }
    }
}

impl Snapshot {
    /// Parse a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// [`GameError::SnapshotParse`] if the text is not a JSON object of
    /// the expected shape.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GameError::SnapshotParse(e.to_string()))
    }

    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// [`GameError::SnapshotEncode`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GameError::SnapshotEncode(e.to_string()))
    }
}

mod lenient {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn as_number(value: &Value) -> f64 {
        value.as_f64().unwrap_or(f64::NAN)
    }

    /// Any number; everything else reads as NaN.
    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Value::deserialize(deserializer).map(|v| as_number(&v))
    }

    /// A map of numbers. A non-object reads as empty and non-number
    /// entries as NaN.
    pub fn numbers<'de, D, K>(deserializer: D) -> Result<BTreeMap<K, f64>, D::Error>
    where
        D: Deserializer<'de>,
        K: From<String> + Ord,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Object(entries) => entries.into_iter().map(|(k, v)| (K::from(k), as_number(&v))).collect(),
            _ => BTreeMap::new(),
        })
    }

    /// A finite number or nothing.
    pub fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Value::deserialize(deserializer).map(|v| v.as_f64().filter(|t| t.is_finite()))
    }
}

/// What a restore could not use as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Resource kinds not defined by the game data.
    pub unknown_resources: Vec<String>,
    /// Generator ids not defined by the game data.
    pub unknown_generators: Vec<String>,
    /// Converter ids not defined by the game data.
    pub unknown_converters: Vec<String>,
    /// Upgrade ids not defined by the game data.
    pub unknown_upgrades: Vec<String>,
    /// Achievement ids not defined by the game data.
    pub unknown_achievements: Vec<String>,
    /// Values that were negative, non-finite or out of range and got clamped.
    pub clamped_values: u32,
}

impl RestoreReport {
    /// Whether the snapshot was used without any correction.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unknown_resources.is_empty()
            && self.unknown_generators.is_empty()
            && self.unknown_converters.is_empty()
            && self.unknown_upgrades.is_empty()
            && self.unknown_achievements.is_empty()
            && self.clamped_values == 0
    }

    fn amount(&mut self, value: f64) -> f64 {
        if value.is_finite() && value >= 0.0 {
            value
        } else {
            self.clamped_values += 1;
            0.0
        }
    }

    fn whole(&mut self, value: f64, max: f64) -> f64 {
        let amount = self.amount(value);
        if amount.fract() != 0.0 || amount > max {
            self.clamped_values += 1;
        }
        amount.floor().min(max)
    }

    fn count(&mut self, value: f64) -> u32 {
        self.whole(value, f64::from(u32::MAX)) as u32
    }

    fn counter(&mut self, value: f64) -> u64 {
        self.whole(value, u64::MAX as f64) as u64
    }

    fn amounts(&mut self, map: &BTreeMap<String, f64>) -> BTreeMap<ResourceKind, f64> {
        map.iter()
            .map(|(kind, value)| (ResourceKind::from(kind.as_str()), self.amount(*value)))
            .collect()
    }

    fn statistics(&mut self, saved: &StatisticsSnapshot) -> Statistics {
        Statistics {
            total_clicks: self.counter(saved.total_clicks),
            resources_gained: self.amounts(&saved.resources_gained),
            resources_spent: self.amounts(&saved.resources_spent),
            highest_production: self.amounts(&saved.highest_production),
            generators_purchased: self.counter(saved.generators_purchased),
            converters_purchased: self.counter(saved.converters_purchased),
            upgrades_purchased: self.counter(saved.upgrades_purchased),
            storage_upgrades: self.counter(saved.storage_upgrades),
            converter_operations: self.counter(saved.converter_operations),
            market_earned: self.amount(saved.market_earned),
            ticks: self.counter(saved.ticks),
            offline_seconds: self.amount(saved.offline_seconds),
        }
    }
}

impl Simulation {
    /// Capture the persistable state, stamped with `now_ms`.
    #[must_use]
    pub fn serialize(&self, now_ms: f64) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            resources: self
                .store
                .iter()
                .map(|(kind, r)| (kind.to_string(), r.amount))
                .collect(),
            generators: self
                .generators
                .iter()
                .map(|g| GeneratorSnapshot {
                    id: g.id.clone(),
                    owned_count: f64::from(g.owned),
                    cost: g.current_cost.clone(),
                    unlocked: Some(g.unlocked),
                })
                .collect(),
            converters: self
                .converters
                .iter()
                .map(|c| ConverterSnapshot {
                    id: c.id.clone(),
                    owned_count: f64::from(c.owned),
                    active: c.active,
                    accumulator: c.accumulator,
                    cost: c.current_cost.clone(),
                    unlocked: Some(c.unlocked),
                })
                .collect(),
            upgrades: self
                .upgrades
                .iter()
                .map(|u| UpgradeSnapshot {
                    id: u.id.clone(),
                    purchased: u.purchased,
                    unlocked: Some(u.unlocked),
                })
                .collect(),
            prestige_multiplier: self.prestige.multiplier,
            prestige_points: self.prestige.points as f64,
            prestige_resets: f64::from(self.prestige.resets),
            click_values: self
                .click_values
                .iter()
                .map(|(kind, value)| (kind.to_string(), *value))
                .collect(),
            storage_levels: self
                .storage_levels
                .iter()
                .map(|(kind, level)| (kind.to_string(), f64::from(*level)))
                .collect(),
            market_sales: self.selling.iter().map(ToString::to_string).collect(),
            achievements: self.achieved.iter().cloned().collect(),
            statistics: StatisticsSnapshot::from(&self.statistics),
            scarcity: ScarcitySnapshot {
                enabled: Some(self.scarcity.is_enabled()),
                deposits: self
                    .scarcity
                    .deposits()
                    .iter()
                    .map(|(kind, remaining)| (kind.to_string(), *remaining))
                    .collect(),
            },
            tick: self.tick as f64,
            last_save_timestamp: Some(now_ms),
        }
    }

    /// Encode [`serialize`](Self::serialize) as JSON.
    ///
    /// # Errors
    ///
    /// [`GameError::SnapshotEncode`] if encoding fails.
    pub fn to_json(&self, now_ms: f64) -> Result<String> {
        self.serialize(now_ms).to_json()
    }

    /// Replace the current state with `snapshot`.
    ///
    /// Starts from a fresh game built from the same data, so anything the
    /// snapshot lacks takes its starting value. Unknown ids are skipped and
    /// bad numbers clamped; both are counted in the returned report. Owned
    /// counts decide costs; saved costs are ignored.
    pub fn restore(&mut self, snapshot: &Snapshot) -> RestoreReport {
        let mut report = RestoreReport::default();
        let mut fresh = match Self::new(self.data.clone()) {
            Ok(sim) => sim,
            Err(err) => {
                tracing::error!(error = %err, "Game data no longer valid, restore skipped");
                return report;
            }
        };
        fresh.restore_into(snapshot, &mut report);
        *self = fresh;

        if !report.is_clean() {
            tracing::warn!(
                unknown_resources = ?report.unknown_resources,
                unknown_generators = ?report.unknown_generators,
                unknown_converters = ?report.unknown_converters,
                unknown_upgrades = ?report.unknown_upgrades,
                unknown_achievements = ?report.unknown_achievements,
                clamped_values = report.clamped_values,
                "Snapshot restored with corrections"
            );
        }
        report
    }

    /// Parse JSON and [`restore`](Self::restore) it.
    ///
    /// # Errors
    ///
    /// [`GameError::SnapshotParse`] if the JSON cannot be parsed. The
    /// simulation is left untouched in that case.
    pub fn restore_json(&mut self, json: &str) -> Result<RestoreReport> {
        let snapshot = Snapshot::from_json(json)?;
        Ok(self.restore(&snapshot))
    }

    fn restore_into(&mut self, snapshot: &Snapshot, report: &mut RestoreReport) {
        let generator_multiplier = self.data.cost_scaling.generator;
        for saved in &snapshot.generators {
            let owned = report.count(saved.owned_count);
            match self.generators.iter_mut().find(|g| g.id == saved.id) {
                Some(generator) => {
                    generator.owned = owned;
                    generator.unlocked = saved.unlocked.unwrap_or(generator.unlocked);
                    generator.refresh_cost(generator_multiplier);
                }
                None => report.unknown_generators.push(saved.id.clone()),
            }
        }

        let converter_multiplier = self.data.cost_scaling.converter;
        for saved in &snapshot.converters {
            let owned = report.count(saved.owned_count);
            let accumulator = report.amount(saved.accumulator);
            match self.converters.iter_mut().find(|c| c.id == saved.id) {
                Some(converter) => {
                    converter.owned = owned;
                    converter.active = saved.active;
                    converter.accumulator = accumulator;
                    converter.unlocked = saved.unlocked.unwrap_or(converter.unlocked);
                    converter.refresh_cost(converter_multiplier);
                }
                None => report.unknown_converters.push(saved.id.clone()),
            }
        }

        for saved in &snapshot.upgrades {
            let Some(upgrade) = self.upgrades.iter_mut().find(|u| u.id == saved.id) else {
                report.unknown_upgrades.push(saved.id.clone());
                continue;
            };
            upgrade.unlocked = saved.unlocked.unwrap_or(upgrade.unlocked);
            if saved.purchased && !upgrade.purchased {
                upgrade.purchased = true;
                let mut targets = EffectTargets {
                    generators: &mut self.generators,
                    converters: &mut self.converters,
                    click_values: &mut self.click_values,
                };
                upgrades::apply_effect(&upgrade.effect, &mut targets);
            }
        }

        for (kind, value) in &snapshot.click_values {
            let value = report.amount(*value);
            match self.data.get_resource(kind) {
                Some(resource) => {
                    self.click_values.insert(resource.id.clone(), value);
                }
                None => report.unknown_resources.push(kind.clone()),
            }
        }

        for (kind, level) in &snapshot.storage_levels {
            let level = report.count(*level);
            match self.data.get_resource(kind) {
                Some(resource) if resource.is_upgradable() => {
                    if level > 0 {
                        self.store.set_cap(&resource.id, resource.cap_at(level));
                        self.storage_levels.insert(resource.id.clone(), level);
                    }
                }
                Some(_) => report.clamped_values += 1,
                None => report.unknown_resources.push(kind.clone()),
            }
        }

        for (kind, amount) in &snapshot.resources {
            let amount = report.amount(*amount);
            if self.data.get_resource(kind).is_none() {
                report.unknown_resources.push(kind.clone());
                continue;
            }
            let kind = ResourceKind::from(kind.as_str());
            if let Some(cap) = self.store.resource(kind.as_str()).and_then(|r| r.cap) {
                if amount > cap {
                    report.clamped_values += 1;
                }
            }
            self.store.set(&kind, amount);
        }

        for kind in &snapshot.market_sales {
            if self.set_market_sale(kind, true).is_err() {
                report.unknown_resources.push(kind.clone());
            }
        }

        for id in &snapshot.achievements {
            if self.data.achievements.iter().any(|a| &a.id == id) {
                self.achieved.insert(id.clone());
            } else {
                report.unknown_achievements.push(id.clone());
            }
        }

        let multiplier = snapshot.prestige_multiplier;
        if multiplier.is_finite() && multiplier >= 1.0 {
            self.prestige.multiplier = multiplier;
        } else {
            report.clamped_values += 1;
            self.prestige.multiplier = 1.0;
        }
        self.prestige.points = u64::from(report.count(snapshot.prestige_points));
        self.prestige.resets = report.count(snapshot.prestige_resets);

        if let Some(enabled) = snapshot.scarcity.enabled {
            self.scarcity.set_enabled(enabled);
        }
        for (kind, remaining) in &snapshot.scarcity.deposits {
            if self.data.get_resource(kind).is_none() {
                report.unknown_resources.push(kind.clone());
                continue;
            }
            if self.scarcity.set_remaining(kind, *remaining) != Some(false) {
                report.clamped_values += 1;
            }
        }

        self.statistics = report.statistics(&snapshot.statistics);
        self.tick = report.counter(snapshot.tick);
        self.recompute_rates();
    }
}
