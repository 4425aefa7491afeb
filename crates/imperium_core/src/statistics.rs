//! Lifetime statistics. Survive prestige resets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cost::CostMap;
use crate::resources::ResourceKind;

/// Counters over the whole game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    /// Manual collections.
    pub total_clicks: u64,
    /// Amount gained per resource, from any source.
    pub resources_gained: BTreeMap<ResourceKind, f64>,
    /// Amount spent per resource on purchases and converter inputs.
    pub resources_spent: BTreeMap<ResourceKind, f64>,
    /// Highest displayed production rate seen per resource.
    pub highest_production: BTreeMap<ResourceKind, f64>,
    /// Generator units bought.
    pub generators_purchased: u64,
    /// Converter units bought.
    pub converters_purchased: u64,
    /// Upgrades bought.
    pub upgrades_purchased: u64,
    /// Storage levels bought.
    pub storage_upgrades: u64,
    /// Whole converter operations run, live and offline.
    pub converter_operations: u64,
    /// Currency earned on the market.
    pub market_earned: f64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Seconds credited by offline catch-up.
    pub offline_seconds: f64,
}

impl Statistics {
    /// Record a gain of `amount` (ignored when not positive).
    pub fn record_gain(&mut self, kind: &ResourceKind, amount: f64) {
        if amount > 0.0 {
            *self.resources_gained.entry(kind.clone()).or_default() += amount;
        }
    }

    /// Record spending of every entry in `cost`.
    pub fn record_spent(&mut self, cost: &CostMap) {
        for (kind, amount) in cost {
            if *amount > 0.0 {
                *self.resources_spent.entry(kind.clone()).or_default() += amount;
            }
        }
    }

    /// Record a signed delta as gain or spending.
    pub fn record_delta(&mut self, kind: &ResourceKind, delta: f64) {
        if delta > 0.0 {
            self.record_gain(kind, delta);
        } else if delta < 0.0 {
            *self.resources_spent.entry(kind.clone()).or_default() -= delta;
        }
    }

    /// Keep the peak of each displayed rate.
    pub fn observe_rate(&mut self, kind: &ResourceKind, rate: f64) {
        let peak = self.highest_production.entry(kind.clone()).or_default();
        if rate > *peak {
            *peak = rate;
        }
    }

    /// Total gained of `kind`.
    #[must_use]
    pub fn gained(&self, kind: &str) -> f64 {
        self.resources_gained.get(kind).copied().unwrap_or(0.0)
    }

    /// Total spent of `kind`.
    #[must_use]
    pub fn spent(&self, kind: &str) -> f64 {
        self.resources_spent.get(kind).copied().unwrap_or(0.0)
    }
}
