//! Market: continuous sale of selected resources for currency.
//!
//! Selling needs at least one market stall. More stalls sell faster and at
//! a better price, and resources with a depleted deposit fetch more.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::data::ResourceData;
use crate::resources::{ResourceKind, ResourceStore};
use crate::scarcity::Scarcity;

/// Market tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketRules {
    /// Units sold per second with one stall.
    #[serde(default = "default_base_sell_rate")]
    pub base_sell_rate: f64,
    /// Relative sell-rate gain per stall.
    #[serde(default = "default_sell_rate_growth")]
    pub sell_rate_growth: f64,
    /// Relative price gain per stall.
    #[serde(default = "default_price_growth")]
    pub price_growth: f64,
    /// Floor for the price of one unit.
    #[serde(default = "default_min_price")]
    pub min_price: f64,
}

const fn default_base_sell_rate() -> f64 {
    0.2
}

const fn default_sell_rate_growth() -> f64 {
    0.5
}

const fn default_price_growth() -> f64 {
    0.05
}

const fn default_min_price() -> f64 {
    0.1
}

impl Default for MarketRules {
    fn default() -> Self {
        Self {
            base_sell_rate: default_base_sell_rate(),
            sell_rate_growth: default_sell_rate_growth(),
            price_growth: default_price_growth(),
            min_price: default_min_price(),
        }
    }
}

impl MarketRules {
    /// Units of each selected resource sold per second with `stalls` stalls.
    #[must_use]
    pub fn sell_rate(&self, stalls: u32) -> f64 {
        let rate = self.base_sell_rate * (1.0 + self.sell_rate_growth * f64::from(stalls));
        rate.max(self.base_sell_rate)
    }

    /// Price factor with `stalls` stalls.
    #[must_use]
    pub fn price_multiplier(&self, stalls: u32) -> f64 {
        (1.0 + self.price_growth * f64::from(stalls)).max(1.0)
    }

    /// Price of one unit with base price `base` and scarcity factor `scarcity`.
    #[must_use]
    pub fn unit_price(&self, base: f64, stalls: u32, scarcity: f64) -> f64 {
        (base * self.price_multiplier(stalls) * scarcity).max(self.min_price)
    }
}

/// Sales during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSale {
    /// Units sold per resource.
    pub sold: BTreeMap<ResourceKind, f64>,
    /// Currency credited.
    pub earned: f64,
}

impl MarketSale {
    /// Whether nothing was sold.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sold.is_empty()
    }
}

fn base_price(resources: &[ResourceData], kind: &ResourceKind) -> Option<f64> {
    resources
        .iter()
        .find(|r| &r.id == kind)
        .and_then(|r| r.sell_price)
}

/// Sell every selected resource for `dt` seconds.
///
/// Never sells more than the stock. Does nothing without stalls.
pub fn process_sales(
    selling: &BTreeSet<ResourceKind>,
    resources: &[ResourceData],
    rules: &MarketRules,
    stalls: u32,
    currency: &ResourceKind,
    dt: f64,
    store: &mut ResourceStore,
    scarcity: &Scarcity,
) -> MarketSale {
    let mut sale = MarketSale::default();
    if stalls == 0 {
        return sale;
    }

    let rate = rules.sell_rate(stalls);
    for kind in selling {
        let Some(price) = base_price(resources, kind) else {
            continue;
        };
        let stock = store.get(kind.as_str());
        let amount = (rate * dt).min(stock);
        if amount <= 0.0 {
            continue;
        }

        let sold = -store.add(kind, -amount);
        let earned = sold * rules.unit_price(price, stalls, scarcity.price_multiplier(kind.as_str()));
        store.add(currency, earned);
        sale.earned += earned;
        sale.sold.insert(kind.clone(), sold);
    }

    sale
}

/// Add the steady-state market flows to per-second `rates`.
///
/// Resources without stock contribute nothing.
pub fn add_sale_rates(
    rates: &mut BTreeMap<ResourceKind, f64>,
    selling: &BTreeSet<ResourceKind>,
    resources: &[ResourceData],
    rules: &MarketRules,
    stalls: u32,
    currency: &ResourceKind,
    store: &ResourceStore,
    scarcity: &Scarcity,
) {
    if stalls == 0 {
        return;
    }
    let rate = rules.sell_rate(stalls);
    for kind in selling {
        let Some(price) = base_price(resources, kind) else {
            continue;
        };
        if store.get(kind.as_str()) <= 0.0 {
            continue;
        }
        *rates.entry(kind.clone()).or_default() -= rate;
        *rates.entry(currency.clone()).or_default() += rate * rules.unit_price(price, stalls, scarcity.price_multiplier(kind.as_str()));
    }
}
