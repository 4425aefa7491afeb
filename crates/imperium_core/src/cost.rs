//! Cost scaling and affordability checks.
//!
//! Shared by generators, converters and upgrades. Everything here is a pure
//! function over a [`CostMap`] and a [`ResourceStore`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resources::{ResourceKind, ResourceStore};

/// Price in several resources at once.
pub type CostMap = BTreeMap<ResourceKind, f64>;

/// Per-category cost growth factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostScaling {
    /// Growth per owned generator.
    #[serde(default = "default_generator_multiplier")]
    pub generator: f64,
    /// Growth per owned converter.
    #[serde(default = "default_converter_multiplier")]
    pub converter: f64,
    /// Growth per resource-level upgrade.
    #[serde(default = "default_resource_level_multiplier")]
    pub resource_level: f64,
}

const fn default_generator_multiplier() -> f64 {
    1.15
}

const fn default_converter_multiplier() -> f64 {
    1.20
}

const fn default_resource_level_multiplier() -> f64 {
    1.15
}

impl Default for CostScaling {
    fn default() -> Self {
        Self {
            generator: default_generator_multiplier(),
            converter: default_converter_multiplier(),
            resource_level: default_resource_level_multiplier(),
        }
    }
}

/// The first resource a store is short of for some cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortfall {
    /// Missing resource.
    pub resource: ResourceKind,
    /// Amount the cost asks for.
    pub required: f64,
    /// Amount in stock.
    pub available: f64,
}

/// Receipt for a successful purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// Id of what was bought.
    pub id: String,
    /// Owned count or level after the purchase.
    pub level: u32,
    /// Resources paid.
    pub paid: CostMap,
}

/// Cost of the next unit after `level` have been bought.
///
/// Each entry is `floor(base * multiplier^level)`.
#[must_use]
pub fn scaled_cost(base: &CostMap, level: u32, multiplier: f64) -> CostMap {
    let factor = multiplier.powi(level.min(i32::MAX as u32) as i32);
    base.iter()
        .map(|(kind, amount)| (kind.clone(), (amount * factor).floor()))
        .collect()
}

/// Whether `store` holds at least every amount listed in `cost`.
///
/// A kind the store does not track counts as insufficient.
#[must_use]
pub fn can_afford(cost: &CostMap, store: &ResourceStore) -> bool {
    first_shortfall(cost, store).is_none()
}

/// The first resource (in kind order) that `store` cannot cover.
#[must_use]
pub fn first_shortfall(cost: &CostMap, store: &ResourceStore) -> Option<Shortfall> {
    cost.iter().find_map(|(kind, &required)| {
        let available = store.get(kind.as_str());
        if store.contains(kind.as_str()) && available >= required {
            None
        } else {
            Some(Shortfall {
                resource: kind.clone(),
                required,
                available,
            })
        }
    })
}

/// Subtract every amount in `cost` from `store`.
///
/// Does not re-check affordability; callers run [`can_afford`] first.
pub fn deduct(cost: &CostMap, store: &mut ResourceStore) {
    for (kind, amount) in cost {
        store.add(kind, -amount);
    }
}

/// Multiply every entry of `cost` by `factor`.
#[must_use]
pub fn scale(cost: &CostMap, factor: f64) -> CostMap {
    cost.iter()
        .map(|(kind, amount)| (kind.clone(), amount * factor))
        .collect()
}
