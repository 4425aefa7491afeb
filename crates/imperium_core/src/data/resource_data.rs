//! Resource kind definitions.

use serde::{Deserialize, Serialize};

use crate::cost::CostMap;
use crate::resources::ResourceKind;

/// Data-driven resource definition.
///
/// # Example RON
///
/// ```ron
/// ResourceData(
///     id: "wood",
///     name: "Holz",
///     base_cap: Some(1000.0),
///     storage_upgrade_cost: { "wood": 10.0 },
///     sell_price: Some(1.0),
///     click_value: 1.0,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    /// Resource kind this entry defines.
    pub id: ResourceKind,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Amount held at game start and after a prestige reset.
    #[serde(default)]
    pub starting_amount: f64,

    /// Storage cap at level 0. `None` means unbounded.
    #[serde(default)]
    pub base_cap: Option<f64>,

    /// Cap growth per storage level.
    #[serde(default = "default_cap_growth")]
    pub cap_growth: f64,

    /// Cost of the first storage upgrade. Empty means the cap cannot be raised.
    #[serde(default)]
    pub storage_upgrade_cost: CostMap,

    /// Base market price per unit. `None` means the resource cannot be sold.
    #[serde(default)]
    pub sell_price: Option<f64>,

    /// Whether the amount survives a prestige reset.
    #[serde(default)]
    pub keep_on_prestige: bool,

    /// Amount gained per manual collection before multipliers.
    #[serde(default)]
    pub click_value: f64,
}

const fn default_cap_growth() -> f64 {
    1.5
}

impl ResourceData {
    /// Create a definition with every optional field at its default.
    #[must_use]
    pub fn new(id: impl Into<ResourceKind>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            starting_amount: 0.0,
            base_cap: None,
            cap_growth: default_cap_growth(),
            storage_upgrade_cost: CostMap::new(),
            sell_price: None,
            keep_on_prestige: false,
            click_value: 0.0,
        }
    }

    /// Cap after `level` storage upgrades.
    #[must_use]
    pub fn cap_at(&self, level: u32) -> Option<f64> {
        self.base_cap
            .map(|cap| cap * self.cap_growth.powi(level.min(i32::MAX as u32) as i32))
    }

    /// Whether the storage cap can be raised.
    #[must_use]
    pub fn is_upgradable(&self) -> bool {
        self.base_cap.is_some() && !self.storage_upgrade_cost.is_empty()
    }

    /// Whether the market buys this resource.
    #[must_use]
    pub fn is_sellable(&self) -> bool {
        self.sell_price.is_some()
    }
}
