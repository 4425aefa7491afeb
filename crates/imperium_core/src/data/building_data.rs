//! Building data structures: generators and converters.

use serde::{Deserialize, Serialize};

use crate::cost::CostMap;
use crate::resources::ResourceKind;

const fn default_unlocked() -> bool {
    true
}

/// Data-driven generator definition.
///
/// A generator produces a single resource kind per second for every unit
/// owned. A generator without a product (the market stall) can still be
/// bought and may enable selling instead.
///
/// # Example RON
///
/// ```ron
/// GeneratorData(
///     id: "iron_miner",
///     name: "Eisenmine",
///     produces: Some("iron"),
///     base_output: 0.2,
///     base_cost: { "coins": 200.0, "wood": 50.0, "stone": 50.0 },
///     requires: ["stone"],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorData {
    /// Unique string identifier for this generator.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Resource kind produced, `None` for buildings without output.
    #[serde(default)]
    pub produces: Option<ResourceKind>,

    /// Output per second of one unit before multipliers.
    #[serde(default)]
    pub base_output: f64,

    /// Cost of the first unit.
    pub base_cost: CostMap,

    /// Whether the generator can be bought from the start.
    #[serde(default = "default_unlocked")]
    pub unlocked: bool,

    /// Amounts that unlock a locked generator once all are held.
    #[serde(default)]
    pub unlock_when: CostMap,

    /// Resources that must each hold at least the production threshold
    /// for this generator to run.
    #[serde(default)]
    pub requires: Vec<ResourceKind>,

    /// Owned units of this generator count as market stalls.
    #[serde(default)]
    pub sells: bool,
}

/// Data-driven converter definition.
///
/// # Example RON
///
/// ```ron
/// ConverterData(
///     id: "sawmill",
///     name: "Saegewerk",
///     input: { "wood": 2.0 },
///     output: { "planks": 1.0 },
///     base_speed: 0.2,
///     base_cost: { "coins": 100.0, "wood": 50.0 },
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterData {
    /// Unique string identifier for this converter.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Resources consumed by one operation.
    pub input: CostMap,

    /// Resources produced by one operation.
    pub output: CostMap,

    /// Operations per second of one unit before multipliers.
    pub base_speed: f64,

    /// Cost of the first unit.
    pub base_cost: CostMap,

    /// Whether the converter can be bought from the start.
    #[serde(default = "default_unlocked")]
    pub unlocked: bool,

    /// Amounts that unlock a locked converter once all are held.
    #[serde(default)]
    pub unlock_when: CostMap,
}
