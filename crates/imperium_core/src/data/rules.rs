//! Tick and step rules.

use serde::{Deserialize, Serialize};

/// Simulation-wide tuning values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationRules {
    /// Nominal length of one fixed tick in seconds.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f64,

    /// Minimum stock each required resource must hold for a dependent
    /// generator to run.
    #[serde(default = "default_production_threshold")]
    pub production_threshold: f64,

    /// Most whole operations one converter may run in a single tick.
    #[serde(default = "default_max_burst_operations")]
    pub max_burst_operations: u32,

    /// Decimal places generator output is rounded to.
    #[serde(default = "default_amount_decimals")]
    pub amount_decimals: i32,

    /// Most fixed ticks a session clock hands out per advance.
    #[serde(default = "default_max_ticks_per_advance")]
    pub max_ticks_per_advance: u32,
}

const fn default_tick_seconds() -> f64 {
    1.0
}

const fn default_production_threshold() -> f64 {
    10.0
}

const fn default_max_burst_operations() -> u32 {
    10_000
}

const fn default_amount_decimals() -> i32 {
    2
}

const fn default_max_ticks_per_advance() -> u32 {
    5
}

impl Default for SimulationRules {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            production_threshold: default_production_threshold(),
            max_burst_operations: default_max_burst_operations(),
            amount_decimals: default_amount_decimals(),
            max_ticks_per_advance: default_max_ticks_per_advance(),
        }
    }
}
