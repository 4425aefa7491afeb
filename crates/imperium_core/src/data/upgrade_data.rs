//! Upgrade and achievement definitions.

use serde::{Deserialize, Serialize};

use crate::achievements::AchievementCondition;
use crate::cost::CostMap;
use crate::upgrades::UpgradeEffect;

/// Data-driven one-time upgrade.
///
/// # Example RON
///
/// ```ron
/// UpgradeData(
///     id: "efficient_woodcutters",
///     name: "Effiziente Holzfaeller",
///     cost: { "coins": 200.0, "wood": 100.0 },
///     effect: MultiplyGeneratorOutput(target: "woodcutter", factor: 2.0),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeData {
    /// Unique string identifier for this upgrade.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// One-time price.
    pub cost: CostMap,

    /// What buying the upgrade does.
    pub effect: UpgradeEffect,

    /// Whether the upgrade can be bought from the start.
    #[serde(default = "default_unlocked")]
    pub unlocked: bool,

    /// Amounts that unlock a locked upgrade once all are held.
    #[serde(default)]
    pub unlock_when: CostMap,
}

const fn default_unlocked() -> bool {
    true
}

/// Data-driven achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementData {
    /// Unique string identifier.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Condition that awards the achievement.
    pub condition: AchievementCondition,
}
