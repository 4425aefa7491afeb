//! Achievements: milestones checked at the end of every tick.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::converters::Converter;
use crate::data::AchievementData;
use crate::generators::Generator;
use crate::resources::{ResourceKind, ResourceStore};
use crate::statistics::Statistics;

/// Condition that awards an achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AchievementCondition {
    /// Hold at least `amount` of `resource`.
    ResourceAmount {
        /// Resource to hold.
        resource: ResourceKind,
        /// Amount to reach.
        amount: f64,
    },
    /// Collect manually this many times.
    TotalClicks(u64),
    /// Own this many generator and converter units together.
    TotalBuildings(u32),
    /// Own this many converter units.
    TotalConverters(u32),
    /// Prestige this many times.
    PrestigeResets(u32),
}

/// State an achievement condition is judged against.
pub struct Progress<'a> {
    /// Resource stock.
    pub store: &'a ResourceStore,
    /// Generators.
    pub generators: &'a [Generator],
    /// Converters.
    pub converters: &'a [Converter],
    /// Lifetime counters.
    pub statistics: &'a Statistics,
    /// Prestige resets performed.
    pub prestige_resets: u32,
}

impl AchievementCondition {
    /// Whether `progress` meets the condition.
    #[must_use]
    pub fn is_met(&self, progress: &Progress<'_>) -> bool {
        let converters: u32 = progress.converters.iter().map(|c| c.owned).sum();
        match self {
            Self::ResourceAmount { resource, amount } => progress.store.get(resource.as_str()) >= *amount,
            Self::TotalClicks(clicks) => progress.statistics.total_clicks >= *clicks,
            Self::TotalBuildings(count) => {
                let generators: u32 = progress.generators.iter().map(|g| g.owned).sum();
                generators + converters >= *count
            }
            Self::TotalConverters(count) => converters >= *count,
            Self::PrestigeResets(count) => progress.prestige_resets >= *count,
        }
    }
}

/// Award every definition whose condition is met.
///
/// Returns the ids newly added to `achieved`, in definition order.
pub fn check_achievements(
    definitions: &[AchievementData],
    achieved: &mut BTreeSet<String>,
    progress: &Progress<'_>,
) -> Vec<String> {
    let mut awarded = Vec::new();
    for definition in definitions {
        if achieved.contains(&definition.id) || !definition.condition.is_met(progress) {
            continue;
        }
        achieved.insert(definition.id.clone());
        awarded.push(definition.id.clone());
    }
    awarded
}
