//! Prestige: trade all progress for a permanent global multiplier.

use serde::{Deserialize, Serialize};

/// Prestige tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrestigeRules {
    /// Currency needed before a prestige is allowed.
    #[serde(default = "default_min_currency")]
    pub min_currency: f64,
    /// Points are `floor(sqrt(currency / point_divisor))`.
    #[serde(default = "default_point_divisor")]
    pub point_divisor: f64,
    /// Global multiplier gained per point.
    #[serde(default = "default_bonus_per_point")]
    pub bonus_per_point: f64,
}

const fn default_min_currency() -> f64 {
    1_000_000.0
}

const fn default_point_divisor() -> f64 {
    10_000.0
}

const fn default_bonus_per_point() -> f64 {
    0.1
}

impl Default for PrestigeRules {
    fn default() -> Self {
        Self {
            min_currency: default_min_currency(),
            point_divisor: default_point_divisor(),
            bonus_per_point: default_bonus_per_point(),
        }
    }
}

impl PrestigeRules {
    /// Whether `currency` is enough to prestige.
    #[must_use]
    pub fn is_ready(&self, currency: f64) -> bool {
        currency >= self.min_currency
    }

    /// Points a prestige at `currency` would grant.
    #[must_use]
    pub fn points_for(&self, currency: f64) -> u64 {
        if !currency.is_finite() || currency <= 0.0 {
            return 0;
        }
        (currency / self.point_divisor).sqrt().floor() as u64
    }

    /// Global multiplier for a point total.
    #[must_use]
    pub fn multiplier_for(&self, points: u64) -> f64 {
        1.0 + points as f64 * self.bonus_per_point
    }
}

/// Prestige progress, kept across resets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrestigeState {
    /// Points earned over all resets.
    pub points: u64,
    /// Number of resets performed.
    pub resets: u32,
    /// Global multiplier, never below 1.
    pub multiplier: f64,
}

impl Default for PrestigeState {
    fn default() -> Self {
        Self {
            points: 0,
            resets: 0,
            multiplier: 1.0,
        }
    }
}

impl PrestigeState {
    /// Credit `gained` points and rebase the multiplier.
    pub fn record_reset(&mut self, gained: u64, rules: &PrestigeRules) {
        self.points += gained;
        self.resets += 1;
        self.multiplier = rules.multiplier_for(self.points).max(self.multiplier);
    }
}

/// Result of a prestige.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrestigeOutcome {
    /// Points earned by this reset.
    pub points_gained: u64,
    /// Point total afterwards.
    pub total_points: u64,
    /// Global multiplier afterwards.
    pub multiplier: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_from_currency() {
        let rules = PrestigeRules::default();
        assert_eq!(rules.points_for(1_000_000.0), 10);
        assert_eq!(rules.points_for(4_000_000.0), 20);
        assert_eq!(rules.points_for(1_209_999.0), 10);
        assert_eq!(rules.points_for(-5.0), 0);
    }

    #[test]
    fn test_ready_threshold() {
        let rules = PrestigeRules::default();
        assert!(!rules.is_ready(999_999.0));
        assert!(rules.is_ready(1_000_000.0));
    }

    #[test]
    fn test_multiplier_accumulates() {
        let rules = PrestigeRules::default();
        let mut state = PrestigeState::default();

        state.record_reset(10, &rules);
        assert!((state.multiplier - 2.0).abs() < 1e-12);

        state.record_reset(5, &rules);
        assert_eq!(state.points, 15);
        assert_eq!(state.resets, 2);
        assert!((state.multiplier - 2.5).abs() < 1e-12);
    }
}
