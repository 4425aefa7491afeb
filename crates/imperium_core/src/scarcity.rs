//! Resource scarcity.
//!
//! Raw materials come out of finite deposits. Generator output draws a
//! deposit down, and the deposit slowly regenerates towards its initial
//! size. Below a configured fraction of the initial size, generators of
//! that resource lose efficiency linearly down to a floor, and the market
//! pays more for it.
//!
//! Resources without a deposit are never affected. A disabled system
//! leaves every efficiency and price factor at 1 and stops depletion and
//! regeneration, but keeps the deposits as they are.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resources::ResourceKind;

/// Definition of one deposit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositData {
    /// Resource mined from the deposit.
    pub resource: ResourceKind,
    /// Size of the untouched deposit.
    pub initial: f64,
    /// Fraction of `initial` restored per minute.
    #[serde(default)]
    pub regeneration_per_minute: f64,
}

impl DepositData {
    /// Deposit of `initial` units regenerating `fraction` per minute.
    #[must_use]
    pub fn new(resource: &str, initial: f64, fraction: f64) -> Self {
        Self {
            resource: ResourceKind::from(resource),
            initial,
            regeneration_per_minute: fraction,
        }
    }

    /// Units restored per second.
    #[must_use]
    pub fn regeneration_per_second(&self) -> f64 {
        self.initial * self.regeneration_per_minute / 60.0
    }
}

/// Scarcity tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScarcityRules {
    /// Whether a fresh game starts with scarcity switched on.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Efficiency of a fully depleted deposit.
    #[serde(default = "default_min_efficiency")]
    pub min_efficiency: f64,
    /// Fraction of the initial deposit below which efficiency drops.
    #[serde(default = "default_efficiency_threshold")]
    pub efficiency_threshold: f64,
    /// Price factor of an untouched deposit.
    #[serde(default = "default_base_price_multiplier")]
    pub base_price_multiplier: f64,
    /// Price factor of a fully depleted deposit.
    #[serde(default = "default_max_price_multiplier")]
    pub max_price_multiplier: f64,
    /// Deposits, at most one per resource.
    #[serde(default)]
    pub deposits: Vec<DepositData>,
}

const fn default_enabled() -> bool {
    true
}

const fn default_min_efficiency() -> f64 {
    0.2
}

const fn default_efficiency_threshold() -> f64 {
    0.5
}

const fn default_base_price_multiplier() -> f64 {
    1.0
}

const fn default_max_price_multiplier() -> f64 {
    5.0
}

impl Default for ScarcityRules {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            min_efficiency: default_min_efficiency(),
            efficiency_threshold: default_efficiency_threshold(),
            base_price_multiplier: default_base_price_multiplier(),
            max_price_multiplier: default_max_price_multiplier(),
            deposits: Vec::new(),
        }
    }
}

impl ScarcityRules {
    /// Deposit definition for `kind`.
    #[must_use]
    pub fn deposit(&self, kind: &str) -> Option<&DepositData> {
        self.deposits.iter().find(|d| d.resource.as_str() == kind)
    }

    /// Generator efficiency at `ratio` of the initial deposit.
    #[must_use]
    pub fn efficiency_at(&self, ratio: f64) -> f64 {
        if ratio >= self.efficiency_threshold {
            return 1.0;
        }
        let normalized = (ratio / self.efficiency_threshold).max(0.0);
        self.min_efficiency + normalized * (1.0 - self.min_efficiency)
    }

    /// Market price factor at `ratio` of the initial deposit.
    #[must_use]
    pub fn price_multiplier_at(&self, ratio: f64) -> f64 {
        if ratio >= 1.0 {
            return self.base_price_multiplier;
        }
        let depleted = (1.0 - ratio).min(1.0);
        self.base_price_multiplier + depleted * (self.max_price_multiplier - self.base_price_multiplier)
    }
}

/// Live deposit state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scarcity {
    rules: ScarcityRules,
    enabled: bool,
    remaining: BTreeMap<ResourceKind, f64>,
}

impl Scarcity {
    /// Every deposit untouched.
    #[must_use]
    pub fn new(rules: &ScarcityRules) -> Self {
        Self {
            rules: rules.clone(),
            enabled: rules.enabled,
            remaining: rules
                .deposits
                .iter()
                .map(|d| (d.resource.clone(), d.initial))
                .collect(),
        }
    }

    /// Whether depletion and its effects are active.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch the system on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Remaining units per tracked resource.
    #[must_use]
    pub fn deposits(&self) -> &BTreeMap<ResourceKind, f64> {
        &self.remaining
    }

    /// Remaining units of `kind`, `None` if it has no deposit.
    #[must_use]
    pub fn remaining(&self, kind: &str) -> Option<f64> {
        self.remaining.get(kind).copied()
    }

    /// Remaining fraction of the initial deposit of `kind`.
    #[must_use]
    pub fn ratio(&self, kind: &str) -> Option<f64> {
        let deposit = self.rules.deposit(kind)?;
        Some(self.remaining(kind)? / deposit.initial)
    }

    /// Output factor for generators of `kind`.
    #[must_use]
    pub fn efficiency(&self, kind: &str) -> f64 {
        match self.active_ratio(kind) {
            Some(ratio) => self.rules.efficiency_at(ratio),
            None => 1.0,
        }
    }

    /// Market price factor for `kind`.
    #[must_use]
    pub fn price_multiplier(&self, kind: &str) -> f64 {
        match self.active_ratio(kind) {
            Some(ratio) => self.rules.price_multiplier_at(ratio),
            None => 1.0,
        }
    }

    fn active_ratio(&self, kind: &str) -> Option<f64> {
        if self.enabled {
            self.ratio(kind)
        } else {
            None
        }
    }

    /// Take up to `amount` out of the deposit of `kind`.
    ///
    /// Returns the units actually taken. Untracked kinds and a disabled
    /// system take nothing.
    pub fn deplete(&mut self, kind: &str, amount: f64) -> f64 {
        if !self.enabled || !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let Some(remaining) = self.remaining.get_mut(kind) else {
            return 0.0;
        };
        let taken = amount.min(*remaining);
        *remaining -= taken;
        taken
    }

    /// Regenerate every deposit for `dt` seconds, never past its initial size.
    pub fn regenerate(&mut self, dt: f64) {
        if !self.enabled || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        for deposit in &self.rules.deposits {
            if let Some(remaining) = self.remaining.get_mut(&deposit.resource) {
                *remaining = (*remaining + deposit.regeneration_per_second() * dt).min(deposit.initial);
            }
        }
    }

    /// Change of every deposit over `seconds` with `extracted` units taken
    /// out in bulk. Pure.
    #[must_use]
    pub fn bulk_deltas(&self, extracted: &BTreeMap<ResourceKind, f64>, seconds: f64) -> BTreeMap<ResourceKind, f64> {
        let mut deltas = BTreeMap::new();
        if !self.enabled || !seconds.is_finite() || seconds <= 0.0 {
            return deltas;
        }
        for deposit in &self.rules.deposits {
            let Some(remaining) = self.remaining(deposit.resource.as_str()) else {
                continue;
            };
            let taken = extracted.get(&deposit.resource).copied().unwrap_or(0.0);
            let after = (remaining - taken + deposit.regeneration_per_second() * seconds).clamp(0.0, deposit.initial);
            if after != remaining {
                deltas.insert(deposit.resource.clone(), after - remaining);
            }
        }
        deltas
    }

    /// Add `delta` to the deposit of `kind`, kept within `[0, initial]`.
    pub fn apply_delta(&mut self, kind: &ResourceKind, delta: f64) {
        let Some(initial) = self.rules.deposit(kind.as_str()).map(|d| d.initial) else {
            return;
        };
        if let Some(remaining) = self.remaining.get_mut(kind) {
            *remaining = (*remaining + delta).clamp(0.0, initial);
        }
    }

    /// Overwrite the deposit of `kind`.
    ///
    /// Returns `None` for an untracked kind, otherwise whether `amount` had
    /// to be clamped into `[0, initial]`.
    pub fn set_remaining(&mut self, kind: &str, amount: f64) -> Option<bool> {
        let initial = self.rules.deposit(kind)?.initial;
        let remaining = self.remaining.get_mut(kind)?;
        let clamped = if amount.is_finite() { amount.clamp(0.0, initial) } else { initial };
        *remaining = clamped;
        Some(clamped != amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ScarcityRules {
        ScarcityRules {
            deposits: vec![DepositData::new("wood", 1000.0, 0.06)],
            ..ScarcityRules::default()
        }
    }

    #[test]
    fn test_full_deposit_is_neutral() {
        let scarcity = Scarcity::new(&rules());
        assert_eq!(scarcity.efficiency("wood"), 1.0);
        assert_eq!(scarcity.price_multiplier("wood"), 1.0);
        assert_eq!(scarcity.efficiency("coins"), 1.0);
    }

    #[test]
    fn test_efficiency_drops_below_threshold() {
        let mut scarcity = Scarcity::new(&rules());

        scarcity.deplete("wood", 500.0);
        assert_eq!(scarcity.efficiency("wood"), 1.0);

        scarcity.deplete("wood", 250.0);
        assert!((scarcity.efficiency("wood") - 0.6).abs() < 1e-12);

        scarcity.deplete("wood", 1000.0);
        assert_eq!(scarcity.remaining("wood"), Some(0.0));
        assert!((scarcity.efficiency("wood") - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_price_rises_with_depletion() {
        let mut scarcity = Scarcity::new(&rules());
        scarcity.deplete("wood", 250.0);
        assert!((scarcity.price_multiplier("wood") - 2.0).abs() < 1e-12);

        scarcity.deplete("wood", 750.0);
        assert!((scarcity.price_multiplier("wood") - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_deplete_takes_at_most_remaining() {
        let mut scarcity = Scarcity::new(&rules());
        assert_eq!(scarcity.deplete("wood", 1200.0), 1000.0);
        assert_eq!(scarcity.deplete("wood", 5.0), 0.0);
        assert_eq!(scarcity.deplete("stone", 5.0), 0.0);
    }

    #[test]
    fn test_regeneration_is_capped() {
        let mut scarcity = Scarcity::new(&rules());
        scarcity.deplete("wood", 10.0);

        // 6% of 1000 per minute is 1 per second
        scarcity.regenerate(4.0);
        assert!((scarcity.remaining("wood").unwrap() - 994.0).abs() < 1e-9);

        scarcity.regenerate(60.0);
        assert_eq!(scarcity.remaining("wood"), Some(1000.0));
    }

    #[test]
    fn test_disabled_system_is_inert() {
        let mut scarcity = Scarcity::new(&rules());
        scarcity.deplete("wood", 900.0);
        scarcity.set_enabled(false);

        assert_eq!(scarcity.efficiency("wood"), 1.0);
        assert_eq!(scarcity.price_multiplier("wood"), 1.0);
        assert_eq!(scarcity.deplete("wood", 10.0), 0.0);
        scarcity.regenerate(600.0);
        assert!((scarcity.remaining("wood").unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_bulk_deltas_net_extraction_and_regeneration() {
        let scarcity = Scarcity::new(&rules());
        let extracted: BTreeMap<_, _> = [(ResourceKind::from("wood"), 300.0)].into_iter().collect();

        let deltas = scarcity.bulk_deltas(&extracted, 100.0);
        assert!((deltas[&ResourceKind::from("wood")] + 200.0).abs() < 1e-9);

        assert!(scarcity.bulk_deltas(&extracted, 0.0).is_empty());
    }

    #[test]
    fn test_set_remaining_clamps() {
        let mut scarcity = Scarcity::new(&rules());
        assert_eq!(scarcity.set_remaining("wood", 400.0), Some(false));
        assert_eq!(scarcity.set_remaining("wood", 5000.0), Some(true));
        assert_eq!(scarcity.remaining("wood"), Some(1000.0));
        assert_eq!(scarcity.set_remaining("coins", 1.0), None);
    }
}
