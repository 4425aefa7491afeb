//! Resource store.
//!
//! Holds the stock of every resource kind together with its storage cap and
//! the aggregate production rate shown to the player.
//!
//! The store is the correctness floor of the simulation: whatever callers do,
//! an amount never drops below zero and never rises above its cap.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a resource kind (`"wood"`, `"planks"`, `"coins"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKind(pub String);

impl ResourceKind {
    /// Create a resource kind from its id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKind {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ResourceKind {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ResourceKind {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Round `value` to `decimals` decimal places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// State of a single resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Resource {
    /// Current stock. Never negative, never above `cap`.
    pub amount: f64,
    /// Net per-second rate for display. May be negative.
    pub production_rate: f64,
    /// Storage limit, `None` for unbounded.
    pub cap: Option<f64>,
}

impl Resource {
    /// Create an empty resource with an optional cap.
    #[must_use]
    pub const fn new(cap: Option<f64>) -> Self {
        Self {
            amount: 0.0,
            production_rate: 0.0,
            cap,
        }
    }

    /// Clamp a candidate amount into `[0, cap]`.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        let floored = if value.is_nan() { 0.0 } else { value.max(0.0) };
        match self.cap {
            Some(cap) => floored.min(cap),
            None => floored,
        }
    }

    /// Remaining room below the cap, `f64::INFINITY` when unbounded.
    #[must_use]
    pub fn available_storage(&self) -> f64 {
        self.cap.map_or(f64::INFINITY, |cap| (cap - self.amount).max(0.0))
    }
}

/// Mapping of resource kind to its state.
///
/// Backed by a `BTreeMap` so iteration is always in kind order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceStore {
    resources: BTreeMap<ResourceKind, Resource>,
}

impl ResourceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resources: BTreeMap::new(),
        }
    }

    /// Register a resource kind with an optional cap. Existing state is kept.
    pub fn register(&mut self, kind: ResourceKind, cap: Option<f64>) {
        self.resources
            .entry(kind)
            .and_modify(|r| r.cap = cap)
            .or_insert_with(|| Resource::new(cap));
    }

    /// Current amount of `kind`, 0 for unknown kinds.
    #[must_use]
    pub fn get(&self, kind: &str) -> f64 {
        self.resources.get(kind).map_or(0.0, |r| r.amount)
    }

    /// Full state of `kind`.
    #[must_use]
    pub fn resource(&self, kind: &str) -> Option<&Resource> {
        self.resources.get(kind)
    }

    /// Whether `kind` is tracked by this store.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.resources.contains_key(kind)
    }

    /// Add `delta` (possibly negative) to `kind`, clamping into `[0, cap]`.
    ///
    /// Returns the change that was actually applied. Non-finite deltas are
    /// ignored.
    pub fn add(&mut self, kind: &ResourceKind, delta: f64) -> f64 {
        if !delta.is_finite() {
            return 0.0;
        }
        let resource = self.resources.entry(kind.clone()).or_default();
        let before = resource.amount;
        resource.amount = resource.clamp(before + delta);
        resource.amount - before
    }

    /// Overwrite the amount of `kind`, clamped into `[0, cap]`.
    pub fn set(&mut self, kind: &ResourceKind, amount: f64) {
        let resource = self.resources.entry(kind.clone()).or_default();
        resource.amount = resource.clamp(amount);
    }

    /// Overwrite the displayed production rate. Does not touch the amount.
    pub fn set_production_rate(&mut self, kind: &ResourceKind, rate: f64) {
        self.resources.entry(kind.clone()).or_default().production_rate = rate;
    }

    /// Displayed production rate of `kind`.
    #[must_use]
    pub fn production_rate(&self, kind: &str) -> f64 {
        self.resources.get(kind).map_or(0.0, |r| r.production_rate)
    }

    /// Change the cap of `kind`, re-clamping the current amount.
    pub fn set_cap(&mut self, kind: &ResourceKind, cap: Option<f64>) {
        let resource = self.resources.entry(kind.clone()).or_default();
        resource.cap = cap;
        resource.amount = resource.clamp(resource.amount);
    }

    /// Round the amount of `kind` to `decimals` places.
    pub fn round_amount(&mut self, kind: &str, decimals: i32) {
        if let Some(resource) = self.resources.get_mut(kind) {
            resource.amount = resource.clamp(round_to(resource.amount, decimals));
        }
    }

    /// Iterate over all resources in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceKind, &Resource)> {
        self.resources.iter()
    }

    /// All tracked kinds in order.
    pub fn kinds(&self) -> impl Iterator<Item = &ResourceKind> {
        self.resources.keys()
    }

    /// Snapshot of all amounts.
    #[must_use]
    pub fn amounts(&self) -> BTreeMap<ResourceKind, f64> {
        self.resources
            .iter()
            .map(|(kind, r)| (kind.clone(), r.amount))
            .collect()
    }

    /// Number of tracked kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the store tracks no kinds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(id: &str) -> ResourceKind {
        ResourceKind::from(id)
    }

    #[test]
    fn test_add_clamps_to_zero() {
        let mut store = ResourceStore::new();
        store.register(kind("wood"), None);
        store.add(&kind("wood"), 5.0);

        let applied = store.add(&kind("wood"), -8.0);
        assert_eq!(applied, -5.0);
        assert_eq!(store.get("wood"), 0.0);
    }

    #[test]
    fn test_add_clamps_to_cap() {
        let mut store = ResourceStore::new();
        store.register(kind("stone"), Some(100.0));

        let applied = store.add(&kind("stone"), 150.0);
        assert_eq!(applied, 100.0);
        assert_eq!(store.get("stone"), 100.0);
        assert_eq!(store.resource("stone").unwrap().available_storage(), 0.0);
    }

    #[test]
    fn test_non_finite_delta_is_ignored() {
        let mut store = ResourceStore::new();
        store.register(kind("wood"), None);
        store.add(&kind("wood"), 3.0);

        assert_eq!(store.add(&kind("wood"), f64::NAN), 0.0);
        assert_eq!(store.add(&kind("wood"), f64::INFINITY), 0.0);
        assert_eq!(store.get("wood"), 3.0);
    }

    #[test]
    fn test_unknown_kind_reads_zero() {
        let store = ResourceStore::new();
        assert_eq!(store.get("mithril"), 0.0);
        assert!(!store.contains("mithril"));
    }

    #[test]
    fn test_production_rate_does_not_touch_amount() {
        let mut store = ResourceStore::new();
        store.add(&kind("wood"), 10.0);
        store.set_production_rate(&kind("wood"), -2.5);

        assert_eq!(store.get("wood"), 10.0);
        assert_eq!(store.production_rate("wood"), -2.5);
    }

    #[test]
    fn test_lowering_cap_reclamps() {
        let mut store = ResourceStore::new();
        store.add(&kind("wood"), 500.0);
        store.set_cap(&kind("wood"), Some(200.0));
        assert_eq!(store.get("wood"), 200.0);
    }

    #[test]
    fn test_round_amount() {
        let mut store = ResourceStore::new();
        store.add(&kind("wood"), 0.1 + 0.2);
        store.round_amount("wood", 2);
        assert_eq!(store.get("wood"), 0.3);
    }

    #[test]
    fn test_iteration_is_sorted() {
        let mut store = ResourceStore::new();
        store.register(kind("wood"), None);
        store.register(kind("coins"), None);
        store.register(kind("planks"), None);

        let kinds: Vec<&str> = store.kinds().map(ResourceKind::as_str).collect();
        assert_eq!(kinds, vec!["coins", "planks", "wood"]);
    }
}
