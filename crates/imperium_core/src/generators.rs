//! Generator registry and per-tick generator production.
//!
//! A generator adds `base_output * output_multiplier * owned * global`
//! of its resource every second, scaled by the scarcity efficiency of that
//! resource. Generators with `requires` only run while each required
//! resource holds at least the production threshold.

use serde::{Deserialize, Serialize};

use crate::cost::{self, CostMap, Purchase};
use crate::data::GeneratorData;
use crate::error::ActionError;
use crate::resources::{ResourceKind, ResourceStore};
use crate::scarcity::Scarcity;

/// Runtime state of one generator type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    /// Unique identifier.
    pub id: String,
    /// Resource produced, `None` for buildings without output.
    pub produces: Option<ResourceKind>,
    /// Output per unit per second before multipliers.
    pub base_output: f64,
    /// Units owned.
    pub owned: u32,
    /// Cost of the first unit.
    pub base_cost: CostMap,
    /// Cost of the next unit.
    pub current_cost: CostMap,
    /// Whether the generator can be bought.
    pub unlocked: bool,
    /// Amounts that unlock the generator.
    pub unlock_when: CostMap,
    /// Resources that must reach the production threshold.
    pub requires: Vec<ResourceKind>,
    /// Whether owned units count as market stalls.
    pub sells: bool,
    /// Product of purchased upgrade factors.
    pub output_multiplier: f64,
}

impl Generator {
    /// Fresh generator with nothing owned.
    #[must_use]
    pub fn from_data(data: &GeneratorData) -> Self {
        Self {
            id: data.id.clone(),
            produces: data.produces.clone(),
            base_output: data.base_output,
            owned: 0,
            base_cost: data.base_cost.clone(),
            current_cost: data.base_cost.clone(),
            unlocked: data.unlocked,
            unlock_when: data.unlock_when.clone(),
            requires: data.requires.clone(),
            sells: data.sells,
            output_multiplier: 1.0,
        }
    }

    /// Output per second of all owned units at deposit `efficiency`.
    #[must_use]
    pub fn output_per_second(&self, global_multiplier: f64, efficiency: f64) -> f64 {
        self.base_output * self.output_multiplier * f64::from(self.owned) * global_multiplier * efficiency
    }

    /// Output per second with the current efficiency of its deposit.
    #[must_use]
    pub fn current_output(&self, global_multiplier: f64, scarcity: &Scarcity) -> f64 {
        let efficiency = self
            .produces
            .as_ref()
            .map_or(1.0, |kind| scarcity.efficiency(kind.as_str()));
        self.output_per_second(global_multiplier, efficiency)
    }

    /// Whether every required resource holds at least `threshold`.
    #[must_use]
    pub fn can_produce(&self, store: &ResourceStore, threshold: f64) -> bool {
        self.requires
            .iter()
            .all(|kind| store.get(kind.as_str()) >= threshold)
    }

    /// Whether this generator contributes output this tick.
    #[must_use]
    pub fn is_producing(&self, store: &ResourceStore, threshold: f64) -> bool {
        self.unlocked && self.owned > 0 && self.produces.is_some() && self.can_produce(store, threshold)
    }

    /// Recompute `current_cost` from `owned`.
    pub fn refresh_cost(&mut self, multiplier: f64) {
        self.current_cost = cost::scaled_cost(&self.base_cost, self.owned, multiplier);
    }
}

/// Output of one generator during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionEvent {
    /// Generator that produced.
    pub generator: String,
    /// Resource produced.
    pub resource: ResourceKind,
    /// Amount that actually landed in the store after rounding and caps.
    pub amount: f64,
}

/// Run every producing generator for `dt` seconds.
///
/// Amounts of produced resources are rounded to `decimals` places after
/// each generator's contribution. What lands in the store is taken out of
/// the resource's deposit.
pub fn tick_generators(
    generators: &[Generator],
    dt: f64,
    global_multiplier: f64,
    store: &mut ResourceStore,
    threshold: f64,
    decimals: i32,
    scarcity: &mut Scarcity,
) -> Vec<ProductionEvent> {
    let mut events = Vec::new();

    for generator in generators {
        if !generator.is_producing(store, threshold) {
            continue;
        }
        let Some(kind) = &generator.produces else {
            continue;
        };

        let before = store.get(kind.as_str());
        store.add(kind, generator.current_output(global_multiplier, scarcity) * dt);
        store.round_amount(kind.as_str(), decimals);
        let amount = store.get(kind.as_str()) - before;
        scarcity.deplete(kind.as_str(), amount);

        if amount != 0.0 {
            events.push(ProductionEvent {
                generator: generator.id.clone(),
                resource: kind.clone(),
                amount,
            });
        }
    }

    events
}

/// Buy one unit of generator `id`.
///
/// On failure nothing is changed.
pub fn purchase_generator(
    generators: &mut [Generator],
    id: &str,
    store: &mut ResourceStore,
    multiplier: f64,
) -> Result<Purchase, ActionError> {
    let generator = generators
        .iter_mut()
        .find(|g| g.id == id)
        .ok_or_else(|| ActionError::UnknownGenerator(id.to_string()))?;

    if !generator.unlocked {
        return Err(ActionError::Locked(id.to_string()));
    }

    generator.refresh_cost(multiplier);
    if let Some(shortfall) = cost::first_shortfall(&generator.current_cost, store) {
        return Err(shortfall.into());
    }

    let paid = generator.current_cost.clone();
    cost::deduct(&paid, store);
    generator.owned += 1;
    generator.refresh_cost(multiplier);

    Ok(Purchase {
        id: generator.id.clone(),
        level: generator.owned,
        paid,
    })
}

/// Number of market stalls owned.
#[must_use]
pub fn stall_count(generators: &[Generator]) -> u32 {
    generators
        .iter()
        .filter(|g| g.sells)
        .map(|g| g.owned)
        .sum()
}
