//! Converter engine.
//!
//! Converters turn a fixed bundle of inputs into a fixed bundle of outputs,
//! one whole operation at a time. Throughput below one operation per tick is
//! carried between ticks in a fractional accumulator.
//!
//! Each operation is atomic: either every input is deducted and every
//! output added, or nothing happens. A converter starved of inputs keeps
//! accumulating and catches up in a burst once inputs return, bounded by
//! the per-tick burst limit.

use serde::{Deserialize, Serialize};

use crate::cost::{self, CostMap, Purchase};
use crate::data::ConverterData;
use crate::error::ActionError;
use crate::resources::ResourceStore;

/// Slack when comparing the accumulator against one whole operation.
///
/// Repeated float addition of rates like 0.2 lands just below the integer
/// it should reach.
pub const ACCUMULATOR_EPSILON: f64 = 1e-9;

/// Runtime state of one converter type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Converter {
    /// Unique identifier.
    pub id: String,
    /// Resources consumed per operation.
    pub input: CostMap,
    /// Resources produced per operation.
    pub output: CostMap,
    /// Operations per unit per second before multipliers.
    pub base_speed: f64,
    /// Units owned.
    pub owned: u32,
    /// Manual on/off switch, independent of `owned`.
    pub active: bool,
    /// Fractional operation credit.
    pub accumulator: f64,
    /// Cost of the first unit.
    pub base_cost: CostMap,
    /// Cost of the next unit.
    pub current_cost: CostMap,
    /// Whether the converter can be bought.
    pub unlocked: bool,
    /// Amounts that unlock the converter.
    pub unlock_when: CostMap,
    /// Product of purchased upgrade factors.
    pub speed_multiplier: f64,
}

impl Converter {
    /// Fresh converter with nothing owned.
    #[must_use]
    pub fn from_data(data: &ConverterData) -> Self {
        Self {
            id: data.id.clone(),
            input: data.input.clone(),
            output: data.output.clone(),
            base_speed: data.base_speed,
            owned: 0,
            active: false,
            accumulator: 0.0,
            base_cost: data.base_cost.clone(),
            current_cost: data.base_cost.clone(),
            unlocked: data.unlocked,
            unlock_when: data.unlock_when.clone(),
            speed_multiplier: 1.0,
        }
    }

    /// Operations per second of all owned units.
    #[must_use]
    pub fn ops_per_second(&self, global_multiplier: f64) -> f64 {
        self.base_speed * self.speed_multiplier * f64::from(self.owned) * global_multiplier
    }

    /// Whether the converter runs at all.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active && self.owned > 0
    }

    /// Whether `store` covers one operation.
    #[must_use]
    pub fn has_inputs(&self, store: &ResourceStore) -> bool {
        cost::can_afford(&self.input, store)
    }

    /// Whole operations the stock in `store` could sustain.
    ///
    /// Counted with the same slack as the live accumulator, so `0.6 / 0.2`
    /// sustains 3 operations.
    #[must_use]
    pub fn sustainable_operations(&self, store: &ResourceStore) -> f64 {
        self.input
            .iter()
            .map(|(kind, amount)| whole_operations(store.get(kind.as_str()) / amount))
            .fold(f64::INFINITY, f64::min)
    }

    /// Run `count` operations at once. Callers check inputs first.
    pub fn run_operations(&self, store: &mut ResourceStore, count: f64) {
        cost::deduct(&cost::scale(&self.input, count), store);
        for (kind, amount) in &self.output {
            store.add(kind, amount * count);
        }
    }

    /// Recompute `current_cost` from `owned`.
    pub fn refresh_cost(&mut self, multiplier: f64) {
        self.current_cost = cost::scaled_cost(&self.base_cost, self.owned, multiplier);
    }
}

/// Whole operations in `credit`, with [`ACCUMULATOR_EPSILON`] slack.
#[must_use]
pub fn whole_operations(credit: f64) -> f64 {
    (credit + ACCUMULATOR_EPSILON).floor()
}

/// Result of one converter's processing during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionEvent {
    /// Converter that ran.
    pub converter: String,
    /// Whole operations completed.
    pub operations: u32,
    /// The loop stopped for lack of inputs with credit left over.
    pub starved: bool,
}

/// Advance every running converter by `dt` seconds.
///
/// Returns one event per converter that completed operations or was
/// starved. At most `max_burst` operations run per converter; credit
/// beyond that stays in the accumulator.
pub fn tick_converters(
    converters: &mut [Converter],
    dt: f64,
    global_multiplier: f64,
    store: &mut ResourceStore,
    max_burst: u32,
) -> Vec<ConversionEvent> {
    let mut events = Vec::new();

    for converter in converters.iter_mut() {
        if !converter.is_running() {
            continue;
        }

        converter.accumulator += converter.ops_per_second(global_multiplier) * dt;

        let mut operations = 0;
        let mut starved = false;
        while converter.accumulator + ACCUMULATOR_EPSILON >= 1.0 && operations < max_burst {
            if !converter.has_inputs(store) {
                starved = true;
                break;
            }
            converter.run_operations(store, 1.0);
            converter.accumulator = (converter.accumulator - 1.0).max(0.0);
            operations += 1;
        }

        if operations > 0 || starved {
            events.push(ConversionEvent {
                converter: converter.id.clone(),
                operations,
                starved,
            });
        }
    }

    events
}

/// Buy one unit of converter `id`.
///
/// The first unit switches the converter on.
pub fn purchase_converter(
    converters: &mut [Converter],
    id: &str,
    store: &mut ResourceStore,
    multiplier: f64,
) -> Result<Purchase, ActionError> {
    let converter = find_mut(converters, id)?;

    if !converter.unlocked {
        return Err(ActionError::Locked(id.to_string()));
    }

    converter.refresh_cost(multiplier);
    if let Some(shortfall) = cost::first_shortfall(&converter.current_cost, store) {
        return Err(shortfall.into());
    }

    let paid = converter.current_cost.clone();
    cost::deduct(&paid, store);
    if converter.owned == 0 {
        converter.active = true;
    }
    converter.owned += 1;
    converter.refresh_cost(multiplier);

    Ok(Purchase {
        id: converter.id.clone(),
        level: converter.owned,
        paid,
    })
}

/// Set or flip the on/off switch of converter `id`.
///
/// Returns the new state.
pub fn toggle_converter(
    converters: &mut [Converter],
    id: &str,
    active: Option<bool>,
) -> Result<bool, ActionError> {
    let converter = find_mut(converters, id)?;
    converter.active = active.unwrap_or(!converter.active);
    Ok(converter.active)
}

fn find_mut<'a>(converters: &'a mut [Converter], id: &str) -> Result<&'a mut Converter, ActionError> {
    converters
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| ActionError::UnknownConverter(id.to_string()))
}
