//! Core simulation context.
//!
//! [`Simulation`] owns the game definitions and every piece of mutable
//! state. There is no global state: tests and tools create as many
//! independent simulations as they need.
//!
//! # Tick order
//!
//! Each tick runs these steps in order:
//! 1. **Generators** - bulk output, gated by dependency thresholds and
//!    scaled by deposit efficiency; deposits then regenerate
//! 2. **Converters** - accumulator advance and whole operations
//! 3. **Market** - sale of selected resources
//! 4. **Rates** - recompute displayed per-second rates
//! 5. **Unlocks and achievements**
//!
//! # Determinism
//!
//! All maps are ordered, nothing reads the clock and nothing is random.
//! The same starting state and the same sequence of `dt` values and
//! actions always produce the same state (see [`Simulation::state_hash`]).
//!
//! # Example
//!
//! ```
//! use imperium_core::simulation::Simulation;
//!
//! let mut sim = Simulation::imperium().unwrap();
//! sim.collect();
//! sim.tick(1.0);
//! assert_eq!(sim.get_tick(), 1);
//! assert_eq!(sim.amount("wood"), 1.0);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::achievements::{check_achievements, Progress};
use crate::actions::{ActionOutcome, ActionQueue, PlayerAction};
use crate::converters::{self, ConversionEvent, Converter};
use crate::cost::{self, CostMap, Purchase};
use crate::data::GameData;
use crate::error::{ActionError, GameError, Result};
use crate::generators::{self, Generator, ProductionEvent};
use crate::market::{self, MarketSale};
use crate::offline::{self, OfflineReport};
use crate::prestige::{PrestigeOutcome, PrestigeState};
use crate::production;
use crate::resources::{ResourceKind, ResourceStore};
use crate::scarcity::Scarcity;
use crate::session::ClockAdvance;
use crate::statistics::Statistics;
use crate::upgrades::{self, EffectTargets, Upgrade};

/// Something that became purchasable during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockEvent {
    /// A generator unlocked.
    Generator(String),
    /// A converter unlocked.
    Converter(String),
    /// An upgrade unlocked.
    Upgrade(String),
}

/// Events generated during a single tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tick number after this tick.
    pub tick: u64,
    /// Generator output.
    pub production: Vec<ProductionEvent>,
    /// Converter activity.
    pub conversions: Vec<ConversionEvent>,
    /// Market sales.
    pub market: MarketSale,
    /// Newly unlocked entities.
    pub unlocks: Vec<UnlockEvent>,
    /// Newly awarded achievement ids.
    pub achievements: Vec<String>,
}

/// Result of [`Simulation::step`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Each drained action with its result, in queue order.
    pub actions: Vec<(PlayerAction, std::result::Result<ActionOutcome, ActionError>)>,
    /// The tick that followed.
    pub tick: TickReport,
}

/// Result of [`Simulation::run_advance`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    /// Bulk catch-up applied before ticking, if any.
    pub catch_up: Option<OfflineReport>,
    /// One report per fixed tick.
    pub steps: Vec<StepReport>,
}

/// The core game simulation.
///
/// Owns validated [`GameData`] and all state derived from it. Every
/// mutation goes through `&mut self`, so ticks and actions can never
/// interleave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub(crate) data: GameData,
    pub(crate) tick: u64,
    pub(crate) store: ResourceStore,
    pub(crate) generators: Vec<Generator>,
    pub(crate) converters: Vec<Converter>,
    pub(crate) upgrades: Vec<Upgrade>,
    pub(crate) click_values: BTreeMap<ResourceKind, f64>,
    pub(crate) storage_levels: BTreeMap<ResourceKind, u32>,
    pub(crate) selling: BTreeSet<ResourceKind>,
    pub(crate) achieved: BTreeSet<String>,
    pub(crate) prestige: PrestigeState,
    pub(crate) statistics: Statistics,
    pub(crate) scarcity: Scarcity,
}

impl Simulation {
    /// Create a fresh game from `data`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the data fails validation.
    pub fn new(data: GameData) -> Result<Self> {
        data.validate()?;

        let mut sim = Self {
            tick: 0,
            store: initial_store(&data),
            generators: data.generators.iter().map(Generator::from_data).collect(),
            converters: data.converters.iter().map(Converter::from_data).collect(),
            upgrades: data.upgrades.iter().map(Upgrade::from_data).collect(),
            click_values: initial_click_values(&data),
            storage_levels: BTreeMap::new(),
            selling: BTreeSet::new(),
            achieved: BTreeSet::new(),
            prestige: PrestigeState::default(),
            statistics: Statistics::default(),
            scarcity: Scarcity::new(&data.scarcity),
            data,
        };
        sim.recompute_rates();
        Ok(sim)
    }

    /// Create a fresh game with the built-in balance.
    ///
    /// # Errors
    ///
    /// Only fails if the built-in data were invalid.
    pub fn imperium() -> Result<Self> {
        Self::new(GameData::imperium())
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// The definitions this game runs on.
    #[must_use]
    pub fn data(&self) -> &GameData {
        &self.data
    }

    /// The resource store.
    #[must_use]
    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// Amount of `kind`, 0 for unknown kinds.
    #[must_use]
    pub fn amount(&self, kind: &str) -> f64 {
        self.store.get(kind)
    }

    /// All generators in definition order.
    #[must_use]
    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    /// Generator `id`.
    #[must_use]
    pub fn generator(&self, id: &str) -> Option<&Generator> {
        self.generators.iter().find(|g| g.id == id)
    }

    /// All converters in definition order.
    #[must_use]
    pub fn converters(&self) -> &[Converter] {
        &self.converters
    }

    /// Converter `id`.
    #[must_use]
    pub fn converter(&self, id: &str) -> Option<&Converter> {
        self.converters.iter().find(|c| c.id == id)
    }

    /// All upgrades in definition order.
    #[must_use]
    pub fn upgrades(&self) -> &[Upgrade] {
        &self.upgrades
    }

    /// Upgrade `id`.
    #[must_use]
    pub fn upgrade(&self, id: &str) -> Option<&Upgrade> {
        self.upgrades.iter().find(|u| u.id == id)
    }

    /// Amount gained per manual collection, before the global multiplier.
    #[must_use]
    pub fn click_values(&self) -> &BTreeMap<ResourceKind, f64> {
        &self.click_values
    }

    /// Storage level of `kind`.
    #[must_use]
    pub fn storage_level(&self, kind: &str) -> u32 {
        self.storage_levels.get(kind).copied().unwrap_or(0)
    }

    /// Whether `kind` is being sold.
    #[must_use]
    pub fn is_selling(&self, kind: &str) -> bool {
        self.selling.contains(kind)
    }

    /// Awarded achievement ids.
    #[must_use]
    pub fn achievements(&self) -> &BTreeSet<String> {
        &self.achieved
    }

    /// Prestige progress.
    #[must_use]
    pub const fn prestige_state(&self) -> &PrestigeState {
        &self.prestige
    }

    /// Global multiplier applied to all production.
    #[must_use]
    pub const fn global_multiplier(&self) -> f64 {
        self.prestige.multiplier
    }

    /// Lifetime statistics.
    #[must_use]
    pub const fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Deposit state.
    #[must_use]
    pub const fn scarcity(&self) -> &Scarcity {
        &self.scarcity
    }

    /// Switch resource scarcity on or off. Deposits keep their level.
    pub fn set_scarcity_enabled(&mut self, enabled: bool) {
        self.scarcity.set_enabled(enabled);
        self.recompute_rates();
        tracing::info!(enabled, "Scarcity toggled");
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// A negative or non-finite `dt` is treated as 0: the tick still runs
    /// but nothing accumulates.
    pub fn tick(&mut self, dt: f64) -> TickReport {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let global = self.global_multiplier();
        let rules = self.data.rules;
        let mut report = TickReport::default();

        // 1. Generators
        report.production = generators::tick_generators(
            &self.generators,
            dt,
            global,
            &mut self.store,
            rules.production_threshold,
            rules.amount_decimals,
            &mut self.scarcity,
        );
        for event in &report.production {
            self.statistics.record_gain(&event.resource, event.amount);
        }
        self.scarcity.regenerate(dt);

        // 2. Converters
        report.conversions = converters::tick_converters(
            &mut self.converters,
            dt,
            global,
            &mut self.store,
            rules.max_burst_operations,
        );
        for event in &report.conversions {
            if let Some(converter) = self.converters.iter().find(|c| c.id == event.converter) {
                let ops = f64::from(event.operations);
                self.statistics.record_spent(&cost::scale(&converter.input, ops));
                for (kind, amount) in &converter.output {
                    self.statistics.record_gain(kind, amount * ops);
                }
            }
            self.statistics.converter_operations += u64::from(event.operations);
        }

        // 3. Market
        report.market = market::process_sales(
            &self.selling,
            &self.data.resources,
            &self.data.market,
            generators::stall_count(&self.generators),
            &self.data.currency,
            dt,
            &mut self.store,
            &self.scarcity,
        );
        self.statistics.record_spent(&report.market.sold);
        self.statistics.record_gain(&self.data.currency, report.market.earned);
        self.statistics.market_earned += report.market.earned;

        // 4. Rates
        self.recompute_rates();

        // 5. Unlocks and achievements
        report.unlocks = self.run_unlock_system();
        report.achievements = self.run_achievement_system();

        self.tick += 1;
        self.statistics.ticks += 1;
        report.tick = self.tick;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        report
    }

    /// Apply every queued action in order, then tick once.
    pub fn step(&mut self, dt: f64, queue: &mut ActionQueue) -> StepReport {
        let actions = queue
            .drain()
            .map(|action| {
                let result = self.apply_action(&action);
                (action, result)
            })
            .collect();
        StepReport {
            actions,
            tick: self.tick(dt),
        }
    }

    /// Run the work a [`SessionClock`](crate::session::SessionClock) handed out.
    ///
    /// Catch-up seconds are applied in bulk first, then each fixed tick is
    /// a [`step`](Self::step). Queued actions run with the first tick.
    pub fn run_advance(&mut self, advance: ClockAdvance, queue: &mut ActionQueue) -> SessionReport {
        let catch_up = (advance.catch_up_seconds > 0.0).then(|| self.catch_up_gap(advance.catch_up_seconds));
        let dt = self.data.rules.tick_seconds;
        let steps = (0..advance.ticks).map(|_| self.step(dt, queue)).collect();
        SessionReport { catch_up, steps }
    }

    /// Perform one player action.
    ///
    /// # Errors
    ///
    /// Returns the reason the action was rejected. A rejected action
    /// changes nothing.
    pub fn apply_action(&mut self, action: &PlayerAction) -> std::result::Result<ActionOutcome, ActionError> {
        match action {
            PlayerAction::Collect => Ok(ActionOutcome::Collected(self.collect())),
            PlayerAction::PurchaseGenerator(id) => self.purchase_generator(id).map(ActionOutcome::Purchased),
            PlayerAction::PurchaseConverter(id) => self.purchase_converter(id).map(ActionOutcome::Purchased),
            PlayerAction::ToggleConverter { id, active } => {
                self.toggle_converter(id, *active).map(ActionOutcome::ConverterToggled)
            }
            PlayerAction::PurchaseUpgrade(id) => self.purchase_upgrade(id).map(ActionOutcome::Purchased),
            PlayerAction::UpgradeStorage(kind) => {
                self.upgrade_storage(kind.as_str()).map(ActionOutcome::Purchased)
            }
            PlayerAction::SetMarketSale { resource, enabled } => self
                .set_market_sale(resource.as_str(), *enabled)
                .map(ActionOutcome::MarketSaleSet),
            PlayerAction::Prestige => self.prestige().map(ActionOutcome::Prestiged),
        }
    }

    /// Buy one unit of generator `id`.
    ///
    /// # Errors
    ///
    /// Unknown id, locked generator or insufficient resources.
    pub fn purchase_generator(&mut self, id: &str) -> std::result::Result<Purchase, ActionError> {
        let purchase = generators::purchase_generator(
            &mut self.generators,
            id,
            &mut self.store,
            self.data.cost_scaling.generator,
        )?;
        self.statistics.record_spent(&purchase.paid);
        self.statistics.generators_purchased += 1;
        self.recompute_rates();
        tracing::info!(generator = %purchase.id, owned = purchase.level, "Generator purchased");
        Ok(purchase)
    }

    /// Buy one unit of converter `id`. The first unit switches it on.
    ///
    /// # Errors
    ///
    /// Unknown id, locked converter or insufficient resources.
    pub fn purchase_converter(&mut self, id: &str) -> std::result::Result<Purchase, ActionError> {
        let purchase = converters::purchase_converter(
            &mut self.converters,
            id,
            &mut self.store,
            self.data.cost_scaling.converter,
        )?;
        self.statistics.record_spent(&purchase.paid);
        self.statistics.converters_purchased += 1;
        self.recompute_rates();
        tracing::info!(converter = %purchase.id, owned = purchase.level, "Converter purchased");
        Ok(purchase)
    }

    /// Set (`Some`) or flip (`None`) the switch of converter `id`.
    ///
    /// # Errors
    ///
    /// Unknown id.
    pub fn toggle_converter(&mut self, id: &str, active: Option<bool>) -> std::result::Result<bool, ActionError> {
        let state = converters::toggle_converter(&mut self.converters, id, active)?;
        self.recompute_rates();
        tracing::debug!(converter = id, active = state, "Converter toggled");
        Ok(state)
    }

    /// Buy upgrade `id` and apply its effect.
    ///
    /// # Errors
    ///
    /// Unknown id, locked, already bought or insufficient resources.
    pub fn purchase_upgrade(&mut self, id: &str) -> std::result::Result<Purchase, ActionError> {
        let mut targets = EffectTargets {
            generators: &mut self.generators,
            converters: &mut self.converters,
            click_values: &mut self.click_values,
        };
        let purchase = upgrades::purchase_upgrade(&mut self.upgrades, id, &mut self.store, &mut targets)?;
        self.statistics.record_spent(&purchase.paid);
        self.statistics.upgrades_purchased += 1;
        self.recompute_rates();
        tracing::info!(upgrade = %purchase.id, "Upgrade purchased");
        Ok(purchase)
    }

    /// Price of the next storage level of `kind`, `None` if it has none.
    #[must_use]
    pub fn storage_upgrade_cost(&self, kind: &str) -> Option<CostMap> {
        let resource = self.data.get_resource(kind)?;
        resource.is_upgradable().then(|| {
            cost::scaled_cost(
                &resource.storage_upgrade_cost,
                self.storage_level(kind),
                self.data.cost_scaling.resource_level,
            )
        })
    }

    /// Raise the storage cap of `kind` by one level.
    ///
    /// # Errors
    ///
    /// Unknown resource, resource without an upgradable cap, or
    /// insufficient resources.
    pub fn upgrade_storage(&mut self, kind: &str) -> std::result::Result<Purchase, ActionError> {
        let resource = self
            .data
            .get_resource(kind)
            .ok_or_else(|| ActionError::UnknownResource(kind.to_string()))?;
        let price = self
            .storage_upgrade_cost(kind)
            .ok_or_else(|| ActionError::NotUpgradable(resource.id.clone()))?;
        if let Some(shortfall) = cost::first_shortfall(&price, &self.store) {
            return Err(shortfall.into());
        }

        let id = resource.id.clone();
        let level = self.storage_level(kind) + 1;
        let cap = resource.cap_at(level);

        cost::deduct(&price, &mut self.store);
        self.storage_levels.insert(id.clone(), level);
        self.store.set_cap(&id, cap);
        self.statistics.record_spent(&price);
        self.statistics.storage_upgrades += 1;
        tracing::info!(resource = %id, level, cap = ?cap, "Storage upgraded");

        Ok(Purchase {
            id: id.0,
            level,
            paid: price,
        })
    }

    /// Manual collection.
    ///
    /// Adds every positive click value times the global multiplier and
    /// returns what actually landed in the store.
    pub fn collect(&mut self) -> BTreeMap<ResourceKind, f64> {
        let global = self.global_multiplier();
        let mut gained = BTreeMap::new();
        for (kind, value) in &self.click_values {
            if *value <= 0.0 {
                continue;
            }
            let applied = self.store.add(kind, value * global);
            self.statistics.record_gain(kind, applied);
            gained.insert(kind.clone(), applied);
        }
        self.statistics.total_clicks += 1;
        gained
    }

    /// Start or stop selling `kind` on the market.
    ///
    /// Returns the new state. Selling only has an effect while at least
    /// one market stall is owned.
    ///
    /// # Errors
    ///
    /// Unknown resource or a resource without a market price.
    pub fn set_market_sale(&mut self, kind: &str, enabled: bool) -> std::result::Result<bool, ActionError> {
        let resource = self
            .data
            .get_resource(kind)
            .ok_or_else(|| ActionError::UnknownResource(kind.to_string()))?;
        if !resource.is_sellable() {
            return Err(ActionError::NotSellable(resource.id.clone()));
        }
        if enabled {
            self.selling.insert(resource.id.clone());
        } else {
            self.selling.remove(kind);
        }
        self.recompute_rates();
        Ok(enabled)
    }

    /// Points a prestige right now would grant.
    #[must_use]
    pub fn preview_prestige_points(&self) -> u64 {
        self.data.prestige.points_for(self.store.get(self.data.currency.as_str()))
    }

    /// Reset all progress for prestige points.
    ///
    /// Resources (except those kept on prestige), generators, converters,
    /// upgrades, click values, storage levels and market selections return
    /// to their starting state. Statistics and achievements are kept.
    ///
    /// # Errors
    ///
    /// [`ActionError::PrestigeNotReady`] below the currency requirement.
    pub fn prestige(&mut self) -> std::result::Result<PrestigeOutcome, ActionError> {
        let currency = self.store.get(self.data.currency.as_str());
        if !self.data.prestige.is_ready(currency) {
            return Err(ActionError::PrestigeNotReady {
                required: self.data.prestige.min_currency,
                available: currency,
            });
        }

        let gained = self.data.prestige.points_for(currency);
        self.prestige.record_reset(gained, &self.data.prestige);
        self.reset_progress();

        let outcome = PrestigeOutcome {
            points_gained: gained,
            total_points: self.prestige.points,
            multiplier: self.prestige.multiplier,
        };
        tracing::info!(
            points_gained = outcome.points_gained,
            total_points = outcome.total_points,
            multiplier = outcome.multiplier,
            "Prestige reset"
        );
        Ok(outcome)
    }

    /// Compute what `elapsed_seconds` away would yield. Changes nothing.
    #[must_use]
    pub fn compute_offline_progress(&self, elapsed_seconds: f64) -> OfflineReport {
        offline::compute_offline_progress(
            &self.generators,
            &self.converters,
            &self.store,
            self.global_multiplier(),
            elapsed_seconds,
            &self.data.offline,
            self.data.rules.production_threshold,
            &self.scarcity,
        )
    }

    /// Add the deltas of a report computed earlier.
    pub fn apply_offline_progress(&mut self, report: &OfflineReport) {
        report.apply(&mut self.store);
        for (kind, delta) in &report.resource_deltas {
            self.statistics.record_delta(kind, *delta);
        }
        for (kind, delta) in &report.deposit_deltas {
            self.scarcity.apply_delta(kind, *delta);
        }
        self.statistics.converter_operations += report.converter_operations.values().sum::<u64>();
        self.statistics.offline_seconds += report.elapsed_seconds;
        self.recompute_rates();
        tracing::info!(
            elapsed_seconds = report.elapsed_seconds,
            resources = report.resource_deltas.len(),
            "Offline progress applied"
        );
    }

    /// Credit the time between a save and `now_ms` (epoch milliseconds).
    ///
    /// Follows the offline rules: capped, and ignored at or below the
    /// minimum threshold or when the save stamp is missing or in the future.
    pub fn catch_up(&mut self, now_ms: f64, last_save_ms: Option<f64>) -> OfflineReport {
        let elapsed = offline::elapsed_offline_seconds(now_ms, last_save_ms, &self.data.offline);
        self.credit(elapsed)
    }

    /// Credit a session gap of `seconds` in one bulk step.
    ///
    /// Capped like offline progress but without the minimum threshold.
    pub fn catch_up_gap(&mut self, seconds: f64) -> OfflineReport {
        let elapsed = if seconds.is_finite() {
            seconds.clamp(0.0, self.data.offline.max_seconds)
        } else {
            0.0
        };
        self.credit(elapsed)
    }

    fn credit(&mut self, elapsed: f64) -> OfflineReport {
        let report = self.compute_offline_progress(elapsed);
        if report.elapsed_seconds > 0.0 {
            self.apply_offline_progress(&report);
        }
        report
    }

    /// Recompute the displayed per-second rates.
    pub fn recompute_rates(&mut self) {
        let mut rates = production::aggregate_rates(
            &self.generators,
            &self.converters,
            self.global_multiplier(),
            &self.store,
            self.data.rules.production_threshold,
            &self.scarcity,
        );
        market::add_sale_rates(
            &mut rates,
            &self.selling,
            &self.data.resources,
            &self.data.market,
            generators::stall_count(&self.generators),
            &self.data.currency,
            &self.store,
            &self.scarcity,
        );
        for (kind, rate) in &rates {
            self.statistics.observe_rate(kind, *rate);
        }
        production::write_rates(&mut self.store, &rates);
    }

    /// Unlock every locked entity whose `unlock_when` amounts are held.
    fn run_unlock_system(&mut self) -> Vec<UnlockEvent> {
        let store = &self.store;
        let ready = |unlock_when: &CostMap| !unlock_when.is_empty() && cost::can_afford(unlock_when, store);
        let mut events = Vec::new();

        for generator in &mut self.generators {
            if !generator.unlocked && ready(&generator.unlock_when) {
                generator.unlocked = true;
                events.push(UnlockEvent::Generator(generator.id.clone()));
            }
        }
        for converter in &mut self.converters {
            if !converter.unlocked && ready(&converter.unlock_when) {
                converter.unlocked = true;
                events.push(UnlockEvent::Converter(converter.id.clone()));
            }
        }
        for upgrade in &mut self.upgrades {
            if !upgrade.unlocked && ready(&upgrade.unlock_when) {
                upgrade.unlocked = true;
                events.push(UnlockEvent::Upgrade(upgrade.id.clone()));
            }
        }

        for event in &events {
            tracing::info!(unlock = ?event, "Unlocked");
        }
        events
    }

    fn run_achievement_system(&mut self) -> Vec<String> {
        let progress = Progress {
            store: &self.store,
            generators: &self.generators,
            converters: &self.converters,
            statistics: &self.statistics,
            prestige_resets: self.prestige.resets,
        };
        let awarded = check_achievements(&self.data.achievements, &mut self.achieved, &progress);
        for id in &awarded {
            tracing::info!(achievement = %id, "Achievement awarded");
        }
        awarded
    }

    /// Put everything but prestige, statistics, achievements and deposits
    /// back to the starting state.
    fn reset_progress(&mut self) {
        let kept: Vec<(ResourceKind, f64)> = self
            .data
            .resources
            .iter()
            .filter(|r| r.keep_on_prestige)
            .map(|r| (r.id.clone(), self.store.get(r.id.as_str())))
            .collect();

        self.store = initial_store(&self.data);
        for (kind, amount) in &kept {
            self.store.set(kind, *amount);
        }
        self.generators = self.data.generators.iter().map(Generator::from_data).collect();
        self.converters = self.data.converters.iter().map(Converter::from_data).collect();
        self.upgrades = self.data.upgrades.iter().map(Upgrade::from_data).collect();
        self.click_values = initial_click_values(&self.data);
        self.storage_levels.clear();
        self.selling.clear();
        self.recompute_rates();
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        self.store.len().hash(&mut hasher);
        for (kind, resource) in self.store.iter() {
            kind.hash(&mut hasher);
            resource.amount.to_bits().hash(&mut hasher);
            resource.cap.map(f64::to_bits).hash(&mut hasher);
        }

        for generator in &self.generators {
            generator.id.hash(&mut hasher);
            generator.owned.hash(&mut hasher);
            generator.unlocked.hash(&mut hasher);
            generator.output_multiplier.to_bits().hash(&mut hasher);
        }

        for converter in &self.converters {
            converter.id.hash(&mut hasher);
            converter.owned.hash(&mut hasher);
            converter.active.hash(&mut hasher);
            converter.unlocked.hash(&mut hasher);
            converter.accumulator.to_bits().hash(&mut hasher);
            converter.speed_multiplier.to_bits().hash(&mut hasher);
        }

        for upgrade in &self.upgrades {
            upgrade.id.hash(&mut hasher);
            upgrade.purchased.hash(&mut hasher);
            upgrade.unlocked.hash(&mut hasher);
        }

        for (kind, value) in &self.click_values {
            kind.hash(&mut hasher);
            value.to_bits().hash(&mut hasher);
        }
        self.storage_levels.hash(&mut hasher);
        self.selling.hash(&mut hasher);
        self.achieved.hash(&mut hasher);

        self.prestige.points.hash(&mut hasher);
        self.prestige.resets.hash(&mut hasher);
        self.prestige.multiplier.to_bits().hash(&mut hasher);

        self.scarcity.is_enabled().hash(&mut hasher);
        for (kind, remaining) in self.scarcity.deposits() {
            kind.hash(&mut hasher);
            remaining.to_bits().hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Encode the complete simulation, definitions included.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize simulation: {e}")))
    }

    /// Decode a simulation produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the embedded data is invalid.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let sim: Self = bincode::deserialize(bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize simulation: {e}")))?;
        sim.data.validate()?;
        Ok(sim)
    }
}

/// Store with every defined kind at its starting amount and base cap.
fn initial_store(data: &GameData) -> ResourceStore {
    let mut store = ResourceStore::new();
    for resource in &data.resources {
        store.register(resource.id.clone(), resource.base_cap);
        store.set(&resource.id, resource.starting_amount);
    }
    store
}

fn initial_click_values(data: &GameData) -> BTreeMap<ResourceKind, f64> {
    data.resources
        .iter()
        .filter(|r| r.click_value > 0.0)
        .map(|r| (r.id.clone(), r.click_value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cost as cost_map;

    fn sim() -> Simulation {
        Simulation::imperium().unwrap()
    }

    fn give(sim: &mut Simulation, entries: &[(&str, f64)]) {
        for (kind, amount) in entries {
            sim.store.add(&ResourceKind::from(*kind), *amount);
        }
    }

    #[test]
    fn test_new_simulation() {
        let sim = sim();
        assert_eq!(sim.get_tick(), 0);
        assert_eq!(sim.global_multiplier(), 1.0);
        assert_eq!(sim.amount("coins"), 0.0);
        assert_eq!(sim.store().len(), 9);
    }

    #[test]
    fn test_invalid_data_rejected() {
        let mut data = GameData::imperium();
        data.rules.tick_seconds = f64::NAN;
        assert!(Simulation::new(data).is_err());
    }

    #[test]
    fn test_tick_increments() {
        let mut sim = sim();
        let report = sim.tick(1.0);
        assert_eq!(report.tick, 1);
        assert_eq!(sim.get_tick(), 1);
        assert_eq!(sim.statistics().ticks, 1);
    }

    #[test]
    fn test_collect_uses_click_values() {
        let mut sim = sim();
        let gained = sim.collect();
        assert_eq!(gained[&ResourceKind::from("wood")], 1.0);
        assert_eq!(sim.amount("wood"), 1.0);
        assert_eq!(sim.statistics().total_clicks, 1);
    }

    #[test]
    fn test_woodcutter_purchase_and_production() {
        let mut sim = sim();
        give(&mut sim, &[("coins", 100.0)]);

        sim.purchase_generator("woodcutter").unwrap();
        sim.purchase_generator("woodcutter").unwrap();

        assert_eq!(sim.amount("coins"), 79.0);
        assert_eq!(sim.store().production_rate("wood"), 1.0);

        sim.tick(1.0);
        assert_eq!(sim.amount("wood"), 1.0);
    }

    #[test]
    fn test_storage_upgrade_raises_cap() {
        let mut sim = sim();
        give(&mut sim, &[("wood", 5000.0)]);
        assert_eq!(sim.amount("wood"), 1000.0);

        let purchase = sim.upgrade_storage("wood").unwrap();
        assert_eq!(purchase.level, 1);
        assert_eq!(purchase.paid, cost_map(&[("wood", 10.0)]));
        assert_eq!(sim.store().resource("wood").unwrap().cap, Some(1500.0));
        assert_eq!(sim.storage_upgrade_cost("wood"), Some(cost_map(&[("wood", 11.0)])));
    }

    #[test]
    fn test_storage_upgrade_rejections() {
        let mut sim = sim();
        assert_eq!(
            sim.upgrade_storage("coins"),
            Err(ActionError::NotUpgradable(ResourceKind::from("coins")))
        );
        assert_eq!(
            sim.upgrade_storage("mithril"),
            Err(ActionError::UnknownResource("mithril".to_string()))
        );
        assert!(matches!(
            sim.upgrade_storage("wood"),
            Err(ActionError::InsufficientResources { .. })
        ));
    }

    #[test]
    fn test_market_sale_needs_price() {
        let mut sim = sim();
        assert_eq!(
            sim.set_market_sale("coins", true),
            Err(ActionError::NotSellable(ResourceKind::from("coins")))
        );
        assert_eq!(sim.set_market_sale("wood", true), Ok(true));
        assert!(sim.is_selling("wood"));
    }

    #[test]
    fn test_market_sells_with_stall() {
        let mut sim = sim();
        give(&mut sim, &[("wood", 130.0)]);
        sim.purchase_generator("market").unwrap();
        sim.set_market_sale("wood", true).unwrap();

        let report = sim.tick(1.0);

        // one stall: 0.3 wood/s at 1.05 coins each
        assert!((report.market.earned - 0.315).abs() < 1e-9);
        assert!((sim.amount("wood") - 99.7).abs() < 1e-9);
        assert!((sim.statistics().market_earned - 0.315).abs() < 1e-9);
    }

    #[test]
    fn test_unlock_when_threshold_reached() {
        let mut data = GameData::imperium();
        data.generators[1].unlocked = false;
        data.generators[1].unlock_when = cost_map(&[("wood", 5.0)]);
        let mut sim = Simulation::new(data).unwrap();

        assert_eq!(sim.purchase_generator("miner"), Err(ActionError::Locked("miner".to_string())));
        give(&mut sim, &[("wood", 5.0)]);
        let report = sim.tick(1.0);

        assert_eq!(report.unlocks, vec![UnlockEvent::Generator("miner".to_string())]);
        assert!(sim.generator("miner").unwrap().unlocked);
    }

    #[test]
    fn test_achievement_awarded_at_tick() {
        let mut sim = sim();
        give(&mut sim, &[("wood", 100.0)]);
        let report = sim.tick(1.0);
        assert!(report.achievements.contains(&"wood_collector".to_string()));
        assert!(sim.achievements().contains("wood_collector"));
    }

    #[test]
    fn test_step_runs_actions_before_tick() {
        let mut sim = sim();
        give(&mut sim, &[("coins", 10.0)]);
        let mut queue = ActionQueue::new();
        queue.push(PlayerAction::PurchaseGenerator("woodcutter".to_string()));
        queue.push(PlayerAction::PurchaseGenerator("woodcutter".to_string()));

        let report = sim.step(1.0, &mut queue);

        assert!(report.actions[0].1.is_ok());
        assert!(matches!(report.actions[1].1, Err(ActionError::InsufficientResources { .. })));
        assert_eq!(sim.amount("wood"), 0.5);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_prestige_not_ready() {
        let mut sim = sim();
        assert!(matches!(sim.prestige(), Err(ActionError::PrestigeNotReady { .. })));
    }

    #[test]
    fn test_prestige_resets_and_multiplies() {
        let mut sim = sim();
        give(&mut sim, &[("coins", 1_000_000.0), ("wood", 500.0)]);
        sim.purchase_generator("woodcutter").unwrap();
        sim.purchase_upgrade("better_axe").unwrap();
        sim.scarcity.set_remaining("stone", 1_000.0);

        let outcome = sim.prestige().unwrap();

        assert_eq!(outcome.points_gained, 9);
        assert!((sim.global_multiplier() - 1.9).abs() < 1e-12);
        assert_eq!(sim.amount("coins"), 0.0);
        assert_eq!(sim.amount("wood"), 0.0);
        assert_eq!(sim.generator("woodcutter").unwrap().owned, 0);
        assert!(!sim.upgrade("better_axe").unwrap().purchased);
        assert_eq!(sim.click_values()[&ResourceKind::from("wood")], 1.0);
        assert_eq!(sim.statistics().generators_purchased, 1);
        assert_eq!(sim.scarcity().remaining("stone"), Some(1_000.0));

        sim.collect();
        assert!((sim.amount("wood") - 1.9).abs() < 1e-12);
    }

    #[test]
    fn test_catch_up_gap_skips_threshold() {
        let mut sim = sim();
        give(&mut sim, &[("coins", 10.0)]);
        sim.purchase_generator("woodcutter").unwrap();

        let report = sim.catch_up_gap(20.0);
        assert_eq!(report.delta("wood"), 10.0);

        let report = sim.catch_up(100_000.0, Some(80_000.0));
        assert!(report.is_empty());
    }

    #[test]
    fn test_bytes_round_trip_preserves_hash() {
        let mut sim = sim();
        give(&mut sim, &[("coins", 500.0)]);
        sim.purchase_generator("woodcutter").unwrap();
        for _ in 0..10 {
            sim.tick(1.0);
        }

        let restored = Simulation::from_bytes(&sim.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.state_hash(), sim.state_hash());
    }

    #[test]
    fn test_hash_changes_with_state() {
        let mut sim = sim();
        let before = sim.state_hash();
        sim.collect();
        assert_ne!(before, sim.state_hash());
    }

    #[test]
    fn test_depleted_deposit_slows_generators() {
        let mut sim = sim();
        give(&mut sim, &[("coins", 10.0)]);
        sim.purchase_generator("woodcutter").unwrap();
        sim.scarcity.set_remaining("wood", 10_000.0);
        assert!((sim.scarcity().efficiency("wood") - 0.36).abs() < 1e-12);

        sim.tick(1.0);

        let wood = sim.amount("wood");
        assert!(wood > 0.0 && wood < 0.5);
        let expected = 10_000.0 - wood + 100_000.0 * 0.001 / 60.0;
        assert!((sim.scarcity().remaining("wood").unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_scarcity_keeps_deposits() {
        let mut sim = sim();
        give(&mut sim, &[("coins", 10.0)]);
        sim.purchase_generator("woodcutter").unwrap();
        sim.scarcity.set_remaining("wood", 10_000.0);
        let before = sim.state_hash();

        sim.set_scarcity_enabled(false);
        assert_ne!(before, sim.state_hash());
        sim.tick(1.0);

        assert_eq!(sim.amount("wood"), 0.5);
        assert_eq!(sim.scarcity().remaining("wood"), Some(10_000.0));
    }

    #[test]
    fn test_offline_progress_moves_deposits() {
        let mut sim = sim();
        give(&mut sim, &[("coins", 10.0)]);
        sim.purchase_generator("woodcutter").unwrap();
        sim.scarcity.set_remaining("wood", 10_000.0);

        let report = sim.catch_up_gap(100.0);
        let produced = report.delta("wood");
        let regenerated = 100_000.0 * 0.001 / 60.0 * 100.0;

        assert!((produced - 18.0).abs() < 1e-9);
        assert!((report.deposit_deltas[&ResourceKind::from("wood")] - (regenerated - produced)).abs() < 1e-9);
        assert!((sim.scarcity().remaining("wood").unwrap() - (10_000.0 + regenerated - produced)).abs() < 1e-9);
    }
}
