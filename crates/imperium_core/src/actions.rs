//! Player actions and the queue they wait in between ticks.
//!
//! Every mutation a player can trigger is a [`PlayerAction`]. Actions are
//! queued by the host and drained by
//! [`Simulation::step`](crate::Simulation::step) before the tick runs, so
//! actions and ticks share one ordered execution path.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::cost::Purchase;
use crate::prestige::PrestigeOutcome;
use crate::resources::ResourceKind;

/// Something the player asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Manual collection (a click).
    Collect,
    /// Buy one generator.
    PurchaseGenerator(String),
    /// Buy one converter.
    PurchaseConverter(String),
    /// Switch a converter on or off. `None` flips it.
    ToggleConverter {
        /// Converter id.
        id: String,
        /// Requested state.
        active: Option<bool>,
    },
    /// Buy an upgrade.
    PurchaseUpgrade(String),
    /// Raise the storage cap of a resource.
    UpgradeStorage(ResourceKind),
    /// Start or stop selling a resource.
    SetMarketSale {
        /// Resource to sell.
        resource: ResourceKind,
        /// Whether to sell it.
        enabled: bool,
    },
    /// Reset for prestige points.
    Prestige,
}

/// What a successful action did.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Amounts gained by a collection.
    Collected(BTreeMap<ResourceKind, f64>),
    /// A generator, converter, upgrade or storage level was bought.
    Purchased(Purchase),
    /// New converter state.
    ConverterToggled(bool),
    /// New sale state.
    MarketSaleSet(bool),
    /// Prestige result.
    Prestiged(PrestigeOutcome),
}

/// FIFO of actions waiting for the next step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionQueue {
    pending: VecDeque<PlayerAction>,
}

impl ActionQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an action.
    pub fn push(&mut self, action: PlayerAction) {
        self.pending.push_back(action);
    }

    /// Take every pending action in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = PlayerAction> + '_ {
        self.pending.drain(..)
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Extend<PlayerAction> for ActionQueue {
    fn extend<T: IntoIterator<Item = PlayerAction>>(&mut self, iter: T) {
        self.pending.extend(iter);
    }
}
