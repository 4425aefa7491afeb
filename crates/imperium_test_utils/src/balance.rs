//! Balance testing utilities for headless simulation.
//!
//! Plays a simple greedy player against a balance set to check pacing:
//! when each building first becomes affordable and what the economy looks
//! like after a fixed amount of play.

use std::collections::BTreeMap;

use imperium_core::actions::{ActionOutcome, PlayerAction};
use imperium_core::resources::ResourceKind;
use imperium_core::simulation::Simulation;

/// Result of a greedy run.
#[derive(Debug, Clone, Default)]
pub struct BalanceRun {
    /// Ticks played.
    pub ticks: u64,
    /// Accepted purchases.
    pub purchases: u32,
    /// Tick of the first accepted purchase per id.
    pub first_purchase: BTreeMap<String, u64>,
    /// Amounts at the end of the run.
    pub final_amounts: BTreeMap<ResourceKind, f64>,
}

impl BalanceRun {
    /// Tick `id` was first bought, if ever.
    pub fn first_purchase_of(&self, id: &str) -> Option<u64> {
        self.first_purchase.get(id).copied()
    }

    /// Final amount of `kind`.
    pub fn final_amount(&self, kind: &str) -> f64 {
        self.final_amounts.get(kind).copied().unwrap_or(0.0)
    }
}

/// Play `ticks` one-second ticks, clicking once and trying every
/// `shopping_list` entry in order each tick.
///
/// Rejected purchases are simply retried on the next tick.
pub fn run_greedy(sim: &mut Simulation, ticks: u64, shopping_list: &[PlayerAction]) -> BalanceRun {
    let mut run = BalanceRun::default();

    for _ in 0..ticks {
        sim.collect();
        for action in shopping_list {
            if let Ok(ActionOutcome::Purchased(purchase)) = sim.apply_action(action) {
                run.purchases += 1;
                run.first_purchase.entry(purchase.id).or_insert(sim.get_tick());
            }
        }
        sim.tick(1.0);
        run.ticks += 1;
    }

    run.final_amounts = sim.store().amounts();
    run
}

/// Early-game shopping list for the built-in balance.
pub fn early_game_list() -> Vec<PlayerAction> {
    vec![
        PlayerAction::PurchaseUpgrade("better_axe".to_string()),
        PlayerAction::PurchaseGenerator("market".to_string()),
        PlayerAction::PurchaseGenerator("woodcutter".to_string()),
        PlayerAction::PurchaseGenerator("miner".to_string()),
        PlayerAction::PurchaseConverter("sawmill".to_string()),
    ]
}
