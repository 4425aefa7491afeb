//! Test fixtures and helpers.
//!
//! Pre-built game states for consistent testing. The simulation's store
//! is not writable from outside the core crate, so fixtures seed amounts
//! through starting amounts in the game data and then play real actions.

use imperium_core::actions::PlayerAction;
use imperium_core::data::GameData;
use imperium_core::simulation::Simulation;

/// Built-in balance with the given starting amounts.
///
/// Kinds not in the data are ignored.
#[must_use]
pub fn data_with_starting(amounts: &[(&str, f64)]) -> GameData {
    let mut data = GameData::imperium();
    for (kind, amount) in amounts {
        if let Some(resource) = data.resources.iter_mut().find(|r| r.id.as_str() == *kind) {
            resource.starting_amount = *amount;
        }
    }
    data
}

/// Fresh game on the built-in balance.
///
/// # Panics
///
/// Panics if the built-in data fails validation.
#[must_use]
pub fn imperium() -> Simulation {
    Simulation::imperium().expect("built-in data is valid")
}

/// Fresh game with the given starting amounts.
///
/// # Panics
///
/// Panics if the resulting data fails validation.
#[must_use]
pub fn with_starting(amounts: &[(&str, f64)]) -> Simulation {
    Simulation::new(data_with_starting(amounts)).expect("fixture data is valid")
}

/// A running mid-game economy.
///
/// Four woodcutters, two stone miners, a market stall and a sawmill, with
/// wood on sale.
///
/// # Panics
///
/// Panics if any fixture purchase is rejected.
#[must_use]
pub fn established_economy() -> Simulation {
    let mut sim = with_starting(&[("coins", 1000.0), ("wood", 500.0), ("stone", 100.0)]);
    for action in economy_purchases() {
        sim.apply_action(&action).expect("fixture purchase succeeds");
    }
    sim
}

/// The purchases [`established_economy`] makes.
#[must_use]
pub fn economy_purchases() -> Vec<PlayerAction> {
    let mut actions = vec![PlayerAction::PurchaseGenerator("woodcutter".to_string()); 4];
    actions.extend([
        PlayerAction::PurchaseGenerator("miner".to_string()),
        PlayerAction::PurchaseGenerator("miner".to_string()),
        PlayerAction::PurchaseGenerator("market".to_string()),
        PlayerAction::PurchaseConverter("sawmill".to_string()),
        PlayerAction::SetMarketSale {
            resource: "wood".into(),
            enabled: true,
        },
    ]);
    actions
}

/// Actions a scripted player issues on `tick`.
///
/// Clicks every tick and tries a purchase every few ticks, so runs mix
/// accepted and rejected actions.
#[must_use]
pub fn scripted_actions(tick: u64) -> Vec<PlayerAction> {
    let mut actions = vec![PlayerAction::Collect];
    match tick % 10 {
        0 => actions.push(PlayerAction::PurchaseGenerator("woodcutter".to_string())),
        3 => actions.push(PlayerAction::PurchaseGenerator("miner".to_string())),
        5 => actions.push(PlayerAction::PurchaseConverter("sawmill".to_string())),
        7 => actions.push(PlayerAction::PurchaseUpgrade("better_axe".to_string())),
        9 => actions.push(PlayerAction::ToggleConverter {
            id: "sawmill".to_string(),
            active: None,
        }),
        _ => {}
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_amounts_applied() {
        let sim = with_starting(&[("coins", 42.0), ("mithril", 5.0)]);
        assert_eq!(sim.amount("coins"), 42.0);
        assert_eq!(sim.amount("mithril"), 0.0);
    }

    #[test]
    fn test_established_economy() {
        let sim = established_economy();
        assert_eq!(sim.generator("woodcutter").unwrap().owned, 4);
        assert_eq!(sim.converter("sawmill").unwrap().owned, 1);
        assert!(sim.is_selling("wood"));
    }
}
