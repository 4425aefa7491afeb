//! One-time upgrades.
//!
//! Effects are plain data. [`apply_effect`] is the only place that
//! interprets them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::converters::Converter;
use crate::cost::{self, CostMap, Purchase};
use crate::data::UpgradeData;
use crate::error::ActionError;
use crate::generators::Generator;
use crate::resources::{ResourceKind, ResourceStore};

/// What an upgrade does when bought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpgradeEffect {
    /// Multiply the output of one generator type.
    MultiplyGeneratorOutput {
        /// Generator id.
        target: String,
        /// Factor applied to its output multiplier.
        factor: f64,
    },

    /// Multiply the speed of one converter type.
    MultiplyConverterSpeed {
        /// Converter id.
        target: String,
        /// Factor applied to its speed multiplier.
        factor: f64,
    },

    /// Multiply the amount gained per manual collection.
    MultiplyClickValue {
        /// Collected resource.
        resource: ResourceKind,
        /// Factor applied to its click value.
        factor: f64,
    },

    /// Set the amount gained per manual collection.
    SetClickValue {
        /// Collected resource.
        resource: ResourceKind,
        /// New click value.
        value: f64,
    },
}

/// Runtime state of one upgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    /// Unique identifier.
    pub id: String,
    /// One-time price.
    pub cost: CostMap,
    /// Effect applied on purchase.
    pub effect: UpgradeEffect,
    /// Whether the upgrade can be bought.
    pub unlocked: bool,
    /// Amounts that unlock the upgrade.
    pub unlock_when: CostMap,
    /// Whether the upgrade was bought.
    pub purchased: bool,
}

impl Upgrade {
    /// Fresh, unpurchased upgrade.
    #[must_use]
    pub fn from_data(data: &UpgradeData) -> Self {
        Self {
            id: data.id.clone(),
            cost: data.cost.clone(),
            effect: data.effect.clone(),
            unlocked: data.unlocked,
            unlock_when: data.unlock_when.clone(),
            purchased: false,
        }
    }
}

/// Everything an effect can modify.
pub struct EffectTargets<'a> {
    /// Generators.
    pub generators: &'a mut [Generator],
    /// Converters.
    pub converters: &'a mut [Converter],
    /// Click values per resource.
    pub click_values: &'a mut BTreeMap<ResourceKind, f64>,
}

/// Apply `effect` to `targets`.
///
/// Returns `false` when the target does not exist.
pub fn apply_effect(effect: &UpgradeEffect, targets: &mut EffectTargets<'_>) -> bool {
    match effect {
        UpgradeEffect::MultiplyGeneratorOutput { target, factor } => {
            match targets.generators.iter_mut().find(|g| &g.id == target) {
                Some(generator) => {
                    generator.output_multiplier *= factor;
                    true
                }
                None => false,
            }
        }
        UpgradeEffect::MultiplyConverterSpeed { target, factor } => {
            match targets.converters.iter_mut().find(|c| &c.id == target) {
                Some(converter) => {
                    converter.speed_multiplier *= factor;
                    true
                }
                None => false,
            }
        }
        UpgradeEffect::MultiplyClickValue { resource, factor } => {
            *targets.click_values.entry(resource.clone()).or_default() *= factor;
            true
        }
        UpgradeEffect::SetClickValue { resource, value } => {
            targets.click_values.insert(resource.clone(), *value);
            true
        }
    }
}

/// Buy upgrade `id` and apply its effect.
pub fn purchase_upgrade(
    upgrades: &mut [Upgrade],
    id: &str,
    store: &mut ResourceStore,
    targets: &mut EffectTargets<'_>,
) -> Result<Purchase, ActionError> {
    let upgrade = upgrades
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| ActionError::UnknownUpgrade(id.to_string()))?;

    if upgrade.purchased {
        return Err(ActionError::AlreadyPurchased(id.to_string()));
    }
    if !upgrade.unlocked {
        return Err(ActionError::Locked(id.to_string()));
    }
    if let Some(shortfall) = cost::first_shortfall(&upgrade.cost, store) {
        return Err(shortfall.into());
    }

    cost::deduct(&upgrade.cost, store);
    upgrade.purchased = true;
    if !apply_effect(&upgrade.effect, targets) {
        tracing::warn!(upgrade = %upgrade.id, "Upgrade effect target missing");
    }

    Ok(Purchase {
        id: upgrade.id.clone(),
        level: 1,
        paid: upgrade.cost.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{cost as cost_map, GeneratorData};

    fn woodcutter() -> Generator {
        Generator::from_data(&GeneratorData {
            id: "woodcutter".to_string(),
            name: String::new(),
            produces: Some(ResourceKind::from("wood")),
            base_output: 0.5,
            base_cost: cost_map(&[("coins", 10.0)]),
            unlocked: true,
            unlock_when: CostMap::new(),
            requires: Vec::new(),
            sells: false,
        })
    }

    fn upgrade(effect: UpgradeEffect) -> Upgrade {
        Upgrade::from_data(&UpgradeData {
            id: "u".to_string(),
            name: String::new(),
            cost: cost_map(&[("coins", 50.0)]),
            effect,
            unlocked: true,
            unlock_when: CostMap::new(),
        })
    }

    #[test]
    fn test_generator_multiplier_stacks() {
        let mut gens = vec![woodcutter()];
        let mut clicks = BTreeMap::new();
        let mut targets = EffectTargets {
            generators: &mut gens,
            converters: &mut [],
            click_values: &mut clicks,
        };
        let effect = UpgradeEffect::MultiplyGeneratorOutput {
            target: "woodcutter".to_string(),
            factor: 2.0,
        };

        assert!(apply_effect(&effect, &mut targets));
        assert!(apply_effect(&effect, &mut targets));
        assert_eq!(gens[0].output_multiplier, 4.0);
    }

    #[test]
    fn test_missing_target_reports_false() {
        let mut clicks = BTreeMap::new();
        let mut targets = EffectTargets {
            generators: &mut [],
            converters: &mut [],
            click_values: &mut clicks,
        };
        let effect = UpgradeEffect::MultiplyConverterSpeed {
            target: "sawmill".to_string(),
            factor: 2.0,
        };
        assert!(!apply_effect(&effect, &mut targets));
    }

    #[test]
    fn test_click_effects() {
        let mut clicks: BTreeMap<ResourceKind, f64> = [(ResourceKind::from("wood"), 1.0)].into_iter().collect();
        let mut targets = EffectTargets {
            generators: &mut [],
            converters: &mut [],
            click_values: &mut clicks,
        };

        apply_effect(
            &UpgradeEffect::MultiplyClickValue {
                resource: ResourceKind::from("wood"),
                factor: 2.0,
            },
            &mut targets,
        );
        apply_effect(
            &UpgradeEffect::SetClickValue {
                resource: ResourceKind::from("stone"),
                value: 1.0,
            },
            &mut targets,
        );

        assert_eq!(clicks[&ResourceKind::from("wood")], 2.0);
        assert_eq!(clicks[&ResourceKind::from("stone")], 1.0);
    }

    #[test]
    fn test_purchase_once() {
        let mut ups = vec![upgrade(UpgradeEffect::SetClickValue {
            resource: ResourceKind::from("stone"),
            value: 1.0,
        })];
        let mut store = ResourceStore::new();
        store.add(&ResourceKind::from("coins"), 120.0);
        let mut clicks = BTreeMap::new();
        let mut targets = EffectTargets {
            generators: &mut [],
            converters: &mut [],
            click_values: &mut clicks,
        };

        purchase_upgrade(&mut ups, "u", &mut store, &mut targets).unwrap();
        assert_eq!(
            purchase_upgrade(&mut ups, "u", &mut store, &mut targets),
            Err(ActionError::AlreadyPurchased("u".to_string()))
        );
        assert_eq!(store.get("coins"), 70.0);
        assert!(ups[0].purchased);
    }

    #[test]
    fn test_effect_serializes_as_data() {
        let effect = UpgradeEffect::MultiplyGeneratorOutput {
            target: "miner".to_string(),
            factor: 2.0,
        };
        let json = serde_json::to_string(&effect).unwrap();
        assert_eq!(json, r#"{"MultiplyGeneratorOutput":{"target":"miner","factor":2.0}}"#);
        assert_eq!(serde_json::from_str::<UpgradeEffect>(&json).unwrap(), effect);
    }
}
