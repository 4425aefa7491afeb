//! Complete balance definition of a game.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{
    AchievementData, ConverterData, GeneratorData, ResourceData, SimulationRules, UpgradeData,
};
use crate::achievements::AchievementCondition;
use crate::cost::{CostMap, CostScaling};
use crate::error::{GameError, Result};
use crate::market::MarketRules;
use crate::offline::OfflineRules;
use crate::prestige::PrestigeRules;
use crate::resources::ResourceKind;
use crate::scarcity::{DepositData, ScarcityRules};
use crate::upgrades::UpgradeEffect;

fn default_currency() -> ResourceKind {
    ResourceKind::from("coins")
}

/// Every definition and tuning value a [`Simulation`](crate::Simulation)
/// is built from.
///
/// Loaded from RON or built in code with [`GameData::imperium`]. Only
/// data that passes [`GameData::validate`] can start a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    /// Name of this balance set.
    #[serde(default)]
    pub name: String,

    /// Resource used for market income and the prestige requirement.
    #[serde(default = "default_currency")]
    pub currency: ResourceKind,

    /// Resource kinds.
    pub resources: Vec<ResourceData>,

    /// Generators.
    #[serde(default)]
    pub generators: Vec<GeneratorData>,

    /// Converters.
    #[serde(default)]
    pub converters: Vec<ConverterData>,

    /// One-time upgrades.
    #[serde(default)]
    pub upgrades: Vec<UpgradeData>,

    /// Achievements.
    #[serde(default)]
    pub achievements: Vec<AchievementData>,

    /// Cost growth factors.
    #[serde(default)]
    pub cost_scaling: CostScaling,

    /// Tick tuning.
    #[serde(default)]
    pub rules: SimulationRules,

    /// Market tuning.
    #[serde(default)]
    pub market: MarketRules,

    /// Prestige tuning.
    #[serde(default)]
    pub prestige: PrestigeRules,

    /// Offline catch-up tuning.
    #[serde(default)]
    pub offline: OfflineRules,

    /// Deposits and scarcity tuning.
    #[serde(default)]
    pub scarcity: ScarcityRules,
}

impl GameData {
    /// Find a resource definition by kind.
    #[must_use]
    pub fn get_resource(&self, id: &str) -> Option<&ResourceData> {
        self.resources.iter().find(|r| r.id.as_str() == id)
    }

    /// Find a generator by its ID.
    #[must_use]
    pub fn get_generator(&self, id: &str) -> Option<&GeneratorData> {
        self.generators.iter().find(|g| g.id == id)
    }

    /// Find a converter by its ID.
    #[must_use]
    pub fn get_converter(&self, id: &str) -> Option<&ConverterData> {
        self.converters.iter().find(|c| c.id == id)
    }

    /// Find an upgrade by its ID.
    #[must_use]
    pub fn get_upgrade(&self, id: &str) -> Option<&UpgradeData> {
        self.upgrades.iter().find(|u| u.id == id)
    }

    /// Parse RON source and validate the result.
    ///
    /// `label` names the source in error messages (usually a file path).
    pub fn from_ron_str(source: &str, label: &str) -> Result<Self> {
        let data: Self = ron::from_str(source).map_err(|e| GameError::DataParseError {
            path: label.to_string(),
            message: e.to_string(),
        })?;
        data.validate()?;
        Ok(data)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::InvalidState(format!("RON encoding failed: {e}")))
    }

    /// Reject the data on its first problem.
    pub fn validate(&self) -> Result<()> {
        match self.validation_errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Every problem found in the data.
    ///
    /// Checks for:
    /// - Non-finite or non-positive multipliers, outputs, speeds, costs and caps
    /// - Duplicate ids
    /// - References to undefined resources, generators and converters
    /// - Converters without inputs or outputs
    #[must_use]
    pub fn validation_errors(&self) -> Vec<GameError> {
        let mut v = Validator::default();
        let kinds: BTreeSet<&str> = self.resources.iter().map(|r| r.id.as_str()).collect();

        if self.get_resource(self.currency.as_str()).is_none() {
            v.fail("currency", format!("undefined resource '{}'", self.currency));
        }

        v.unique("resources", self.resources.iter().map(|r| r.id.as_str()));
        v.unique("generators", self.generators.iter().map(|g| g.id.as_str()));
        v.unique("converters", self.converters.iter().map(|c| c.id.as_str()));
        v.unique("upgrades", self.upgrades.iter().map(|u| u.id.as_str()));
        v.unique("achievements", self.achievements.iter().map(|a| a.id.as_str()));

        for r in &self.resources {
            let at = format!("resources.{}", r.id);
            v.non_negative(&format!("{at}.starting_amount"), r.starting_amount);
            v.non_negative(&format!("{at}.click_value"), r.click_value);
            if let Some(cap) = r.base_cap {
                v.positive(&format!("{at}.base_cap"), cap);
                if r.starting_amount > cap {
                    v.fail(&format!("{at}.starting_amount"), "exceeds base_cap");
                }
            }
            v.at_least_one(&format!("{at}.cap_growth"), r.cap_growth);
            v.cost(&format!("{at}.storage_upgrade_cost"), &r.storage_upgrade_cost, &kinds, false);
            if !r.storage_upgrade_cost.is_empty() && r.base_cap.is_none() {
                v.fail(&format!("{at}.storage_upgrade_cost"), "resource has no cap to raise");
            }
            if let Some(price) = r.sell_price {
                v.positive(&format!("{at}.sell_price"), price);
            }
        }

        for g in &self.generators {
            let at = format!("generators.{}", g.id);
            match &g.produces {
                Some(kind) => {
                    v.known(&format!("{at}.produces"), kind, &kinds);
                    v.positive(&format!("{at}.base_output"), g.base_output);
                }
                None => v.non_negative(&format!("{at}.base_output"), g.base_output),
            }
            v.cost(&format!("{at}.base_cost"), &g.base_cost, &kinds, true);
            v.cost(&format!("{at}.unlock_when"), &g.unlock_when, &kinds, false);
            for kind in &g.requires {
                v.known(&format!("{at}.requires"), kind, &kinds);
            }
        }

        for c in &self.converters {
            let at = format!("converters.{}", c.id);
            v.cost(&format!("{at}.input"), &c.input, &kinds, true);
            v.cost(&format!("{at}.output"), &c.output, &kinds, true);
            v.positive(&format!("{at}.base_speed"), c.base_speed);
            v.cost(&format!("{at}.base_cost"), &c.base_cost, &kinds, true);
            v.cost(&format!("{at}.unlock_when"), &c.unlock_when, &kinds, false);
        }

        for u in &self.upgrades {
            let at = format!("upgrades.{}", u.id);
            v.cost(&format!("{at}.cost"), &u.cost, &kinds, true);
            v.cost(&format!("{at}.unlock_when"), &u.unlock_when, &kinds, false);
            let field = format!("{at}.effect");
            match &u.effect {
                UpgradeEffect::MultiplyGeneratorOutput { target, factor } => {
                    if self.get_generator(target).is_none() {
                        v.fail(&field, format!("unknown generator '{target}'"));
                    }
                    v.positive(&field, *factor);
                }
                UpgradeEffect::MultiplyConverterSpeed { target, factor } => {
                    if self.get_converter(target).is_none() {
                        v.fail(&field, format!("unknown converter '{target}'"));
                    }
                    v.positive(&field, *factor);
                }
                UpgradeEffect::MultiplyClickValue { resource, factor } => {
                    v.known(&field, resource, &kinds);
                    v.positive(&field, *factor);
                }
                UpgradeEffect::SetClickValue { resource, value } => {
                    v.known(&field, resource, &kinds);
                    v.non_negative(&field, *value);
                }
            }
        }

        for a in &self.achievements {
            if let AchievementCondition::ResourceAmount { resource, amount } = &a.condition {
                let at = format!("achievements.{}.condition", a.id);
                v.known(&at, resource, &kinds);
                v.non_negative(&at, *amount);
            }
        }

        v.at_least_one("cost_scaling.generator", self.cost_scaling.generator);
        v.at_least_one("cost_scaling.converter", self.cost_scaling.converter);
        v.at_least_one("cost_scaling.resource_level", self.cost_scaling.resource_level);

        v.positive("rules.tick_seconds", self.rules.tick_seconds);
        v.non_negative("rules.production_threshold", self.rules.production_threshold);
        if self.rules.max_burst_operations == 0 {
            v.fail("rules.max_burst_operations", "must be at least 1");
        }
        if !(0..=10).contains(&self.rules.amount_decimals) {
            v.fail("rules.amount_decimals", "must be between 0 and 10");
        }
        if self.rules.max_ticks_per_advance == 0 {
            v.fail("rules.max_ticks_per_advance", "must be at least 1");
        }

        v.positive("market.base_sell_rate", self.market.base_sell_rate);
        v.non_negative("market.sell_rate_growth", self.market.sell_rate_growth);
        v.non_negative("market.price_growth", self.market.price_growth);
        v.positive("market.min_price", self.market.min_price);

        v.positive("prestige.min_currency", self.prestige.min_currency);
        v.positive("prestige.point_divisor", self.prestige.point_divisor);
        v.positive("prestige.bonus_per_point", self.prestige.bonus_per_point);

        v.positive("offline.max_seconds", self.offline.max_seconds);
        v.non_negative("offline.min_threshold_seconds", self.offline.min_threshold_seconds);
        v.positive("offline.efficiency", self.offline.efficiency);
        if self.offline.max_operations_per_converter == 0 {
            v.fail("offline.max_operations_per_converter", "must be at least 1");
        }

        let scarcity = &self.scarcity;
        if !(scarcity.min_efficiency.is_finite() && (0.0..=1.0).contains(&scarcity.min_efficiency)) {
            v.fail("scarcity.min_efficiency", "must be between 0 and 1");
        }
        if !(scarcity.efficiency_threshold.is_finite()
            && scarcity.efficiency_threshold > 0.0
            && scarcity.efficiency_threshold <= 1.0)
        {
            v.fail("scarcity.efficiency_threshold", "must be above 0 and at most 1");
        }
        v.positive("scarcity.base_price_multiplier", scarcity.base_price_multiplier);
        v.positive("scarcity.max_price_multiplier", scarcity.max_price_multiplier);
        if scarcity.max_price_multiplier < scarcity.base_price_multiplier {
            v.fail("scarcity.max_price_multiplier", "must not be below base_price_multiplier");
        }
        v.unique("scarcity.deposits", scarcity.deposits.iter().map(|d| d.resource.as_str()));
        for d in &scarcity.deposits {
            let at = format!("scarcity.deposits.{}", d.resource);
            v.known(&at, &d.resource, &kinds);
            v.positive(&format!("{at}.initial"), d.initial);
            v.non_negative(&format!("{at}.regeneration_per_minute"), d.regeneration_per_minute);
        }

        v.errors
    }

    /// The built-in balance of Ressourcen-Imperium.
    #[must_use]
    pub fn imperium() -> Self {
        let raw = |id: &str, name: &str, upgrade: f64, price: f64| ResourceData {
            name: name.to_string(),
            base_cap: Some(1000.0),
            storage_upgrade_cost: cost(&[(id, upgrade)]),
            sell_price: Some(price),
            ..ResourceData::new(id)
        };
        let refined = |id: &str, name: &str, price: f64| ResourceData {
            name: name.to_string(),
            sell_price: Some(price),
            ..ResourceData::new(id)
        };

        let resources = vec![
            ResourceData {
                name: "Muenzen".to_string(),
                ..ResourceData::new("coins")
            },
            ResourceData {
                click_value: 1.0,
                ..raw("wood", "Holz", 10.0, 1.0)
            },
            raw("stone", "Stein", 15.0, 2.0),
            raw("iron", "Eisen", 25.0, 5.0),
            raw("copper", "Kupfer", 50.0, 7.0),
            refined("planks", "Bretter", 3.0),
            refined("bricks", "Ziegel", 6.0),
            refined("tools", "Werkzeuge", 15.0),
            refined("jewelry", "Schmuck", 25.0),
        ];

        let generator = |id: &str, name: &str, produces: Option<&str>, output: f64, price: &[(&str, f64)]| {
            GeneratorData {
                id: id.to_string(),
                name: name.to_string(),
                produces: produces.map(ResourceKind::from),
                base_output: output,
                base_cost: cost(price),
                unlocked: true,
                unlock_when: CostMap::new(),
                requires: Vec::new(),
                sells: false,
            }
        };

        let generators = vec![
            generator("woodcutter", "Holzfaeller", Some("wood"), 0.5, &[("coins", 10.0)]),
            generator("miner", "Steinmetz", Some("stone"), 0.3, &[("coins", 50.0), ("wood", 20.0)]),
            GeneratorData {
                requires: vec![ResourceKind::from("stone")],
                ..generator(
                    "iron_miner",
                    "Eisenmine",
                    Some("iron"),
                    0.2,
                    &[("coins", 200.0), ("wood", 50.0), ("stone", 50.0)],
                )
            },
            GeneratorData {
                requires: vec![ResourceKind::from("stone"), ResourceKind::from("iron")],
                ..generator(
                    "copper_miner",
                    "Kupfermine",
                    Some("copper"),
                    0.1,
                    &[("coins", 300.0), ("wood", 100.0), ("stone", 80.0)],
                )
            },
            GeneratorData {
                sells: true,
                ..generator("market", "Marktstand", None, 0.0, &[("wood", 30.0)])
            },
            generator("bank", "Bank", Some("coins"), 2.0, &[("wood", 100.0), ("stone", 50.0)]),
        ];

        let converter = |id: &str,
                         name: &str,
                         input: &[(&str, f64)],
                         output: &[(&str, f64)],
                         speed: f64,
                         price: &[(&str, f64)]| ConverterData {
            id: id.to_string(),
            name: name.to_string(),
            input: cost(input),
            output: cost(output),
            base_speed: speed,
            base_cost: cost(price),
            unlocked: true,
            unlock_when: CostMap::new(),
        };

        let converters = vec![
            converter(
                "sawmill",
                "Saegewerk",
                &[("wood", 2.0)],
                &[("planks", 1.0)],
                0.2,
                &[("coins", 100.0), ("wood", 50.0)],
            ),
            converter(
                "brickmaker",
                "Ziegelei",
                &[("stone", 3.0)],
                &[("bricks", 1.0)],
                0.15,
                &[("coins", 200.0), ("wood", 80.0), ("stone", 40.0)],
            ),
            converter(
                "toolsmith",
                "Werkzeugschmiede",
                &[("iron", 2.0), ("planks", 1.0)],
                &[("tools", 1.0)],
                0.1,
                &[("coins", 500.0), ("planks", 50.0), ("iron", 30.0)],
            ),
            converter(
                "jeweler",
                "Schmuckwerkstatt",
                &[("copper", 2.0), ("iron", 1.0)],
                &[("jewelry", 1.0)],
                0.05,
                &[("coins", 800.0), ("planks", 100.0), ("bricks", 50.0)],
            ),
        ];

        let upgrade = |id: &str, name: &str, price: &[(&str, f64)], effect: UpgradeEffect| {
            UpgradeData {
                id: id.to_string(),
                name: name.to_string(),
                cost: cost(price),
                effect,
                unlocked: true,
                unlock_when: CostMap::new(),
            }
        };
        let set_click = |resource: &str| UpgradeEffect::SetClickValue {
            resource: ResourceKind::from(resource),
            value: 1.0,
        };

        let upgrades = vec![
            upgrade(
                "better_axe",
                "Bessere Axt",
                &[("coins", 50.0)],
                UpgradeEffect::MultiplyClickValue {
                    resource: ResourceKind::from("wood"),
                    factor: 2.0,
                },
            ),
            upgrade(
                "stone_pickaxe",
                "Steinspitzhacke",
                &[("coins", 150.0), ("wood", 50.0)],
                set_click("stone"),
            ),
            upgrade(
                "iron_pickaxe",
                "Eisenspitzhacke",
                &[("coins", 400.0), ("wood", 100.0), ("stone", 80.0)],
                set_click("iron"),
            ),
            upgrade(
                "copper_pickaxe",
                "Kupferspitzhacke",
                &[("coins", 600.0), ("wood", 150.0), ("stone", 120.0)],
                set_click("copper"),
            ),
            upgrade(
                "efficient_woodcutters",
                "Effiziente Holzfaeller",
                &[("coins", 200.0), ("wood", 100.0)],
                UpgradeEffect::MultiplyGeneratorOutput {
                    target: "woodcutter".to_string(),
                    factor: 2.0,
                },
            ),
            upgrade(
                "efficient_miners",
                "Effiziente Steinmetze",
                &[("coins", 500.0), ("stone", 150.0)],
                UpgradeEffect::MultiplyGeneratorOutput {
                    target: "miner".to_string(),
                    factor: 2.0,
                },
            ),
            upgrade(
                "fast_sawmill",
                "Schnelle Saegewerke",
                &[("coins", 300.0), ("planks", 50.0)],
                UpgradeEffect::MultiplyConverterSpeed {
                    target: "sawmill".to_string(),
                    factor: 2.0,
                },
            ),
            upgrade(
                "fast_brickmaker",
                "Schnelle Ziegelei",
                &[("coins", 600.0), ("bricks", 50.0)],
                UpgradeEffect::MultiplyConverterSpeed {
                    target: "brickmaker".to_string(),
                    factor: 2.0,
                },
            ),
        ];

        let achievement = |id: &str, name: &str, condition: AchievementCondition| AchievementData {
            id: id.to_string(),
            name: name.to_string(),
            condition,
        };
        let holding = |resource: &str, amount: f64| AchievementCondition::ResourceAmount {
            resource: ResourceKind::from(resource),
            amount,
        };

        let achievements = vec![
            achievement("wood_collector", "Holzsammler", holding("wood", 100.0)),
            achievement("quarry", "Steinbruch", holding("stone", 100.0)),
            achievement("iron_age", "Eisenzeit", holding("iron", 50.0)),
            achievement("carpenter", "Zimmermann", holding("planks", 50.0)),
            achievement("toolmaker", "Werkzeugmacher", holding("tools", 20.0)),
            achievement("jeweler", "Juwelier", holding("jewelry", 10.0)),
            achievement("busy_clicker", "Fleissiger Klicker", AchievementCondition::TotalClicks(100)),
            achievement("click_enthusiast", "Klick-Enthusiast", AchievementCondition::TotalClicks(500)),
            achievement("master_builder", "Baumeister", AchievementCondition::TotalBuildings(10)),
            achievement("manufacturer", "Fabrikant", AchievementCondition::TotalConverters(5)),
        ];

        Self {
            name: "Ressourcen-Imperium".to_string(),
            currency: default_currency(),
            resources,
            generators,
            converters,
            upgrades,
            achievements,
            cost_scaling: CostScaling::default(),
            rules: SimulationRules::default(),
            market: MarketRules::default(),
            prestige: PrestigeRules::default(),
            offline: OfflineRules::default(),
            scarcity: ScarcityRules {
                deposits: vec![
                    DepositData::new("wood", 100_000.0, 0.001),
                    DepositData::new("stone", 80_000.0, 0.0005),
                    DepositData::new("iron", 50_000.0, 0.0002),
                    DepositData::new("copper", 30_000.0, 0.0001),
                ],
                ..ScarcityRules::default()
            },
        }
    }
}

/// Build a [`CostMap`] from `(kind, amount)` pairs.
#[must_use]
pub fn cost(entries: &[(&str, f64)]) -> CostMap {
    entries
        .iter()
        .map(|(kind, amount)| (ResourceKind::from(*kind), *amount))
        .collect()
}

#[derive(Default)]
struct Validator {
    errors: Vec<GameError>,
}

impl Validator {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(GameError::config(field, message));
    }

    fn positive(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value <= 0.0 {
            self.fail(field, format!("must be a positive finite number, got {value}"));
        }
    }

    fn non_negative(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value < 0.0 {
            self.fail(field, format!("must be a non-negative finite number, got {value}"));
        }
    }

    fn at_least_one(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value < 1.0 {
            self.fail(field, format!("must be a finite number >= 1, got {value}"));
        }
    }

    fn known(&mut self, field: &str, kind: &ResourceKind, kinds: &BTreeSet<&str>) {
        if !kinds.contains(kind.as_str()) {
            self.fail(field, format!("undefined resource '{kind}'"));
        }
    }

    fn cost(&mut self, field: &str, cost: &CostMap, kinds: &BTreeSet<&str>, required: bool) {
        if required && cost.is_empty() {
            self.fail(field, "must not be empty");
        }
        for (kind, amount) in cost {
            self.known(field, kind, kinds);
            self.positive(&format!("{field}.{kind}"), *amount);
        }
    }

    fn unique<'a>(&mut self, field: &str, ids: impl Iterator<Item = &'a str>) {
        let mut seen = BTreeSet::new();
        for id in ids {
            if !seen.insert(id) {
                self.fail(field, format!("duplicate id '{id}'"));
            }
        }
    }
}
