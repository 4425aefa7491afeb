//! Data structures for game balance configuration.
//!
//! This module contains pure data structures that define resources,
//! generators, converters, upgrades and achievements. All structs are
//! designed to be deserialized from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by the caller (see `imperium_tools`).

mod building_data;
mod game_data;
mod resource_data;
mod rules;
mod upgrade_data;

pub use building_data::{ConverterData, GeneratorData};
pub use game_data::{cost, GameData};
pub use resource_data::ResourceData;
pub use rules::SimulationRules;
pub use upgrade_data::{AchievementData, UpgradeData};
