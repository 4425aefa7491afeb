//! # Imperium Core
//!
//! Deterministic simulation core for the Ressourcen-Imperium idle game.
//!
//! This crate contains **only** game logic:
//! - No rendering
//! - No IO (save files and wall clocks belong to the host)
//! - No randomness
//!
//! This separation enables:
//! - Headless runs and balance tools
//! - Offline progress computed from a save timestamp
//! - Replays verified by state hash
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`resources`] - Resource kinds, caps and the store
//! - [`generators`] / [`converters`] - Production entities
//! - [`upgrades`] / [`market`] / [`prestige`] - Multipliers and sinks
//! - [`scarcity`] - Depleting deposits, efficiency and price pressure
//! - [`offline`] - Bulk progress over elapsed time
//! - [`simulation`] - Core tick loop and player actions
//! - [`snapshot`] - JSON save format and tolerant restore
//! - [`session`] - Fixed-step clock with pause and resume
//! - [`data`] - RON-loadable game definitions

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod achievements;
pub mod actions;
pub mod converters;
pub mod cost;
pub mod data;
pub mod error;
pub mod generators;
pub mod market;
pub mod offline;
pub mod prestige;
pub mod production;
pub mod replay;
pub mod resources;
pub mod scarcity;
pub mod session;
pub mod simulation;
pub mod snapshot;
pub mod statistics;
pub mod upgrades;

pub use simulation::Simulation;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::achievements::AchievementCondition;
    pub use crate::actions::{ActionOutcome, ActionQueue, PlayerAction};
    pub use crate::converters::{ConversionEvent, Converter};
    pub use crate::cost::{CostMap, CostScaling, Purchase, Shortfall};
    pub use crate::data::{GameData, ResourceData, SimulationRules};
    pub use crate::error::{ActionError, GameError, Result};
    pub use crate::generators::{Generator, ProductionEvent};
    pub use crate::market::{MarketRules, MarketSale};
    pub use crate::offline::{OfflineReport, OfflineRules};
    pub use crate::prestige::{PrestigeOutcome, PrestigeRules, PrestigeState};
    pub use crate::replay::{Replay, ReplayPlayer};
    pub use crate::resources::{Resource, ResourceKind, ResourceStore};
    pub use crate::scarcity::{DepositData, Scarcity, ScarcityRules};
    pub use crate::session::{ClockAdvance, SessionClock};
    pub use crate::simulation::{SessionReport, Simulation, StepReport, TickReport, UnlockEvent};
    pub use crate::snapshot::{RestoreReport, Snapshot};
    pub use crate::statistics::Statistics;
    pub use crate::upgrades::{Upgrade, UpgradeEffect};
}
