//! Error types for the game simulation.

use thiserror::Error;

use crate::cost::Shortfall;
use crate::resources::ResourceKind;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Game data failed validation.
    #[error("Invalid configuration at '{field}': {message}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or source label) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// A persisted snapshot could not be decoded at all.
    #[error("Failed to decode snapshot: {0}")]
    SnapshotParse(String),

    /// A snapshot could not be encoded.
    #[error("Failed to encode snapshot: {0}")]
    SnapshotEncode(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

impl GameError {
    /// Shorthand for [`GameError::InvalidConfig`].
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Why a player action was rejected.
///
/// Rejections are ordinary outcomes, not faults: the UI decides whether
/// to tell the player. A rejected action never mutates the simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    /// No generator with this id exists.
    #[error("Unknown generator: {0}")]
    UnknownGenerator(String),

    /// No converter with this id exists.
    #[error("Unknown converter: {0}")]
    UnknownConverter(String),

    /// No upgrade with this id exists.
    #[error("Unknown upgrade: {0}")]
    UnknownUpgrade(String),

    /// No resource with this id exists.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// The entity exists but has not been unlocked yet.
    #[error("'{0}' is not unlocked")]
    Locked(String),

    /// The upgrade was already bought.
    #[error("Upgrade '{0}' was already purchased")]
    AlreadyPurchased(String),

    /// Insufficient resources.
    #[error("Insufficient resources: need {required} {resource}, have {available}")]
    InsufficientResources {
        /// Resource type.
        resource: ResourceKind,
        /// Amount required.
        required: f64,
        /// Amount available.
        available: f64,
    },

    /// The resource has no storage cap that can be raised.
    #[error("Storage of '{0}' cannot be upgraded")]
    NotUpgradable(ResourceKind),

    /// The resource has no market price.
    #[error("Resource '{0}' cannot be sold")]
    NotSellable(ResourceKind),

    /// Prestige requirements are not met yet.
    #[error("Prestige requires {required} coins, have {available}")]
    PrestigeNotReady {
        /// Coins required.
        required: f64,
        /// Coins available.
        available: f64,
    },
}

impl From<Shortfall> for ActionError {
    fn from(shortfall: Shortfall) -> Self {
        Self::InsufficientResources {
            resource: shortfall.resource,
            required: shortfall.required,
            available: shortfall.available,
        }
    }
}
