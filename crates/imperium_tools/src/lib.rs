//! # Imperium Development Tools
//!
//! Command-line tools for development:
//! - Data validators for RON balance files
//! - Headless scripted runs with replay recording
//! - Offline-progress reports for saved games
//!
//! Everything that touches the filesystem lives here; the core crate
//! stays free of IO.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod files;
pub mod script;
pub mod validate;

pub use error::{Result, ToolError};
