//! Loading and storing data files, saves and replays.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use imperium_core::data::GameData;
use imperium_core::replay::Replay;
use imperium_core::simulation::Simulation;
use imperium_core::snapshot::Snapshot;

use crate::error::{Result, ToolError};

/// Read a file to a string.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ToolError::io(path, e))
}

/// Load and validate a RON balance file.
///
/// `None` selects the built-in balance.
pub fn load_game_data(path: Option<&Path>) -> Result<GameData> {
    match path {
        Some(path) => {
            let source = read_to_string(path)?;
            Ok(GameData::from_ron_str(&source, &path.display().to_string())?)
        }
        None => Ok(GameData::imperium()),
    }
}

/// Load a JSON save.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    Ok(Snapshot::from_json(&read_to_string(path)?)?)
}

/// Write `sim` as a JSON save stamped with `now_ms`.
pub fn save_snapshot(sim: &Simulation, now_ms: f64, path: &Path) -> Result<()> {
    let json = sim.to_json(now_ms)?;
    fs::write(path, json).map_err(|e| ToolError::io(path, e))
}

/// Wall clock in epoch milliseconds, 0 if the clock is before 1970.
#[must_use]
pub fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_millis() as f64)
}

/// Load a binary replay.
pub fn load_replay(path: &Path) -> Result<Replay> {
    let bytes = fs::read(path).map_err(|e| ToolError::io(path, e))?;
    Ok(Replay::from_bytes(&bytes)?)
}

/// Write a binary replay.
pub fn save_replay(replay: &Replay, path: &Path) -> Result<()> {
    let bytes = replay.to_bytes()?;
    fs::write(path, bytes).map_err(|e| ToolError::io(path, e))
}
