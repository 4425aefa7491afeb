//! Scripted headless runs.
//!
//! A script lists the actions to issue on given ticks. Running it drives
//! the simulation through the same action queue the game uses and can
//! record a replay on the way.
//!
//! # Example RON
//!
//! ```ron
//! Script(
//!     ticks: 120,
//!     steps: [
//!         (tick: 0, actions: [Collect, PurchaseGenerator("woodcutter")]),
//!         (tick: 30, actions: [PurchaseConverter("sawmill")]),
//!     ],
//! )
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use imperium_core::actions::{ActionQueue, PlayerAction};
use imperium_core::replay::Replay;
use imperium_core::resources::ResourceKind;
use imperium_core::simulation::Simulation;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolError};
use crate::files;

const fn default_dt() -> f64 {
    1.0
}

/// Actions issued before one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Tick offset from the start of the run.
    pub tick: u64,
    /// Actions in order.
    pub actions: Vec<PlayerAction>,
}

/// A scripted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Ticks to run.
    pub ticks: u64,
    /// Seconds per tick.
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Scheduled actions.
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// A script with no actions.
    #[must_use]
    pub fn idle(ticks: u64) -> Self {
        Self {
            ticks,
            dt: default_dt(),
            steps: Vec::new(),
        }
    }

    /// Parse a RON script file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let source = files::read_to_string(path)?;
        ron::from_str(&source).map_err(|e| ToolError::ScriptParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn actions_at(&self, tick: u64) -> impl Iterator<Item = &PlayerAction> {
        self.steps
            .iter()
            .filter(move |s| s.tick == tick)
            .flat_map(|s| s.actions.iter())
    }
}

/// What a scripted run ended with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Final tick number.
    pub tick: u64,
    /// Final state hash.
    pub state_hash: u64,
    /// Actions accepted.
    pub accepted: u32,
    /// Actions rejected.
    pub rejected: u32,
    /// Final amounts.
    pub amounts: BTreeMap<ResourceKind, f64>,
    /// Final per-second rates.
    pub rates: BTreeMap<ResourceKind, f64>,
    /// Awarded achievements.
    pub achievements: Vec<String>,
}

/// Run `script` on `sim`, recording into `replay` if given.
pub fn run(sim: &mut Simulation, script: &Script, mut replay: Option<&mut Replay>) -> RunSummary {
    let mut queue = ActionQueue::new();
    let mut accepted = 0;
    let mut rejected = 0;

    for offset in 0..script.ticks {
        for action in script.actions_at(offset) {
            if let Some(replay) = replay.as_deref_mut() {
                replay.record_action(sim.get_tick(), action.clone());
            }
            queue.push(action.clone());
        }

        let report = sim.step(script.dt, &mut queue);
        for (action, result) in &report.actions {
            match result {
                Ok(_) => accepted += 1,
                Err(err) => {
                    rejected += 1;
                    tracing::debug!(tick = sim.get_tick(), ?action, error = %err, "Action rejected");
                }
            }
        }
        for achievement in &report.tick.achievements {
            tracing::info!(tick = report.tick.tick, achievement = %achievement, "Achievement");
        }
    }

    if let Some(replay) = replay {
        replay.finalize(sim);
    }

    RunSummary {
        tick: sim.get_tick(),
        state_hash: sim.state_hash(),
        accepted,
        rejected,
        amounts: sim.store().amounts(),
        rates: sim
            .store()
            .iter()
            .map(|(kind, r)| (kind.clone(), r.production_rate))
            .collect(),
        achievements: sim.achievements().iter().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script() -> Script {
        ron::from_str(
            r#"Script(
                ticks: 20,
                steps: [
                    (tick: 0, actions: [PurchaseGenerator("woodcutter"), PurchaseGenerator("woodcutter")]),
                    (tick: 5, actions: [Collect, PurchaseGenerator("bank")]),
                ],
            )"#,
        )
        .unwrap()
    }

    #[test]
    fn test_script_parses_with_default_dt() {
        let script = script();
        assert_eq!(script.dt, 1.0);
        assert_eq!(script.actions_at(5).count(), 2);
    }

    #[test]
    fn test_run_counts_actions() {
        let mut data = imperium_core::data::GameData::imperium();
        data.resources[0].starting_amount = 10.0;
        let mut sim = Simulation::new(data).unwrap();

        let summary = run(&mut sim, &script(), None);

        assert_eq!(summary.tick, 20);
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.amounts[&ResourceKind::from("wood")], 11.0);
    }

    #[test]
    fn test_recorded_run_verifies() {
        let mut sim = Simulation::imperium().unwrap();
        let mut replay = Replay::new("script", 1.0, &sim).unwrap();

        let summary = run(&mut sim, &script(), Some(&mut replay));

        assert_eq!(replay.final_hash, summary.state_hash);
        let mut player = imperium_core::replay::ReplayPlayer::new(replay).unwrap();
        assert!(player.verify().unwrap());
    }
}
