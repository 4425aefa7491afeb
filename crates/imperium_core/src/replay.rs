//! Replays: an initial state plus the actions issued on each tick.
//!
//! Because the simulation is deterministic, a replay recreates a whole
//! session and can check it against the recorded final state hash.

use serde::{Deserialize, Serialize};

use crate::actions::PlayerAction;
use crate::error::{GameError, Result};
use crate::simulation::Simulation;

/// A single action record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedAction {
    /// Simulation tick before which the action was applied.
    pub tick: u64,
    /// The action.
    pub action: PlayerAction,
}

/// Replay format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Free-form label (scenario or save name).
    pub label: String,
    /// Seconds per tick used throughout the session.
    pub dt: f64,
    /// Tick of the initial simulation.
    pub start_tick: u64,
    /// Encoded initial simulation.
    pub initial_state: Vec<u8>,
    /// Actions in tick order.
    pub actions: Vec<RecordedAction>,
    /// Tick at which recording stopped.
    pub final_tick: u64,
    /// State hash at `final_tick`.
    pub final_hash: u64,
}

impl Replay {
    /// Start a replay from `initial`.
    ///
    /// # Errors
    /// Returns an error if the simulation cannot be encoded.
    pub fn new(label: impl Into<String>, dt: f64, initial: &Simulation) -> Result<Self> {
        Ok(Self {
            version: REPLAY_VERSION,
            label: label.into(),
            dt,
            start_tick: initial.get_tick(),
            initial_state: initial.to_bytes()?,
            actions: Vec::new(),
            final_tick: initial.get_tick(),
            final_hash: initial.state_hash(),
        })
    }

    /// Record an action applied before `tick` ran.
    pub fn record_action(&mut self, tick: u64, action: PlayerAction) {
        self.actions.push(RecordedAction { tick, action });
    }

    /// Close the replay at the current state of `sim`.
    pub fn finalize(&mut self, sim: &Simulation) {
        self.final_tick = sim.get_tick();
        self.final_hash = sim.state_hash();
    }

    /// Encode with bincode.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize replay: {e}")))
    }

    /// Decode bytes written by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    /// Returns an error on malformed bytes or a version mismatch.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self = bincode::deserialize(bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "Replay version mismatch: expected {}, got {}",
                REPLAY_VERSION, replay.version
            )));
        }

        Ok(replay)
    }

    /// Decode the initial simulation.
    ///
    /// # Errors
    /// Returns an error if state decoding fails.
    pub fn restore_initial_state(&self) -> Result<Simulation> {
        Simulation::from_bytes(&self.initial_state)
    }

    /// Actions recorded for `tick`.
    #[must_use]
    pub fn actions_at_tick(&self, tick: u64) -> Vec<&RecordedAction> {
        self.actions.iter().filter(|a| a.tick == tick).collect()
    }

    /// Number of recorded actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Recorded length in ticks.
    #[must_use]
    pub fn duration(&self) -> u64 {
        self.final_tick.saturating_sub(self.start_tick)
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    simulation: Simulation,
    action_index: usize,
}

impl ReplayPlayer {
    /// Create a player positioned at the initial state.
    ///
    /// # Errors
    /// Returns an error if the initial state cannot be restored.
    pub fn new(replay: Replay) -> Result<Self> {
        let simulation = replay.restore_initial_state()?;
        Ok(Self {
            replay,
            simulation,
            action_index: 0,
        })
    }

    /// Apply the actions due and run one tick.
    ///
    /// Returns true if there are more ticks to play.
    pub fn advance(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }

        let now = self.simulation.get_tick();
        while let Some(recorded) = self.replay.actions.get(self.action_index) {
            if recorded.tick > now {
                break;
            }
            if let Err(err) = self.simulation.apply_action(&recorded.action) {
                tracing::debug!(tick = now, error = %err, "Replayed action rejected");
            }
            self.action_index += 1;
        }

        self.simulation.tick(self.replay.dt);
        !self.is_finished()
    }

    /// Play from the start up to `target_tick`.
    ///
    /// # Errors
    /// Returns an error if state restoration fails.
    pub fn seek(&mut self, target_tick: u64) -> Result<()> {
        self.simulation = self.replay.restore_initial_state()?;
        self.action_index = 0;
        while self.simulation.get_tick() < target_tick.min(self.replay.final_tick) {
            self.advance();
        }
        Ok(())
    }

    /// Current simulation tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.simulation.get_tick()
    }

    /// The replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Playback progress in percent.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        let duration = self.replay.duration();
        if duration == 0 {
            return 100.0;
        }
        let played = self.simulation.get_tick().saturating_sub(self.replay.start_tick);
        (played as f64 / duration as f64 * 100.0).min(100.0)
    }

    /// Get a reference to the current simulation state.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Check if the replay has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.simulation.get_tick() >= self.replay.final_tick
    }

    /// Play to the end and compare with the recorded hash.
    ///
    /// # Errors
    /// Returns an error if state restoration fails.
    pub fn verify(&mut self) -> Result<bool> {
        self.seek(self.replay.final_tick)?;
        Ok(self.simulation.state_hash() == self.replay.final_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionQueue;

    fn record(ticks: u64) -> Replay {
        let mut sim = Simulation::imperium().unwrap();
        let mut replay = Replay::new("test", 1.0, &sim).unwrap();

        for tick in 0..ticks {
            let mut queue = ActionQueue::new();
            let action = if tick % 3 == 0 {
                PlayerAction::PurchaseGenerator("woodcutter".to_string())
            } else {
                PlayerAction::Collect
            };
            replay.record_action(sim.get_tick(), action.clone());
            queue.push(action);
            sim.step(1.0, &mut queue);
        }

        replay.finalize(&sim);
        replay
    }

    #[test]
    fn test_replay_records_actions() {
        let replay = record(9);
        assert_eq!(replay.action_count(), 9);
        assert_eq!(replay.actions_at_tick(3).len(), 1);
        assert_eq!(replay.final_tick, 9);
    }

    #[test]
    fn test_replay_verifies() {
        let mut player = ReplayPlayer::new(record(30)).unwrap();
        assert!(player.verify().unwrap());
        assert!(player.is_finished());
    }

    #[test]
    fn test_tampered_hash_fails() {
        let mut replay = record(10);
        replay.final_hash ^= 1;
        let mut player = ReplayPlayer::new(replay).unwrap();
        assert!(!player.verify().unwrap());
    }

    #[test]
    fn test_bytes_round_trip() {
        let replay = record(5);
        let decoded = Replay::from_bytes(&replay.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.actions, replay.actions);
        assert_eq!(decoded.final_hash, replay.final_hash);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut replay = record(1);
        replay.version = 99;
        assert!(Replay::from_bytes(&replay.to_bytes().unwrap()).is_err());
    }

    #[test]
    fn test_seek_stops_at_target() {
        let mut player = ReplayPlayer::new(record(20)).unwrap();
        player.seek(7).unwrap();
        assert_eq!(player.current_tick(), 7);
        assert!((player.progress_percent() - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_advance_until_finished() {
        let mut player = ReplayPlayer::new(record(4)).unwrap();
        assert_eq!(player.replay().duration(), 4);
        let mut steps = 1;
        while player.advance() {
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert!(!player.advance());
        assert_eq!(player.progress_percent(), 100.0);
    }
}
