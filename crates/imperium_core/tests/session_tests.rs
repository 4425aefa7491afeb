//! Whole-session tests: save and reload, offline catch-up, the session
//! clock and replays.

use imperium_core::actions::{ActionQueue, PlayerAction};
use imperium_core::replay::{Replay, ReplayPlayer};
use imperium_core::session::SessionClock;
use imperium_core::simulation::Simulation;
use imperium_core::snapshot::Snapshot;
use imperium_test_utils::determinism::{run_script, verify_snapshot_round_trip};
use imperium_test_utils::fixtures;

const HOUR_MS: f64 = 3_600_000.0;

// =============================================================================
// Save and reload
// =============================================================================

#[test]
fn test_reload_continues_identically() {
    let mut original = fixtures::established_economy();
    run_script(&mut original, 40, 1.0, fixtures::scripted_actions);

    let json = original.to_json(1_000.0).unwrap();
    let mut reloaded = fixtures::imperium();
    let report = reloaded.restore_json(&json).unwrap();
    assert!(report.is_clean());

    for _ in 0..40 {
        original.tick(1.0);
        reloaded.tick(1.0);
    }
    assert_eq!(original.state_hash(), reloaded.state_hash());
}

#[test]
fn test_snapshot_keeps_achievements_and_statistics() {
    let mut sim = fixtures::with_starting(&[("wood", 150.0)]);
    for _ in 0..5 {
        sim.collect();
    }
    sim.tick(1.0);
    assert!(sim.achievements().contains("wood_collector"));

    let snapshot = sim.serialize(0.0);
    let mut reloaded = fixtures::imperium();
    reloaded.restore(&snapshot);

    assert!(reloaded.achievements().contains("wood_collector"));
    assert_eq!(reloaded.statistics().total_clicks, 5);
    assert!(verify_snapshot_round_trip(&reloaded));
}

#[test]
fn test_snapshot_from_older_save_without_new_fields() {
    let json = r#"{"resources":{"wood":12.5,"coins":40},"generators":[{"id":"woodcutter","ownedCount":3}]}"#;
    let mut sim = fixtures::imperium();
    let report = sim.restore_json(json).unwrap();

    assert!(report.is_clean());
    assert_eq!(sim.amount("wood"), 12.5);
    assert_eq!(sim.generator("woodcutter").unwrap().owned, 3);
    assert_eq!(sim.global_multiplier(), 1.0);
}

// =============================================================================
// Offline progress
// =============================================================================

#[test]
fn test_offline_catch_up_from_save_stamp() {
    let mut sim = fixtures::with_starting(&[("coins", 100.0)]);
    sim.purchase_generator("woodcutter").unwrap();
    sim.purchase_generator("woodcutter").unwrap();
    let snapshot = sim.serialize(0.0);

    let mut reloaded = fixtures::imperium();
    reloaded.restore(&snapshot);
    let report = reloaded.catch_up(600_000.0, snapshot.last_save_timestamp);

    assert_eq!(report.elapsed_seconds, 600.0);
    assert_eq!(reloaded.amount("wood"), 600.0);
    assert_eq!(reloaded.statistics().offline_seconds, 600.0);
}

#[test]
fn test_short_absence_is_ignored() {
    let mut sim = fixtures::established_economy();
    let before = sim.state_hash();
    let report = sim.catch_up(30_000.0, Some(0.0));
    assert!(report.is_empty());
    assert_eq!(sim.state_hash(), before);
}

#[test]
fn test_absence_is_capped() {
    let mut sim = fixtures::imperium();
    let report = sim.catch_up(48.0 * HOUR_MS, Some(0.0));
    assert_eq!(report.elapsed_seconds, 43_200.0);
}

#[test]
fn test_offline_converters_run_whole_operations() {
    let mut sim = fixtures::with_starting(&[("coins", 1000.0), ("wood", 500.0)]);
    sim.purchase_converter("sawmill").unwrap();

    let report = sim.compute_offline_progress(100.0);

    // 0.2 ops/s for 100 s, 450 wood in stock
    assert_eq!(report.converter_operations["sawmill"], 20);
    assert_eq!(report.delta("wood"), -40.0);
    assert_eq!(report.delta("planks"), 20.0);
}

#[test]
fn test_future_save_stamp_yields_nothing() {
    let mut sim = fixtures::established_economy();
    assert!(sim.catch_up(1_000.0, Some(HOUR_MS)).is_empty());
    assert!(sim.catch_up(HOUR_MS, None).is_empty());
}

// =============================================================================
// Session clock
// =============================================================================

#[test]
fn test_clock_drives_fixed_ticks() {
    let mut sim = fixtures::imperium();
    let mut clock = SessionClock::from_rules(&sim.data().rules);
    let mut queue = ActionQueue::new();
    clock.start(0);

    queue.push(PlayerAction::Collect);
    let report = sim.run_advance(clock.advance(2_400), &mut queue);

    assert_eq!(report.steps.len(), 2);
    assert!(report.catch_up.is_none());
    assert_eq!(sim.get_tick(), 2);
    assert_eq!(sim.amount("wood"), 1.0);
}

#[test]
fn test_pause_gap_becomes_catch_up() {
    let mut sim = fixtures::with_starting(&[("coins", 10.0)]);
    sim.purchase_generator("woodcutter").unwrap();
    let mut clock = SessionClock::from_rules(&sim.data().rules);
    let mut queue = ActionQueue::new();
    clock.start(0);

    sim.run_advance(clock.pause(1_000), &mut queue);
    let report = sim.run_advance(clock.resume(21_000), &mut queue);

    let catch_up = report.catch_up.unwrap();
    assert_eq!(catch_up.elapsed_seconds, 20.0);
    assert_eq!(sim.amount("wood"), 10.5);
}

// =============================================================================
// Prestige
// =============================================================================

#[test]
fn test_prestige_keeps_achievements() {
    let mut sim = fixtures::with_starting(&[("coins", 4_000_000.0), ("wood", 200.0)]);
    sim.tick(1.0);
    assert!(sim.achievements().contains("wood_collector"));

    let outcome = sim.prestige().unwrap();

    assert_eq!(outcome.points_gained, 20);
    assert_eq!(outcome.multiplier, 3.0);
    assert!(sim.achievements().contains("wood_collector"));
    assert_eq!(sim.prestige_state().resets, 1);
    // starting amounts are granted again after the reset
    assert_eq!(sim.amount("coins"), 4_000_000.0);
}

// =============================================================================
// Replays
// =============================================================================

#[test]
fn test_replay_of_scripted_session_verifies() {
    let mut sim = fixtures::with_starting(&[("coins", 500.0)]);
    let mut replay = Replay::new("scripted", 1.0, &sim).unwrap();
    let mut queue = ActionQueue::new();

    for tick in 0..100 {
        for action in fixtures::scripted_actions(tick) {
            replay.record_action(sim.get_tick(), action.clone());
            queue.push(action);
        }
        sim.step(1.0, &mut queue);
    }
    replay.finalize(&sim);

    let decoded = Replay::from_bytes(&replay.to_bytes().unwrap()).unwrap();
    let mut player = ReplayPlayer::new(decoded).unwrap();
    assert!(player.verify().unwrap());
    assert_eq!(player.simulation().store().amounts(), sim.store().amounts());
}

#[test]
fn test_empty_snapshot_gives_fresh_game() {
    let mut sim = fixtures::imperium();
    sim.collect();
    sim.tick(1.0);
    sim.restore(&Snapshot::default());
    assert_eq!(sim.state_hash(), Simulation::imperium().unwrap().state_hash());
}
