//! Session clock: host timestamps in, whole fixed ticks out.
//!
//! The clock never reads the wall clock itself. The host passes epoch
//! milliseconds and receives the number of fixed ticks due, plus any
//! backlog too large to tick through that should be handled as one
//! catch-up (see [`Simulation::run_advance`](crate::Simulation::run_advance)).

use serde::{Deserialize, Serialize};

use crate::data::SimulationRules;

/// Work due after an advance, pause or resume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockAdvance {
    /// Fixed ticks to run now.
    pub ticks: u32,
    /// Seconds to credit in bulk before ticking.
    pub catch_up_seconds: f64,
}

impl ClockAdvance {
    /// Whether nothing is due.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.ticks == 0 && self.catch_up_seconds == 0.0
    }
}

/// Fixed-step scheduler with pause and resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClock {
    tick_ms: u64,
    max_ticks_per_advance: u32,
    last_ms: Option<u64>,
    remainder_ms: u64,
    paused_at: Option<u64>,
}

impl SessionClock {
    /// Create a stopped clock.
    #[must_use]
    pub fn new(tick_seconds: f64, max_ticks_per_advance: u32) -> Self {
        let tick_ms = (tick_seconds * 1000.0).round().max(1.0) as u64;
        Self {
            tick_ms,
            max_ticks_per_advance: max_ticks_per_advance.max(1),
            last_ms: None,
            remainder_ms: 0,
            paused_at: None,
        }
    }

    /// Create a clock using the tick length from `rules`.
    #[must_use]
    pub fn from_rules(rules: &SimulationRules) -> Self {
        Self::new(rules.tick_seconds, rules.max_ticks_per_advance)
    }

    /// Length of one tick in seconds.
    #[must_use]
    pub fn tick_seconds(&self) -> f64 {
        self.tick_ms as f64 / 1000.0
    }

    /// Whether the clock is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Whether the clock has been started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.last_ms.is_some()
    }

    /// Start (or restart) counting from `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        self.last_ms = Some(now_ms);
        self.remainder_ms = 0;
        self.paused_at = None;
    }

    /// Ticks due at `now_ms`.
    ///
    /// At most `max_ticks_per_advance` ticks are handed out; the rest of a
    /// longer backlog comes back as catch-up seconds. A timestamp earlier
    /// than the last one re-bases the clock and yields nothing.
    pub fn advance(&mut self, now_ms: u64) -> ClockAdvance {
        if self.is_paused() {
            return ClockAdvance::default();
        }
        let Some(last) = self.last_ms else {
            self.start(now_ms);
            return ClockAdvance::default();
        };
        if now_ms < last {
            tracing::debug!(now_ms, last, "Clock went backwards, re-basing");
            self.last_ms = Some(now_ms);
            return ClockAdvance::default();
        }

        let elapsed = now_ms - last + self.remainder_ms;
        let due = elapsed / self.tick_ms;
        self.remainder_ms = elapsed % self.tick_ms;
        self.last_ms = Some(now_ms);

        let max = u64::from(self.max_ticks_per_advance);
        if due > max {
            ClockAdvance {
                ticks: self.max_ticks_per_advance,
                catch_up_seconds: ((due - max) * self.tick_ms) as f64 / 1000.0,
            }
        } else {
            ClockAdvance {
                ticks: due as u32,
                catch_up_seconds: 0.0,
            }
        }
    }

    /// Stop ticking. Returns the work still due up to `now_ms`.
    pub fn pause(&mut self, now_ms: u64) -> ClockAdvance {
        if self.is_paused() {
            return ClockAdvance::default();
        }
        let due = self.advance(now_ms);
        self.paused_at = Some(self.last_ms.unwrap_or(now_ms));
        due
    }

    /// Continue after a pause.
    ///
    /// A gap longer than one tick comes back as catch-up seconds; shorter
    /// gaps are dropped. The sub-tick remainder from before the pause is kept.
    pub fn resume(&mut self, now_ms: u64) -> ClockAdvance {
        let Some(paused_at) = self.paused_at.take() else {
            return ClockAdvance::default();
        };
        self.last_ms = Some(now_ms);

        let gap = now_ms.saturating_sub(paused_at);
        if gap <= self.tick_ms {
            ClockAdvance::default()
        } else {
            ClockAdvance {
                ticks: 0,
                catch_up_seconds: gap as f64 / 1000.0,
            }
        }
    }

    /// Fraction of the next tick already elapsed at `now_ms`, in `[0, 1]`.
    ///
    /// For display interpolation only.
    #[must_use]
    pub fn interpolation_alpha(&self, now_ms: u64) -> f64 {
        let since_last = match (self.last_ms, self.paused_at) {
            (Some(last), None) => now_ms.saturating_sub(last),
            _ => 0,
        };
        ((since_last + self.remainder_ms) as f64 / self.tick_ms as f64).clamp(0.0, 1.0)
    }
}
