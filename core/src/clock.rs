//! Simulation clock: tick state, simulated time, speed and pause.
//!
//! Simulated time is derived from the tick counter (`tick * tick_seconds`)
//! rather than accumulated, so `now()` is exactly reproducible and never
//! rewinds.

use crate::types::{RunId, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub run_id:       RunId,
    pub current_tick: Tick,
    pub tick_seconds: f64,
    pub speed:        SimSpeed,
    pub paused:       bool,
}

impl SimClock {
    pub fn new(run_id: RunId, tick_seconds: f64) -> Self {
        Self {
            run_id,
            current_tick: 0,
            tick_seconds,
            speed: SimSpeed::Normal,
            paused: true,
        }
    }

    /// Advance one tick. Returns the new tick number.
    /// Panics if called while paused. Callers must check.
    pub fn advance(&mut self) -> Tick {
        assert!(!self.paused, "advance() called on paused clock");
        self.current_tick += 1;
        self.current_tick
    }

    /// Current simulation time in seconds.
    pub fn now(&self) -> f64 {
        self.current_tick as f64 * self.tick_seconds
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_speed(&mut self, speed: SimSpeed) {
        self.speed = speed;
    }

    pub fn ticks_per_step(&self) -> u64 {
        match self.speed {
            SimSpeed::Normal      => 1,
            SimSpeed::Accelerated => 4,
            SimSpeed::FastForward => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    Normal,       // 1 tick/step
    Accelerated,  // 4 ticks/step
    FastForward,  // 16 ticks/step
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_derived_from_tick_count() {
        let mut clock = SimClock::new("clock-test".into(), 0.1);
        clock.resume();
        for _ in 0..15 {
            clock.advance();
        }
        assert_eq!(clock.current_tick, 15);
        assert!((clock.now() - 1.5).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "paused")]
    fn advancing_paused_clock_panics() {
        let mut clock = SimClock::new("clock-test".into(), 0.1);
        clock.advance();
    }
}
