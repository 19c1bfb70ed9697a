//! Per-entity clock data: output level, last flip time, and the two periods.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("period must be positive, got {0}")]
    NotPositive(i64),

    #[error("period {0} does not fit in 32 bits")]
    TooLarge(i64),

    #[error("'{0}' is not an integer")]
    NotAnInteger(String),
}

/// A duration in tenths of a second. Always in `1..=i32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Period(i32);

impl Period {
    pub const ONE: Period = Period(1);

    pub fn new(tenths: i64) -> Result<Self, PeriodError> {
        if tenths <= 0 {
            return Err(PeriodError::NotPositive(tenths));
        }
        i32::try_from(tenths)
            .map(Period)
            .map_err(|_| PeriodError::TooLarge(tenths))
    }

    pub fn tenths(self) -> i32 {
        self.0
    }

    pub fn as_seconds(self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

impl TryFrom<i32> for Period {
    type Error = PeriodError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Period::new(i64::from(value))
    }
}

impl From<Period> for i32 {
    fn from(p: Period) -> i32 {
        p.0
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| PeriodError::NotAnInteger(s.to_string()))?;
        Period::new(value)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Runtime state of one clock entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockState {
    is_emitting_high:     bool,
    last_transition_time: f64,
    up_period:            Period,
    down_period:          Period,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            is_emitting_high:     false,
            last_transition_time: 0.0,
            up_period:            Period::ONE,
            down_period:          Period::ONE,
        }
    }
}

impl ClockState {
    pub fn new(up_period: Period, down_period: Period) -> Self {
        Self { up_period, down_period, ..Self::default() }
    }

    pub fn is_emitting_high(&self) -> bool {
        self.is_emitting_high
    }

    pub fn last_transition_time(&self) -> f64 {
        self.last_transition_time
    }

    pub fn up_period(&self) -> Period {
        self.up_period
    }

    pub fn down_period(&self) -> Period {
        self.down_period
    }

    pub fn set_up_period(&mut self, tenths: i64) -> Result<(), PeriodError> {
        self.up_period = Period::new(tenths)?;
        Ok(())
    }

    pub fn set_down_period(&mut self, tenths: i64) -> Result<(), PeriodError> {
        self.down_period = Period::new(tenths)?;
        Ok(())
    }

    /// Replace both periods in one write.
    pub fn set_periods(&mut self, up: Period, down: Period) {
        self.up_period = up;
        self.down_period = down;
    }

    /// Duration of the level currently being emitted.
    pub fn active_period(&self) -> Period {
        if self.is_emitting_high { self.up_period } else { self.down_period }
    }

    /// Flip the output level at `now`. Returns the new level.
    pub(crate) fn flip(&mut self, now: f64) -> bool {
        debug_assert!(now >= self.last_transition_time, "simulation time rewound");
        self.is_emitting_high = !self.is_emitting_high;
        self.last_transition_time = now;
        self.is_emitting_high
    }

    pub fn to_persisted(&self) -> PersistedClock {
        PersistedClock {
            is_emitting_high: self.is_emitting_high,
            up_period:        self.up_period,
            down_period:      self.down_period,
        }
    }

    /// Rebuild from saved data. The flip timer restarts at `now`.
    pub fn from_persisted(saved: &PersistedClock, now: f64) -> Self {
        Self {
            is_emitting_high:     saved.is_emitting_high,
            last_transition_time: now,
            up_period:            saved.up_period,
            down_period:          saved.down_period,
        }
    }
}

/// Saved form of [`ClockState`]. `last_transition_time` is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistedClock {
    pub is_emitting_high: bool,
    pub up_period:        Period,
    pub down_period:      Period,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_low_with_unit_periods() {
        let state = ClockState::default();
        assert!(!state.is_emitting_high());
        assert_eq!(state.last_transition_time(), 0.0);
        assert_eq!(state.up_period().tenths(), 1);
        assert_eq!(state.down_period().tenths(), 1);
    }

    #[test]
    fn setters_reject_non_positive_values() {
        let mut state = ClockState::default();
        state.set_up_period(7).unwrap();

        assert_eq!(state.set_up_period(0), Err(PeriodError::NotPositive(0)));
        assert_eq!(state.set_down_period(-3), Err(PeriodError::NotPositive(-3)));
        assert_eq!(state.up_period().tenths(), 7);
        assert_eq!(state.down_period().tenths(), 1);
    }

    #[test]
    fn setters_reject_values_beyond_i32() {
        let mut state = ClockState::default();
        let too_big = i64::from(i32::MAX) + 1;
        assert_eq!(state.set_up_period(too_big), Err(PeriodError::TooLarge(too_big)));
        assert_eq!(state.up_period(), Period::ONE);
    }

    #[test]
    fn active_period_follows_level() {
        let mut state = ClockState::new(Period::new(5).unwrap(), Period::new(10).unwrap());
        assert_eq!(state.active_period().tenths(), 10);
        state.flip(1.0);
        assert_eq!(state.active_period().tenths(), 5);
    }

    #[test]
    fn period_parses_from_dialog_text() {
        assert_eq!(" 12 ".parse::<Period>().unwrap().tenths(), 12);
        assert!(matches!("0".parse::<Period>(), Err(PeriodError::NotPositive(0))));
        assert!(matches!("abc".parse::<Period>(), Err(PeriodError::NotAnInteger(_))));
        assert!(matches!("1.5".parse::<Period>(), Err(PeriodError::NotAnInteger(_))));
    }

    #[test]
    fn persisted_schema_omits_transition_time() {
        let mut state = ClockState::new(Period::new(5).unwrap(), Period::new(10).unwrap());
        state.flip(3.0);

        let json = serde_json::to_value(state.to_persisted()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "is_emitting_high": true, "up_period": 5, "down_period": 10 })
        );

        let restored = ClockState::from_persisted(&state.to_persisted(), 42.0);
        assert!(restored.is_emitting_high());
        assert_eq!(restored.last_transition_time(), 42.0);
        assert_eq!(restored.up_period().tenths(), 5);
    }

    #[test]
    fn persisted_schema_rejects_non_positive_periods() {
        let bad = r#"{ "is_emitting_high": false, "up_period": 0, "down_period": 3 }"#;
        assert!(serde_json::from_str::<PersistedClock>(bad).is_err());
    }
}
