//! Position definition and direction inference.

use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Long when the first target sits above the entry, short otherwise
    /// (including `target1 == entry`).
    pub fn infer(entry_price: f64, target1: f64) -> Self {
        if target1 > entry_price {
            Direction::Long
        } else {
            Direction::Short
        }
    }

    pub fn is_long(self) -> bool {
        self == Direction::Long
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// A validated position. All prices and the leverage are positive and
/// `open_time` is not in the future relative to when it was validated.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSpec {
    pub symbol: String,
    pub entry_price: f64,
    pub target1: f64,
    pub target2: Option<f64>,
    pub stop_price: f64,
    pub leverage: f64,
    pub open_time: DateTime<Utc>,
}

impl PositionSpec {
    pub fn direction(&self) -> Direction {
        Direction::infer(self.entry_price, self.target1)
    }

    /// `true` once price has reached `target` in the favourable direction.
    pub fn target_touched(&self, high: f64, low: f64, target: f64) -> bool {
        match self.direction() {
            Direction::Long => high >= target,
            Direction::Short => low <= target,
        }
    }

    /// `true` once price has reached the stop in the adverse direction.
    pub fn stop_touched(&self, high: f64, low: f64) -> bool {
        match self.direction() {
            Direction::Long => low <= self.stop_price,
            Direction::Short => high >= self.stop_price,
        }
    }
}
