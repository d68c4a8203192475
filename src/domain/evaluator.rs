//! Position outcome evaluation over an ordered bar sequence.
//!
//! A single forward pass records the first bar that touches each target and
//! the stop. Touches are latched: a later bar never replaces an earlier one,
//! even at a better price. Fill prices are clamped to the level itself.

use chrono::{DateTime, Utc};

use crate::domain::pnl::pnl_percent;
use crate::domain::position::{Direction, PositionSpec};
use crate::domain::price_bar::PriceBar;

/// Where and when a level was first reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub time: DateTime<Utc>,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub target1: Option<Touch>,
    pub target2: Option<Touch>,
    pub stop: Option<Touch>,
    /// Stop was hit no later than the earliest hit target (or no target hit).
    pub stop_before_any_target: bool,
    pub last_close: f64,
    pub last_time: DateTime<Utc>,
}

/// Resolved classification of an evaluation, each variant carrying the
/// price the profit/loss is measured against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Stopped { price: f64, time: DateTime<Utc> },
    Target2Reached { price: f64, time: DateTime<Utc> },
    Target1Reached { price: f64, time: DateTime<Utc> },
    Open { price: f64, time: DateTime<Utc> },
}

impl Outcome {
    pub fn reference_price(&self) -> f64 {
        match *self {
            Outcome::Stopped { price, .. }
            | Outcome::Target2Reached { price, .. }
            | Outcome::Target1Reached { price, .. }
            | Outcome::Open { price, .. } => price,
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        match *self {
            Outcome::Stopped { time, .. }
            | Outcome::Target2Reached { time, .. }
            | Outcome::Target1Reached { time, .. }
            | Outcome::Open { time, .. } => time,
        }
    }

    pub fn is_closed(&self) -> bool {
        !matches!(self, Outcome::Open { .. })
    }

    /// Leveraged profit/loss percentage of this outcome for `position`.
    pub fn pnl_percent(&self, position: &PositionSpec) -> f64 {
        pnl_percent(
            position.entry_price,
            self.reference_price(),
            position.leverage,
            position.direction(),
        )
    }
}

impl EvaluationResult {
    pub fn target1_hit(&self) -> bool {
        self.target1.is_some()
    }

    pub fn target2_hit(&self) -> bool {
        self.target2.is_some()
    }

    pub fn stop_hit(&self) -> bool {
        self.stop.is_some()
    }

    /// Classification priority: stop (when it came first), target2,
    /// target1, otherwise still open at the last close.
    pub fn outcome(&self) -> Outcome {
        if let (Some(stop), true) = (self.stop, self.stop_before_any_target) {
            return Outcome::Stopped {
                price: stop.price,
                time: stop.time,
            };
        }
        if let Some(t2) = self.target2 {
            return Outcome::Target2Reached {
                price: t2.price,
                time: t2.time,
            };
        }
        if let Some(t1) = self.target1 {
            return Outcome::Target1Reached {
                price: t1.price,
                time: t1.time,
            };
        }
        Outcome::Open {
            price: self.last_close,
            time: self.last_time,
        }
    }
}

/// Fill price for a target touched on `bar`.
fn target_fill(direction: Direction, bar: &PriceBar, target: f64) -> f64 {
    match direction {
        Direction::Long => bar.high.min(target),
        Direction::Short => bar.low.max(target),
    }
}

/// Fill price for the stop touched on `bar`.
fn stop_fill(direction: Direction, bar: &PriceBar, stop: f64) -> f64 {
    match direction {
        Direction::Long => bar.low.max(stop),
        Direction::Short => bar.high.min(stop),
    }
}

/// Scans `bars` (ascending by open time) for the first touch of each target
/// and of the stop. Returns `None` only when `bars` is empty.
pub fn evaluate(bars: &[PriceBar], position: &PositionSpec) -> Option<EvaluationResult> {
    let last = bars.last()?;
    let direction = position.direction();

    let mut target1: Option<Touch> = None;
    let mut target2: Option<Touch> = None;
    let mut stop: Option<Touch> = None;

    for bar in bars {
        if target1.is_none() && position.target_touched(bar.high, bar.low, position.target1) {
            target1 = Some(Touch {
                time: bar.open_time,
                price: target_fill(direction, bar, position.target1),
            });
        }
        if let Some(level) = position.target2 {
            if target2.is_none() && position.target_touched(bar.high, bar.low, level) {
                target2 = Some(Touch {
                    time: bar.open_time,
                    price: target_fill(direction, bar, level),
                });
            }
        }
        if stop.is_none() && position.stop_touched(bar.high, bar.low) {
            stop = Some(Touch {
                time: bar.open_time,
                price: stop_fill(direction, bar, position.stop_price),
            });
        }
    }

    let stop_before_any_target = match stop {
        None => false,
        Some(stop) => {
            let earliest_target = [target1, target2]
                .into_iter()
                .flatten()
                .map(|t| t.time)
                .min();
            // Same-bar ties go to the stop.
            earliest_target.is_none_or(|t| stop.time <= t)
        }
    };

    Some(EvaluationResult {
        target1,
        target2,
        stop,
        stop_before_any_target,
        last_close: last.close,
        last_time: last.open_time,
    })
}
