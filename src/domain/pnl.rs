//! Leveraged profit/loss percentage.

use crate::domain::position::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnlStatus {
    Gain,
    Loss,
    Neutral,
}

impl PnlStatus {
    pub fn from_percent(percent: f64) -> Self {
        if percent > 0.0 {
            PnlStatus::Gain
        } else if percent < 0.0 {
            PnlStatus::Loss
        } else {
            PnlStatus::Neutral
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PnlStatus::Gain => "Profit",
            PnlStatus::Loss => "Loss",
            PnlStatus::Neutral => "Neutral",
        }
    }
}

/// Percentage move from `entry` to `reference`, signed for `direction` and
/// scaled by `leverage`. `entry` must be positive.
pub fn pnl_percent(entry: f64, reference: f64, leverage: f64, direction: Direction) -> f64 {
    let change = match direction {
        Direction::Long => (reference - entry) / entry,
        Direction::Short => (entry - reference) / entry,
    };
    change * 100.0 * leverage
}
