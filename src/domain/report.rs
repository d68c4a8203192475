//! Human-readable rendering of a position check.

use chrono::{DateTime, FixedOffset, Utc};

use crate::domain::check::PositionCheck;
use crate::domain::evaluator::Outcome;
use crate::domain::pnl::PnlStatus;
use crate::domain::saved_position::SavedPosition;
use crate::domain::validation::DISPLAY_TIME_FORMAT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl Tone {
    pub fn from_percent(percent: f64) -> Self {
        match PnlStatus::from_percent(percent) {
            PnlStatus::Gain => Tone::Positive,
            PnlStatus::Loss => Tone::Negative,
            PnlStatus::Neutral => Tone::Neutral,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Tone::Positive => "positive",
            Tone::Negative => "negative",
            Tone::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeReport {
    pub title: String,
    pub detail: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveStatus {
    pub text: String,
    pub tone: Tone,
}

/// Integral leverage prints without a fractional part.
pub fn format_leverage(leverage: f64) -> String {
    if leverage.fract() == 0.0 && leverage.abs() < 1e15 {
        format!("{}x", leverage as i64)
    } else {
        format!("{}x", leverage)
    }
}

pub fn format_time(time: DateTime<Utc>, offset: FixedOffset) -> String {
    time.with_timezone(&offset).format(DISPLAY_TIME_FORMAT).to_string()
}

/// One-line description of a saved position for listings.
pub fn saved_summary(saved: &SavedPosition, offset: FixedOffset) -> String {
    format!(
        "{} {} | Entry: {:.2} | Stop: {:.2} | Leverage: {} | Opened: {}",
        saved.symbol,
        saved.to_position().direction(),
        saved.entry_price,
        saved.stop_price,
        format_leverage(saved.leverage),
        format_time(saved.open_time, offset)
    )
}

pub fn live_status(check: &PositionCheck) -> LiveStatus {
    let status = PnlStatus::from_percent(check.live_pnl);
    LiveStatus {
        text: format!(
            "Current: {} {:.2}% | Price: {:.2}",
            status.label(),
            check.live_pnl,
            check.evaluation.last_close
        ),
        tone: Tone::from_percent(check.live_pnl),
    }
}

pub fn outcome_report(check: &PositionCheck, offset: FixedOffset) -> OutcomeReport {
    let p = &check.position;
    let pnl = check.outcome_pnl;
    let status = PnlStatus::from_percent(pnl).label();
    let leverage = format_leverage(p.leverage);
    let direction = check.direction;

    match check.outcome {
        Outcome::Stopped { price, time } => OutcomeReport {
            title: format!(
                "{} position stopped out at {} ({}).",
                direction,
                format_time(time, offset),
                status
            ),
            detail: format!(
                "{}: {:.2}% (Stop: {:.2}, Filled: {:.2}, Leverage: {})",
                status, pnl, p.stop_price, price, leverage
            ),
            tone: Tone::Negative,
        },
        Outcome::Target2Reached { price, time } => OutcomeReport {
            title: format!(
                "{} position reached target 2 at {} ({}).",
                direction,
                format_time(time, offset),
                status
            ),
            detail: format!(
                "{}: {:.2}% (Target 2: {:.2}, Filled: {:.2}, Leverage: {})",
                status,
                pnl,
                p.target2.unwrap_or(price),
                price,
                leverage
            ),
            tone: Tone::Positive,
        },
        Outcome::Target1Reached { price, time } => OutcomeReport {
            title: format!(
                "{} position reached target 1 at {} ({}).",
                direction,
                format_time(time, offset),
                status
            ),
            detail: format!(
                "{}: {:.2}% (Target 1: {:.2}, Filled: {:.2}, Leverage: {})",
                status, pnl, p.target1, price, leverage
            ),
            tone: Tone::Positive,
        },
        Outcome::Open { price, .. } => {
            let targets = match p.target2 {
                Some(t2) => format!("Target 1: {:.2}, Target 2: {:.2}", p.target1, t2),
                None => format!("Target: {:.2}", p.target1),
            };
            OutcomeReport {
                title: format!(
                    "{} position still open, no target reached. Current price: {:.2}",
                    direction, price
                ),
                detail: format!(
                    "{}: {:.2}% ({}, Stop: {:.2}, Leverage: {})",
                    status, pnl, targets, p.stop_price, leverage
                ),
                tone: Tone::from_percent(pnl),
            }
        }
    }
}
