//! Position check: fetch bars, evaluate, and price the outcome.

use chrono::{DateTime, Utc};

use crate::domain::error::PosCheckError;
use crate::domain::evaluator::{evaluate, EvaluationResult, Outcome};
use crate::domain::pnl::pnl_percent;
use crate::domain::position::{Direction, PositionSpec};
use crate::domain::price_bar::PriceBar;
use crate::ports::price_data_port::PriceDataPort;

#[derive(Debug, Clone)]
pub struct PositionCheck {
    pub position: PositionSpec,
    pub direction: Direction,
    pub bars: Vec<PriceBar>,
    pub evaluation: EvaluationResult,
    pub outcome: Outcome,
    /// Profit/loss at the resolved outcome's reference price.
    pub outcome_pnl: f64,
    /// Unrealized profit/loss at the last close, regardless of outcome.
    pub live_pnl: f64,
}

/// Evaluates an already fetched bar sequence.
pub fn check_with_bars(
    position: &PositionSpec,
    bars: Vec<PriceBar>,
) -> Result<PositionCheck, PosCheckError> {
    let evaluation = evaluate(&bars, position).ok_or_else(|| PosCheckError::NoData {
        symbol: position.symbol.clone(),
    })?;
    let direction = position.direction();
    let outcome = evaluation.outcome();
    let outcome_pnl = outcome.pnl_percent(position);
    let live_pnl = pnl_percent(
        position.entry_price,
        evaluation.last_close,
        position.leverage,
        direction,
    );

    Ok(PositionCheck {
        position: position.clone(),
        direction,
        bars,
        evaluation,
        outcome,
        outcome_pnl,
        live_pnl,
    })
}

/// Fetches bars for `[position.open_time, now]` and evaluates them.
pub fn check_position(
    source: &dyn PriceDataPort,
    position: &PositionSpec,
    now: DateTime<Utc>,
) -> Result<PositionCheck, PosCheckError> {
    let bars = source.fetch_bars(&position.symbol, position.open_time, now)?;
    tracing::debug!(
        symbol = %position.symbol,
        bars = bars.len(),
        "evaluating position"
    );
    check_with_bars(position, bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};
    use std::cell::RefCell;

    struct FixedSource {
        bars: Vec<PriceBar>,
        requested: RefCell<Vec<(String, DateTime<Utc>, DateTime<Utc>)>>,
    }

    impl PriceDataPort for FixedSource {
        fn fetch_bars(
            &self,
            symbol: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<PriceBar>, PosCheckError> {
            self.requested
                .borrow_mut()
                .push((symbol.to_string(), start, end));
            Ok(self.bars.clone())
        }

        fn max_bars(&self) -> usize {
            1000
        }
    }

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn bar(minute: i64, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            open_time: t(minute),
            open: close,
            high,
            low,
            close,
        }
    }

    fn position() -> PositionSpec {
        PositionSpec {
            symbol: "BTCUSDT".into(),
            entry_price: 100.0,
            target1: 110.0,
            target2: None,
            stop_price: 90.0,
            leverage: 3.0,
            open_time: t(0),
        }
    }

    #[test]
    fn requests_interval_from_open_time_to_now() {
        let source = FixedSource {
            bars: vec![bar(0, 101.0, 99.0, 100.0)],
            requested: RefCell::new(Vec::new()),
        };
        check_position(&source, &position(), t(30)).unwrap();
        assert_eq!(
            source.requested.borrow().as_slice(),
            &[("BTCUSDT".to_string(), t(0), t(30))]
        );
    }

    #[test]
    fn empty_bars_is_no_data() {
        let err = check_with_bars(&position(), Vec::new()).unwrap_err();
        assert!(matches!(err, PosCheckError::NoData { symbol } if symbol == "BTCUSDT"));
    }

    #[test]
    fn live_pnl_tracks_last_close_independent_of_outcome() {
        let bars = vec![bar(0, 112.0, 100.0, 111.0), bar(1, 106.0, 103.0, 104.0)];
        let check = check_with_bars(&position(), bars).unwrap();

        assert!(matches!(check.outcome, Outcome::Target1Reached { .. }));
        assert_relative_eq!(check.outcome_pnl, 30.0);
        assert_relative_eq!(check.live_pnl, 12.0, epsilon = 1e-9);
    }

    #[test]
    fn propagates_source_errors() {
        struct Failing;
        impl PriceDataPort for Failing {
            fn fetch_bars(
                &self,
                symbol: &str,
                _start: DateTime<Utc>,
                _end: DateTime<Utc>,
            ) -> Result<Vec<PriceBar>, PosCheckError> {
                Err(PosCheckError::UnknownSymbol {
                    symbol: symbol.to_string(),
                })
            }
            fn max_bars(&self) -> usize {
                1000
            }
        }
        let err = check_position(&Failing, &position(), t(5)).unwrap_err();
        assert!(matches!(err, PosCheckError::UnknownSymbol { .. }));
    }
}
