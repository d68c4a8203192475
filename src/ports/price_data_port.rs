//! Price data access port trait.

use crate::domain::error::PosCheckError;
use crate::domain::price_bar::PriceBar;
use chrono::{DateTime, Utc};

/// Source of one-minute bars.
///
/// Implementations return bars ascending by open time within the closed
/// interval `[start, end]`, capped at [`PriceDataPort::max_bars`]. An unknown
/// symbol is `UnknownSymbol`; an interval without bars is `NoData`.
pub trait PriceDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>, PosCheckError>;

    fn max_bars(&self) -> usize;
}
