//! One-minute price bar representation.

use chrono::{DateTime, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBar {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    /// Builds a bar from an epoch-millisecond open time. `None` if the
    /// timestamp is out of chrono's range.
    pub fn from_millis(open_time_ms: i64, open: f64, high: f64, low: f64, close: f64) -> Option<Self> {
        let open_time = Utc.timestamp_millis_opt(open_time_ms).single()?;
        Some(Self {
            open_time,
            open,
            high,
            low,
            close,
        })
    }

    pub fn open_time_millis(&self) -> i64 {
        self.open_time.timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_millis_round_trips_timestamp() {
        let bar = PriceBar::from_millis(1_700_000_040_000, 1.0, 2.0, 0.5, 1.5).unwrap();
        assert_eq!(bar.open_time_millis(), 1_700_000_040_000);
        assert_eq!(bar.open_time.to_rfc3339(), "2023-11-14T22:14:00+00:00");
    }

    #[test]
    fn from_millis_rejects_out_of_range() {
        assert!(PriceBar::from_millis(i64::MAX, 1.0, 1.0, 1.0, 1.0).is_none());
    }
}
