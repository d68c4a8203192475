#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use poscheck::domain::error::PosCheckError;
use poscheck::domain::position::PositionSpec;
pub use poscheck::domain::price_bar::PriceBar;
use poscheck::domain::saved_position::{NewPosition, SavedPosition, next_id};
use poscheck::domain::validation::PositionInput;
use poscheck::ports::position_store_port::PositionStorePort;
use poscheck::ports::price_data_port::PriceDataPort;
use std::collections::HashMap;
use std::sync::Mutex;

/// 2024-06-01 00:00 UTC
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

pub fn minute(i: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(i)
}

pub fn make_bar(i: i64, high: f64, low: f64, close: f64) -> PriceBar {
    PriceBar {
        open_time: minute(i),
        open: close,
        high,
        low,
        close,
    }
}

/// Flat bars around `price` with a one-unit range.
pub fn flat_bars(count: i64, price: f64) -> Vec<PriceBar> {
    (0..count)
        .map(|i| make_bar(i, price + 1.0, price - 1.0, price))
        .collect()
}

pub fn long_position(target2: Option<f64>) -> PositionSpec {
    PositionSpec {
        symbol: "BTCUSDT".to_string(),
        entry_price: 100.0,
        target1: 110.0,
        target2,
        stop_price: 90.0,
        leverage: 1.0,
        open_time: t0(),
    }
}

pub fn short_position() -> PositionSpec {
    PositionSpec {
        symbol: "ETHUSDT".to_string(),
        entry_price: 100.0,
        target1: 90.0,
        target2: None,
        stop_price: 110.0,
        leverage: 2.0,
        open_time: t0(),
    }
}

pub struct MockPriceSource {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub requests: Mutex<Vec<(String, DateTime<Utc>, DateTime<Utc>)>>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }
}

impl PriceDataPort for MockPriceSource {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>, PosCheckError> {
        self.requests
            .lock()
            .unwrap()
            .push((symbol.to_string(), start, end));
        let bars = self
            .data
            .get(symbol)
            .ok_or_else(|| PosCheckError::UnknownSymbol {
                symbol: symbol.to_string(),
            })?;
        Ok(bars
            .iter()
            .filter(|b| b.open_time >= start && b.open_time <= end)
            .copied()
            .collect())
    }

    fn max_bars(&self) -> usize {
        1000
    }
}

#[derive(Default)]
pub struct MockStore {
    pub settings: Mutex<Option<PositionInput>>,
    pub positions: Mutex<Vec<SavedPosition>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PositionStorePort for MockStore {
    fn load_settings(&self) -> Result<Option<PositionInput>, PosCheckError> {
        Ok(self.settings.lock().unwrap().clone())
    }

    fn save_settings(&self, settings: &PositionInput) -> Result<(), PosCheckError> {
        *self.settings.lock().unwrap() = Some(settings.clone());
        Ok(())
    }

    fn list_positions(&self) -> Result<Vec<SavedPosition>, PosCheckError> {
        Ok(self.positions.lock().unwrap().clone())
    }

    fn add_position(&self, position: NewPosition) -> Result<SavedPosition, PosCheckError> {
        let mut positions = self.positions.lock().unwrap();
        let saved = position.into_saved(next_id(&positions));
        positions.push(saved.clone());
        Ok(saved)
    }

    fn delete_position(&self, id: u64) -> Result<bool, PosCheckError> {
        let mut positions = self.positions.lock().unwrap();
        let before = positions.len();
        positions.retain(|p| p.id != id);
        Ok(positions.len() != before)
    }
}
