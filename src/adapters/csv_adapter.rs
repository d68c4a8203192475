//! CSV file price data adapter.
//!
//! Reads `{SYMBOL}.csv` files with the header `open_time,open,high,low,close`,
//! where `open_time` is epoch milliseconds.

use crate::domain::app_config::MAX_KLINES_PER_REQUEST;
use crate::domain::error::PosCheckError;
use crate::domain::price_bar::PriceBar;
use crate::ports::price_data_port::PriceDataPort;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
    max_bars: usize,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            max_bars: MAX_KLINES_PER_REQUEST,
        }
    }

    pub fn with_max_bars(mut self, max_bars: usize) -> Self {
        self.max_bars = max_bars;
        self
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn column<'r>(record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, PosCheckError> {
    record.get(idx).ok_or_else(|| PosCheckError::PriceSource {
        reason: format!("missing {} column", name),
    })
}

fn parse_price(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, PosCheckError> {
    column(record, idx, name)?
        .trim()
        .parse()
        .map_err(|e| PosCheckError::PriceSource {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl PriceDataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>, PosCheckError> {
        if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PosCheckError::UnknownSymbol {
                symbol: symbol.to_string(),
            });
        }
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            tracing::debug!("failed to read {}: {}", path.display(), e);
            PosCheckError::UnknownSymbol {
                symbol: symbol.to_string(),
            }
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| PosCheckError::PriceSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let open_time_ms: i64 = column(&record, 0, "open_time")?
                .trim()
                .parse()
                .map_err(|e| PosCheckError::PriceSource {
                    reason: format!("invalid open_time value: {}", e),
                })?;

            let bar = PriceBar::from_millis(
                open_time_ms,
                parse_price(&record, 1, "open")?,
                parse_price(&record, 2, "high")?,
                parse_price(&record, 3, "low")?,
                parse_price(&record, 4, "close")?,
            )
            .ok_or_else(|| PosCheckError::PriceSource {
                reason: format!("open_time {} out of range", open_time_ms),
            })?;

            if bar.open_time < start || bar.open_time > end {
                continue;
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.open_time);
        bars.truncate(self.max_bars);

        if bars.is_empty() {
            return Err(PosCheckError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }

    fn max_bars(&self) -> usize {
        self.max_bars
    }
}
