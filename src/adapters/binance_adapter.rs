//! Binance spot klines REST adapter.
//!
//! Fetches one-minute klines from `GET /api/v3/klines`. Each kline is a JSON
//! array whose first five fields are the open time in milliseconds followed
//! by open/high/low/close as decimal strings.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::domain::app_config::MAX_KLINES_PER_REQUEST;
use crate::domain::error::PosCheckError;
use crate::domain::price_bar::PriceBar;
use crate::ports::price_data_port::PriceDataPort;

const KLINES_PATH: &str = "/api/v3/klines";
const INTERVAL: &str = "1m";

pub struct BinanceAdapter {
    client: Client,
    base_url: String,
    limit: usize,
}

impl BinanceAdapter {
    pub fn new(base_url: &str, limit: usize, timeout: Duration) -> Result<Self, PosCheckError> {
        let client = Client::builder()
            .user_agent(concat!("poscheck/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| PosCheckError::PriceSource {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limit: limit.clamp(1, MAX_KLINES_PER_REQUEST),
        })
    }

    fn klines_url(&self) -> String {
        format!("{}{}", self.base_url, KLINES_PATH)
    }
}

/// Decodes a klines response body into bars, ascending by open time.
pub fn parse_klines(body: &Value) -> Result<Vec<PriceBar>, PosCheckError> {
    let rows = body.as_array().ok_or_else(|| PosCheckError::PriceSource {
        reason: "klines response is not an array".into(),
    })?;

    let mut bars = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let fields = row.as_array().ok_or_else(|| PosCheckError::PriceSource {
            reason: format!("kline {} is not an array", i),
        })?;
        if fields.len() < 5 {
            return Err(PosCheckError::PriceSource {
                reason: format!("kline {} has {} fields, expected at least 5", i, fields.len()),
            });
        }
        let open_time_ms = fields[0].as_i64().ok_or_else(|| PosCheckError::PriceSource {
            reason: format!("kline {} open time is not an integer", i),
        })?;
        let bar = PriceBar::from_millis(
            open_time_ms,
            decimal_field(&fields[1], i, "open")?,
            decimal_field(&fields[2], i, "high")?,
            decimal_field(&fields[3], i, "low")?,
            decimal_field(&fields[4], i, "close")?,
        )
        .ok_or_else(|| PosCheckError::PriceSource {
            reason: format!("kline {} open time {} out of range", i, open_time_ms),
        })?;
        bars.push(bar);
    }

    bars.sort_by_key(|b| b.open_time);
    Ok(bars)
}

/// Prices arrive as strings; plain JSON numbers are accepted too.
fn decimal_field(value: &Value, row: usize, name: &str) -> Result<f64, PosCheckError> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| PosCheckError::PriceSource {
        reason: format!("kline {} has invalid {} value {}", row, name, value),
    })
}

fn preview(bar: &PriceBar) -> String {
    format!(
        "{} | O:{:.4} H:{:.4} L:{:.4} C:{:.4}",
        bar.open_time.format("%Y-%m-%d %H:%M:%S"),
        bar.open,
        bar.high,
        bar.low,
        bar.close
    )
}

fn log_preview(bars: &[PriceBar]) {
    tracing::debug!(count = bars.len(), "klines response");
    for bar in bars.iter().take(3) {
        tracing::debug!("first: {}", preview(bar));
    }
    if bars.len() >= 3 {
        for bar in &bars[bars.len() - 3..] {
            tracing::debug!("last: {}", preview(bar));
        }
    }
}

impl PriceDataPort for BinanceAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>, PosCheckError> {
        let start_ms = start.timestamp_millis();
        let end_ms = end.timestamp_millis();
        tracing::debug!(
            url = %self.klines_url(),
            symbol,
            interval = INTERVAL,
            start_ms,
            end_ms,
            limit = self.limit,
            "klines request"
        );

        let response = self
            .client
            .get(self.klines_url())
            .query(&[
                ("symbol", symbol.to_string()),
                ("interval", INTERVAL.to_string()),
                ("startTime", start_ms.to_string()),
                ("endTime", end_ms.to_string()),
                ("limit", self.limit.to_string()),
            ])
            .send()
            .map_err(|e| PosCheckError::PriceSource {
                reason: format!("request failed: {}", e),
            })?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            // Binance answers 400 with code -1121 for unknown symbols.
            let body = response.text().unwrap_or_default();
            tracing::debug!(%status, body = %body, "klines rejected");
            return Err(PosCheckError::UnknownSymbol {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(PosCheckError::PriceSource {
                reason: format!("unexpected HTTP status {}", status),
            });
        }

        let body: Value = response.json().map_err(|e| PosCheckError::PriceSource {
            reason: format!("invalid JSON: {}", e),
        })?;
        let bars = parse_klines(&body)?;
        log_preview(&bars);

        if bars.is_empty() {
            return Err(PosCheckError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }

    fn max_bars(&self) -> usize {
        self.limit
    }
}
