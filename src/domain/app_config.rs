//! Resolved application settings.

use chrono::FixedOffset;
use std::path::PathBuf;

pub const DEFAULT_BINANCE_URL: &str = "https://api.binance.com";
pub const MAX_KLINES_PER_REQUEST: usize = 1000;
pub const DEFAULT_TIMEOUT_SECS: i64 = 10;
pub const DEFAULT_UTC_OFFSET_MINUTES: i64 = 180;
pub const DEFAULT_LISTEN: &str = "127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Json {
        settings_path: PathBuf,
        positions_path: PathBuf,
    },
    Sqlite {
        path: PathBuf,
        pool_size: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PriceSource {
    Binance {
        base_url: String,
        limit: usize,
        timeout_secs: u64,
    },
    Csv {
        dir: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub price_source: PriceSource,
    pub storage: StorageBackend,
    pub display_offset: FixedOffset,
    pub listen: String,
}
