//! Configuration validation.
//!
//! Validates all config fields before any command runs.

use crate::domain::app_config::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_UTC_OFFSET_MINUTES, MAX_KLINES_PER_REQUEST,
};
use crate::domain::error::PosCheckError;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), PosCheckError> {
    validate_binance(config)?;
    validate_display(config)?;
    validate_storage(config)?;
    validate_listen(config)?;
    Ok(())
}

fn validate_binance(config: &dyn ConfigPort) -> Result<(), PosCheckError> {
    let limit = config.get_int("binance", "limit", MAX_KLINES_PER_REQUEST as i64);
    if limit < 1 || limit > MAX_KLINES_PER_REQUEST as i64 {
        return Err(PosCheckError::ConfigInvalid {
            section: "binance".to_string(),
            key: "limit".to_string(),
            reason: format!("limit must be between 1 and {}", MAX_KLINES_PER_REQUEST),
        });
    }
    let timeout = config.get_int("binance", "timeout_secs", DEFAULT_TIMEOUT_SECS);
    if timeout <= 0 {
        return Err(PosCheckError::ConfigInvalid {
            section: "binance".to_string(),
            key: "timeout_secs".to_string(),
            reason: "timeout_secs must be positive".to_string(),
        });
    }
    if let Some(url) = config.get_string("binance", "base_url") {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PosCheckError::ConfigInvalid {
                section: "binance".to_string(),
                key: "base_url".to_string(),
                reason: "base_url must start with http:// or https://".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_display(config: &dyn ConfigPort) -> Result<(), PosCheckError> {
    let minutes = config.get_int("display", "utc_offset_minutes", DEFAULT_UTC_OFFSET_MINUTES);
    if !(-720..=840).contains(&minutes) {
        return Err(PosCheckError::ConfigInvalid {
            section: "display".to_string(),
            key: "utc_offset_minutes".to_string(),
            reason: "utc_offset_minutes must be between -720 and 840".to_string(),
        });
    }
    Ok(())
}

fn validate_storage(config: &dyn ConfigPort) -> Result<(), PosCheckError> {
    let backend = config.get_string_or("storage", "backend", "json").to_lowercase();
    match backend.as_str() {
        "json" => Ok(()),
        "sqlite" => {
            if config.get_string_or("sqlite", "path", "").is_empty() {
                return Err(PosCheckError::ConfigMissing {
                    section: "sqlite".to_string(),
                    key: "path".to_string(),
                });
            }
            let pool_size = config.get_int("sqlite", "pool_size", 4);
            if pool_size < 1 {
                return Err(PosCheckError::ConfigInvalid {
                    section: "sqlite".to_string(),
                    key: "pool_size".to_string(),
                    reason: "pool_size must be at least 1".to_string(),
                });
            }
            Ok(())
        }
        other => Err(PosCheckError::ConfigInvalid {
            section: "storage".to_string(),
            key: "backend".to_string(),
            reason: format!("unknown backend '{}', expected json or sqlite", other),
        }),
    }
}

fn validate_listen(config: &dyn ConfigPort) -> Result<(), PosCheckError> {
    if let Some(listen) = config.get_string("web", "listen") {
        if listen.trim().parse::<std::net::SocketAddr>().is_err() {
            return Err(PosCheckError::ConfigInvalid {
                section: "web".to_string(),
                key: "listen".to_string(),
                reason: format!("'{}' is not a socket address", listen.trim()),
            });
        }
    }
    Ok(())
}
