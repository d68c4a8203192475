//! Concrete adapter implementations for ports.

#[cfg(feature = "binance")]
pub mod binance_adapter;
pub mod chart_svg;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod json_store_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
#[cfg(feature = "web")]
pub mod web;
