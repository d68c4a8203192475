//! Core domain types and logic.

pub mod app_config;
pub mod check;
pub mod config_validation;
pub mod error;
pub mod evaluator;
pub mod pnl;
pub mod position;
pub mod price_bar;
pub mod report;
pub mod saved_position;
pub mod validation;
