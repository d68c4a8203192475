//! Port traits at the boundary of the domain.

pub mod config_port;
pub mod position_store_port;
pub mod price_data_port;
