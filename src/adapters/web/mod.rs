//! Web server adapter.
//!
//! A single form page for checking positions plus a saved-positions list.
//! Port calls block (HTTP, file and SQLite I/O), so handlers run them on the
//! blocking pool.

mod error;
mod handlers;
mod templates;

pub use error::{WebError, status_from_error};
pub use handlers::*;
pub use templates::*;

use axum::{
    Router,
    routing::{get, post},
};
use chrono::FixedOffset;
use std::sync::Arc;

use crate::ports::position_store_port::PositionStorePort;
use crate::ports::price_data_port::PriceDataPort;

pub struct AppState {
    pub prices: Arc<dyn PriceDataPort + Send + Sync>,
    pub store: Arc<dyn PositionStorePort + Send + Sync>,
    pub display_offset: FixedOffset,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::submit))
        .route("/delete_position/{id}", post(handlers::delete_position))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}
