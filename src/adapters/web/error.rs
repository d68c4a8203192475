//! HTTP error responses for the web adapter.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::domain::error::PosCheckError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &PosCheckError) -> StatusCode {
    match err {
        PosCheckError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        PosCheckError::PositionNotFound { .. } => StatusCode::NOT_FOUND,
        PosCheckError::NoData { .. } | PosCheckError::UnknownSymbol { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PosCheckError::PriceSource { .. }
        | PosCheckError::Storage { .. }
        | PosCheckError::StorageQuery { .. }
        | PosCheckError::ConfigParse { .. }
        | PosCheckError::ConfigMissing { .. }
        | PosCheckError::ConfigInvalid { .. }
        | PosCheckError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PosCheckError> for WebError {
    fn from(err: PosCheckError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl From<tokio::task::JoinError> for WebError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("blocking task failed: {}", err);
        Self::internal("internal error")
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let template = super::templates::ErrorTemplate {
            message: &self.message,
            status: self.status.as_u16(),
        };
        match template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}
