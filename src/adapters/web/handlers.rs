//! HTTP request handlers for the web adapter.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::check::check_position;
use crate::domain::error::PosCheckError;
use crate::domain::saved_position::NewPosition;
use crate::domain::validation::{PositionInput, validate_position};

use super::templates::{IndexTemplate, ResultView, SavedRow};
use super::{AppState, WebError, status_from_error};

#[derive(Debug, Default, Deserialize)]
pub struct LoadQuery {
    pub load: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PositionForm {
    pub symbol: String,
    pub entry_price: String,
    pub target1: String,
    pub target2: String,
    pub stop_price: String,
    pub leverage: String,
    pub open_time: String,
    pub name: String,
    pub action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Check,
    Save,
}

impl PositionForm {
    /// Anything other than `save` runs a check.
    pub fn action(&self) -> FormAction {
        if self.action.trim().eq_ignore_ascii_case("save") {
            FormAction::Save
        } else {
            FormAction::Check
        }
    }

    pub fn input(&self) -> PositionInput {
        PositionInput {
            symbol: self.symbol.clone(),
            entry_price: self.entry_price.clone(),
            target1: self.target1.clone(),
            target2: self.target2.clone(),
            stop_price: self.stop_price.clone(),
            leverage: self.leverage.clone(),
            open_time: self.open_time.clone(),
        }
    }
}

struct Page {
    status: StatusCode,
    template: IndexTemplate,
}

impl Page {
    fn new(form: PositionInput) -> Self {
        Self {
            status: StatusCode::OK,
            template: IndexTemplate {
                form,
                saved: Vec::new(),
                message: None,
                error: None,
                result: None,
            },
        }
    }

    /// Shows the error inline instead of replacing the page.
    fn fail(&mut self, err: PosCheckError) {
        tracing::debug!("request failed: {}", err);
        self.status = status_from_error(&err);
        self.template.error = Some(err.to_string());
    }

    fn with_saved(mut self, state: &AppState) -> Result<Self, PosCheckError> {
        self.template.saved = state
            .store
            .list_positions()?
            .iter()
            .map(|p| SavedRow::new(p, state.display_offset))
            .collect();
        Ok(self)
    }

    fn render(self) -> Result<Response, WebError> {
        let html = self
            .template
            .render()
            .map_err(|e| WebError::internal(e.to_string()))?;
        Ok((self.status, Html(html)).into_response())
    }
}

fn index_page(
    state: &AppState,
    load: Option<u64>,
    now: DateTime<Utc>,
) -> Result<Page, PosCheckError> {
    let offset = state.display_offset;
    let defaults = PositionInput::with_defaults(now, offset);
    let form = state
        .store
        .load_settings()?
        .unwrap_or_default()
        .or_else(&defaults);
    let mut page = Page::new(form);

    if let Some(id) = load {
        match state.store.get_position(id)? {
            Some(saved) => {
                page.template.form = PositionInput::from_position(&saved.to_position(), offset);
                page.template.message = Some(format!("Loaded position '{}'", saved.name));
            }
            None => page.fail(PosCheckError::PositionNotFound { id }),
        }
    }
    page.with_saved(state)
}

fn submit_page(
    state: &AppState,
    form: PositionForm,
    now: DateTime<Utc>,
) -> Result<Page, PosCheckError> {
    let offset = state.display_offset;
    let input = form.input();
    let mut page = Page::new(input.clone());

    let position = match validate_position(&input, now, offset) {
        Ok(p) => p,
        Err(e) => {
            page.fail(e);
            return page.with_saved(state);
        }
    };

    if let Err(e) = state.store.save_settings(&input) {
        tracing::warn!("Failed to save settings: {}", e);
    }

    match form.action() {
        FormAction::Save => {
            let saved = state.store.add_position(NewPosition::new(
                position,
                Some(form.name),
                now,
                offset,
            ))?;
            page.template.message = Some(format!("Saved position '{}'", saved.name));
        }
        FormAction::Check => match check_position(state.prices.as_ref(), &position, now) {
            Ok(check) => page.template.result = Some(ResultView::new(&check, offset)),
            Err(e) => page.fail(e),
        },
    }
    page.with_saved(state)
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoadQuery>,
) -> Result<Response, WebError> {
    let page =
        tokio::task::spawn_blocking(move || index_page(&state, query.load, Utc::now())).await??;
    page.render()
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PositionForm>,
) -> Result<Response, WebError> {
    let page = tokio::task::spawn_blocking(move || submit_page(&state, form, Utc::now())).await??;
    page.render()
}

pub async fn delete_position(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Redirect, WebError> {
    let deleted = tokio::task::spawn_blocking(move || state.store.delete_position(id)).await??;
    if !deleted {
        tracing::info!("Delete requested for unknown position {}", id);
    }
    Ok(Redirect::to("/"))
}

pub async fn not_found() -> WebError {
    WebError::not_found("page not found")
}
