//! HTTP routes
//!
//! Global content is served from the prebuilt dashboard context; panels
//! for a selector value are computed fresh on every request.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

use super::AppState;
use crate::dashboard::{Dashboard, Panel, Sheet, SheetContent};
use crate::error::Error;
use crate::pipeline::{FamilyAggregates, StateAggregates, StoreAggregates};

/// Serve the dashboard page
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

/// Error body returned to the page, which shows it in place of the charts
#[derive(Debug)]
pub enum ApiError {
    Dashboard(Error),
    BadRequest(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Dashboard(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Dashboard(err) => {
                let status = match &err {
                    Error::NotFound { .. } | Error::UnknownSheet(_) => StatusCode::NOT_FOUND,
                    Error::EmptyAggregate(_) | Error::Load(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!("Request failed: {}", message);
        } else {
            warn!("Request rejected: {}", message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Run a view on the blocking pool; scans over the raw table can be long
async fn compute<T, F>(state: &AppState, view: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Dashboard) -> Result<T, Error> + Send + 'static,
{
    let dashboard = state.dashboard.clone();
    tokio::task::spawn_blocking(move || view(&dashboard))
        .await
        .map_err(|e| ApiError::Internal(format!("view task failed: {e}")))?
        .map_err(ApiError::from)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub rows: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        rows: state.dashboard.raw().len(),
    })
}

#[derive(Debug, Serialize)]
pub struct SheetEntry {
    pub id: &'static str,
    pub label: &'static str,
}

/// API: list the tabs in display order
pub async fn api_sheets() -> Json<Vec<SheetEntry>> {
    Json(
        Sheet::ALL
            .into_iter()
            .map(|sheet| SheetEntry {
                id: sheet.id(),
                label: sheet.label(),
            })
            .collect(),
    )
}

/// API: content of one tab
pub async fn api_sheet(
    State(state): State<Arc<AppState>>,
    Path(sheet): Path<String>,
) -> Result<Json<SheetContent>, ApiError> {
    let sheet: Sheet = sheet.parse()?;
    Ok(Json(state.dashboard.sheet(sheet)))
}

/// API: store panel
pub async fn api_store(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<String>,
) -> Result<Json<Panel<StoreAggregates>>, ApiError> {
    let store_id: i64 = store_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid store id {store_id:?}")))?;
    let panel = compute(&state, move |d| d.store_panel(store_id)).await?;
    Ok(Json(panel))
}

/// API: state panel
pub async fn api_state(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Panel<StateAggregates>>, ApiError> {
    let panel = compute(&state, move |d| d.state_panel(&name)).await?;
    Ok(Json(panel))
}

/// API: product family panel
pub async fn api_family(
    State(state): State<Arc<AppState>>,
    Path(family): Path<String>,
) -> Result<Json<Panel<FamilyAggregates>>, ApiError> {
    let panel = compute(&state, move |d| d.family_panel(&family)).await?;
    Ok(Json(panel))
}
