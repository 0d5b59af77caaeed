//! Device database endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use super::{ApiError, ApiState};
use crate::Error;

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search(State(state): State<Arc<ApiState>>, Query(query): Query<SearchQuery>) -> Response {
    Json(state.database.search(&query.q)).into_response()
}

async fn get_entry(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<usize>,
) -> Result<Response, ApiError> {
    let entry = state
        .database
        .get(id)
        .ok_or_else(|| Error::NotFound(format!("device {id}")))?;
    Ok(Json(entry).into_response())
}

async fn adapter_definition(
    State(state): State<Arc<ApiState>>,
    Path(adapter_name): Path<String>,
) -> Result<Response, ApiError> {
    let adapter = state
        .database
        .adapter(&adapter_name)
        .ok_or_else(|| Error::NotFound(format!("adapter {adapter_name}")))?;
    Ok(Json(adapter.definition()).into_response())
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/adapterdefinition/{adapter_name}", get(adapter_definition))
        .route("/{id}", get(get_entry))
        .with_state(state)
}
