use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    database::Item, error::AppError, proxy::fetch_sheet, search::suggest, state::AppState,
};

#[derive(Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Item>>, AppError> {
    // A mangled query string is treated like a missing one
    let query = params.ok().and_then(|Query(params)| params.q);

    suggest(state.store.clone(), query.as_deref()).await.map(Json)
}

pub async fn sheets_handler(
    State(state): State<Arc<AppState>>,
    Path((spreadsheet_id, range)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    fetch_sheet(&state, &spreadsheet_id, &range).await.map(Json)
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
