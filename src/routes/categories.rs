use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::GameError,
    models::{Category, CategoryAxis},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub axis: Option<CategoryAxis>,
}

/// List categories in display order, optionally for one axis
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<Category>>, GameError> {
    let categories = state.store.fetch_categories(query.axis, true).await?;
    Ok(Json(categories))
}
