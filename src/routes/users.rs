use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{models::User, AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// Name suggestions for the answer picker.
///
/// A failed lookup yields no suggestions rather than an error, so the
/// player can simply keep typing.
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<User>> {
    let needle = query.q.trim();
    if needle.is_empty() {
        return Json(Vec::new());
    }

    let cap = state.config.game.search_limit;
    let limit = query.limit.unwrap_or(cap).clamp(1, cap.max(1));

    match state.store.search_users(needle, limit).await {
        Ok(users) => Json(users),
        Err(e) => {
            tracing::error!("Failed to search users for '{}': {}", needle, e);
            Json(Vec::new())
        }
    }
}
