pub mod categories;
pub mod games;
pub mod health;
pub mod users;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(categories::list_categories))
        .route("/users/search", get(users::search_users))
        .route("/games", post(games::create_game))
        .route(
            "/games/{game_id}",
            get(games::get_game).delete(games::end_game),
        )
        .route(
            "/games/{game_id}/cells/{row}/{col}",
            get(games::get_cell),
        )
        .route(
            "/games/{game_id}/cells/{row}/{col}/select",
            post(games::select_cell),
        )
        .route(
            "/games/{game_id}/selection",
            axum::routing::delete(games::close_selection),
        )
        .route("/games/{game_id}/answers", post(games::submit_answer))
}
