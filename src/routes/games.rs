use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::GameError,
    game::GridState,
    models::{Category, CellPosition, GridCell, RarityInfo, RarityTier, User},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct CellView {
    pub row: usize,
    pub col: usize,
    pub user: Option<User>,
    /// `null` until an answer is submitted
    pub is_correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<RarityTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity_info: Option<RarityInfo>,
    pub locked: bool,
    pub active: bool,
}

impl CellView {
    fn new(position: CellPosition, cell: &GridCell, active: bool) -> Self {
        Self {
            row: position.row,
            col: position.col,
            user: cell.user().cloned(),
            is_correct: cell.is_correct(),
            rarity: cell.rarity(),
            rarity_info: cell.rarity().map(RarityTier::info),
            locked: cell.is_locked(),
            active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BoardView {
    pub game_id: Uuid,
    pub rows: Vec<Category>,
    pub columns: Vec<Category>,
    /// Row-major, nine entries
    pub cells: Vec<CellView>,
    pub active_cell: Option<CellPosition>,
    pub correct_count: usize,
    pub complete: bool,
    pub created_at: DateTime<Utc>,
}

impl BoardView {
    fn from_state(grid: &GridState) -> Self {
        let active = grid.active_cell();
        Self {
            game_id: grid.game_id(),
            rows: grid.row_categories().to_vec(),
            columns: grid.column_categories().to_vec(),
            cells: grid
                .cells()
                .map(|(position, cell)| CellView::new(position, cell, active == Some(position)))
                .collect(),
            active_cell: active,
            correct_count: grid.correct_count(),
            complete: grid.is_complete(),
            created_at: grid.created_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub cell: CellView,
    pub correct_count: usize,
    pub complete: bool,
}

fn session(state: &AppState, game_id: Uuid) -> Result<Arc<Mutex<GridState>>, GameError> {
    state
        .games
        .get(&game_id)
        .map(|entry| entry.value().clone())
        .ok_or(GameError::GameNotFound(game_id))
}

/// Start a game: pick the axis categories and open an empty board
pub async fn create_game(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<BoardView>), GameError> {
    let pool = state.store.fetch_categories(None, true).await?;

    let selection = state.selector.select(&pool).map_err(|e| {
        tracing::warn!("Cannot start game: {}", e);
        e
    })?;
    let grid = GridState::new(selection)?;
    let view = BoardView::from_state(&grid);

    tracing::info!(
        "Started game {} (rows: {:?}, columns: {:?})",
        view.game_id,
        view.rows.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        view.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
    );

    state
        .games
        .insert(grid.game_id(), Arc::new(Mutex::new(grid)));
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<BoardView>, GameError> {
    let session = session(&state, game_id)?;
    let grid = session.lock().await;
    Ok(Json(BoardView::from_state(&grid)))
}

pub async fn get_cell(
    State(state): State<Arc<AppState>>,
    Path((game_id, row, col)): Path<(Uuid, usize, usize)>,
) -> Result<Json<CellView>, GameError> {
    let session = session(&state, game_id)?;
    let grid = session.lock().await;
    let cell = grid.current_cell(row, col)?;
    let position = CellPosition { row, col };
    Ok(Json(CellView::new(
        position,
        cell,
        grid.active_cell() == Some(position),
    )))
}

pub async fn select_cell(
    State(state): State<Arc<AppState>>,
    Path((game_id, row, col)): Path<(Uuid, usize, usize)>,
) -> Result<Json<BoardView>, GameError> {
    let session = session(&state, game_id)?;
    let mut grid = session.lock().await;
    grid.select_cell(row, col)?;
    Ok(Json(BoardView::from_state(&grid)))
}

pub async fn close_selection(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<BoardView>, GameError> {
    let session = session(&state, game_id)?;
    let mut grid = session.lock().await;
    grid.close_selection();
    Ok(Json(BoardView::from_state(&grid)))
}

/// Answer the open cell with a user picked from the suggestions
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<AnswerResponse>, GameError> {
    let session = session(&state, game_id)?;
    let mut grid = session.lock().await;
    let position = grid.active_cell().ok_or(GameError::NoActiveCell)?;

    let user = state
        .store
        .fetch_user(payload.user_id)
        .await?
        .ok_or(GameError::UserNotFound(payload.user_id))?;

    let cell = grid.submit_answer(state.store.as_ref(), user).await?;
    if grid.is_complete() {
        tracing::info!("Game {} completed", game_id);
    }

    Ok(Json(AnswerResponse {
        cell: CellView::new(position, &cell, false),
        correct_count: grid.correct_count(),
        complete: grid.is_complete(),
    }))
}

pub async fn end_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> Result<StatusCode, GameError> {
    state
        .games
        .remove(&game_id)
        .ok_or(GameError::GameNotFound(game_id))?;
    tracing::info!("Ended game {}", game_id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        db::{
            testing::{board_categories, seeded_store, FailingStore},
            GridStore, MemoryStore,
        },
        game::{selector::AxisSelection, SelectionPolicy},
        routes::create_routes,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        state: Arc<AppState>,
        selection: AxisSelection,
        member: User,
    }

    /// Partitioned selection so the board is R1..R3 x C1..C3;
    /// `member` belongs to R1 and C1
    fn test_app() -> TestApp {
        let selection = board_categories();
        let store = seeded_store(&selection);
        let member = User::new("Ewa", "Kowalczyk");
        store.add_user(member.clone());
        store.add_user(User::new("Tomasz", "Nowicki"));
        store.add_membership(member.id, selection.rows[0].id);
        store.add_membership(member.id, selection.columns[0].id);

        let state = app_state(Arc::new(store));
        TestApp {
            router: create_routes().with_state(state.clone()),
            state,
            selection,
            member,
        }
    }

    fn app_state(store: Arc<dyn GridStore>) -> Arc<AppState> {
        Arc::new(AppState::new(
            Config::for_tests(SelectionPolicy::Partitioned),
            store,
        ))
    }

    async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn start_game(app: &TestApp) -> String {
        let (status, body) = call(&app.router, Method::POST, "/api/games", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["game_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let (status, body) = call(&app.router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "memory");
    }

    #[tokio::test]
    async fn test_create_game_returns_empty_board() {
        let app = test_app();
        let (status, body) = call(&app.router, Method::POST, "/api/games", None).await;

        assert_eq!(status, StatusCode::CREATED);
        let rows: Vec<&str> = body["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(rows, vec!["R1", "R2", "R3"]);
        assert_eq!(body["columns"].as_array().unwrap().len(), 3);
        assert_eq!(body["cells"].as_array().unwrap().len(), 9);
        assert!(body["cells"][0]["is_correct"].is_null());
        assert!(body["active_cell"].is_null());
        assert_eq!(app.state.games.len(), 1);
    }

    #[tokio::test]
    async fn test_create_game_with_too_few_categories() {
        let store = MemoryStore::new();
        for category in board_categories().rows {
            store.add_category(category);
        }
        let router = create_routes().with_state(app_state(Arc::new(store)));

        let (status, body) = call(&router, Method::POST, "/api/games", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "insufficient_categories");
    }

    #[tokio::test]
    async fn test_create_game_store_failure_hides_details() {
        let router = create_routes().with_state(app_state(Arc::new(FailingStore)));
        let (status, body) = call(&router, Method::POST, "/api/games", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "data access failure");
    }

    #[tokio::test]
    async fn test_correct_answer_flow() {
        let app = test_app();
        let game_id = start_game(&app).await;

        let (status, body) = call(
            &app.router,
            Method::POST,
            &format!("/api/games/{game_id}/cells/0/0/select"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active_cell"], json!({"row": 0, "col": 0}));
        assert_eq!(body["cells"][0]["active"], true);

        let (status, body) = call(
            &app.router,
            Method::POST,
            &format!("/api/games/{game_id}/answers"),
            Some(json!({ "user_id": app.member.id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cell"]["is_correct"], true);
        assert_eq!(body["cell"]["rarity"], "legendary");
        assert_eq!(body["cell"]["rarity_info"]["label"], "Legendarny");
        assert_eq!(body["cell"]["locked"], true);
        assert_eq!(body["correct_count"], 1);

        let (status, body) = call(
            &app.router,
            Method::POST,
            &format!("/api/games/{game_id}/cells/0/0/select"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "cell_locked");

        let key = crate::models::AnswerKey::new(
            app.member.id,
            app.selection.rows[0].id,
            app.selection.columns[0].id,
        );
        let stat = app.state.store.fetch_statistic(key).await.unwrap().unwrap();
        assert_eq!(stat.usage_count, 1);
    }

    #[tokio::test]
    async fn test_incorrect_answer_can_be_retried() {
        let app = test_app();
        let game_id = start_game(&app).await;
        let select = format!("/api/games/{game_id}/cells/1/2/select");
        let answer = format!("/api/games/{game_id}/answers");

        call(&app.router, Method::POST, &select, None).await;
        let (status, body) = call(
            &app.router,
            Method::POST,
            &answer,
            Some(json!({ "user_id": app.member.id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cell"]["is_correct"], false);
        assert!(body["cell"].get("rarity").is_none());

        let (status, _) = call(&app.router, Method::POST, &select, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_answer_without_selection_conflicts() {
        let app = test_app();
        let game_id = start_game(&app).await;
        let (status, body) = call(
            &app.router,
            Method::POST,
            &format!("/api/games/{game_id}/answers"),
            Some(json!({ "user_id": app.member.id })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "no_active_cell");
    }

    #[tokio::test]
    async fn test_unknown_user_leaves_cell_open() {
        let app = test_app();
        let game_id = start_game(&app).await;
        call(
            &app.router,
            Method::POST,
            &format!("/api/games/{game_id}/cells/2/2/select"),
            None,
        )
        .await;

        let (status, _) = call(
            &app.router,
            Method::POST,
            &format!("/api/games/{game_id}/answers"),
            Some(json!({ "user_id": Uuid::new_v4() })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, board) = call(&app.router, Method::GET, &format!("/api/games/{game_id}"), None).await;
        assert_eq!(board["active_cell"], json!({"row": 2, "col": 2}));
        assert!(board["cells"][8]["is_correct"].is_null());
    }

    #[tokio::test]
    async fn test_get_cell_after_answer() {
        let app = test_app();
        let game_id = start_game(&app).await;
        let cell_uri = format!("/api/games/{game_id}/cells/0/0");

        let (status, body) = call(&app.router, Method::GET, &cell_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["is_correct"].is_null());
        assert_eq!(body["active"], false);

        call(&app.router, Method::POST, &format!("{cell_uri}/select"), None).await;
        call(
            &app.router,
            Method::POST,
            &format!("/api/games/{game_id}/answers"),
            Some(json!({ "user_id": app.member.id })),
        )
        .await;

        let (status, body) = call(&app.router, Method::GET, &cell_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_correct"], true);
        assert_eq!(body["user"]["first_name"], "Ewa");
        assert_eq!(body["locked"], true);

        let (status, _) = call(
            &app.router,
            Method::GET,
            &format!("/api/games/{game_id}/cells/3/0"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_select_out_of_bounds() {
        let app = test_app();
        let game_id = start_game(&app).await;
        let (status, body) = call(
            &app.router,
            Method::POST,
            &format!("/api/games/{game_id}/cells/0/3/select"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "cell_out_of_bounds");
    }

    #[tokio::test]
    async fn test_close_selection() {
        let app = test_app();
        let game_id = start_game(&app).await;
        call(
            &app.router,
            Method::POST,
            &format!("/api/games/{game_id}/cells/1/1/select"),
            None,
        )
        .await;

        let (status, body) = call(
            &app.router,
            Method::DELETE,
            &format!("/api/games/{game_id}/selection"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["active_cell"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_and_ended_games() {
        let app = test_app();
        let (status, body) = call(
            &app.router,
            Method::GET,
            &format!("/api/games/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "game_not_found");

        let game_id = start_game(&app).await;
        let uri = format!("/api/games/{game_id}");
        let (status, _) = call(&app.router, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app.router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(app.state.games.is_empty());
    }

    #[tokio::test]
    async fn test_user_search() {
        let app = test_app();

        let (status, body) = call(&app.router, Method::GET, "/api/users/search?q=EWA", None).await;
        assert_eq!(status, StatusCode::OK);
        let hits = body.as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["last_name"], "Kowalczyk");

        let (_, body) = call(&app.router, Method::GET, "/api/users/search?q=%20%20", None).await;
        assert_eq!(body, json!([]));

        let (_, body) = call(&app.router, Method::GET, "/api/users/search?q=o&limit=1", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_user_search_failure_returns_no_suggestions() {
        let router = create_routes().with_state(app_state(Arc::new(FailingStore)));
        let (status, body) = call(&router, Method::GET, "/api/users/search?q=anna", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_list_categories_by_axis() {
        let app = test_app();
        let (status, body) = call(&app.router, Method::GET, "/api/categories?axis=column", None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["C1", "C2", "C3"]);
    }
}
