use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::AnswerKey;

/// Failures of the data-access layer. A missing row is not one of them:
/// lookups return `Option` for that.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("answer statistic already exists for {0:?}")]
    DuplicateStatistic(AnswerKey),

    #[error("answer statistic {0} not found")]
    StatisticNotFound(Uuid),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("not enough categories: need at least {required}, found {found}")]
    InsufficientCategories { found: usize, required: usize },

    #[error("category {0} appears more than once on the board")]
    DuplicateCategory(Uuid),

    #[error("cell ({row}, {col}) is outside the board")]
    CellOutOfBounds { row: usize, col: usize },

    #[error("cell ({row}, {col}) already holds a correct answer")]
    CellLocked { row: usize, col: usize },

    #[error("no cell is selected")]
    NoActiveCell,

    #[error("game {0} not found")]
    GameNotFound(Uuid),

    #[error("user {0} not found")]
    UserNotFound(Uuid),

    #[error(transparent)]
    DataAccess(#[from] StoreError),
}

impl GameError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GameError::InsufficientCategories { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GameError::DuplicateCategory(_) | GameError::CellOutOfBounds { .. } => {
                StatusCode::BAD_REQUEST
            }
            GameError::CellLocked { .. } | GameError::NoActiveCell => StatusCode::CONFLICT,
            GameError::GameNotFound(_) | GameError::UserNotFound(_) => StatusCode::NOT_FOUND,
            GameError::DataAccess(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            GameError::InsufficientCategories { .. } => "insufficient_categories",
            GameError::DuplicateCategory(_) => "duplicate_category",
            GameError::CellOutOfBounds { .. } => "cell_out_of_bounds",
            GameError::CellLocked { .. } => "cell_locked",
            GameError::NoActiveCell => "no_active_cell",
            GameError::GameNotFound(_) => "game_not_found",
            GameError::UserNotFound(_) => "user_not_found",
            GameError::DataAccess(_) => "data_access_failure",
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        // Store internals stay in the logs
        let message = match &self {
            GameError::DataAccess(_) => "data access failure".to_string(),
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "error": self.code(),
                "message": message,
            })),
        )
            .into_response()
    }
}
