use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Which edge of the board a category is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CategoryAxis {
    Row,
    Column,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// Stored axis type. The random selection policy ignores it.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub axis: CategoryAxis,
    /// Display order within its axis
    pub position: i32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Category {
    #[allow(dead_code)]
    pub fn new(name: impl Into<String>, axis: CategoryAxis, position: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            axis,
            position,
            created_at: Utc::now(),
        }
    }
}

/// A (user, category) row from `user_categories`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct Membership {
    pub user_id: Uuid,
    pub category_id: Uuid,
}
