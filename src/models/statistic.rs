use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Identifies one possible grid answer: (user, row category, column category)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnswerKey {
    pub user_id: Uuid,
    pub row_category_id: Uuid,
    pub column_category_id: Uuid,
}

impl AnswerKey {
    pub fn new(user_id: Uuid, row_category_id: Uuid, column_category_id: Uuid) -> Self {
        Self {
            user_id,
            row_category_id,
            column_category_id,
        }
    }
}

/// How many times an exact answer has been submitted correctly, across all games
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AnswerStatistic {
    pub id: Uuid,
    pub user_id: Uuid,
    pub row_category_id: Uuid,
    pub column_category_id: Uuid,
    /// Always >= 1
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnswerStatistic {
    /// A freshly recorded answer
    pub fn first_use(key: AnswerKey) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: key.user_id,
            row_category_id: key.row_category_id,
            column_category_id: key.column_category_id,
            usage_count: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> AnswerKey {
        AnswerKey::new(self.user_id, self.row_category_id, self.column_category_id)
    }
}
