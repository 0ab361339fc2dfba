use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::GridStore;
use crate::{
    error::StoreError,
    models::{AnswerKey, AnswerStatistic, Category, CategoryAxis, User},
};

const CATEGORY_COLUMNS: &str = "SELECT id, name, type, position, created_at FROM categories";

/// `GridStore` backed by Postgres
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE metacharacters so user input only ever matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl GridStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn fetch_categories(
        &self,
        axis: Option<CategoryAxis>,
        ordered: bool,
    ) -> Result<Vec<Category>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(CATEGORY_COLUMNS);
        if let Some(axis) = axis {
            builder.push(" WHERE type = ").push_bind(axis);
        }
        if ordered {
            builder.push(" ORDER BY position, name");
        }

        let categories = builder
            .build_query_as::<Category>()
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn search_users(&self, query: &str, limit: usize) -> Result<Vec<User>, StoreError> {
        let pattern = format!("%{}%", escape_like(query));

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE first_name ILIKE $1 OR last_name ILIKE $1
            ORDER BY last_name, first_name
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn fetch_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn fetch_membership(&self, user_id: Uuid) -> Result<HashSet<Uuid>, StoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT category_id FROM user_categories WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn fetch_statistic(
        &self,
        key: AnswerKey,
    ) -> Result<Option<AnswerStatistic>, StoreError> {
        let stat = sqlx::query_as::<_, AnswerStatistic>(
            r#"
            SELECT * FROM answer_statistics
            WHERE user_id = $1 AND row_category_id = $2 AND column_category_id = $3
            "#,
        )
        .bind(key.user_id)
        .bind(key.row_category_id)
        .bind(key.column_category_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stat)
    }

    async fn fetch_pair_statistics(
        &self,
        row_category_id: Uuid,
        column_category_id: Uuid,
    ) -> Result<Vec<AnswerStatistic>, StoreError> {
        let stats = sqlx::query_as::<_, AnswerStatistic>(
            r#"
            SELECT * FROM answer_statistics
            WHERE row_category_id = $1 AND column_category_id = $2
            ORDER BY usage_count DESC
            "#,
        )
        .bind(row_category_id)
        .bind(column_category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn insert_statistic(&self, key: AnswerKey) -> Result<AnswerStatistic, StoreError> {
        sqlx::query_as::<_, AnswerStatistic>(
            r#"
            INSERT INTO answer_statistics (user_id, row_category_id, column_category_id, usage_count)
            VALUES ($1, $2, $3, 1)
            RETURNING *
            "#,
        )
        .bind(key.user_id)
        .bind(key.row_category_id)
        .bind(key.column_category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Another session inserted the same triple between our read and write
            let duplicate = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if duplicate {
                StoreError::DuplicateStatistic(key)
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn update_statistic_usage(
        &self,
        id: Uuid,
        usage_count: i64,
    ) -> Result<AnswerStatistic, StoreError> {
        sqlx::query_as::<_, AnswerStatistic>(
            r#"
            UPDATE answer_statistics
            SET usage_count = $1,
                updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(usage_count)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::StatisticNotFound(id))
    }
}
