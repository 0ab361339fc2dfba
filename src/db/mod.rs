use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::{AnswerKey, AnswerStatistic, Category, CategoryAxis, User},
};

pub mod memory;
pub mod queries;

pub use memory::MemoryStore;
pub use queries::PgStore;

pub async fn create_pool(database_url: &str, max_connections: u32) -> sqlx::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Data access used by the game core.
///
/// Absent rows come back as `None` or an empty collection, never as an error.
#[async_trait]
pub trait GridStore: Send + Sync {
    /// Short name for logs and the health endpoint
    fn backend(&self) -> &'static str;

    /// All categories, optionally restricted to one axis and ordered by display position
    async fn fetch_categories(
        &self,
        axis: Option<CategoryAxis>,
        ordered: bool,
    ) -> Result<Vec<Category>, StoreError>;

    /// Case-insensitive substring match on first or last name, at most `limit` rows
    async fn search_users(&self, query: &str, limit: usize) -> Result<Vec<User>, StoreError>;

    async fn fetch_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    /// Ids of every category the user belongs to
    async fn fetch_membership(&self, user_id: Uuid) -> Result<HashSet<Uuid>, StoreError>;

    async fn fetch_statistic(&self, key: AnswerKey)
        -> Result<Option<AnswerStatistic>, StoreError>;

    /// Every statistic recorded for a (row, column) pair, most used first
    async fn fetch_pair_statistics(
        &self,
        row_category_id: Uuid,
        column_category_id: Uuid,
    ) -> Result<Vec<AnswerStatistic>, StoreError>;

    /// Record a first use (usage_count = 1). Fails if the triple already exists.
    async fn insert_statistic(&self, key: AnswerKey) -> Result<AnswerStatistic, StoreError>;

    /// Overwrite usage_count and refresh updated_at
    async fn update_statistic_usage(
        &self,
        id: Uuid,
        usage_count: i64,
    ) -> Result<AnswerStatistic, StoreError>;
}
