use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use serde::Deserialize;
use tokio::fs;
use uuid::Uuid;

use super::GridStore;
use crate::{
    error::StoreError,
    models::{AnswerKey, AnswerStatistic, Category, CategoryAxis, Membership, User},
};

/// Contents of a JSON seed file for the in-memory store
#[derive(Debug, Default, Deserialize)]
pub struct StoreSeed {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
}

/// In-process `GridStore`, used when no database is configured and in tests
#[derive(Default)]
pub struct MemoryStore {
    categories: DashMap<Uuid, Category>,
    users: DashMap<Uuid, User>,
    memberships: DashMap<Uuid, HashSet<Uuid>>,
    statistics: DashMap<AnswerKey, AnswerStatistic>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: StoreSeed) -> Self {
        let store = Self::new();
        for category in seed.categories {
            store.add_category(category);
        }
        for user in seed.users {
            store.add_user(user);
        }
        for membership in seed.memberships {
            store.add_membership(membership.user_id, membership.category_id);
        }
        store
    }

    /// Load a seed file from disk
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        let seed: StoreSeed = serde_json::from_str(&content)
            .with_context(|| format!("invalid seed file {}", path.display()))?;

        tracing::info!(
            "Loaded seed: {} categories, {} users, {} memberships",
            seed.categories.len(),
            seed.users.len(),
            seed.memberships.len()
        );

        Ok(Self::from_seed(seed))
    }

    pub fn add_category(&self, category: Category) {
        self.categories.insert(category.id, category);
    }

    pub fn add_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn add_membership(&self, user_id: Uuid, category_id: Uuid) {
        self.memberships
            .entry(user_id)
            .or_default()
            .insert(category_id);
    }
}

#[async_trait]
impl GridStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn fetch_categories(
        &self,
        axis: Option<CategoryAxis>,
        ordered: bool,
    ) -> Result<Vec<Category>, StoreError> {
        let mut categories: Vec<Category> = self
            .categories
            .iter()
            .filter(|c| axis.map_or(true, |axis| c.axis == axis))
            .map(|c| c.value().clone())
            .collect();

        if ordered {
            categories.sort_by(|a, b| {
                a.position
                    .cmp(&b.position)
                    .then_with(|| a.name.cmp(&b.name))
            });
        }
        Ok(categories)
    }

    async fn search_users(&self, query: &str, limit: usize) -> Result<Vec<User>, StoreError> {
        let needle = query.to_lowercase();
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|u| u.matches_query(&needle))
            .map(|u| u.value().clone())
            .collect();

        users.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        users.truncate(limit);
        Ok(users)
    }

    async fn fetch_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&user_id).map(|u| u.value().clone()))
    }

    async fn fetch_membership(&self, user_id: Uuid) -> Result<HashSet<Uuid>, StoreError> {
        Ok(self
            .memberships
            .get(&user_id)
            .map(|m| m.value().clone())
            .unwrap_or_default())
    }

    async fn fetch_statistic(
        &self,
        key: AnswerKey,
    ) -> Result<Option<AnswerStatistic>, StoreError> {
        Ok(self.statistics.get(&key).map(|s| s.value().clone()))
    }

    async fn fetch_pair_statistics(
        &self,
        row_category_id: Uuid,
        column_category_id: Uuid,
    ) -> Result<Vec<AnswerStatistic>, StoreError> {
        let mut stats: Vec<AnswerStatistic> = self
            .statistics
            .iter()
            .filter(|s| {
                s.row_category_id == row_category_id && s.column_category_id == column_category_id
            })
            .map(|s| s.value().clone())
            .collect();

        stats.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
        Ok(stats)
    }

    async fn insert_statistic(&self, key: AnswerKey) -> Result<AnswerStatistic, StoreError> {
        match self.statistics.entry(key) {
            Entry::Occupied(_) => Err(StoreError::DuplicateStatistic(key)),
            Entry::Vacant(slot) => {
                let stat = AnswerStatistic::first_use(key);
                slot.insert(stat.clone());
                Ok(stat)
            }
        }
    }

    async fn update_statistic_usage(
        &self,
        id: Uuid,
        usage_count: i64,
    ) -> Result<AnswerStatistic, StoreError> {
        let mut stat = self
            .statistics
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::StatisticNotFound(id))?;

        stat.usage_count = usage_count;
        stat.updated_at = Utc::now();
        Ok(stat.clone())
    }
}
