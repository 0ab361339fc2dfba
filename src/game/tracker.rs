use crate::{db::GridStore, error::StoreError, models::AnswerKey};

/// Counts correct submissions per (user, row, column) triple.
///
/// Each call is one read followed by one write, without locking. Two sessions
/// recording the same triple at the same moment can lose an increment, or one
/// of them hits the unique key on insert and is skipped. Counts never drop
/// below 1 and a triple never gets two rows.
pub struct UsageTracker<'a> {
    store: &'a dyn GridStore,
}

impl<'a> UsageTracker<'a> {
    pub fn new(store: &'a dyn GridStore) -> Self {
        Self { store }
    }

    /// Record one more correct use of `key`, returning the new usage count
    pub async fn record_correct_answer(&self, key: AnswerKey) -> Result<i64, StoreError> {
        match self.store.fetch_statistic(key).await? {
            Some(existing) => {
                let updated = self
                    .store
                    .update_statistic_usage(existing.id, existing.usage_count + 1)
                    .await?;
                Ok(updated.usage_count)
            }
            None => {
                let created = self.store.insert_statistic(key).await?;
                Ok(created.usage_count)
            }
        }
    }
}
