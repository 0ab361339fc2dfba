use crate::{
    db::GridStore,
    error::StoreError,
    models::{AnswerKey, RarityTier},
};

/// Result of classifying an answer, with the numbers behind it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RarityScore {
    pub tier: RarityTier,
    /// Share (0..=100) of the pair's records strictly more popular than this one
    pub percentile: f64,
    pub usage_count: i64,
    /// Records counted for the pair, this answer's own included
    pub siblings: usize,
}

pub struct RarityClassifier<'a> {
    store: &'a dyn GridStore,
}

impl<'a> RarityClassifier<'a> {
    pub fn new(store: &'a dyn GridStore) -> Self {
        Self { store }
    }

    /// Classify a correct answer. Statistics read failures degrade to `Common`.
    pub async fn classify(&self, key: AnswerKey) -> RarityTier {
        match self.score(key).await {
            Ok(score) => {
                tracing::debug!(
                    "Answer {:?}: used {} times, percentile {:.1} of {} pair records -> {:?}",
                    key,
                    score.usage_count,
                    score.percentile,
                    score.siblings,
                    score.tier
                );
                score.tier
            }
            Err(e) => {
                tracing::warn!("Failed to read answer statistics, rarity defaults to common: {}", e);
                RarityTier::Common
            }
        }
    }

    /// Compute the rarity of `key` against every answer recorded for its
    /// (row, column) pair, its own record included.
    ///
    /// Rules:
    /// - the answer's own usage count defaults to 1 when it has not been recorded yet
    /// - no records for the pair, or only this answer's own: `Legendary`
    /// - otherwise percentile = 100 * (records used strictly more) / records
    pub async fn score(&self, key: AnswerKey) -> Result<RarityScore, StoreError> {
        let usage_count = self
            .store
            .fetch_statistic(key)
            .await?
            .map(|stat| stat.usage_count)
            .unwrap_or(1);

        let pair = self
            .store
            .fetch_pair_statistics(key.row_category_id, key.column_category_id)
            .await?;

        if pair.iter().all(|stat| stat.key() == key) {
            return Ok(Self::score_counts(usage_count, &[]));
        }

        let pair_counts: Vec<i64> = pair.iter().map(|stat| stat.usage_count).collect();
        Ok(Self::score_counts(usage_count, &pair_counts))
    }

    pub fn score_counts(usage_count: i64, pair_counts: &[i64]) -> RarityScore {
        if pair_counts.is_empty() {
            return RarityScore {
                tier: RarityTier::Legendary,
                percentile: 100.0,
                usage_count,
                siblings: 0,
            };
        }

        let more_popular = pair_counts
            .iter()
            .filter(|&&count| count > usage_count)
            .count();
        let percentile = 100.0 * more_popular as f64 / pair_counts.len() as f64;

        RarityScore {
            tier: RarityTier::from_percentile(percentile),
            percentile,
            usage_count,
            siblings: pair_counts.len(),
        }
    }
}
