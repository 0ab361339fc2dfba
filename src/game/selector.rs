use std::{fmt, str::FromStr, sync::Arc};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::GameError,
    models::{Category, CategoryAxis},
};

/// Categories per board edge
pub const AXIS_LEN: usize = 3;
/// Categories needed to start a game
pub const REQUIRED_CATEGORIES: usize = AXIS_LEN * 2;

/// Row and column labels for one game
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSelection {
    pub rows: [Category; AXIS_LEN],
    pub columns: [Category; AXIS_LEN],
}

/// Picks the board's labels from the category pool. Never mutates the pool.
pub trait CategorySelector: Send + Sync {
    fn select(&self, pool: &[Category]) -> Result<AxisSelection, GameError>;
}

fn insufficient(found: usize, required: usize) -> GameError {
    GameError::InsufficientCategories { found, required }
}

fn into_axis(categories: Vec<Category>) -> Result<[Category; AXIS_LEN], GameError> {
    let found = categories.len();
    categories
        .try_into()
        .map_err(|_| insufficient(found, AXIS_LEN))
}

/// Respects the stored axis type: first 3 rows and first 3 columns by display order
pub struct TypePartitionedSelector;

impl TypePartitionedSelector {
    fn partition(pool: &[Category], axis: CategoryAxis) -> Result<[Category; AXIS_LEN], GameError> {
        let mut matching: Vec<&Category> = pool.iter().filter(|c| c.axis == axis).collect();
        if matching.len() < AXIS_LEN {
            return Err(insufficient(matching.len(), AXIS_LEN));
        }

        matching.sort_by_key(|c| c.position);
        into_axis(matching.into_iter().take(AXIS_LEN).cloned().collect())
    }
}

impl CategorySelector for TypePartitionedSelector {
    fn select(&self, pool: &[Category]) -> Result<AxisSelection, GameError> {
        if pool.len() < REQUIRED_CATEGORIES {
            return Err(insufficient(pool.len(), REQUIRED_CATEGORIES));
        }

        Ok(AxisSelection {
            rows: Self::partition(pool, CategoryAxis::Row)?,
            columns: Self::partition(pool, CategoryAxis::Column)?,
        })
    }
}

/// Ignores the stored axis type: shuffles the whole pool, first 3 become rows, next 3 columns
pub struct RandomUniformSelector;

impl RandomUniformSelector {
    pub fn select_with<R: Rng + ?Sized>(
        pool: &[Category],
        rng: &mut R,
    ) -> Result<AxisSelection, GameError> {
        if pool.len() < REQUIRED_CATEGORIES {
            return Err(insufficient(pool.len(), REQUIRED_CATEGORIES));
        }

        let mut shuffled = pool.to_vec();
        fisher_yates(&mut shuffled, rng);
        shuffled.truncate(REQUIRED_CATEGORIES);

        let columns = shuffled.split_off(AXIS_LEN);
        Ok(AxisSelection {
            rows: into_axis(shuffled)?,
            columns: into_axis(columns)?,
        })
    }
}

impl CategorySelector for RandomUniformSelector {
    fn select(&self, pool: &[Category]) -> Result<AxisSelection, GameError> {
        Self::select_with(pool, &mut rand::rng())
    }
}

/// Unbiased in-place shuffle: walk down from the last index, swapping each
/// element with a uniformly chosen one at or below it
fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Which selector a deployment uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    #[default]
    Random,
    Partitioned,
}

impl SelectionPolicy {
    pub fn selector(self) -> Arc<dyn CategorySelector> {
        match self {
            SelectionPolicy::Random => Arc::new(RandomUniformSelector),
            SelectionPolicy::Partitioned => Arc::new(TypePartitionedSelector),
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(SelectionPolicy::Random),
            "partitioned" => Ok(SelectionPolicy::Partitioned),
            other => Err(format!(
                "unknown category selection policy '{}' (expected 'random' or 'partitioned')",
                other
            )),
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::Random => write!(f, "random"),
            SelectionPolicy::Partitioned => write!(f, "partitioned"),
        }
    }
}
