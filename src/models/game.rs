use serde::{Deserialize, Serialize};

use super::User;

/// Popularity class of a correct answer. Rarer means fewer players picked it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RarityTier {
    Legendary,
    Epic,
    Rare,
    Uncommon,
    Common,
}

/// Presentation hints attached to a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RarityInfo {
    pub label: &'static str,
    pub color: &'static str,
    pub background: &'static str,
    pub icon: &'static str,
}

impl RarityTier {
    /// Lower bounds (inclusive) checked from the top; anything below the last is common
    const THRESHOLDS: [(f64, RarityTier); 4] = [
        (98.0, RarityTier::Legendary),
        (90.0, RarityTier::Epic),
        (70.0, RarityTier::Rare),
        (40.0, RarityTier::Uncommon),
    ];

    /// Map a percentile (share of sibling answers strictly more popular, 0..=100) to a tier.
    /// Higher percentile means a less popular answer, hence a rarer tier.
    pub fn from_percentile(percentile: f64) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(floor, _)| percentile >= *floor)
            .map(|(_, tier)| *tier)
            .unwrap_or(RarityTier::Common)
    }

    pub fn info(self) -> RarityInfo {
        match self {
            RarityTier::Legendary => RarityInfo {
                label: "Legendarny",
                color: "text-yellow-600",
                background: "bg-yellow-100",
                icon: "⭐",
            },
            RarityTier::Epic => RarityInfo {
                label: "Epicki",
                color: "text-purple-600",
                background: "bg-purple-100",
                icon: "💎",
            },
            RarityTier::Rare => RarityInfo {
                label: "Rzadka",
                color: "text-blue-600",
                background: "bg-blue-100",
                icon: "💠",
            },
            RarityTier::Uncommon => RarityInfo {
                label: "Nieczęsta",
                color: "text-green-600",
                background: "bg-green-100",
                icon: "✨",
            },
            RarityTier::Common => RarityInfo {
                label: "Powszechna",
                color: "text-gray-600",
                background: "bg-gray-100",
                icon: "⚪",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

/// Contents of one board cell.
///
/// A tier only exists on `Correct`, so "rarity iff correct" cannot be broken.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GridCell {
    #[default]
    Empty,
    Incorrect {
        user: User,
    },
    Correct {
        user: User,
        rarity: RarityTier,
    },
}

impl GridCell {
    pub fn user(&self) -> Option<&User> {
        match self {
            GridCell::Empty => None,
            GridCell::Incorrect { user } | GridCell::Correct { user, .. } => Some(user),
        }
    }

    /// `None` until an answer has been submitted
    pub fn is_correct(&self) -> Option<bool> {
        match self {
            GridCell::Empty => None,
            GridCell::Incorrect { .. } => Some(false),
            GridCell::Correct { .. } => Some(true),
        }
    }

    pub fn rarity(&self) -> Option<RarityTier> {
        match self {
            GridCell::Correct { rarity, .. } => Some(*rarity),
            _ => None,
        }
    }

    /// Correct answers can never be replaced
    pub fn is_locked(&self) -> bool {
        matches!(self, GridCell::Correct { .. })
    }
}
