pub mod category;
pub mod game;
pub mod statistic;
pub mod user;

pub use category::{Category, CategoryAxis, Membership};
pub use game::{CellPosition, GridCell, RarityInfo, RarityTier};
pub use statistic::{AnswerKey, AnswerStatistic};
pub use user::User;
