// Game engine modules

pub mod grid;
pub mod rarity;
pub mod selector;
pub mod tracker;
pub mod validator;

pub use grid::GridState;
pub use rarity::RarityClassifier;
pub use selector::{CategorySelector, SelectionPolicy};
pub use tracker::UsageTracker;
pub use validator::MembershipValidator;
