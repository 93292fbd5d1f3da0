//! StockVerse progression - XP, levels and feature unlocks
//!
//! Trading, quizzes and challenges award XP; XP decides level; level
//! decides which parts of the app are open.

pub mod error;
pub mod progression;
pub mod store;
pub mod config;
pub mod gateway;

// Re-export commonly used types
pub use config::ProgressionConfig;
pub use error::{ProgressionError, Result};
pub use gateway::{AwardResult, ProgressionGateway};
pub use progression::{
    FeatureGate, LevelCurve, LevelUpEvent, ProgressInfo, ProgressionEngine, RewardEvent, UnlockTable,
};
pub use store::{JsonFileStore, MemoryStore, UserId, UserRecord, UserStore};
