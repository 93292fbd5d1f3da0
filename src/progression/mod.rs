//! Progression systems

pub mod curve;
pub mod xp;
pub mod unlocks;
pub mod rewards;
pub mod engine;

pub use curve::LevelCurve;
pub use engine::ProgressionEngine;
pub use rewards::{RewardEvent, RewardSchedule, TradeSide};
pub use unlocks::{FeatureGate, FeatureUnlock, UnlockRequirement, UnlockTable, default_unlocks};
pub use xp::{LevelUpEvent, ProgressInfo, level_title, xp_from_signed};
