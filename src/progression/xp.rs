//! Experience and leveling
//!
//! Progress snapshots, level-up events and rank titles.

use serde::{Deserialize, Serialize};

use super::unlocks::FeatureUnlock;
use crate::error::{ProgressionError, Result};

/// Where a player stands inside their current level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub level: u32,
    /// Lifetime XP
    pub xp: u64,
    /// Cumulative XP at which the current level starts
    pub xp_for_current_level: u64,
    /// Cumulative XP at which the next level starts (equal to the current one at the cap)
    pub xp_for_next_level: u64,
    pub xp_into_level: u64,
    pub xp_to_next: u64,
    /// 0.0 ..= 100.0
    pub percent_to_next: f64,
}

impl ProgressInfo {
    /// True at `max_level`, or at level `u32::MAX` on an uncapped curve
    pub fn is_max_level(&self) -> bool {
        self.xp_for_next_level == self.xp_for_current_level
    }
}

/// Produced when an award crosses at least one level boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpEvent {
    pub old_level: u32,
    pub new_level: u32,
    /// XP past the start of `new_level`
    pub xp_carried_over: u64,
    /// Every feature whose `min_level` lies in `(old_level, new_level]`
    pub unlocked_features: Vec<FeatureUnlock>,
}

impl LevelUpEvent {
    pub fn levels_gained(&self) -> u32 {
        self.new_level - self.old_level
    }

    /// One-line celebration text
    pub fn summary(&self) -> String {
        let mut msg = format!(
            "Level up! {} -> {} ({})",
            self.old_level,
            self.new_level,
            level_title(self.new_level)
        );
        if !self.unlocked_features.is_empty() {
            let names: Vec<&str> = self.unlocked_features.iter().map(|f| f.name.as_str()).collect();
            msg.push_str(&format!(". Unlocked: {}", names.join(", ")));
        }
        msg
    }
}

/// Convert an externally supplied XP total, rejecting negatives
pub fn xp_from_signed(xp: i64) -> Result<u64> {
    u64::try_from(xp)
        .map_err(|_| ProgressionError::InvalidInput(format!("XP cannot be negative (got {})", xp)))
}

/// Get a title/rank based on level
pub fn level_title(level: u32) -> &'static str {
    match level {
        0..=2 => "Intern",
        3..=4 => "Junior Trader",
        5..=7 => "Analyst",
        8..=10 => "Senior Trader",
        11..=14 => "Portfolio Manager",
        15..=19 => "Fund Manager",
        20..=29 => "Market Wizard",
        _ => "Market Legend",
    }
}
