//! Progression engine
//!
//! Pure level math over a validated curve and unlock table. No I/O.

use super::curve::LevelCurve;
use super::unlocks::{FeatureGate, FeatureUnlock, UnlockTable};
use super::xp::{LevelUpEvent, ProgressInfo};
use crate::config::ProgressionConfig;
use crate::error::{ProgressionError, Result};

/// A validated curve + unlock table.
///
/// Construction is the only place configuration is checked, so every method
/// can assume strictly increasing thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionEngine {
    curve: LevelCurve,
    max_level: Option<u32>,
    unlocks: UnlockTable,
}

impl ProgressionEngine {
    pub fn new(curve: LevelCurve, max_level: Option<u32>, unlocks: UnlockTable) -> Result<Self> {
        curve.validate(max_level)?;

        if let Some(cap) = max_level {
            if let Some(entry) = unlocks.entries().iter().find(|e| e.min_level > cap) {
                return Err(ProgressionError::Configuration(format!(
                    "feature '{}' unlocks at level {} but max_level is {}",
                    entry.key, entry.min_level, cap
                )));
            }
        }

        Ok(Self { curve, max_level, unlocks })
    }

    pub fn from_config(config: &ProgressionConfig) -> Result<Self> {
        Self::new(config.curve.clone(), config.max_level, config.unlocks.clone())
    }

    pub fn curve(&self) -> &LevelCurve {
        &self.curve
    }

    pub fn max_level(&self) -> Option<u32> {
        self.max_level
    }

    pub fn unlocks(&self) -> &UnlockTable {
        &self.unlocks
    }

    /// Cumulative XP required to reach `level`
    pub fn threshold_for_level(&self, level: u32) -> Result<u64> {
        if level == 0 {
            return Err(ProgressionError::InvalidInput("levels start at 1".into()));
        }
        self.curve.threshold(level).ok_or_else(|| {
            ProgressionError::InvalidInput(format!("threshold for level {} overflows u64", level))
        })
    }

    /// The unique level `L` with `threshold(L) <= xp < threshold(L+1)`, capped at `max_level`
    pub fn level_for_xp(&self, xp: u64) -> u32 {
        let level = self.curve.level_for_xp(xp);
        match self.max_level {
            Some(cap) => level.min(cap),
            None => level,
        }
    }

    /// Threshold of the level after `level`, or `None` at the cap
    fn next_threshold(&self, level: u32) -> Option<u64> {
        if self.max_level.is_some_and(|cap| level >= cap) {
            return None;
        }
        self.curve.threshold(level.checked_add(1)?)
    }

    pub fn describe_progress(&self, xp: u64) -> ProgressInfo {
        let level = self.level_for_xp(xp);
        let current = self.curve.threshold(level).unwrap_or_default();
        let into_level = xp - current;

        match self.next_threshold(level) {
            Some(next) => {
                let span = next - current;
                let percent = (into_level as f64 / span as f64 * 100.0).clamp(0.0, 100.0);
                ProgressInfo {
                    level,
                    xp,
                    xp_for_current_level: current,
                    xp_for_next_level: next,
                    xp_into_level: into_level,
                    xp_to_next: next - xp,
                    percent_to_next: percent,
                }
            }
            None => ProgressInfo {
                level,
                xp,
                xp_for_current_level: current,
                xp_for_next_level: current,
                xp_into_level: into_level,
                xp_to_next: 0,
                percent_to_next: 100.0,
            },
        }
    }

    /// Compare the levels before and after an award.
    ///
    /// XP only ever grows, so `new_xp < old_xp` is a caller bug.
    pub fn detect_level_up(&self, old_xp: u64, new_xp: u64) -> Result<Option<LevelUpEvent>> {
        if new_xp < old_xp {
            return Err(ProgressionError::InvalidInput(format!(
                "XP cannot decrease ({} -> {})",
                old_xp, new_xp
            )));
        }

        let old_level = self.level_for_xp(old_xp);
        let new_level = self.level_for_xp(new_xp);
        if new_level == old_level {
            return Ok(None);
        }

        let start = self.curve.threshold(new_level).unwrap_or_default();
        Ok(Some(LevelUpEvent {
            old_level,
            new_level,
            xp_carried_over: new_xp - start,
            unlocked_features: self
                .unlocks
                .unlocked_between(old_level, new_level)
                .into_iter()
                .cloned()
                .collect(),
        }))
    }

    pub fn resolve_feature_gate(&self, level: u32, feature_key: &str) -> Result<FeatureGate> {
        if level == 0 {
            return Err(ProgressionError::InvalidInput("levels start at 1".into()));
        }
        Ok(self.unlocks.resolve_gate(level, feature_key))
    }

    /// Everything available at `level`
    pub fn unlocked_features(&self, level: u32) -> Vec<&FeatureUnlock> {
        self.unlocks.unlocked_at(level)
    }
}

impl Default for ProgressionEngine {
    fn default() -> Self {
        Self {
            curve: LevelCurve::default(),
            max_level: None,
            unlocks: UnlockTable::default(),
        }
    }
}
