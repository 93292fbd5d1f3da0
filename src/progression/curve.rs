//! Level thresholds
//!
//! Cumulative XP needed to reach each level, and the reverse lookup.

use serde::{Deserialize, Serialize};

use crate::error::{ProgressionError, Result};

/// XP added per level on the canonical curve
pub const DEFAULT_BASE_STEP: u64 = 1000;
/// Extra XP added per level on the canonical curve
pub const DEFAULT_BONUS_STEP: u64 = 200;

/// Shape of the XP curve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelCurve {
    /// `threshold(L) = (L-1) * base_step + (L-1) * bonus_step`
    Linear { base_step: u64, bonus_step: u64 },
    /// Explicit cumulative thresholds for levels `1..=n`.
    /// Levels past the end keep climbing by the last step.
    Table { thresholds: Vec<u64> },
}

impl Default for LevelCurve {
    fn default() -> Self {
        LevelCurve::Linear {
            base_step: DEFAULT_BASE_STEP,
            bonus_step: DEFAULT_BONUS_STEP,
        }
    }
}

impl LevelCurve {
    /// Cumulative XP needed to reach `level`.
    ///
    /// `None` for level 0 or when the threshold does not fit in a `u64`.
    pub fn threshold(&self, level: u32) -> Option<u64> {
        if level == 0 {
            return None;
        }
        let steps = u64::from(level - 1);

        match self {
            LevelCurve::Linear { base_step, bonus_step } => {
                steps.checked_mul(base_step.checked_add(*bonus_step)?)
            }
            LevelCurve::Table { thresholds } => {
                let idx = (level - 1) as usize;
                if let Some(&xp) = thresholds.get(idx) {
                    return Some(xp);
                }
                let n = thresholds.len();
                let last = *thresholds.last()?;
                let prev = *thresholds.get(n.checked_sub(2)?)?;
                let last_step = last.checked_sub(prev)?;
                let extra = (idx - (n - 1)) as u64;
                last.checked_add(extra.checked_mul(last_step)?)
            }
        }
    }

    /// Highest level whose threshold is at or below `xp`.
    ///
    /// Exponential probe for an upper bound, then binary search. Relies on
    /// `threshold(1) == 0` and strictly increasing thresholds.
    pub fn level_for_xp(&self, xp: u64) -> u32 {
        let mut lo: u32 = 1;
        let mut hi: u32 = 2;

        loop {
            match self.threshold(hi) {
                Some(t) if t <= xp => {
                    lo = hi;
                    if hi == u32::MAX {
                        return u32::MAX;
                    }
                    hi = hi.saturating_mul(2);
                }
                _ => break,
            }
        }

        // threshold(lo) <= xp < threshold(hi)
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            match self.threshold(mid) {
                Some(t) if t <= xp => lo = mid,
                _ => hi = mid,
            }
        }
        lo
    }

    /// Reject curves that would make `level_for_xp` ill-defined
    pub fn validate(&self, max_level: Option<u32>) -> Result<()> {
        match self {
            LevelCurve::Linear { base_step, bonus_step } => {
                let step = base_step.checked_add(*bonus_step).ok_or_else(|| {
                    ProgressionError::Configuration("level step overflows u64".into())
                })?;
                if step == 0 {
                    return Err(ProgressionError::Configuration(
                        "linear curve needs a positive step so thresholds strictly increase".into(),
                    ));
                }
            }
            LevelCurve::Table { thresholds } => {
                if thresholds.len() < 2 {
                    return Err(ProgressionError::Configuration(format!(
                        "threshold table needs at least 2 levels, got {}",
                        thresholds.len()
                    )));
                }
                if thresholds[0] != 0 {
                    return Err(ProgressionError::Configuration(format!(
                        "level 1 must require 0 XP, table says {}",
                        thresholds[0]
                    )));
                }
                for (i, pair) in thresholds.windows(2).enumerate() {
                    if pair[1] <= pair[0] {
                        return Err(ProgressionError::Configuration(format!(
                            "thresholds must strictly increase: level {} needs {} XP but level {} needs {}",
                            i + 1,
                            pair[0],
                            i + 2,
                            pair[1]
                        )));
                    }
                }
            }
        }

        if max_level == Some(0) {
            return Err(ProgressionError::Configuration("max_level must be at least 1".into()));
        }

        // Thresholds are monotonic, so checking the top level covers every level
        let top = max_level.unwrap_or(u32::MAX);
        if self.threshold(top).is_none() {
            return Err(ProgressionError::Configuration(match max_level {
                Some(cap) => format!("threshold for max_level {} overflows u64", cap),
                None => format!("threshold for level {} overflows u64; set a lower max_level", top),
            }));
        }

        Ok(())
    }
}
