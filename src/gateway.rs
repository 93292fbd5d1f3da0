//! Progression gateway
//!
//! Loads a user's XP from the store, runs the engine, and writes the result
//! back. Awards use optimistic concurrency: read at a version, compute, and
//! write only if the version is unchanged, re-reading on conflict.

use serde::{Deserialize, Serialize};

use crate::config::{ProgressionConfig, DEFAULT_MAX_CAS_ATTEMPTS};
use crate::error::{ProgressionError, Result};
use crate::progression::{
    FeatureGate, LevelUpEvent, ProgressInfo, ProgressionEngine, RewardEvent, RewardSchedule,
};
use crate::store::{CasOutcome, UserId, UserRecord, UserStore, Versioned};

/// Outcome of a successful award
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardResult {
    pub new_xp: u64,
    pub new_level: u32,
    /// Set when the award crossed a level boundary
    pub level_up: Option<LevelUpEvent>,
}

/// Owns the engine and a store handle. Construct once and pass it around.
pub struct ProgressionGateway<S: UserStore> {
    store: S,
    engine: ProgressionEngine,
    rewards: RewardSchedule,
    max_cas_attempts: u32,
}

impl<S: UserStore> ProgressionGateway<S> {
    pub fn new(store: S, engine: ProgressionEngine) -> Self {
        Self {
            store,
            engine,
            rewards: RewardSchedule::default(),
            max_cas_attempts: DEFAULT_MAX_CAS_ATTEMPTS,
        }
    }

    pub fn from_config(store: S, config: &ProgressionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            engine: ProgressionEngine::from_config(config)?,
            rewards: config.rewards.clone(),
            max_cas_attempts: config.max_cas_attempts,
        })
    }

    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create the progression fields for a new account
    pub fn register_user(&self, user_id: &UserId) -> Result<UserRecord> {
        let record = UserRecord::new(user_id.clone());
        self.store.insert(record.clone())?;
        log::info!("Registered user {} at level 1", user_id);
        Ok(record)
    }

    /// Load a record and make sure its cached level matches its XP
    fn load_record(&self, user_id: &UserId) -> Result<Versioned<UserRecord>> {
        let mut stored = self
            .store
            .load(user_id)?
            .ok_or_else(|| ProgressionError::UserNotFound(user_id.clone()))?;

        let level = self.engine.level_for_xp(stored.value.xp);
        if stored.value.level != level {
            log::warn!(
                "User {} has cached level {} but {} XP means level {}",
                user_id,
                stored.value.level,
                stored.value.xp,
                level
            );
            stored.value.level = level;
        }
        Ok(stored)
    }

    /// Add `amount` XP to a user and persist the new level.
    ///
    /// Concurrent awards for the same user never lose an update; a version
    /// conflict re-reads and recomputes. Store errors are returned as-is.
    pub fn award_xp(&self, user_id: &UserId, amount: i64, reason: &str) -> Result<AwardResult> {
        if amount <= 0 {
            return Err(ProgressionError::InvalidAmount { amount });
        }
        let amount = u64::try_from(amount).map_err(|_| ProgressionError::InvalidAmount { amount })?;

        for attempt in 1..=self.max_cas_attempts {
            let current = self.load_record(user_id)?;
            let old_xp = current.value.xp;
            let new_xp = old_xp.checked_add(amount).ok_or_else(|| {
                ProgressionError::InvalidInput(format!("awarding {} XP to {} overflows", amount, old_xp))
            })?;

            let level_up = self.engine.detect_level_up(old_xp, new_xp)?;
            let new_level = self.engine.level_for_xp(new_xp);
            let record = UserRecord { id: user_id.clone(), xp: new_xp, level: new_level };

            match self.store.compare_and_swap(current.version, record)? {
                CasOutcome::Swapped(_) => {
                    log::info!("Awarded {} XP to {} ({}): {} -> {}", amount, user_id, reason, old_xp, new_xp);
                    if let Some(event) = &level_up {
                        log::info!("User {}: {}", user_id, event.summary());
                    }
                    return Ok(AwardResult { new_xp, new_level, level_up });
                }
                CasOutcome::Conflict => {
                    log::debug!("Award to {} hit a concurrent write (attempt {}), retrying", user_id, attempt);
                }
            }
        }

        Err(ProgressionError::StoreUnavailable(format!(
            "gave up awarding XP to {} after {} conflicting writes",
            user_id, self.max_cas_attempts
        )))
    }

    /// Award whatever `event` is worth. `Ok(None)` if it is worth nothing.
    pub fn award_event(&self, user_id: &UserId, event: &RewardEvent) -> Result<Option<AwardResult>> {
        let xp = self.rewards.xp_for(event);
        if xp == 0 {
            log::debug!("{:?} earns no XP for {}", event, user_id);
            return Ok(None);
        }
        let amount = i64::try_from(xp).map_err(|_| {
            ProgressionError::InvalidInput(format!("reward of {} XP is too large", xp))
        })?;
        self.award_xp(user_id, amount, &self.rewards.reason_for(event)).map(Some)
    }

    pub fn get_progress(&self, user_id: &UserId) -> Result<ProgressInfo> {
        let record = self.load_record(user_id)?;
        Ok(self.engine.describe_progress(record.value.xp))
    }

    pub fn check_feature_lock(&self, user_id: &UserId, feature_key: &str) -> Result<FeatureGate> {
        let record = self.load_record(user_id)?;
        self.engine.resolve_feature_gate(record.value.level, feature_key)
    }
}
