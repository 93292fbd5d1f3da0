//! RON configuration
//!
//! A missing file means "use the defaults"; a file that exists but cannot be
//! read, parsed or validated is fatal.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ProgressionError, Result};
use crate::progression::{LevelCurve, ProgressionEngine, RewardSchedule, UnlockTable};

/// Default number of optimistic write attempts per award
pub const DEFAULT_MAX_CAS_ATTEMPTS: u32 = 32;

fn default_max_cas_attempts() -> u32 {
    DEFAULT_MAX_CAS_ATTEMPTS
}

/// Everything tunable about progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default)]
    pub curve: LevelCurve,
    /// Optional level cap
    #[serde(default)]
    pub max_level: Option<u32>,
    #[serde(default)]
    pub unlocks: UnlockTable,
    #[serde(default)]
    pub rewards: RewardSchedule,
    /// Write attempts per award before giving up under contention
    #[serde(default = "default_max_cas_attempts")]
    pub max_cas_attempts: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            curve: LevelCurve::default(),
            max_level: None,
            unlocks: UnlockTable::default(),
            rewards: RewardSchedule::default(),
            max_cas_attempts: DEFAULT_MAX_CAS_ATTEMPTS,
        }
    }
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    use directories::ProjectDirs;

    if let Some(proj_dirs) = ProjectDirs::from("com", "stockverse", "StockVerse") {
        let mut path = proj_dirs.config_dir().to_path_buf();
        path.push("config.ron");
        path
    } else {
        PathBuf::from("./config.ron")
    }
}

impl ProgressionConfig {
    /// Parse and validate RON text
    pub fn from_ron(content: &str) -> Result<Self> {
        let config: Self = ron::from_str(content)
            .map_err(|e| ProgressionError::Configuration(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults only if the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ProgressionError::Configuration(format!("failed to read {:?}: {}", path, e))
        })?;
        let config = Self::from_ron(&content)?;
        log::debug!("Config loaded from {:?}", path);
        Ok(config)
    }

    /// Check the curve, cap and unlock table together
    pub fn validate(&self) -> Result<()> {
        if self.max_cas_attempts == 0 {
            return Err(ProgressionError::Configuration("max_cas_attempts must be at least 1".into()));
        }
        ProgressionEngine::from_config(self).map(|_| ())
    }

    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ProgressionError::Configuration(format!("failed to serialize config: {}", e)))
    }
}

/// Write the default config to `path` for easy editing
pub fn export_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                ProgressionError::Configuration(format!("failed to create {:?}: {}", parent, e))
            })?;
        }
    }

    let ron = ProgressionConfig::default().to_ron()?;
    fs::write(path, ron)
        .map_err(|e| ProgressionError::Configuration(format!("failed to write {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("stockverse-config-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&path);
        path.push("config.ron");
        path
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = ProgressionConfig::load(&temp_path("missing")).unwrap();
        assert_eq!(config, ProgressionConfig::default());
    }

    #[test]
    fn test_export_then_load() {
        let path = temp_path("export");
        export_default_config(&path).unwrap();
        assert!(path.exists());

        let loaded = ProgressionConfig::load(&path).unwrap();
        assert_eq!(loaded, ProgressionConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = ProgressionConfig::from_ron(
            "(curve: Linear(base_step: 1000, bonus_step: 0), max_level: Some(20))",
        )
        .unwrap();
        assert_eq!(config.curve, LevelCurve::Linear { base_step: 1000, bonus_step: 0 });
        assert_eq!(config.max_level, Some(20));
        assert_eq!(config.unlocks, UnlockTable::default());
        assert_eq!(config.max_cas_attempts, DEFAULT_MAX_CAS_ATTEMPTS);
    }

    #[test]
    fn test_non_increasing_table_is_fatal() {
        let result = ProgressionConfig::from_ron("(curve: Table(thresholds: [0, 500, 400]))");
        assert!(matches!(result, Err(ProgressionError::Configuration(_))));
    }

    #[test]
    fn test_unsorted_unlocks_are_fatal() {
        let result = ProgressionConfig::from_ron(
            r#"(unlocks: [
                (min_level: 4, key: "b", name: "B"),
                (min_level: 2, key: "a", name: "A"),
            ])"#,
        );
        assert!(matches!(result, Err(ProgressionError::Configuration(_))));
    }

    #[test]
    fn test_unparsable_file_is_fatal() {
        let path = temp_path("broken");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "(curve: ").unwrap();
        assert!(ProgressionConfig::load(&path).is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(ProgressionConfig::from_ron("(max_cas_attempts: 0)").is_err());
    }
}
