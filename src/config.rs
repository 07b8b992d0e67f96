//! Configuration loading for Lockin.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.lockin/config.toml`)
//! 3. User config (`~/.lockin/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The defaults reproduce the reference
//! scheduling policy exactly.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::RecallGrade;
use crate::error::{LockinError, Result};
use crate::scheduling::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_BASE_INTERVAL_DAYS, DEFAULT_MASTERY_WEIGHT,
    DEFAULT_SUCCESS_THRESHOLD,
};

/// Main configuration struct for Lockin.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Scheduling policy tuning.
    pub scheduling: SchedulingConfig,
    /// Concept store configuration.
    pub storage: StorageConfig,
}

/// Scheduling policy tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Minimum interval in days, also used after poor recall.
    pub base_interval_days: f64,
    /// Interval multiplier on good recall.
    pub backoff_factor: f64,
    /// Lowest grade (1-4) that counts as good recall.
    pub success_threshold: RecallGrade,
    /// Moving-average weight of each new grade.
    pub mastery_weight: f64,
}

impl SchedulingConfig {
    /// Base interval must be finite and positive.
    pub fn is_valid_base_interval(value: f64) -> bool {
        value.is_finite() && value > 0.0
    }

    /// Backoff factor must be finite and at least 1, so success never shrinks an interval.
    pub fn is_valid_backoff_factor(value: f64) -> bool {
        value.is_finite() && value >= 1.0
    }

    /// Mastery weight must be in [0, 1] to keep mastery in range.
    pub fn is_valid_mastery_weight(value: f64) -> bool {
        value.is_finite() && (0.0..=1.0).contains(&value)
    }

    /// Replace invalid fields with defaults, logging each replacement.
    fn sanitize(&mut self, source: &str) {
        let defaults = Self::default();

        if !Self::is_valid_base_interval(self.base_interval_days) {
            tracing::warn!(
                source,
                value = self.base_interval_days,
                "invalid scheduling.base_interval_days, using default"
            );
            self.base_interval_days = defaults.base_interval_days;
        }
        if !Self::is_valid_backoff_factor(self.backoff_factor) {
            tracing::warn!(
                source,
                value = self.backoff_factor,
                "invalid scheduling.backoff_factor, using default"
            );
            self.backoff_factor = defaults.backoff_factor;
        }
        if !Self::is_valid_mastery_weight(self.mastery_weight) {
            tracing::warn!(
                source,
                value = self.mastery_weight,
                "invalid scheduling.mastery_weight, using default"
            );
            self.mastery_weight = defaults.mastery_weight;
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            base_interval_days: DEFAULT_BASE_INTERVAL_DAYS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            mastery_weight: DEFAULT_MASTERY_WEIGHT,
        }
    }
}

/// Concept store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding concept files. Defaults to `<lockin_home>/concepts`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`.lockin/config.toml` in cwd)
    /// 3. User config (`~/.lockin/config.toml`)
    /// 4. Defaults
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.lockin/config.toml`.
    fn load_user_config() -> Option<Config> {
        let config_path = lockin_home()?.join("config.toml");
        Self::load_optional(&config_path)
    }

    /// Load project config from `.lockin/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        Self::load_optional(&project_lockin_dir(cwd).join("config.toml"))
    }

    /// Load a config file that may not exist; parse failures are logged.
    fn load_optional(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring config file");
                None
            }
        }
    }

    /// Load config from a specific file path.
    ///
    /// Out-of-range scheduling values are replaced by defaults.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| LockinError::storage(path, e))?;
        let mut config: Config =
            toml::from_str(&content).map_err(|e| LockinError::config(e.to_string()))?;
        config.scheduling.sanitize(&path.display().to_string());
        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        let scheduling = &mut self.scheduling;

        env_override(
            "LOCKIN_BASE_INTERVAL_DAYS",
            &mut scheduling.base_interval_days,
            |v| SchedulingConfig::is_valid_base_interval(*v),
        );
        env_override(
            "LOCKIN_BACKOFF_FACTOR",
            &mut scheduling.backoff_factor,
            |v| SchedulingConfig::is_valid_backoff_factor(*v),
        );
        env_override(
            "LOCKIN_MASTERY_WEIGHT",
            &mut scheduling.mastery_weight,
            |v| SchedulingConfig::is_valid_mastery_weight(*v),
        );

        if let Ok(val) = env::var("LOCKIN_SUCCESS_THRESHOLD") {
            match val.parse::<i64>().map(RecallGrade::try_from) {
                Ok(Ok(grade)) => scheduling.success_threshold = grade,
                _ => tracing::warn!(
                    value = %val,
                    current = scheduling.success_threshold.value(),
                    "invalid LOCKIN_SUCCESS_THRESHOLD, expected 1-4"
                ),
            }
        }

        if let Ok(val) = env::var("LOCKIN_DATA_DIR") {
            if val.is_empty() {
                tracing::warn!("LOCKIN_DATA_DIR is empty, ignoring");
            } else {
                self.storage.data_dir = Some(PathBuf::from(val));
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence field by field: every value in
    /// `other` that differs from the default replaces the value in `self`.
    ///
    /// # Limitation
    ///
    /// A layer cannot set a value back to its default to undo a non-default
    /// value from a lower layer, because "unset" and "set to default" are
    /// indistinguishable without wrapping every field in `Option`.
    fn merge(mut self, other: Config) -> Self {
        let default_scheduling = SchedulingConfig::default();
        if other.scheduling.base_interval_days != default_scheduling.base_interval_days {
            self.scheduling.base_interval_days = other.scheduling.base_interval_days;
        }
        if other.scheduling.backoff_factor != default_scheduling.backoff_factor {
            self.scheduling.backoff_factor = other.scheduling.backoff_factor;
        }
        if other.scheduling.success_threshold != default_scheduling.success_threshold {
            self.scheduling.success_threshold = other.scheduling.success_threshold;
        }
        if other.scheduling.mastery_weight != default_scheduling.mastery_weight {
            self.scheduling.mastery_weight = other.scheduling.mastery_weight;
        }

        if other.storage.data_dir.is_some() {
            self.storage.data_dir = other.storage.data_dir;
        }

        self
    }

    /// Directory of the concept store.
    ///
    /// Uses `storage.data_dir` when set, otherwise `<lockin_home>/concepts`.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage.data_dir.clone().or_else(concepts_dir)
    }
}

/// Override `target` from an environment variable if it parses and validates.
fn env_override<T>(name: &str, target: &mut T, is_valid: impl Fn(&T) -> bool)
where
    T: FromStr + std::fmt::Display,
{
    let Ok(val) = env::var(name) else {
        return;
    };

    match val.parse::<T>() {
        Ok(parsed) if is_valid(&parsed) => *target = parsed,
        Ok(_) => tracing::warn!(
            name,
            value = %val,
            current = %target,
            "environment override out of range, ignoring"
        ),
        Err(_) => tracing::warn!(
            name,
            value = %val,
            current = %target,
            "environment override is not a number, ignoring"
        ),
    }
}

/// Get the Lockin home directory.
///
/// Checks `LOCKIN_HOME` first, then falls back to `~/.lockin`. An empty
/// `LOCKIN_HOME` is ignored.
pub fn lockin_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("LOCKIN_HOME") {
        if home.is_empty() {
            tracing::warn!("LOCKIN_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("LOCKIN_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".lockin"));
    }

    let fallback_path = fallback_lockin_home();
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback_path.display()
    );
    Some(fallback_path)
}

/// Fallback home when HOME is unavailable.
#[cfg(unix)]
fn fallback_lockin_home() -> PathBuf {
    use std::os::unix::fs::MetadataExt;
    let uid = std::fs::metadata("/").map(|m| m.uid()).unwrap_or(0);
    PathBuf::from(format!("/tmp/lockin-{}", uid))
}

/// Fallback home when HOME is unavailable.
#[cfg(not(unix))]
fn fallback_lockin_home() -> PathBuf {
    std::env::temp_dir().join("lockin")
}

/// Default concept store directory: `<lockin_home>/concepts/`.
pub fn concepts_dir() -> Option<PathBuf> {
    lockin_home().map(|h| h.join("concepts"))
}

/// Crash log path: `<lockin_home>/crash.log`.
pub fn crash_log_path() -> Option<PathBuf> {
    lockin_home().map(|h| h.join("crash.log"))
}

/// Project config directory: `<cwd>/.lockin/`.
pub fn project_lockin_dir(cwd: &Path) -> PathBuf {
    cwd.join(".lockin")
}
