//! # Sync Configuration
//!
//! Configuration for the reconcile checker, scheduler and logging.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     AUTHENTICATOR_DUPLICATE_POLICY=reject                              │
//! │     AUTHENTICATOR_SYNC_PERIOD_MS=10000                                 │
//! │     AUTHENTICATOR_ONLY_ON_CHANGE=false                                 │
//! │     AUTHENTICATOR_LOG=authenticator_sync=debug                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/authenticator/sync.toml (Linux)                          │
//! │     ~/Library/Application Support/me.proton.authenticator/sync.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [reconcile]
//! duplicate_policy = "last_wins"  # last_wins | reject
//!
//! [scheduler]
//! period_ms = 30000
//! only_on_change = true
//!
//! [logging]
//! filter = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Duplicate Policy
// =============================================================================

/// What to do when a snapshot lists the same entry id twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The last occurrence is used.
    #[default]
    LastWins,

    /// The snapshot is rejected with a validation error.
    Reject,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::LastWins => write!(f, "last_wins"),
            DuplicatePolicy::Reject => write!(f, "reject"),
        }
    }
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last_wins" | "last-wins" | "lastwins" => Ok(DuplicatePolicy::LastWins),
            "reject" | "strict" => Ok(DuplicatePolicy::Reject),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown duplicate policy: '{}'. Valid options: last_wins, reject",
                other
            ))),
        }
    }
}

// =============================================================================
// Settings Sections
// =============================================================================

/// Reconciliation behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileSettings {
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

/// Periodic reconcile settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Interval between ticks (milliseconds).
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    /// Skip emitting when a tick yields the same operations as the last one.
    #[serde(default = "default_true")]
    pub only_on_change: bool,
}

fn default_period_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        SchedulerSettings {
            period_ms: default_period_ms(),
            only_on_change: true,
        }
    }
}

impl SchedulerSettings {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// Log filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive string.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
        }
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub reconcile: ReconcileSettings,

    #[serde(default)]
    pub scheduler: SchedulerSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// [`SyncConfig::load`] with overrides read from `lookup`.
    fn load_with(
        config_path: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(lookup);
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.scheduler.period_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "scheduler.period_ms must be greater than 0".into(),
            ));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "logging.filter must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides from any key/value source.
    ///
    /// Unparseable values are logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(policy) = lookup("AUTHENTICATOR_DUPLICATE_POLICY") {
            match policy.parse() {
                Ok(parsed) => {
                    debug!(policy = %policy, "Overriding duplicate policy from environment");
                    self.reconcile.duplicate_policy = parsed;
                }
                Err(_) => warn!(policy = %policy, "Unknown duplicate policy in environment"),
            }
        }

        if let Some(period) = lookup("AUTHENTICATOR_SYNC_PERIOD_MS") {
            match period.parse::<u64>() {
                Ok(ms) => {
                    debug!(period_ms = ms, "Overriding sync period from environment");
                    self.scheduler.period_ms = ms;
                }
                Err(_) => warn!(period = %period, "Invalid sync period in environment"),
            }
        }

        if let Some(flag) = lookup("AUTHENTICATOR_ONLY_ON_CHANGE") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.scheduler.only_on_change = true,
                "0" | "false" | "no" => self.scheduler.only_on_change = false,
                _ => warn!(flag = %flag, "Invalid only-on-change flag in environment"),
            }
        }

        if let Some(filter) = lookup("AUTHENTICATOR_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("me", "proton", "authenticator")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.reconcile.duplicate_policy
    }

    pub fn period(&self) -> Duration {
        self.scheduler.period()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("authenticator-sync-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_duplicate_policy_parsing() {
        assert_eq!("last_wins".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::LastWins);
        assert_eq!("Last-Wins".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::LastWins);
        assert_eq!("reject".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Reject);
        assert!("first_wins".parse::<DuplicatePolicy>().is_err());

        let policy = DuplicatePolicy::Reject;
        assert_eq!(policy.to_string().parse::<DuplicatePolicy>().unwrap(), policy);
    }

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.duplicate_policy(), DuplicatePolicy::LastWins);
        assert_eq!(config.scheduler.period_ms, 30_000);
        assert!(config.scheduler.only_on_change);
        assert_eq!(config.period(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SyncConfig::default();
        config.scheduler.period_ms = 0;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));

        config.scheduler.period_ms = 1;
        config.logging.filter = "  ".to_string();
        assert!(config.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SyncConfig = toml::from_str(
            r#"
            [scheduler]
            period_ms = 5000
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduler.period_ms, 5000);
        assert!(config.scheduler.only_on_change);
        assert_eq!(config.duplicate_policy(), DuplicatePolicy::LastWins);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("AUTHENTICATOR_DUPLICATE_POLICY", "reject"),
            ("AUTHENTICATOR_SYNC_PERIOD_MS", "1500"),
            ("AUTHENTICATOR_ONLY_ON_CHANGE", "false"),
            ("AUTHENTICATOR_LOG", "authenticator_sync=debug"),
        ]
        .into_iter()
        .collect();

        let mut config = SyncConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.duplicate_policy(), DuplicatePolicy::Reject);
        assert_eq!(config.scheduler.period_ms, 1500);
        assert!(!config.scheduler.only_on_change);
        assert_eq!(config.logging.filter, "authenticator_sync=debug");
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut config = SyncConfig::default();
        config.apply_overrides(|key| match key {
            "AUTHENTICATOR_SYNC_PERIOD_MS" => Some("soon".to_string()),
            "AUTHENTICATOR_DUPLICATE_POLICY" => Some("random".to_string()),
            _ => None,
        });

        assert_eq!(config.scheduler.period_ms, 30_000);
        assert_eq!(config.duplicate_policy(), DuplicatePolicy::LastWins);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip/sync.toml");
        let mut config = SyncConfig::default();
        config.reconcile.duplicate_policy = DuplicatePolicy::Reject;
        config.scheduler.period_ms = 2_000;

        config.save(Some(path.clone())).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[scheduler]"));
        assert!(contents.contains("duplicate_policy = \"reject\""));

        let loaded: SyncConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.duplicate_policy(), DuplicatePolicy::Reject);
        assert_eq!(loaded.scheduler.period_ms, 2_000);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let path = temp_path("malformed/sync.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[scheduler\nperiod_ms = ").unwrap();

        let err = SyncConfig::load_with(Some(path.clone()), |_| None).unwrap_err();
        assert!(matches!(err, SyncError::ConfigLoadFailed(_)));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_applies_overrides_after_file() {
        let path = temp_path("layered/sync.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[scheduler]\nperiod_ms = 5000\nonly_on_change = false\n").unwrap();

        let config = SyncConfig::load_with(Some(path.clone()), |_| None).unwrap();
        assert_eq!(config.scheduler.period_ms, 5_000);
        assert!(!config.scheduler.only_on_change);

        let config = SyncConfig::load_with(Some(path.clone()), |key| {
            (key == "AUTHENTICATOR_SYNC_PERIOD_MS").then(|| "750".to_string())
        })
        .unwrap();
        assert_eq!(config.scheduler.period_ms, 750);
        assert!(!config.scheduler.only_on_change);

        let err = SyncConfig::load_with(Some(path.clone()), |key| {
            (key == "AUTHENTICATOR_SYNC_PERIOD_MS").then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(err.is_config_error());

        let _ = std::fs::remove_file(&path);
    }
}
