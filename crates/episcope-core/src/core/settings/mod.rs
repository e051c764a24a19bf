//! Settings Persistence System
//!
//! Provides persistent application settings with:
//! - Atomic file writes (temp file + rename)
//! - Defaults for every missing field
//! - Normalization of out-of-range values
//!
//! Storage location: {config_dir}/episcope/settings.json

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::fs::atomic_write_json_pretty;
use crate::core::taxonomy::TaxonomyOptions;
use crate::core::CoreResult;

/// Settings schema version
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Application directory name under the platform config directory
pub const APP_DIR_NAME: &str = "episcope";

/// Log levels accepted in `logging.level`
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub taxonomy: TaxonomySettings,

    #[serde(default)]
    pub report: ReportSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            taxonomy: TaxonomySettings::default(),
            report: ReportSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl AppSettings {
    /// Corrects bad values instead of failing, so an edited or stale file
    /// still loads.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.taxonomy.path = non_blank(self.taxonomy.path.take());
        self.report.doctor_name = self.report.doctor_name.trim().to_string();
        self.logging.directory = non_blank(self.logging.directory.take());
        self.logging.level = normalize_enum(&self.logging.level, &LOG_LEVELS, default_log_level());
    }

    /// Loading options for the configured taxonomy
    pub fn taxonomy_options(&self) -> TaxonomyOptions {
        TaxonomyOptions {
            strict_duplicates: self.taxonomy.strict_duplicates,
        }
    }
}

fn non_blank(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().to_string_lossy().trim().is_empty())
}

fn normalize_enum(value: &str, allowed: &[&str], fallback: String) -> String {
    if allowed.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        value.to_ascii_lowercase()
    } else {
        fallback
    }
}

/// Symptom taxonomy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomySettings {
    /// Taxonomy file loaded at startup
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Fail the load on duplicate names instead of warning
    #[serde(default)]
    pub strict_duplicates: bool,
}

/// Report defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSettings {
    /// Used when a report is exported without an explicit doctor name
    #[serde(default)]
    pub doctor_name: String,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSettings {
    /// Directory for daily log files; stderr only when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: None,
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Creates a manager for `settings.json` inside `config_dir`
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            settings_path: config_dir.join(SETTINGS_FILE),
        }
    }

    /// Platform config location, e.g. `~/.config/episcope` on Linux
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join(APP_DIR_NAME)))
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Loads settings, returning defaults if the file is missing or unreadable
    pub fn load(&self) -> AppSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(AppSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)?;
            let mut settings = serde_json::from_str::<AppSettings>(&content)?;
            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    /// Normalizes and saves settings, returning what was written
    pub fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            atomic_write_json_pretty(&self.settings_path, &normalized)?;
            info!("Settings saved to {}", self.settings_path.display());
            Ok(normalized)
        })
    }

    /// Deletes the settings file and returns defaults
    pub fn reset(&self) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!("Settings file deleted");
            }
            Ok(AppSettings::default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.taxonomy.path, None);
        assert!(!settings.taxonomy.strict_duplicates);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.taxonomy_options(), TaxonomyOptions::default());
    }

    #[test]
    fn test_settings_serialization_is_camel_case() {
        let mut settings = AppSettings::default();
        settings.taxonomy.strict_duplicates = true;
        settings.report.doctor_name = "John Smith".to_string();

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["taxonomy"]["strictDuplicates"], true);
        assert_eq!(json["report"]["doctorName"], "John Smith");

        let deserialized: AppSettings = serde_json::from_value(json).unwrap();
        assert_eq!(settings, deserialized);
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path().to_path_buf());

        assert_eq!(manager.load(), AppSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path().to_path_buf());

        let mut settings = AppSettings::default();
        settings.taxonomy.path = Some(PathBuf::from("/opt/episcope/symptoms.json"));
        settings.taxonomy.strict_duplicates = true;
        settings.logging.level = "debug".to_string();

        manager.save(&settings).unwrap();
        let loaded = manager.load();

        assert_eq!(loaded, settings);
        assert!(loaded.taxonomy_options().strict_duplicates);
        assert!(!manager.settings_path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_reset_deletes_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path().to_path_buf());

        manager.save(&AppSettings::default()).unwrap();
        assert!(manager.settings_path().exists());

        let reset_settings = manager.reset().unwrap();
        assert!(!manager.settings_path().exists());
        assert_eq!(reset_settings, AppSettings::default());
    }

    #[test]
    fn test_invalid_json_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(SETTINGS_FILE), "invalid json {{{").unwrap();

        let manager = SettingsManager::new(temp_dir.path().to_path_buf());
        assert_eq!(manager.load(), AppSettings::default());
    }

    #[test]
    fn test_partial_json_uses_defaults_for_missing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(SETTINGS_FILE),
            r#"{"version": 1, "report": {"doctorName": "Jane Roe"}, "unknown": 3}"#,
        )
        .unwrap();

        let manager = SettingsManager::new(temp_dir.path().to_path_buf());
        let settings = manager.load();

        assert_eq!(settings.report.doctor_name, "Jane Roe");
        assert_eq!(settings.logging, LoggingSettings::default());
    }

    #[test]
    fn test_normalization() {
        let mut settings = AppSettings::default();
        settings.version = 0;
        settings.taxonomy.path = Some(PathBuf::from("  "));
        settings.report.doctor_name = "  John Smith ".to_string();
        settings.logging.level = "DEBUG".to_string();
        settings.normalize();

        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.taxonomy.path, None);
        assert_eq!(settings.report.doctor_name, "John Smith");
        assert_eq!(settings.logging.level, "debug");

        settings.logging.level = "verbose".to_string();
        settings.normalize();
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join(APP_DIR_NAME);
        let manager = SettingsManager::new(nested);

        manager.save(&AppSettings::default()).unwrap();
        assert!(manager.settings_path().exists());
    }

    #[test]
    fn test_lock_path_sits_next_to_settings() {
        let manager = SettingsManager::new(PathBuf::from("/etc/episcope"));
        assert_eq!(
            manager.lock_path(),
            PathBuf::from("/etc/episcope").join(SETTINGS_LOCK_FILE)
        );
    }
}
