//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration, persisted as `settings.json` in the data
/// directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// User data directory (sites, history, whitelists, scripts)
    pub data_dir: PathBuf,

    /// Fallback external-navigation policy for panes that never
    /// resolved to a configured site. Unset means cross-origin
    /// navigation is blocked for such panes.
    pub allow_external_navigation: Option<bool>,

    /// Initial window width (logical pixels)
    pub window_width: f64,

    /// Initial window height (logical pixels)
    pub window_height: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("paddock"),
            allow_external_navigation: None,
            window_width: 1280.0,
            window_height: 800.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from a file, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(err) => {
                    log::warn!("Invalid settings file {}: {}", path.display(), err);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> crate::PaddockResult<()> {
        let data = serde_json::to_string_pretty(self).map_err(|err| {
            crate::PaddockError::Config(format!("Failed to serialize settings: {}", err))
        })?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Path of the site configuration document
    pub fn sites_path(&self) -> PathBuf {
        self.data_dir.join("sites.json")
    }

    /// Directory holding one history log per site key
    pub fn history_dir(&self) -> PathBuf {
        self.data_dir.join("history")
    }

    /// Directory holding one whitelist document per site key
    pub fn whitelist_dir(&self) -> PathBuf {
        self.data_dir.join("whitelist")
    }

    /// Directory holding optional per-site custom scripts
    pub fn scripts_dir(&self) -> PathBuf {
        self.data_dir.join("scripts")
    }

    /// Path of the app settings document
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.allow_external_navigation, None);
        assert!(config.data_dir.ends_with("paddock"));
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let config = AppConfig::load(Path::new("/nonexistent/settings.json"));
        assert_eq!(config.allow_external_navigation, None);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = AppConfig::default();
        config.allow_external_navigation = Some(true);
        let json = serde_json::to_string(&config).unwrap();
        let restored: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.allow_external_navigation, Some(true));
    }

    #[test]
    fn test_store_paths_live_under_data_dir() {
        let config = AppConfig::default();
        assert!(config.sites_path().starts_with(&config.data_dir));
        assert!(config.history_dir().starts_with(&config.data_dir));
        assert!(config.whitelist_dir().starts_with(&config.data_dir));
    }
}
