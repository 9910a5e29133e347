//! Preferences facade backed by `config.json` in the data directory.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::entities::AppConfig;
use crate::errors::{TasksError, TasksResult};

const CONFIG_FILE: &str = "config.json";

/// Loads and persists [`AppConfig`]
pub struct ConfigDomain {
    config_path: PathBuf,
}

impl ConfigDomain {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            config_path: data_dir.as_ref().join(CONFIG_FILE),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the configuration, falling back to defaults when none was saved
    pub async fn load(&self) -> TasksResult<AppConfig> {
        match fs::read_to_string(&self.config_path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| TasksError::ConfigError {
                reason: format!("{}: {e}", self.config_path.display()),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
            Err(e) => Err(TasksError::FileReadError {
                path: self.config_path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Written to a temp file, then renamed over `config.json`
    pub async fn save(&self, config: &AppConfig) -> TasksResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(config)?;
        let tmp = self.config_path.with_extension("json.tmp");
        let write_err = |e: std::io::Error| TasksError::FileWriteError {
            path: self.config_path.display().to_string(),
            reason: e.to_string(),
        };

        fs::write(&tmp, content).await.map_err(write_err)?;
        fs::rename(&tmp, &self.config_path).await.map_err(write_err)?;

        debug!(path = %self.config_path.display(), "Saved config");
        Ok(())
    }

    /// Flip the dark theme flag. Returns the new value.
    pub async fn toggle_dark_theme(&self) -> TasksResult<bool> {
        let mut config = self.load().await?;
        config.theme.dark = !config.theme.dark;
        self.save(&config).await?;
        Ok(config.theme.dark)
    }

    pub async fn set_dark_theme(&self, dark: bool) -> TasksResult<()> {
        let mut config = self.load().await?;
        config.theme.dark = dark;
        self.save(&config).await
    }

    /// Update reminder settings; `None` leaves a field unchanged
    pub async fn set_notifications(
        &self,
        enabled: Option<bool>,
        interval_secs: Option<u64>,
    ) -> TasksResult<AppConfig> {
        let mut config = self.load().await?;
        if let Some(enabled) = enabled {
            config.notifications.enabled = enabled;
        }
        if let Some(secs) = interval_secs {
            if secs == 0 {
                return Err(TasksError::ConfigError {
                    reason: "notification interval must be positive".to_string(),
                });
            }
            config.notifications.interval_secs = secs;
        }
        self.save(&config).await?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigDomain::new(temp_dir.path());

        let loaded = config.load().await.unwrap();
        assert_eq!(loaded, AppConfig::default());
        assert!(!config.config_path().exists());
    }

    #[tokio::test]
    async fn test_toggle_dark_theme_persists() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigDomain::new(temp_dir.path());

        assert!(config.toggle_dark_theme().await.unwrap());
        assert!(config.load().await.unwrap().theme.dark);

        assert!(!config.toggle_dark_theme().await.unwrap());

        config.set_dark_theme(true).await.unwrap();
        assert!(ConfigDomain::new(temp_dir.path()).load().await.unwrap().theme.dark);
    }

    #[tokio::test]
    async fn test_set_notifications() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigDomain::new(temp_dir.path());

        let updated = config.set_notifications(Some(false), Some(60)).await.unwrap();
        assert!(!updated.notifications.enabled);
        assert_eq!(updated.notifications.interval_secs, 60);

        let err = config.set_notifications(None, Some(0)).await.unwrap_err();
        assert!(matches!(err, TasksError::ConfigError { .. }));
        assert_eq!(config.load().await.unwrap().notifications.interval_secs, 60);
    }

    #[tokio::test]
    async fn test_save_replaces_config_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigDomain::new(temp_dir.path());
        let tmp = temp_dir.path().join("config.json.tmp");

        // Leftover from an interrupted save
        std::fs::write(&tmp, "{ partial").unwrap();

        config.set_dark_theme(true).await.unwrap();
        assert!(!tmp.exists());
        assert!(config.load().await.unwrap().theme.dark);

        config.set_notifications(Some(false), None).await.unwrap();
        assert!(!tmp.exists());
        let entries = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 1);

        let loaded = config.load().await.unwrap();
        assert!(loaded.theme.dark);
        assert!(!loaded.notifications.enabled);
    }

    #[tokio::test]
    async fn test_corrupt_config_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigDomain::new(temp_dir.path());
        std::fs::write(config.config_path(), "{ nope").unwrap();

        assert!(matches!(
            config.load().await,
            Err(TasksError::ConfigError { .. })
        ));
    }
}
