//! Configuration entities.

use serde::{Deserialize, Serialize};

use super::TaskPriority;

/// Application preferences stored in `config.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub theme: ThemeConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub defaults: TaskDefaults,
}

/// Display theme preference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default)]
    pub dark: bool,
}

/// Deadline reminder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between deadline checks in watch mode
    #[serde(default = "default_interval_secs", rename = "intervalSecs")]
    pub interval_secs: u64,
}

/// Defaults applied to new tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefaults {
    #[serde(default)]
    pub priority: TaskPriority,
}

const fn default_enabled() -> bool {
    true
}

/// Fifteen minutes
const fn default_interval_secs() -> u64 {
    900
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(!config.theme.dark);
        assert!(config.notifications.enabled);
        assert_eq!(config.notifications.interval_secs, 900);
        assert_eq!(config.defaults.priority, TaskPriority::Medium);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"theme": {"dark": true}, "notifications": {}}"#).unwrap();
        assert!(config.theme.dark);
        assert!(config.notifications.enabled);
        assert_eq!(config.notifications.interval_secs, 900);
    }
}
