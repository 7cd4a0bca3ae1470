//! Editor settings: undo depth, log verbosity and the shortcut table.
//!
//! Settings live in one versioned JSON document. Native builds keep it under
//! the user's config directory; the browser build keeps it in localStorage.
//! Every field has a default, so a file only needs the entries it changes.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_HISTORY_CAPACITY;
use crate::keybindings::{KeyBindings, ShortcutBinding, default_bindings};

/// Format version written by this build. Files with a higher version are
/// refused instead of being half-understood.
pub const CONFIG_VERSION: u32 = 1;

/// Editor settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: u32,

    /// Tool that wrote the file
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default)]
    pub preferences: UserPreferences,

    /// Shortcut bindings, applied in order (later entries win)
    #[serde(default = "default_bindings")]
    pub shortcuts: Vec<ShortcutBinding>,
}

fn default_app_name() -> String {
    "coralseg".to_string()
}

/// Tunables of the editing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Undo steps kept per image
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Maximum level of log records emitted (`"off"` to `"trace"`)
    #[serde(default = "default_log_level")]
    pub log_level: log::LevelFilter,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_log_level() -> log::LevelFilter {
    log::LevelFilter::Info
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            log_level: default_log_level(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            preferences: UserPreferences::default(),
            shortcuts: default_bindings(),
        }
    }

    /// Shortcut bindings as a lookup table.
    pub fn keybindings(&self) -> KeyBindings {
        KeyBindings::from_bindings(self.shortcuts.iter().copied())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse and check a settings document.
    ///
    /// Unknown interaction states and malformed key combinations fail the
    /// parse. Repeated bindings are accepted with a warning.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }
        if config.preferences.history_capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }

        let distinct = config.keybindings().bindings().len();
        if distinct < config.shortcuts.len() {
            log::warn!(
                "Config binds {} shortcuts more than once; later entries win",
                config.shortcuts.len() - distinct
            );
        }

        Ok(config)
    }

    pub fn default_filename() -> &'static str {
        "coralseg-config.json"
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AppConfig {
    /// `<config dir>/coralseg/coralseg-config.json`, or `~/.config/...` when the
    /// platform reports no config directory.
    pub fn default_path() -> Option<std::path::PathBuf> {
        let base = dirs::config_dir().or_else(|| dirs::home_dir().map(|home| home.join(".config")))?;
        Some(base.join("coralseg").join(Self::default_filename()))
    }

    pub fn load_from_path(path: &std::path::Path) -> Result<Self, ConfigError> {
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!("Settings loaded from {}", path.display());
        Ok(config)
    }

    /// Settings from [`AppConfig::default_path`]. A missing or broken file
    /// yields `None`; the latter is logged.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.is_file() {
            log::debug!("No settings file at {}", path.display());
            return None;
        }
        Self::load_from_path(&path)
            .map_err(|e| log::warn!("Ignoring settings file {}: {}", path.display(), e))
            .ok()
    }

    /// Write the settings, creating missing parent directories.
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Settings written to {}", path.display());
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
impl AppConfig {
    const STORAGE_KEY: &'static str = "coralseg-config";

    fn local_storage() -> Result<web_sys::Storage, ConfigError> {
        let window =
            web_sys::window().ok_or_else(|| ConfigError::Storage("no window".to_string()))?;
        window
            .local_storage()
            .map_err(|e| ConfigError::Storage(format!("{:?}", e)))?
            .ok_or_else(|| ConfigError::Storage("localStorage disabled".to_string()))
    }

    /// Settings stored by [`AppConfig::save_to_local_storage`]. Missing or
    /// unreadable settings yield `None`; failures are logged.
    pub fn load_from_local_storage() -> Option<Self> {
        let stored = Self::local_storage().and_then(|storage| {
            storage
                .get_item(Self::STORAGE_KEY)
                .map_err(|e| ConfigError::Storage(format!("{:?}", e)))
        });

        match stored {
            Ok(Some(json)) => Self::from_json(&json)
                .map_err(|e| log::warn!("Ignoring stored settings: {}", e))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Settings storage unavailable: {}", e);
                None
            }
        }
    }

    pub fn save_to_local_storage(&self) -> Result<(), ConfigError> {
        Self::local_storage()?
            .set_item(Self::STORAGE_KEY, &self.to_json()?)
            .map_err(|e| ConfigError::Storage(format!("{:?}", e)))?;
        log::info!("Settings stored in localStorage");
        Ok(())
    }
}

/// Why a settings document could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Settings version {found} is newer than the supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("History capacity must be at least 1")]
    InvalidCapacity,

    #[error("Settings file error: {0}")]
    Io(#[from] std::io::Error),

    /// Browser storage unavailable or refusing the write
    #[error("Settings storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use coralseg_ui::KeyCombo;

    use super::*;
    use crate::keybindings::ShortcutAction;
    use crate::mode::InteractionState;

    #[test]
    fn test_default_config_roundtrip() {
        let config = AppConfig::new();
        let json = config.to_json().unwrap();
        assert_eq!(AppConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = AppConfig::from_json(r#"{ "version": 1 }"#).unwrap();
        assert_eq!(config.app_name, "coralseg");
        assert_eq!(config.preferences.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(config.shortcuts, default_bindings());
    }

    #[test]
    fn test_version_too_new() {
        let json = format!(r#"{{ "version": {} }}"#, CONFIG_VERSION + 1);
        assert!(matches!(
            AppConfig::from_json(&json),
            Err(ConfigError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let json = r#"{ "version": 1, "preferences": { "history_capacity": 0 } }"#;
        assert!(matches!(
            AppConfig::from_json(json),
            Err(ConfigError::InvalidCapacity)
        ));
    }

    #[test]
    fn test_custom_shortcuts() {
        let json = r#"{
            "version": 1,
            "preferences": { "history_capacity": 3, "log_level": "debug" },
            "shortcuts": [
                { "state": "default", "combo": "Ctrl+Z", "action": "undo" },
                { "state": "maskCreate", "combo": "q", "action": "exit_mask_creation" }
            ]
        }"#;
        let config = AppConfig::from_json(json).unwrap();
        assert_eq!(config.preferences.log_level, log::LevelFilter::Debug);

        let bindings = config.keybindings();
        assert_eq!(
            bindings.action_for(
                InteractionState::MaskCreation,
                &KeyCombo::parse("q").unwrap()
            ),
            Some(ShortcutAction::ExitMaskCreation)
        );
        assert_eq!(bindings.bindings().len(), 2);
    }

    #[test]
    fn test_unknown_state_or_bad_combo_rejected() {
        let bad_state = r#"{ "version": 1, "shortcuts": [
            { "state": "drawing", "combo": "q", "action": "undo" } ] }"#;
        assert!(AppConfig::from_json(bad_state).is_err());

        let bad_combo = r#"{ "version": 1, "shortcuts": [
            { "state": "default", "combo": "ctrl+", "action": "undo" } ] }"#;
        assert!(AppConfig::from_json(bad_combo).is_err());
    }

    #[test]
    fn test_save_and_load_path() {
        let dir = std::env::temp_dir().join(format!("coralseg-config-{}", std::process::id()));
        let path = dir.join(AppConfig::default_filename());

        let mut config = AppConfig::new();
        config.preferences.history_capacity = 25;
        config.save_to_path(&path).unwrap();

        let loaded = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.preferences.history_capacity, 25);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
