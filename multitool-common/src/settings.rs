//! User preference settings
//!
//! Stored as pretty JSON in `{config_dir}/multitool/config.json`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, warn};

use crate::constants::{APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_LANG};
use crate::io::write_private;

/// UI theme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// The other theme
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}

/// User preferences for the application
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Settings {
    /// UI theme preference
    #[serde(default)]
    pub theme: Theme,

    /// Two-letter interface language code
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Google Safe Browsing API key (empty = safety checks disabled)
    #[serde(default)]
    pub safe_browsing_api: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("theme", &self.theme)
            .field("lang", &self.lang)
            .field(
                "safe_browsing_api",
                &if self.safe_browsing_api.is_empty() {
                    ""
                } else {
                    "[REDACTED]"
                },
            )
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            lang: default_lang(),
            safe_browsing_api: String::new(),
        }
    }
}

/// Language from the system locale (`fr-FR` -> `fr`), or English
fn default_lang() -> String {
    sys_locale::get_locale()
        .and_then(|locale| lang_from_locale(&locale))
        .unwrap_or_else(|| DEFAULT_LANG.to_string())
}

fn lang_from_locale(locale: &str) -> Option<String> {
    let lang: String = locale
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();

    (lang.len() >= 2).then(|| lang[..2].to_ascii_lowercase())
}

impl Settings {
    /// Get the platform-specific config file path
    ///
    /// Returns None if the config directory cannot be determined.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load settings from `path`, writing defaults first if it does not exist
    ///
    /// Returns defaults if the file cannot be read or contains invalid JSON.
    pub fn load(path: &Path) -> Self {
        Self::load_with_status(path).0
    }

    /// Like [`Settings::load`], but also reports whether the file was usable
    ///
    /// An unreadable file is left untouched. Callers should not save over it,
    /// since that would discard whatever the user had written there.
    pub fn load_with_status(path: &Path) -> (Self, SettingsStatus) {
        if !path.exists() {
            let settings = Self::default();
            if let Err(e) = settings.save(path) {
                error!(path = %path.display(), error = %e, "failed to write default config");
            }
            return (settings, SettingsStatus::Created);
        }

        match Self::read(path) {
            Ok(settings) => (settings, SettingsStatus::Loaded),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                (Self::default(), SettingsStatus::Unreadable(e.to_string()))
            }
        }
    }

    fn read(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save settings to disk with restrictive permissions
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        write_private(path, json.as_bytes())?;
        Ok(())
    }

    /// Switch between dark and light themes, returning the new theme
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    /// Whether URL safety checks can reach the Safe Browsing API
    pub fn has_safe_browsing_key(&self) -> bool {
        !self.safe_browsing_api.trim().is_empty()
    }
}

/// Outcome of loading the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsStatus {
    /// No file existed; defaults were written
    Created,
    /// File was read successfully
    Loaded,
    /// File exists but could not be read or parsed; defaults are in use
    Unreadable(String),
}

impl SettingsStatus {
    pub fn is_unreadable(&self) -> bool {
        matches!(self, SettingsStatus::Unreadable(_))
    }
}

/// Errors that can occur while reading or writing settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
