//! Application-wide constants
//!
//! Shared constants used across multiple modules.

/// Application directory name (used in data and config directory paths)
pub const APP_DIR_NAME: &str = "multitool";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Key file name
pub const KEY_FILE_NAME: &str = "secret.key";

/// Encrypted history file name
pub const HISTORY_FILE_NAME: &str = "history.enc";

/// Plain-text export file name
pub const EXPORT_FILE_NAME: &str = "history_export.csv";

/// Log file name
pub const LOG_FILE_NAME: &str = "multitool.log";

/// First line of every history export
pub const EXPORT_HEADER: &str = "History";

/// Language used when the system locale cannot be determined
pub const DEFAULT_LANG: &str = "en";
