//! Multitool Common Library
//!
//! Encrypted conversion history, user settings, and shared constants for the
//! Multitool client.

pub mod constants;
pub mod history;
pub mod io;
pub mod settings;

pub use history::{HistoryError, HistoryStore, LoadStatus, SharedHistory, StorePaths};
pub use settings::{Settings, SettingsError, SettingsStatus, Theme};
