//! Command-line argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Get default data directory help text for current platform
fn default_data_dir_help() -> String {
    #[cfg(target_os = "linux")]
    return "Data directory for key, history, and log (default: ~/.local/share/multitool/)"
        .to_string();

    #[cfg(target_os = "macos")]
    return "Data directory for key, history, and log (default: ~/Library/Application Support/multitool/)"
        .to_string();

    #[cfg(target_os = "windows")]
    return "Data directory for key, history, and log (default: %APPDATA%\\multitool\\)"
        .to_string();

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    return "Data directory for key, history, and log (overrides platform default)".to_string();
}

/// Get default config path help text for current platform
fn default_config_help() -> String {
    #[cfg(target_os = "linux")]
    return "Config file path (default: ~/.config/multitool/config.json)".to_string();

    #[cfg(target_os = "macos")]
    return "Config file path (default: ~/Library/Application Support/multitool/config.json)"
        .to_string();

    #[cfg(target_os = "windows")]
    return "Config file path (default: %APPDATA%\\multitool\\config.json)".to_string();

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    return "Config file path (overrides platform default)".to_string();
}

/// Currency converter and URL shortener with an encrypted history log
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Data directory (overrides platform default)
    #[arg(short, long, global = true, help = default_data_dir_help())]
    pub data_dir: Option<PathBuf>,

    /// Config file path (overrides platform default)
    #[arg(short, long, global = true, help = default_config_help())]
    pub config: Option<PathBuf>,

    /// Also log to stderr at debug level
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Convert an amount between currencies and record it in the history
    Convert {
        /// Amount to convert
        #[arg(allow_negative_numbers = true)]
        amount: String,
        /// Source currency code
        #[arg(default_value = "USD")]
        from: String,
        /// Target currency code
        #[arg(default_value = "EUR")]
        to: String,
    },

    /// List available currency codes
    Currencies,

    /// Inspect or export the conversion history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Shorten a URL
    Shorten {
        /// URL to shorten (http:// is added when no scheme is given)
        url: String,
    },

    /// Check a URL against the Safe Browsing lists
    Check {
        /// URL to check
        url: String,
    },

    /// Switch between dark and light themes
    Theme,

    /// Show the current settings
    Config,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum HistoryAction {
    /// Print every entry
    List,

    /// Print entries containing QUERY, ignoring case
    Search {
        query: String,
    },

    /// Write the history as plain text (unencrypted)
    Export {
        /// Destination file (default: history_export.csv in the data directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete every entry
    Clear,
}
