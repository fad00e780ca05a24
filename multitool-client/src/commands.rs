//! Command execution
//!
//! [`App`] owns the settings, the shared history store, and the service
//! clients, and runs one [`Command`] at a time. Output goes to the supplied
//! writer; failures come back as [`CommandError`] for the caller to report.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use multitool_common::constants::CONFIG_FILE_NAME;
use multitool_common::{
    HistoryError, HistoryStore, LoadStatus, Settings, SettingsError, SettingsStatus, SharedHistory,
    StorePaths,
};
use thiserror::Error;
use tracing::warn;

use crate::args::{Args, Command, HistoryAction};
use crate::services::currency::DEFAULT_RATES_URL;
use crate::services::safety::DEFAULT_SAFE_BROWSING_URL;
use crate::services::shortener::DEFAULT_SHORTENER_URL;
use crate::services::{
    CurrencyClient, HttpSession, SafetyChecker, ServiceError, Shortener, parse_amount,
};

/// Base URLs of the remote services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub rates: String,
    pub shortener: String,
    pub safe_browsing: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            rates: DEFAULT_RATES_URL.to_string(),
            shortener: DEFAULT_SHORTENER_URL.to_string(),
            safe_browsing: DEFAULT_SAFE_BROWSING_URL.to_string(),
        }
    }
}

/// Resolve the data directory: `--data-dir` or the platform default
pub fn data_dir(args: &Args) -> PathBuf {
    args.data_dir.clone().unwrap_or_else(StorePaths::default_dir)
}

/// Resolve the config path
///
/// `--config` wins; with `--data-dir` the config lives inside it; otherwise
/// the platform config directory is used.
pub fn config_path(args: &Args) -> PathBuf {
    if let Some(path) = &args.config {
        return path.clone();
    }
    if let Some(dir) = &args.data_dir {
        return dir.join(CONFIG_FILE_NAME);
    }
    Settings::default_path().unwrap_or_else(|| StorePaths::default_dir().join(CONFIG_FILE_NAME))
}

/// Application state shared by all commands
pub struct App {
    settings: Settings,
    settings_path: PathBuf,
    settings_status: SettingsStatus,
    history: SharedHistory,
    currency: CurrencyClient,
    shortener: Shortener,
    safety: SafetyChecker,
}

impl App {
    /// Load settings and open the history store
    pub fn open(
        data_dir: &Path,
        settings_path: PathBuf,
        endpoints: Endpoints,
        session: HttpSession,
    ) -> Result<Self, CommandError> {
        let (settings, settings_status) = Settings::load_with_status(&settings_path);
        let history = HistoryStore::open(StorePaths::in_dir(data_dir))?.into_shared();

        Ok(Self {
            currency: CurrencyClient::with_base_url(session.clone(), endpoints.rates),
            shortener: Shortener::with_base_url(session.clone(), endpoints.shortener),
            safety: SafetyChecker::with_base_url(
                session,
                endpoints.safe_browsing,
                &settings.safe_browsing_api,
            ),
            settings,
            settings_path,
            settings_status,
            history,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_status(&self) -> &SettingsStatus {
        &self.settings_status
    }

    pub fn history(&self) -> SharedHistory {
        self.history.clone()
    }

    /// Run one command, writing user-facing output to `out`
    pub async fn execute(
        &mut self,
        command: Command,
        out: &mut impl Write,
    ) -> Result<(), CommandError> {
        match command {
            Command::Convert { amount, from, to } => self.convert(&amount, &from, &to, out).await,
            Command::Currencies => {
                let currencies = self.currency.fetch_currencies().await;
                writeln!(out, "{}", currencies.join(" "))?;
                Ok(())
            }
            Command::History { action } => self.history_action(action, out),
            Command::Shorten { url } => {
                let short = self.shortener.shorten(&url).await?;
                writeln!(out, "Shortened: {}", short)?;
                Ok(())
            }
            Command::Check { url } => {
                let verdict = self.safety.check(&url).await?;
                writeln!(out, "{}", verdict)?;
                Ok(())
            }
            Command::Theme => {
                if let SettingsStatus::Unreadable(reason) = &self.settings_status {
                    return Err(CommandError::SettingsUnreadable {
                        path: self.settings_path.clone(),
                        reason: reason.clone(),
                    });
                }

                let theme = self.settings.toggle_theme();
                self.settings.save(&self.settings_path)?;
                self.settings_status = SettingsStatus::Loaded;
                writeln!(out, "Theme: {}", theme)?;
                Ok(())
            }
            Command::Config => {
                if let SettingsStatus::Unreadable(reason) = &self.settings_status {
                    writeln!(
                        out,
                        "(config file could not be read, showing defaults: {})",
                        reason
                    )?;
                }
                writeln!(out, "theme: {}", self.settings.theme)?;
                writeln!(out, "lang: {}", self.settings.lang)?;
                writeln!(
                    out,
                    "safe_browsing_api: {}",
                    if self.settings.has_safe_browsing_key() {
                        "set"
                    } else {
                        "not set"
                    }
                )?;
                writeln!(out, "config file: {}", self.settings_path.display())?;
                Ok(())
            }
        }
    }

    async fn convert(
        &mut self,
        amount: &str,
        from: &str,
        to: &str,
        out: &mut impl Write,
    ) -> Result<(), CommandError> {
        let amount = parse_amount(amount)?;
        let conversion = self.currency.convert(amount, from, to).await?;
        writeln!(out, "{}", conversion)?;

        // Result is already shown; a failed save is reported separately
        self.lock_history()?.append(conversion.history_entry())?;
        Ok(())
    }

    fn history_action(
        &mut self,
        action: HistoryAction,
        out: &mut impl Write,
    ) -> Result<(), CommandError> {
        let mut history = self.lock_history()?;

        match action {
            HistoryAction::List => {
                if let LoadStatus::Unreadable(reason) = history.load_status() {
                    warn!(%reason, "listing empty history after failed load");
                    writeln!(out, "(history file could not be read: {})", reason)?;
                }
                for entry in history.entries() {
                    writeln!(out, "{}", entry)?;
                }
            }
            HistoryAction::Search { query } => {
                for entry in history.search(&query) {
                    writeln!(out, "{}", entry)?;
                }
            }
            HistoryAction::Export { output } => {
                let path = match output {
                    Some(path) => {
                        history.export(&path)?;
                        path
                    }
                    None => history.export_default()?,
                };
                writeln!(
                    out,
                    "Exported {} entries to {}",
                    history.len(),
                    path.display()
                )?;
            }
            HistoryAction::Clear => {
                history.clear()?;
                writeln!(out, "History cleared")?;
            }
        }

        Ok(())
    }

    fn lock_history(&self) -> Result<std::sync::MutexGuard<'_, HistoryStore>, CommandError> {
        self.history.lock().map_err(|_| CommandError::HistoryPoisoned)
    }
}

/// Errors that can occur while running a command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("failed to save settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("config file {} could not be read ({reason}); fix or remove it first", .path.display())]
    SettingsUnreadable { path: PathBuf, reason: String },

    #[error("history store is unavailable after a panic in another task")]
    HistoryPoisoned,

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}
