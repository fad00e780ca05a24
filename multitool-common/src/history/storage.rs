//! Storage operations for the history file
//!
//! The whole history is serialized as a JSON array of strings, encrypted, and
//! rewritten on every change. Files are organized as:
//! `{data_dir}/multitool/secret.key` and `{data_dir}/multitool/history.enc`
//!
//! See the parent module for the security model.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{error, info, warn};

use super::crypto::{CryptoError, HistoryCrypto};
use super::key::{KeyError, KeyMaterial};
use crate::constants::{
    APP_DIR_NAME, EXPORT_FILE_NAME, EXPORT_HEADER, HISTORY_FILE_NAME, KEY_FILE_NAME,
};
use crate::io::write_private;

/// History store shared between tasks
///
/// All writers go through the mutex, so overlapping appends are applied one
/// after the other and each rewrite contains every earlier entry.
pub type SharedHistory = Arc<Mutex<HistoryStore>>;

/// Locations of the files owned by the history store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    /// Key material, written once
    pub key_file: PathBuf,
    /// Encrypted history
    pub history_file: PathBuf,
    /// Default destination for plain-text exports
    pub export_file: PathBuf,
}

impl StorePaths {
    /// Place all store files inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            key_file: dir.join(KEY_FILE_NAME),
            history_file: dir.join(HISTORY_FILE_NAME),
            export_file: dir.join(EXPORT_FILE_NAME),
        }
    }

    /// Platform data directory for the application
    ///
    /// Falls back to the current directory if the platform has none.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }
}

impl Default for StorePaths {
    fn default() -> Self {
        Self::in_dir(Self::default_dir())
    }
}

/// Outcome of the most recent [`HistoryStore::load`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No history file on disk yet
    Fresh,
    /// History file decrypted, holding this many entries
    Restored(usize),
    /// History file exists but could not be read, decrypted, or parsed
    Unreadable(String),
}

/// Owns the conversion history and its encrypted file
pub struct HistoryStore {
    paths: StorePaths,
    crypto: HistoryCrypto,
    /// Entries in insertion order
    entries: Vec<String>,
    status: LoadStatus,
}

impl HistoryStore {
    /// Open the store, creating the key file on first use, and load the history
    ///
    /// Only fails if the key file cannot be read or created. An unreadable
    /// history file yields an empty store; check [`load_status`](Self::load_status).
    pub fn open(paths: StorePaths) -> Result<Self, HistoryError> {
        let material = KeyMaterial::load_or_create(&paths.key_file)?;
        let crypto = HistoryCrypto::new(&material);

        let mut store = Self {
            paths,
            crypto,
            entries: Vec::new(),
            status: LoadStatus::Fresh,
        };
        store.load();
        Ok(store)
    }

    /// Open the store at the platform default location
    pub fn open_default() -> Result<Self, HistoryError> {
        Self::open(StorePaths::default())
    }

    /// Wrap the store for use from several tasks
    pub fn into_shared(self) -> SharedHistory {
        Arc::new(Mutex::new(self))
    }

    /// Reload the history from disk
    ///
    /// Never fails: a missing file gives an empty history, and a corrupt file,
    /// wrong key, or truncated write is logged and also gives an empty history.
    pub fn load(&mut self) -> &[String] {
        match self.read_file() {
            Ok(Some(entries)) => {
                self.status = LoadStatus::Restored(entries.len());
                self.entries = entries;
            }
            Ok(None) => {
                self.status = LoadStatus::Fresh;
                self.entries.clear();
            }
            Err(e) => {
                error!(
                    path = %self.paths.history_file.display(),
                    error = %e,
                    "failed to load history, starting empty"
                );
                self.status = LoadStatus::Unreadable(e.to_string());
                self.entries.clear();
            }
        }

        &self.entries
    }

    /// Read and decrypt the history file, `None` if it does not exist
    fn read_file(&self) -> Result<Option<Vec<String>>, HistoryError> {
        let encrypted = match fs::read(&self.paths.history_file) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(HistoryError::Io(e)),
        };

        let decrypted = self.crypto.decrypt(&encrypted)?;
        let entries: Vec<String> =
            serde_json::from_slice(&decrypted).map_err(HistoryError::InvalidFormat)?;

        Ok(Some(entries))
    }

    /// Add an entry and rewrite the history file
    ///
    /// If the write fails the entry stays in memory, so the file lags behind
    /// until the next successful write.
    pub fn append(&mut self, entry: impl Into<String>) -> Result<(), HistoryError> {
        self.entries.push(entry.into());

        if let Err(e) = self.save() {
            error!(
                path = %self.paths.history_file.display(),
                error = %e,
                entries = self.entries.len(),
                "failed to save history"
            );
            return Err(e);
        }

        info!(entries = self.entries.len(), "history entry added");
        Ok(())
    }

    /// Remove every entry and rewrite the history file
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.entries.clear();

        if let Err(e) = self.save() {
            error!(error = %e, "failed to save cleared history");
            return Err(e);
        }

        info!("history cleared");
        Ok(())
    }

    /// Serialize, encrypt, and replace the history file
    fn save(&self) -> Result<(), HistoryError> {
        let json = serde_json::to_vec(&self.entries).map_err(HistoryError::Serialization)?;
        let encrypted = self.crypto.encrypt(&json)?;
        write_private(&self.paths.history_file, &encrypted)?;
        Ok(())
    }

    /// Entries containing `query`, ignoring case, in insertion order
    pub fn search(&self, query: &str) -> Vec<String> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Write the history as plain text, one entry per line after a header
    ///
    /// The export is not encrypted.
    pub fn export(&self, destination: &Path) -> Result<(), HistoryError> {
        let mut contents = String::from(EXPORT_HEADER);
        contents.push('\n');
        for entry in &self.entries {
            contents.push_str(entry);
            contents.push('\n');
        }

        if let Err(e) = fs::write(destination, contents) {
            error!(
                path = %destination.display(),
                error = %e,
                "failed to export history"
            );
            return Err(HistoryError::Io(e));
        }

        if self.entries.iter().any(|entry| entry.contains('\n')) {
            warn!("exported history contains multi-line entries");
        }

        info!(
            path = %destination.display(),
            entries = self.entries.len(),
            "history exported"
        );
        Ok(())
    }

    /// Export to the default export location
    pub fn export_default(&self) -> Result<PathBuf, HistoryError> {
        let path = self.paths.export_file.clone();
        self.export(&path)?;
        Ok(path)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }
}

/// Errors that can occur during history operations
#[derive(Debug, Error)]
pub enum HistoryError {
    /// I/O error reading/writing files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Key file could not be loaded or created
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// Cryptographic operation failed
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Decrypted data is not a JSON array of strings
    #[error("invalid history format: {0}")]
    InvalidFormat(#[source] serde_json::Error),

    /// Serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> HistoryStore {
        HistoryStore::open(StorePaths::in_dir(dir.path())).unwrap()
    }

    #[test]
    fn test_store_paths_in_dir() {
        let paths = StorePaths::in_dir("/data/multitool");
        assert_eq!(paths.key_file, PathBuf::from("/data/multitool/secret.key"));
        assert_eq!(
            paths.history_file,
            PathBuf::from("/data/multitool/history.enc")
        );
        assert_eq!(
            paths.export_file,
            PathBuf::from("/data/multitool/history_export.csv")
        );
    }

    #[test]
    fn test_default_dir_ends_with_app_dir() {
        assert!(StorePaths::default_dir().ends_with(APP_DIR_NAME));
    }

    #[test]
    fn test_open_fresh_store() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        assert!(store.is_empty());
        assert_eq!(store.load_status(), &LoadStatus::Fresh);
        // Nothing is written until the first append
        assert!(!store.paths().history_file.exists());
    }

    #[test]
    fn test_append_keeps_order_and_duplicates() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        store.append("1.0 USD -> 0.92 EUR").unwrap();
        store.append("1.0 USD -> 0.92 EUR").unwrap();
        store.append("5.0 GBP -> 6.30 USD").unwrap();

        assert_eq!(
            store.entries(),
            &[
                "1.0 USD -> 0.92 EUR",
                "1.0 USD -> 0.92 EUR",
                "5.0 GBP -> 6.30 USD"
            ]
        );
    }

    #[test]
    fn test_history_file_is_not_plaintext() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.append("100.0 USD -> 92.34 EUR").unwrap();

        let raw = fs::read(&store.paths().history_file).unwrap();
        let needle = b"USD";
        assert!(!raw.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn test_load_reports_restored_count() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.append("a").unwrap();
        store.append("b").unwrap();

        let reopened = open_store(&dir);
        assert_eq!(reopened.load_status(), &LoadStatus::Restored(2));
    }

    #[test]
    fn test_valid_ciphertext_with_wrong_shape_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        // Correctly encrypted, but an object rather than an array of strings
        let encrypted = store.crypto.encrypt(br#"{"entries": 3}"#).unwrap();
        fs::write(&store.paths().history_file, encrypted).unwrap();

        let reopened = open_store(&dir);
        assert!(reopened.is_empty());
        assert!(matches!(
            reopened.load_status(),
            LoadStatus::Unreadable(_)
        ));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.append("100 USD -> 92 EUR").unwrap();
        store.append("10 GBP -> 12 CAD").unwrap();

        assert_eq!(store.search("usd"), vec!["100 USD -> 92 EUR"]);
        assert_eq!(store.search("Eur"), vec!["100 USD -> 92 EUR"]);
        assert!(store.search("jpy").is_empty());
    }

    #[test]
    fn test_search_empty_query_matches_all() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.append("x").unwrap();
        store.append("y").unwrap();

        assert_eq!(store.search(""), vec!["x", "y"]);
    }

    #[test]
    fn test_clear_persists_empty_history() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.append("a").unwrap();
        store.clear().unwrap();

        let reopened = open_store(&dir);
        assert!(reopened.is_empty());
        assert_eq!(reopened.load_status(), &LoadStatus::Restored(0));
    }

    #[test]
    fn test_append_failure_keeps_entry_in_memory() {
        let dir = TempDir::new().unwrap();
        let mut paths = StorePaths::in_dir(dir.path());
        // A directory where the history file should be makes the rename fail
        fs::create_dir_all(&paths.history_file).unwrap();
        paths.export_file = dir.path().join("out.txt");
        let mut store = HistoryStore::open(paths).unwrap();

        let result = store.append("kept");

        assert!(result.is_err());
        assert_eq!(store.entries(), &["kept"]);
    }

    #[test]
    fn test_export_default_uses_store_path() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.append("only").unwrap();

        let path = store.export_default().unwrap();
        assert_eq!(path, dir.path().join(EXPORT_FILE_NAME));
        assert_eq!(fs::read_to_string(path).unwrap(), "History\nonly\n");
    }
}
