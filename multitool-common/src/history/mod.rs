//! Encrypted conversion history
//!
//! Keeps the ordered list of completed conversions and persists it on disk as
//! `{data_dir}/multitool/history.enc`, encrypted with a key stored next to it
//! in `secret.key`.
//!
//! # Security Model
//!
//! The key file lives beside the history file with owner-only permissions.
//! This protects the history from other local users and from casual reading
//! of backups that omit the key, but not from anyone who can read both files.
//! Exports are written in plain text on purpose.

mod crypto;
mod key;
mod storage;

pub use crypto::CryptoError;
pub use key::{KEY_SIZE, KeyError, KeyMaterial};
pub use storage::{HistoryError, HistoryStore, LoadStatus, SharedHistory, StorePaths};
