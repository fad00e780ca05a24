//! Key file management
//!
//! The key file holds exactly [`KEY_SIZE`] random bytes, generated once per
//! installation and never rotated.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chacha20poly1305::aead::{OsRng, rand_core::RngCore};
use thiserror::Error;
use tracing::{info, warn};

use crate::io::{publish_private, write_private};

/// Size of the key material in bytes
pub const KEY_SIZE: usize = 32;

/// Raw key material read from (or written to) the key file
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial([u8; KEY_SIZE]);

impl KeyMaterial {
    /// Generate fresh key material from the OS RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Read the key file at `path`, generating it first if it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self, KeyError> {
        match Self::read(path) {
            Err(KeyError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {}
            Err(KeyError::InvalidLength { len: 0, .. }) => return Self::replace_empty(path),
            other => return other,
        }

        let material = Self::generate();
        match material.write_new(path) {
            Ok(()) => {
                info!(path = %path.display(), "generated new history key");
                Ok(material)
            }
            // Another process created it between our read and write
            Err(KeyError::Write { source, .. })
                if source.kind() == io::ErrorKind::AlreadyExists =>
            {
                Self::read(path)
            }
            Err(e) => Err(e),
        }
    }

    /// Read existing key material, checking its length
    fn read(path: &Path) -> Result<Self, KeyError> {
        let bytes = fs::read(path).map_err(|source| KeyError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let bytes: [u8; KEY_SIZE] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| KeyError::InvalidLength {
                    path: path.to_path_buf(),
                    len: bytes.len(),
                })?;

        Ok(Self(bytes))
    }

    /// Write the key file, refusing to overwrite an existing one
    ///
    /// The file only appears once all [`KEY_SIZE`] bytes are on disk.
    fn write_new(&self, path: &Path) -> Result<(), KeyError> {
        publish_private(path, &self.0).map_err(|source| KeyError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replace an empty key file, which cannot have encrypted anything
    fn replace_empty(path: &Path) -> Result<Self, KeyError> {
        warn!(path = %path.display(), "key file is empty, generating a new key");

        let material = Self::generate();
        write_private(path, &material.0).map_err(|source| KeyError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        // A concurrent opener may have replaced it too; the file on disk wins
        Self::read(path)
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyMaterial([REDACTED])")
    }
}

/// Errors that can occur while loading or creating the key file
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to read key file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write key file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("key file {} holds {len} bytes, expected {}", .path.display(), KEY_SIZE)]
    InvalidLength { path: PathBuf, len: usize },
}
