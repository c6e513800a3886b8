//! On-disk credential cache.
//!
//! The cache is a single JSON record `{"version": 1, "credential": {...}}`.
//! Writes go to a temporary sibling file that is renamed over the cache, so
//! a reader never observes a half-written record.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sendgmail_oauth::Credential;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};

/// Current record layout version.
const RECORD_VERSION: u32 = 1;

/// Result of deleting the cached credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// A cached credential was removed.
    Deleted,
    /// There was nothing to remove.
    NotFound,
}

/// Storage used by the credential lifecycle.
pub trait CredentialCache {
    /// Returns true if a cached credential is present.
    fn exists(&self) -> bool;

    /// Prepares the location the credential is written to.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be created.
    fn ensure_directory(&self) -> Result<()>;

    /// Loads the cached credential, `None` when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptCredential`] for an unreadable record.
    fn load(&self) -> Result<Option<Credential>>;

    /// Replaces the cached credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be written.
    fn save(&self, credential: &Credential) -> Result<()>;

    /// Removes the cached credential.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing credential cannot be removed.
    fn delete(&self) -> Result<DeleteOutcome>;
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedCredential {
    version: u32,
    credential: Credential,
}

/// Reads and writes the cached credential.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Creates a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the configured cache location.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.credential_cache_path())
    }

    /// Returns the cache file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a cache file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Creates the cache directory if needed.
    ///
    /// On Unix a newly created directory is restricted to the owner (0700).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_directory(&self) -> Result<()> {
        let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };
        if dir.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
        }

        debug!(dir = %dir.display(), "created config directory");
        Ok(())
    }

    /// Loads the cached credential.
    ///
    /// Returns `Ok(None)` when no cache file exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptCredential`] if the file cannot be decoded,
    /// or an I/O error if it cannot be read.
    pub fn load(&self) -> Result<Option<Credential>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: CachedCredential =
            serde_json::from_str(&json).map_err(|e| self.corrupt(e.to_string()))?;
        if record.version != RECORD_VERSION {
            return Err(self.corrupt(format!("unsupported version {}", record.version)));
        }

        debug!(path = %self.path.display(), "loaded credential");
        Ok(Some(record.credential))
    }

    /// Replaces the cached credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        self.ensure_directory()?;

        let record = CachedCredential {
            version: RECORD_VERSION,
            credential: credential.clone(),
        };
        let json = serde_json::to_string_pretty(&record)?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        set_owner_only(&tmp_path)?;
        fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), "saved credential");
        Ok(())
    }

    /// Removes the cached credential.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    pub fn delete(&self) -> Result<DeleteOutcome> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "deleted credential");
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(DeleteOutcome::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    fn corrupt(&self, reason: String) -> Error {
        Error::CorruptCredential {
            path: self.path.display().to_string(),
            reason,
        }
    }
}

impl CredentialCache for CredentialStore {
    fn exists(&self) -> bool {
        Self::exists(self)
    }

    fn ensure_directory(&self) -> Result<()> {
        Self::ensure_directory(self)
    }

    fn load(&self) -> Result<Option<Credential>> {
        Self::load(self)
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        Self::save(self, credential)
    }

    fn delete(&self) -> Result<DeleteOutcome> {
        Self::delete(self)
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn set_owner_only(_path: &Path) -> Result<()> {
    Ok(())
}
