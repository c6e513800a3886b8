//! Location of the files `sendgmail` reads and writes.

use std::path::{Path, PathBuf};

/// File name of the operator-supplied OAuth client secret.
pub const CLIENT_SECRET_FILE: &str = "credentials.json";

/// File name of the cached credential.
pub const CREDENTIAL_CACHE_FILE: &str = "token.json";

/// Configuration directory holding the client secret and credential cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    config_dir: PathBuf,
}

impl Config {
    /// Uses `config_dir` for both files.
    #[must_use]
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Platform configuration directory joined with `sendgmail`
    /// (e.g. `~/.config/sendgmail` on Linux), or `./sendgmail` if the
    /// platform has none.
    #[must_use]
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sendgmail")
    }

    /// Returns the configuration directory.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the client secret path.
    #[must_use]
    pub fn client_secret_path(&self) -> PathBuf {
        self.config_dir.join(CLIENT_SECRET_FILE)
    }

    /// Returns the credential cache path.
    #[must_use]
    pub fn credential_cache_path(&self) -> PathBuf {
        self.config_dir.join(CREDENTIAL_CACHE_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_directory() {
        let config = Config::new("/tmp/sg");
        assert_eq!(config.client_secret_path(), Path::new("/tmp/sg/credentials.json"));
        assert_eq!(config.credential_cache_path(), Path::new("/tmp/sg/token.json"));
        assert_eq!(
            config.client_secret_path().parent(),
            config.credential_cache_path().parent()
        );
    }

    #[test]
    fn test_default_dir_name() {
        assert!(Config::default_dir().ends_with("sendgmail"));
    }
}
