//! Client configuration (loaded from sealdrop.toml)

use crate::envelope::Scheme;
use crate::error::{ErrorCategory, ErrorKind, Result, SealdropError};
use crate::wordlist::WordList;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a config file when `--config` is absent
pub const CONFIG_ENV: &str = "SEALDROP_CONFIG";

/// Largest payload accepted for upload by default (100 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub share: ShareConfig,
    pub wordlist: WordlistConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage service root; `upload` and `retrieve` are resolved under it
    pub base_url: String,
    /// Per-request timeout in seconds (0 disables it)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Also send the secret word in the upload form (default: false)
    pub send_secret_word: bool,
    /// Upload size ceiling in bytes
    pub max_bytes: u64,
    /// Cipher for new envelopes: "aes-cbc" or "aes-gcm"
    pub scheme: Scheme,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Web origin that share links point at
    pub origin: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WordlistConfig {
    /// One-word-per-line list replacing the built-in one
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".into(),
            timeout_secs: 60,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            send_secret_word: false,
            max_bytes: DEFAULT_MAX_BYTES,
            scheme: Scheme::AesCbc,
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000/".into(),
        }
    }
}

impl Config {
    /// Loads the config from `path`, or from `$SEALDROP_CONFIG` when no
    /// path is given. A named file that does not exist yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match path.or(env_path.as_deref()) {
            Some(path) => Self::load_file(path),
            None => Ok(Self::default()),
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            SealdropError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Config,
                format!("reading config {}", path.display()),
                e,
            )
        })?;
        Self::parse(&content).map_err(|e| e.with_context(format!("config {}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            SealdropError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Config,
                format!("parsing config: {}", e),
                e,
            )
        })
    }

    /// The word list secret words are drawn from.
    pub fn word_list(&self) -> Result<WordList> {
        match &self.wordlist.path {
            Some(path) => WordList::load(path),
            None => Ok(WordList::builtin()),
        }
    }
}
