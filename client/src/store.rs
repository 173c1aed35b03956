use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The token pair as persisted on disk, keyed the way the web client keyed
/// its browser storage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredTokens {
    #[serde(default, rename = "accessToken")]
    pub access: Option<String>,
    #[serde(default, rename = "refreshToken")]
    pub refresh: Option<String>,
}

impl StoredTokens {
    pub fn pair(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: Some(access.into()),
            refresh: Some(refresh.into()),
        }
    }
}

/// Durable storage of the access/refresh pair.
///
/// No expiry tracking, no encryption, no cross-process lock: concurrent
/// clients share the same file and may race on refresh.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<StoredTokens>;
    fn save(&self, tokens: &StoredTokens) -> Result<()>;
    fn clear(&self) -> Result<()>;

    /// The stored access token, if any. Load failures read as logged out.
    fn access_token(&self) -> Option<String> {
        self.load().ok().and_then(|tokens| tokens.access)
    }

    /// The refresh exchange rewrites only the access token.
    fn set_access(&self, access: &str) -> Result<()> {
        let mut tokens = self.load().unwrap_or_default();
        tokens.access = Some(access.to_string());
        self.save(&tokens)
    }
}

/// JSON file store under the user data directory.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store at the default location, `<data dir>/edumed/auth.json`.
    pub fn new() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "No user data directory"))?;
        Ok(Self::at(data_dir.join("edumed").join("auth.json")))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<StoredTokens> {
        if !self.path.exists() {
            return Ok(StoredTokens::default());
        }
        let content = fs::read_to_string(&self.path)?;
        let tokens = serde_json::from_str(&content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(tokens)
    }

    fn save(&self, tokens: &StoredTokens) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<StoredTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(access: &str, refresh: &str) -> Self {
        Self {
            tokens: Mutex::new(StoredTokens::pair(access, refresh)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<StoredTokens> {
        Ok(self
            .tokens
            .lock()
            .map(|tokens| tokens.clone())
            .unwrap_or_default())
    }

    fn save(&self, tokens: &StoredTokens) -> Result<()> {
        if let Ok(mut slot) = self.tokens.lock() {
            *slot = tokens.clone();
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if let Ok(mut slot) = self.tokens.lock() {
            *slot = StoredTokens::default();
        }
        Ok(())
    }
}
