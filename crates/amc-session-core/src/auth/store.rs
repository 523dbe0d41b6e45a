use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use keyring::Entry;

use crate::config::{Config, StoreBackend, APP_NAME};

/// Name of the single persisted slot holding the raw token
pub const TOKEN_SLOT: &str = "amc-jwt-token";

/// A durable slot holding the current bearer token as an opaque string.
///
/// Writes replace the previous value wholesale and are never validated;
/// `clear` on an empty slot is not an error.
pub trait CredentialStore: Send + Sync {
    fn write(&self, token: &str) -> Result<()>;
    fn read(&self) -> Result<Option<String>>;
    fn clear(&self) -> Result<()>;
}

/// Open the backend selected in the config.
pub fn open_store(config: &Config) -> Result<Arc<dyn CredentialStore>> {
    let store: Arc<dyn CredentialStore> = match config.store {
        StoreBackend::File => Arc::new(FileStore::new(config.data_dir()?)),
        StoreBackend::Keyring => Arc::new(KeyringStore::new()?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

// ============================================================================
// In-memory slot
// ============================================================================

/// Process-local slot; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    token: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn write(&self, token: &str) -> Result<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|_| anyhow::anyhow!("Token slot lock poisoned"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn read(&self) -> Result<Option<String>> {
        let slot = self
            .token
            .read()
            .map_err(|_| anyhow::anyhow!("Token slot lock poisoned"))?;
        Ok(slot.clone())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|_| anyhow::anyhow!("Token slot lock poisoned"))?;
        *slot = None;
        Ok(())
    }
}

// ============================================================================
// File-backed slot
// ============================================================================

/// Slot persisted as a single file in the data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn slot_path(&self) -> PathBuf {
        self.dir.join(TOKEN_SLOT)
    }
}

impl CredentialStore for FileStore {
    fn write(&self, token: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        // Write then rename so readers never observe a partial token.
        let tmp = self.dir.join(format!("{}.tmp", TOKEN_SLOT));
        std::fs::write(&tmp, token).context("Failed to write token file")?;
        std::fs::rename(&tmp, self.slot_path()).context("Failed to replace token file")?;
        Ok(())
    }

    fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(self.slot_path()) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read token file"),
        }
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(self.slot_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove token file"),
        }
    }
}

// ============================================================================
// OS keychain slot
// ============================================================================

/// Slot persisted in the OS keychain.
///
/// One entry is opened up front and reused, so every operation addresses the
/// same credential whatever keychain backend the platform provides.
pub struct KeyringStore {
    entry: Entry,
}

impl KeyringStore {
    pub fn new() -> Result<Self> {
        let entry = Entry::new(APP_NAME, TOKEN_SLOT).context("Failed to create keyring entry")?;
        Ok(Self::with_entry(entry))
    }

    pub fn with_entry(entry: Entry) -> Self {
        Self { entry }
    }
}

impl CredentialStore for KeyringStore {
    fn write(&self, token: &str) -> Result<()> {
        self.entry
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn read(&self) -> Result<Option<String>> {
        match self.entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn clear(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}
