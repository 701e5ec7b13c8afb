//! Storage backends for persisted session state.
//!
//! The session store talks to durable storage through the `SessionStorage`
//! trait, so the medium and encoding stay a backend decision. The one contract
//! every backend honors: `save` followed by a fresh `load` (for example after
//! a process restart) returns the same token value.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use keyring::Entry;

use super::store::SessionState;

/// Session file name inside the data directory
const SESSION_FILE: &str = "session.json";

/// Keychain service name used by `KeyringStorage`
const KEYRING_SERVICE: &str = "satchel";

/// Durable storage collaborator for session state.
pub trait SessionStorage: Send {
    /// Read the last persisted state, or `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<SessionState>>;

    /// Durably record the given state, replacing any previous one.
    fn save(&self, state: &SessionState) -> Result<()>;
}

/// JSON file storage at `<dir>/session.json`.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<SessionState>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .context("Failed to read session file")?;
        let state = serde_json::from_str(&contents)
            .context("Failed to parse session file")?;
        Ok(Some(state))
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create session directory")?;
        }
        let contents = serde_json::to_string_pretty(state)?;
        write_private(&path, &contents).context("Failed to write session file")
    }
}

/// Write a credential file readable only by the current user (0600 on Unix).
fn write_private(path: &Path, contents: &str) -> Result<()> {
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(contents.as_bytes())?;
    }
    #[cfg(not(unix))]
    {
        std::fs::write(path, contents)?;
    }
    Ok(())
}

/// Non-durable storage keeping state in process memory.
///
/// Clones share one slot, so a fresh store opened over a clone observes the
/// last saved state. Useful for sessions that should not outlive the process
/// and for tests that simulate a restart without touching the filesystem.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<SessionState>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<SessionState>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<SessionState>> {
        Ok(self.lock().clone())
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        *self.lock() = Some(state.clone());
        Ok(())
    }
}

/// OS keychain storage via the `keyring` crate.
///
/// The serialized state is stored as the account's secret, so the token never
/// touches a plain file. A missing keychain entry reads as no session.
pub struct KeyringStorage {
    account: String,
}

impl KeyringStorage {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(KEYRING_SERVICE, &self.account).context("Failed to create keyring entry")
    }
}

impl SessionStorage for KeyringStorage {
    fn load(&self) -> Result<Option<SessionState>> {
        match self.entry()?.get_password() {
            Ok(contents) => {
                let state = serde_json::from_str(&contents)
                    .context("Failed to parse keychain session entry")?;
                Ok(Some(state))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read session from keychain"),
        }
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        let contents = serde_json::to_string(state)?;
        self.entry()?
            .set_password(&contents)
            .context("Failed to store session in keychain")
    }
}
