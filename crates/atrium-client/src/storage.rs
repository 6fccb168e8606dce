//! Durable key/value slots backing the session
//!
//! A session lives in two slots: a long-lived one that survives restarts
//! (a directory of JSON files by default) and a session-scoped one that
//! lives as long as the process. Both carry the token; only the long-lived
//! slot carries the profile.

use atrium_core::config::SessionConfig;
use atrium_core::{Error, Profile, Result, Session};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Key holding the bearer token
pub const TOKEN_KEY: &str = "token";

/// Key holding the serialized profile
pub const USER_KEY: &str = "user";

/// A string key/value store
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Read a value
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be modified.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

/// One file per key inside a directory, created on first write
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the files
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::storage(key, "key must be alphanumeric, '-' or '_'"));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::storage(key, err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| Error::storage(key, e))?;

        // Write to a sibling file and rename so readers never see a partial value.
        let tmp = path.with_extension("json.tmp");
        let mut file = open_private(&tmp).map_err(|e| Error::storage(key, e))?;
        file.write_all(value.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| Error::storage(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| Error::storage(key, e))?;

        debug!(key, dir = %self.dir.display(), "Persisted slot value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::storage(key, err)),
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}

/// One pending write and the value it replaces
struct SlotWrite<'a> {
    store: &'a dyn KeyValueStore,
    key: &'static str,
    value: &'a str,
    previous: Option<String>,
}

impl SlotWrite<'_> {
    fn undo(&self) -> Result<()> {
        match &self.previous {
            Some(value) => self.store.set(self.key, value),
            None => self.store.remove(self.key),
        }
    }
}

/// The pair of slots a session is persisted to
#[derive(Debug, Clone)]
pub struct SessionSlots {
    long_lived: Arc<dyn KeyValueStore>,
    session_scoped: Arc<dyn KeyValueStore>,
}

impl SessionSlots {
    /// Slots backed by the given stores
    #[must_use]
    pub fn new(long_lived: Arc<dyn KeyValueStore>, session_scoped: Arc<dyn KeyValueStore>) -> Self {
        Self {
            long_lived,
            session_scoped,
        }
    }

    /// Both slots in memory; nothing survives the process
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Long-lived slot in `dir`, session-scoped slot in memory
    #[must_use]
    pub fn on_disk(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(dir)), Arc::new(MemoryStore::new()))
    }

    /// Slots as configured: on disk when persistence is enabled and a
    /// directory can be determined, in memory otherwise
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        if !config.persist {
            return Self::in_memory();
        }
        match config.resolve_storage_dir() {
            Some(dir) => Self::on_disk(dir),
            None => {
                warn!("No data directory available, session will not persist");
                Self::in_memory()
            }
        }
    }

    /// Write `session` to both slots
    ///
    /// The profile is written before the token. If any write fails, the
    /// writes that already landed are undone, so a failed save leaves the
    /// earlier session in place. If undoing fails too, both slots are
    /// cleared.
    ///
    /// # Errors
    ///
    /// Returns the first storage or serialization failure.
    pub fn save(&self, session: &Session) -> Result<()> {
        let token = serde_json::to_string(&session.token)?;
        let user = serde_json::to_string(&session.user)?;

        let writes = [
            (&*self.long_lived, USER_KEY, user.as_str()),
            (&*self.long_lived, TOKEN_KEY, token.as_str()),
            (&*self.session_scoped, TOKEN_KEY, token.as_str()),
        ]
        .into_iter()
        .map(|(store, key, value)| {
            store.get(key).map(|previous| SlotWrite {
                store,
                key,
                value,
                previous,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        for (done, write) in writes.iter().enumerate() {
            if let Err(err) = write.store.set(write.key, write.value) {
                self.undo(writes.get(..done).unwrap_or_default());
                return Err(err);
            }
        }
        Ok(())
    }

    fn undo(&self, landed: &[SlotWrite<'_>]) {
        let results: Vec<Result<()>> = landed.iter().rev().map(SlotWrite::undo).collect();
        if let Some(Err(err)) = results.into_iter().find(Result::is_err) {
            warn!(error = %err, "Failed to restore previous session after write failure");
            self.discard();
        }
    }

    /// Replace the persisted profile, keeping the token
    ///
    /// # Errors
    ///
    /// Returns a storage or serialization failure.
    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        self.long_lived
            .set(USER_KEY, &serde_json::to_string(profile)?)
    }

    /// Restore a session: the long-lived slot first, then the scoped one
    ///
    /// A token without a readable profile is discarded and reported as no
    /// session.
    ///
    /// # Errors
    ///
    /// Returns an error only when a slot cannot be read at all.
    pub fn load(&self) -> Result<Option<Session>> {
        let raw_token = match self.long_lived.get(TOKEN_KEY)? {
            Some(token) => Some(token),
            None => self.session_scoped.get(TOKEN_KEY)?,
        };
        let Some(raw_token) = raw_token else {
            return Ok(None);
        };

        let token = match serde_json::from_str::<String>(&raw_token) {
            Ok(token) if !token.trim().is_empty() => token,
            Ok(_) | Err(_) => {
                warn!("Discarding unreadable persisted token");
                self.discard();
                return Ok(None);
            }
        };

        let user = match self.long_lived.get(USER_KEY)? {
            Some(raw) => match serde_json::from_str::<Profile>(&raw) {
                Ok(profile) => profile,
                Err(err) => {
                    warn!(error = %err, "Discarding corrupt persisted profile");
                    self.discard();
                    return Ok(None);
                }
            },
            None => {
                warn!("Discarding persisted token without a profile");
                self.discard();
                return Ok(None);
            }
        };

        Ok(Some(Session { token, user }))
    }

    /// Remove token and profile from both slots
    ///
    /// Every removal is attempted even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first removal failure.
    pub fn clear(&self) -> Result<()> {
        let results = [
            self.long_lived.remove(TOKEN_KEY),
            self.long_lived.remove(USER_KEY),
            self.session_scoped.remove(TOKEN_KEY),
        ];
        results.into_iter().collect()
    }

    fn discard(&self) {
        if let Err(err) = self.clear() {
            warn!(error = %err, "Failed to discard persisted session");
        }
    }
}
