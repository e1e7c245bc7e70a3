//! Durable key/value storage shared by every client process
//!
//! Holds the token pair plus the refresh lock flags. `FileStore` keeps them in
//! a JSON file with restricted permissions (0o600) so concurrent `ragc`
//! processes observe each other's writes.

use fs2::FileExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use tempfile::NamedTempFile;

use crate::types::TokenPair;

/// Access token key
pub const ACCESS_TOKEN_KEY: &str = "console_token";
/// Refresh token key
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Set to "1" while some process is refreshing the access token
pub const REFRESHING_FLAG_KEY: &str = "is_other_tab_refreshing";
/// Millisecond timestamp of the last refresh lock claim
pub const LAST_REFRESH_TIME_KEY: &str = "last_refresh_time";

/// String key/value storage visible to every client sharing a session.
///
/// Reads and writes are independent operations; there is no compare-and-swap.
pub trait SharedStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;

    /// Current access token, if signed in
    fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    /// Persist a freshly issued token pair
    fn save_token_pair(&self, pair: &TokenPair) -> io::Result<()> {
        self.set(ACCESS_TOKEN_KEY, &pair.access_token)?;
        self.set(REFRESH_TOKEN_KEY, &pair.refresh_token)
    }

    /// Forget the session tokens
    fn clear_tokens(&self) -> io::Result<()> {
        self.remove(ACCESS_TOKEN_KEY)?;
        self.remove(REFRESH_TOKEN_KEY)
    }
}

/// In-process store; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SharedStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// JSON file store. Every operation re-reads the file so writes made by
/// other processes are picked up.
///
/// Writes go to a temporary file that is renamed over the store, so readers
/// always see a complete map. Read-modify-write cycles hold an exclusive lock
/// on a sibling `.lock` file so concurrent writers do not drop each other's
/// keys. A store file that exists but cannot be parsed is never overwritten.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

/// Exclusive lock on the store's lock file, released on drop
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to unlock token store: {}", e);
        }
    }
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn ensure_dir(&self) -> io::Result<()> {
        let dir = self.dir();
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            #[cfg(unix)]
            fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
        }
        Ok(())
    }

    fn lock(&self) -> io::Result<StoreLock> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.path.with_extension("lock"))?;
        file.lock_exclusive()?;
        Ok(StoreLock { file })
    }

    /// Current map. A missing or empty file is an empty map; anything
    /// unparsable is an error.
    fn load(&self) -> io::Result<HashMap<String, String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e),
        };
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} is not a valid token store: {}", self.path.display(), e),
            )
        })
    }

    fn save(&self, entries: &HashMap<String, String>) -> io::Result<()> {
        let mut tmp = NamedTempFile::new_in(self.dir())?;
        serde_json::to_writer_pretty(&mut tmp, entries)?;
        tmp.as_file().sync_all()?;

        #[cfg(unix)]
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;

        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Apply `change` under the store lock; it returns whether to write back
    fn update<F>(&self, change: F) -> io::Result<()>
    where
        F: FnOnce(&mut HashMap<String, String>) -> bool,
    {
        self.ensure_dir()?;
        let _lock = self.lock()?;
        let mut entries = self.load()?;
        if change(&mut entries) {
            self.save(&entries)?;
        }
        Ok(())
    }
}

impl SharedStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(entries) => entries.get(key).cloned(),
            Err(e) => {
                tracing::warn!("Failed to read token store: {}", e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.update(|entries| entries.remove(key).is_some())
    }
}
