//! services/client/src/adapters/file_store.rs
//!
//! The durable `KeyValueStore`: a single JSON document on disk. Several processes
//! pointing at the same path share one session, the way browser tabs share
//! local storage.

use scroll_saga_core::ports::{KeyValueStore, PortError, PortResult, StoreMutation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

/// How long `apply` waits for another writer's lock before giving up.
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
/// A lock file older than this was left behind by a crashed writer.
const STALE_LOCK_AGE: Duration = Duration::from_secs(30);
const LOCK_RETRY: Duration = Duration::from_millis(5);

//=========================================================================================
// On-disk Layout
//=========================================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    revision: u64,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

//=========================================================================================
// The Store
//=========================================================================================

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles issued through this handle. Other
    /// handles and processes are excluded by the lock file.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "session.json".to_string());
        self.path.with_file_name(format!("{}{}", file_name, suffix))
    }

    fn ensure_parent(&self) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
        }
        Ok(())
    }

    /// Takes the cross-process write lease: a `create_new` lock file next to the
    /// store, removed when the returned guard drops.
    fn acquire_lease(&self) -> PortResult<LockLease> {
        self.ensure_parent()?;
        let lock_path = self.sibling(".lock");
        let started = Instant::now();
        loop {
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(_) => return Ok(LockLease { path: lock_path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if lock_is_stale(&lock_path) {
                        warn!(path = %lock_path.display(), "Removing stale session store lock");
                        let _ = std::fs::remove_file(&lock_path);
                        continue;
                    }
                    if started.elapsed() >= LOCK_TIMEOUT {
                        return Err(PortError::Storage(format!(
                            "timed out waiting for {}",
                            lock_path.display()
                        )));
                    }
                    std::thread::sleep(LOCK_RETRY);
                }
                Err(e) => return Err(storage_error(&lock_path, e)),
            }
        }
    }

    fn load(&self) -> PortResult<StoreDocument> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreDocument::default()),
            Err(e) => return Err(storage_error(&self.path, e)),
        };
        if raw.trim().is_empty() {
            return Ok(StoreDocument::default());
        }
        serde_json::from_str(&raw).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "Session store file is corrupt");
            PortError::Storage(format!("corrupt store file {}: {}", self.path.display(), e))
        })
    }

    /// Writes to a per-process sibling temp file and renames it over the target,
    /// so a reader sees either the old document or the new one.
    fn persist(&self, document: &StoreDocument) -> PortResult<()> {
        self.ensure_parent()?;
        let body = serde_json::to_vec_pretty(document)
            .map_err(|e| PortError::Storage(e.to_string()))?;

        let temp_path = self.sibling(&format!(".tmp.{}", std::process::id()));
        std::fs::write(&temp_path, body).map_err(|e| storage_error(&temp_path, e))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| storage_error(&self.path, e))?;
        Ok(())
    }
}

/// Held for the whole read-modify-write of one batch.
struct LockLease {
    path: PathBuf,
}

impl Drop for LockLease {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to release session store lock");
        }
    }
}

fn lock_is_stale(path: &Path) -> bool {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > STALE_LOCK_AGE)
}

fn storage_error(path: &Path, error: std::io::Error) -> PortError {
    PortError::Storage(format!("{}: {}", path.display(), error))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.load()?.entries.get(key).cloned())
    }

    fn apply(&self, mutations: &[StoreMutation]) -> PortResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| PortError::Storage("file store lock poisoned".to_string()))?;
        let _lease = self.acquire_lease()?;

        let mut document = self.load()?;
        for mutation in mutations {
            match mutation {
                StoreMutation::Set { key, value } => {
                    document.entries.insert(key.clone(), value.clone());
                }
                StoreMutation::Remove { key } => {
                    document.entries.remove(key);
                }
            }
        }
        document.revision += 1;
        self.persist(&document)?;
        debug!(
            path = %self.path.display(),
            revision = document.revision,
            "Session store updated"
        );
        Ok(())
    }

    fn revision(&self) -> PortResult<u64> {
        Ok(self.load()?.revision)
    }
}
