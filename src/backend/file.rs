//! File-backed key-value store scoped per origin.
//!
//! All keys of one origin live in a single JSON object on disk:
//! `<dir>/<origin>.json`. Every write rewrites the file through a temporary
//! file and a rename, so a crash never leaves a half-written store behind.

use super::StorageBackend;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Persistent store keeping one JSON file per origin.
///
/// # Example
///
/// ```no_run
/// use crud_kit::backend::{FileBackend, StorageBackend};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = FileBackend::open("/tmp/crud-kit", "https://example.com")?;
///     backend.set("users", "[]".to_string())?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct FileBackend {
    path: Arc<PathBuf>,
    quota: Option<usize>,
    lock: Arc<Mutex<()>>,
}

impl FileBackend {
    /// Open (or create) the store for `origin` inside `dir`.
    ///
    /// # Errors
    /// Returns `Error::Storage` if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>, origin: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", sanitize_origin(origin)));
        debug!("✓ File store for {} at {}", origin, path.display());

        Ok(FileBackend {
            path: Arc::new(path),
            quota: None,
            lock: Arc::new(Mutex::new(())),
        })
    }

    /// Reject writes that would grow the file past `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| Error::Storage("file store lock poisoned".to_string()))
    }

    fn read_raw(&self) -> Result<Option<String>> {
        match fs::read_to_string(&*self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(None),
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        match self.read_raw()? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| Error::Storage(format!("corrupt store file: {}", e))),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Like `load`, but an unparseable file counts as empty so the write replaces it.
    fn load_for_write(&self) -> Result<BTreeMap<String, String>> {
        let Some(raw) = self.read_raw()? else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(
                    "⚠ Corrupt store file {} discarded: {}",
                    self.path.display(),
                    e
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn persist(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let raw = serde_json::to_string(map)?;
        if let Some(limit) = self.quota {
            if raw.len() > limit {
                return Err(Error::QuotaExceeded {
                    limit,
                    requested: raw.len(),
                });
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &*self.path)?;
        Ok(())
    }
}

/// Turn an origin such as `https://example.com:8080` into a file name.
fn sanitize_origin(origin: &str) -> String {
    let name: String = origin
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    if name.is_empty() {
        "default".to_string()
    } else {
        name
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.guard()?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let _guard = self.guard()?;
        let mut map = self.load_for_write()?;
        map.insert(key.to_string(), value);
        self.persist(&map)?;
        debug!("✓ File SET {}", key);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let _guard = self.guard()?;
        let mut map = self.load_for_write()?;
        if map.remove(key).is_some() {
            self.persist(&map)?;
        }
        debug!("✓ File DELETE {}", key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let _guard = self.guard()?;
        Ok(self.load()?.into_keys().collect())
    }

    fn clear_all(&self) -> Result<()> {
        let _guard = self.guard()?;
        self.persist(&BTreeMap::new())?;
        warn!("⚠ File CLEAR_ALL executed for {}", self.path.display());
        Ok(())
    }
}
