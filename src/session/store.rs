//! Persistence backends for the session snapshot.

use crate::error::{MundoError, MundoResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Key the snapshot is stored under
pub const STORAGE_KEY: &str = "auth-storage";

/// Read/write access to one serialized snapshot
pub trait SessionStore: Send + Sync {
    fn read(&self) -> MundoResult<Option<String>>;
    fn write(&self, data: &str) -> MundoResult<()>;
    fn clear(&self) -> MundoResult<()>;
}

/// Process-lifetime store for tests and the CLI
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn read(&self) -> MundoResult<Option<String>> {
        Ok(self
            .data
            .read()
            .map_err(|_| MundoError::internal("Session store lock poisoned"))?
            .clone())
    }

    fn write(&self, data: &str) -> MundoResult<()> {
        *self
            .data
            .write()
            .map_err(|_| MundoError::internal("Session store lock poisoned"))? = Some(data.to_string());
        Ok(())
    }

    fn clear(&self) -> MundoResult<()> {
        *self
            .data
            .write()
            .map_err(|_| MundoError::internal("Session store lock poisoned"))? = None;
        Ok(())
    }
}

/// JSON file on disk; writes go through a temp file and a rename
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/auth-storage.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{}.json", STORAGE_KEY)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileStore {
    fn read(&self) -> MundoResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MundoError::storage_error(format!(
                "Cannot read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write(&self, data: &str) -> MundoResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> MundoResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
