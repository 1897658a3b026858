use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::modules::utils::logging::log_store_operation;
use crate::UserId;

/// Custom error type for password file operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("password file store is corrupt: {0}")]
    Corrupt(String),
}

/// Per-user persisted handle storage.
///
/// Implementations must make reads and overwrites atomic per user id, so a
/// reader racing a writer sees either the old or the new handle in full.
pub trait PasswordFileStore: Send + Sync {
    /// Read the stored handle for `uid`, `None` if nothing was enrolled
    fn read_password_file(&self, uid: UserId) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the stored handle for `uid`
    fn write_password_file(&self, uid: UserId, handle: &[u8]) -> Result<(), StoreError>;
}

impl<T: PasswordFileStore + ?Sized> PasswordFileStore for Arc<T> {
    fn read_password_file(&self, uid: UserId) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).read_password_file(uid)
    }

    fn write_password_file(&self, uid: UserId, handle: &[u8]) -> Result<(), StoreError> {
        (**self).write_password_file(uid, handle)
    }
}

/// Directory-backed store with one file per user
#[derive(Debug, Clone)]
pub struct FilePasswordStore {
    dir: PathBuf,
}

impl FilePasswordStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Path of the password file for a user
    pub fn file_path(&self, uid: UserId) -> PathBuf {
        self.dir.join(format!("gatekeeper.{}.pwd", uid))
    }
}

impl PasswordFileStore for FilePasswordStore {
    fn read_password_file(&self, uid: UserId) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.file_path(uid);
        // Missing or empty file means nothing enrolled yet
        match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                log_store_operation("read", uid, false, Some(&e.to_string()));
                Err(StoreError::Io(e))
            }
        }
    }

    fn write_password_file(&self, uid: UserId, handle: &[u8]) -> Result<(), StoreError> {
        // Write to a sibling temp file so the rename stays on one filesystem
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(handle)?;

        // Flush contents to disk before the file becomes visible
        file.as_file().sync_all()?;

        // Atomic rename over the old file; readers see old or new, never partial
        file.persist(self.file_path(uid)).map_err(|e| {
            log_store_operation("write", uid, false, Some(&e.error.to_string()));
            StoreError::Io(e.error)
        })?;

        log_store_operation("write", uid, true, None);
        Ok(())
    }
}

/// In-memory store, mainly for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryPasswordStore {
    files: RwLock<HashMap<UserId, Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryPasswordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes since creation
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Replace a stored file without counting it as a write
    pub fn insert(&self, uid: UserId, handle: Vec<u8>) -> Result<(), StoreError> {
        self.files
            .write()
            .map_err(|_| StoreError::Corrupt("lock poisoned".to_string()))?
            .insert(uid, handle);
        Ok(())
    }
}

impl PasswordFileStore for MemoryPasswordStore {
    fn read_password_file(&self, uid: UserId) -> Result<Option<Vec<u8>>, StoreError> {
        let files = self
            .files
            .read()
            .map_err(|_| StoreError::Corrupt("lock poisoned".to_string()))?;
        Ok(files.get(&uid).cloned())
    }

    fn write_password_file(&self, uid: UserId, handle: &[u8]) -> Result<(), StoreError> {
        self.insert(uid, handle.to_vec())?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
