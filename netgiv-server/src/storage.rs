//! Temporary-file backing store for stored objects.
//!
//! Each object lives in its own `netgiv_*` file. An upload in progress is a
//! [`PendingObject`]: its file disappears when it is dropped unless
//! [`finish`](PendingObject::finish) was reached, so an aborted Send never
//! leaks a partial file.

use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{StorageError, StorageResult};

const FILE_PREFIX: &str = "netgiv_";

/// Opaque reference to an object's bytes on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageHandle {
    path: PathBuf,
}

impl StorageHandle {
    pub(crate) fn from_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Creates, opens and removes object files in one directory.
#[derive(Debug, Clone)]
pub struct TempStore {
    dir: PathBuf,
}

impl TempStore {
    /// Use `dir`, or the OS temp dir when `None`. The directory is created
    /// if missing.
    pub fn open(dir: Option<PathBuf>) -> StorageResult<Self> {
        let dir = dir.unwrap_or_else(std::env::temp_dir);
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::io("create directory", &dir, e))?;
        Ok(Self { dir })
    }

    /// Directory holding the object files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Start a new object file.
    pub fn create(&self) -> StorageResult<PendingObject> {
        let named = tempfile::Builder::new()
            .prefix(FILE_PREFIX)
            .tempfile_in(&self.dir)
            .map_err(|e| StorageError::io("create object file in", &self.dir, e))?;
        let (file, path) = named.into_parts();

        Ok(PendingObject {
            file: File::from_std(file),
            path,
            written: 0,
        })
    }

    /// Open a stored object for reading.
    pub async fn read(&self, handle: &StorageHandle) -> StorageResult<File> {
        File::open(&handle.path)
            .await
            .map_err(|e| StorageError::io("open", &handle.path, e))
    }

    /// Delete a stored object's file.
    pub async fn remove(&self, handle: &StorageHandle) -> StorageResult<()> {
        tokio::fs::remove_file(&handle.path)
            .await
            .map_err(|e| StorageError::io("remove", &handle.path, e))
    }
}

/// An object being uploaded.
#[derive(Debug)]
pub struct PendingObject {
    file: File,
    /// Deletes the file on drop until kept.
    path: TempPath,
    written: u64,
}

impl PendingObject {
    /// Append bytes.
    pub async fn write(&mut self, data: &[u8]) -> StorageResult<()> {
        self.file
            .write_all(data)
            .await
            .map_err(|e| StorageError::io("write", self.path.to_path_buf(), e))?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush, stat and keep the file. Returns the handle and final size.
    pub async fn finish(mut self) -> StorageResult<(StorageHandle, u64)> {
        self.file
            .flush()
            .await
            .map_err(|e| StorageError::io("flush", self.path.to_path_buf(), e))?;
        let size = self
            .file
            .metadata()
            .await
            .map_err(|e| StorageError::io("stat", self.path.to_path_buf(), e))?
            .len();

        let path = self
            .path
            .keep()
            .map_err(|e| StorageError::io("keep", e.path.to_path_buf(), e.error))?;

        Ok((StorageHandle::from_path(path), size))
    }
}
