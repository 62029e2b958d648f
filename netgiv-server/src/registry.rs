//! In-memory directory of stored objects.
//!
//! One `Registry` is shared by every session. The entry list sits behind a
//! lock; ids come from an atomic counter that starts at 1 and is never reset,
//! so an id is never handed out twice, even after a burn. Draining closes
//! the registry: later appends are refused.

use netgiv_types::{ListEntry, ObjectId};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::RwLock;

use crate::storage::StorageHandle;

/// A stored object. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Server-assigned id.
    pub id: ObjectId,
    /// Backing file.
    pub handle: StorageHandle,
    /// Original file name, may be empty.
    pub filename: String,
    /// Detected content kind.
    pub kind: String,
    /// Size in bytes.
    pub size: u32,
    /// Unix timestamp (seconds) of the completed upload.
    pub created_at: u64,
}

impl StoredObject {
    /// The listing record for this object.
    pub fn to_list_entry(&self) -> ListEntry {
        ListEntry {
            id: self.id,
            filename: self.filename.clone(),
            size: self.size,
            kind: self.kind.clone(),
            created_at: self.created_at,
        }
    }
}

/// Ordered collection of stored objects plus the id counter.
#[derive(Debug)]
pub struct Registry {
    objects: RwLock<Vec<StoredObject>>,
    next_id: AtomicU32,
    /// Set by `drain`; only changed under the write lock.
    closed: AtomicBool,
}

impl Registry {
    /// An empty registry whose first id is 1.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Allocate a fresh id.
    pub fn next_id(&self) -> ObjectId {
        ObjectId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Add a finished object at the end.
    ///
    /// After [`drain`](Self::drain) the object is handed back instead, and
    /// the caller owns its backing file.
    pub async fn append(&self, object: StoredObject) -> Result<(), StoredObject> {
        let mut objects = self.objects.write().await;
        if self.closed.load(Ordering::Acquire) {
            return Err(object);
        }
        objects.push(object);
        tracing::debug!(count = objects.len(), "Object appended");
        Ok(())
    }

    /// Snapshot of all objects in insertion order.
    pub async fn list(&self) -> Vec<StoredObject> {
        self.objects.read().await.clone()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Resolve an id; [`ObjectId::LATEST`] means the last surviving entry.
    pub async fn find(&self, id: ObjectId) -> Option<StoredObject> {
        let objects = self.objects.read().await;
        resolve(&objects, id).map(|index| objects[index].clone())
    }

    /// Resolve and remove in one step. Two concurrent takes of the same
    /// object get it at most once.
    pub async fn take(&self, id: ObjectId) -> Option<StoredObject> {
        let mut objects = self.objects.write().await;
        let index = resolve(&objects, id)?;
        Some(objects.remove(index))
    }

    /// Remove and return every object, and refuse appends from now on.
    pub async fn drain(&self) -> Vec<StoredObject> {
        let mut objects = self.objects.write().await;
        self.closed.store(true, Ordering::Release);
        std::mem::take(&mut *objects)
    }

    /// Whether [`drain`](Self::drain) has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve(objects: &[StoredObject], id: ObjectId) -> Option<usize> {
    if id.is_latest() {
        objects.len().checked_sub(1)
    } else {
        objects.iter().position(|o| o.id == id)
    }
}
