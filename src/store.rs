//! Object store contract used by the file service.
//!
//! The transform pipeline never talks to a store; it only sees byte buffers.
//! [`ObjectStore`] is the seam for a network-backed bucket, and
//! [`MemoryStore`] is the in-process implementation.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Metadata of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub content_type: String,
    pub last_modified: SystemTime,
}

/// Key/value blob storage with per-object content type.
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `key`, replacing any previous object.
    fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<ObjectInfo, StoreError>;

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    fn stat(&self, key: &str) -> Result<ObjectInfo, StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Objects whose key starts with `prefix`, newest first.
    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StoreError>;
}

#[derive(Debug)]
struct StoredObject {
    bytes: Vec<u8>,
    info: ObjectInfo,
    /// Monotonic write counter.
    revision: u64,
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<String, StoredObject>,
    next_revision: u64,
}

/// In-memory [`ObjectStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObjectStore for MemoryStore {
    fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<ObjectInfo, StoreError> {
        if key.is_empty() {
            return Err(StoreError::Backend("object key must not be empty".into()));
        }
        let info = ObjectInfo {
            key: key.to_string(),
            size: bytes.len() as u64,
            content_type: content_type.to_string(),
            last_modified: SystemTime::now(),
        };
        let mut inner = self.lock();
        let revision = inner.next_revision;
        inner.next_revision += 1;
        inner.objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                info: info.clone(),
                revision,
            },
        );
        Ok(info)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.lock()
            .objects
            .get(key)
            .map(|obj| obj.bytes.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn stat(&self, key: &str) -> Result<ObjectInfo, StoreError> {
        self.lock()
            .objects
            .get(key)
            .map(|obj| obj.info.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock()
            .objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StoreError> {
        let inner = self.lock();
        let mut matches: Vec<&StoredObject> = inner
            .objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, obj)| obj)
            .collect();
        // Revisions follow write order, which is last-modified order here
        // even when two writes share a clock tick.
        matches.sort_by(|a, b| b.revision.cmp(&a.revision));
        Ok(matches.into_iter().map(|obj| obj.info.clone()).collect())
    }
}
