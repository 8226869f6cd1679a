//! In-memory object store.
//!
//! Keeps the key space in a `BTreeMap`, so listings come back sorted the way a
//! real object store returns them.

use super::{
    paginate, presign_deadline, ListPage, ListRequest, ObjectStoreClient, ObjectSummary,
    PresignMethod,
};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredObject {
    summary: ObjectSummary,
    data: Vec<u8>,
}

pub struct MemoryStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    list_calls: AtomicUsize,
    list_failure: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
            list_calls: AtomicUsize::new(0),
            list_failure: RwLock::new(None),
        }
    }

    pub fn put(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.put_with_time(key, data, Utc::now());
    }

    pub fn put_with_time(
        &self,
        key: impl Into<String>,
        data: impl Into<Vec<u8>>,
        last_modified: DateTime<Utc>,
    ) {
        let key = key.into();
        let data = data.into();
        let summary = ObjectSummary {
            key: key.clone(),
            size: data.len() as u64,
            last_modified,
        };
        self.objects
            .write()
            .insert(key, StoredObject { summary, data });
    }

    /// Number of list calls served so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent list call fail with `StoreError::Other(message)`.
    pub fn fail_listings(&self, message: impl Into<String>) {
        *self.list_failure.write() = Some(message.into());
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ObjectStoreClient for MemoryStore {
    async fn list_objects(&self, request: &ListRequest) -> Result<ListPage, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.list_failure.read().clone() {
            return Err(StoreError::Other(message));
        }
        let objects = self.objects.read();
        Ok(paginate(objects.values().map(|o| &o.summary), request))
    }

    async fn get_object(&self, key: &str, offset: u64) -> Result<Vec<u8>, StoreError> {
        let objects = self.objects.read();
        let object = objects
            .get(key)
            .ok_or_else(|| StoreError::NoSuchKey(key.to_string()))?;
        let len = object.data.len() as u64;
        if offset > len || (offset == len && len > 0) {
            return Err(StoreError::InvalidRange {
                key: key.to_string(),
                offset,
            });
        }
        Ok(object.data[offset as usize..].to_vec())
    }

    async fn head_object(&self, key: &str) -> Result<ObjectSummary, StoreError> {
        self.objects
            .read()
            .get(key)
            .map(|o| o.summary.clone())
            .ok_or_else(|| StoreError::NoSuchKey(key.to_string()))
    }

    fn presign(
        &self,
        method: PresignMethod,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        let expires_at = presign_deadline(expires_in)?;
        Ok(format!(
            "memory://{}/{}?method={}&expires={}",
            self.bucket,
            key,
            method.as_str(),
            expires_at.timestamp()
        ))
    }
}
