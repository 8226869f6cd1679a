//! Directory-backed object store.
//!
//! Exposes every regular file under `root` as a flat key made of its relative
//! path with `/` separators. Directories are not objects.
//!
//! A listing scans only the directory holding its prefix. Follow-up pages
//! are served from that scan, so a paginated listing walks the disk once.

use super::{
    paginate, presign_deadline, ListPage, ListRequest, ObjectStoreClient, ObjectSummary,
    PresignMethod,
};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

/// Objects found under one scanned directory, sorted by key.
struct Snapshot {
    dir: String,
    objects: Arc<Vec<ObjectSummary>>,
}

pub struct LocalStore {
    root: PathBuf,
    snapshot: Mutex<Option<Snapshot>>,
}

impl LocalStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            snapshot: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn os_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn map_io(key: &str, err: std::io::Error) -> StoreError {
        if err.kind() == ErrorKind::NotFound {
            StoreError::NoSuchKey(key.to_string())
        } else {
            StoreError::Io(err)
        }
    }

    fn cached(&self, dir: &str) -> Option<Arc<Vec<ObjectSummary>>> {
        self.snapshot
            .lock()
            .as_ref()
            .filter(|snapshot| snapshot.dir == dir)
            .map(|snapshot| snapshot.objects.clone())
    }

    /// Every file under `root/dir`, keyed relative to `root`.
    fn scan(root: &Path, dir: &str) -> Result<Vec<ObjectSummary>, StoreError> {
        let mut objects = Vec::new();
        let start = root.join(dir);
        if !start.is_dir() {
            return Ok(objects);
        }
        for entry in WalkDir::new(&start).follow_links(false) {
            let entry = entry.map_err(|e| StoreError::Other(format!("walk failed: {}", e)))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = match entry.path().strip_prefix(root) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let metadata = entry.metadata().map_err(|e| {
                StoreError::Other(format!("metadata for {}: {}", entry.path().display(), e))
            })?;
            objects.push(ObjectSummary {
                key,
                size: metadata.len(),
                last_modified: modified_time(&metadata),
            });
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}

/// Directory part of a key prefix, up to and including the last `/`.
fn scan_dir(prefix: &str) -> &str {
    match prefix.rfind('/') {
        Some(i) => &prefix[..=i],
        None => "",
    }
}

fn modified_time(metadata: &std::fs::Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH))
}

#[async_trait]
impl ObjectStoreClient for LocalStore {
    async fn list_objects(&self, request: &ListRequest) -> Result<ListPage, StoreError> {
        let dir = scan_dir(&request.prefix).to_string();
        if request.continuation_token.is_some() {
            if let Some(objects) = self.cached(&dir) {
                return Ok(paginate(objects.iter(), request));
            }
        }

        let root = self.root.clone();
        let scan_from = dir.clone();
        let objects = tokio::task::spawn_blocking(move || Self::scan(&root, &scan_from))
            .await
            .map_err(|e| StoreError::Other(format!("join error: {}", e)))??;
        let objects = Arc::new(objects);
        *self.snapshot.lock() = Some(Snapshot {
            dir,
            objects: objects.clone(),
        });
        Ok(paginate(objects.iter(), request))
    }

    async fn get_object(&self, key: &str, offset: u64) -> Result<Vec<u8>, StoreError> {
        let data = tokio::fs::read(self.os_path(key))
            .await
            .map_err(|e| Self::map_io(key, e))?;
        let len = data.len() as u64;
        if offset > len || (offset == len && len > 0) {
            return Err(StoreError::InvalidRange {
                key: key.to_string(),
                offset,
            });
        }
        Ok(data[offset as usize..].to_vec())
    }

    async fn head_object(&self, key: &str) -> Result<ObjectSummary, StoreError> {
        let metadata = tokio::fs::metadata(self.os_path(key))
            .await
            .map_err(|e| Self::map_io(key, e))?;
        if !metadata.is_file() {
            return Err(StoreError::NoSuchKey(key.to_string()));
        }
        Ok(ObjectSummary {
            key: key.to_string(),
            size: metadata.len(),
            last_modified: modified_time(&metadata),
        })
    }

    fn presign(
        &self,
        method: PresignMethod,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        let expires_at = presign_deadline(expires_in)?;
        Ok(format!(
            "file://{}?method={}&expires={}",
            self.os_path(key).display(),
            method.as_str(),
            expires_at.timestamp()
        ))
    }
}
