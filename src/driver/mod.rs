//! Storage Driver
//!
//! Read-only registry storage driver over a flat object store. Registry paths
//! under `/docker/registry` are translated into sharded content locations;
//! listings and walks expose the store's keys as a virtual directory tree.
//!
//! Writes, moves and deletes are not supported and fail without side effects.

pub mod factory;

pub use factory::DriverFactory;

use crate::config::DriverConfig;
use crate::error::{DriverError, Result, StoreError};
use crate::lister::{KeySpace, Lister};
use crate::store::{ListPage, ListRequest, ObjectStoreClient, PresignMethod};
use crate::translate::{MetadataMap, PathTranslator};
use crate::types::{FileInfo, VirtualPath};
use crate::walk::{WalkEngine, WalkFn, WalkOptions, WalkSummary};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Name reported by [`StorageDriver::name`].
pub const DRIVER_NAME: &str = "shardfs";

/// Registry storage driver operations.
///
/// Every path argument is an absolute virtual path.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whole content of `path`. Descriptor paths yield the synthesized
    /// `algorithm:fragment` bytes without touching the store.
    async fn get_content(&self, path: &str) -> Result<Vec<u8>>;

    async fn put_content(&self, path: &str, contents: &[u8]) -> Result<()>;

    /// Content of `path` from `offset` to the end; empty past end-of-object.
    async fn reader(&self, path: &str, offset: u64) -> Result<Vec<u8>>;

    async fn writer(&self, path: &str, append: bool) -> Result<()>;

    async fn stat(&self, path: &str) -> Result<FileInfo>;

    /// Direct children of `path`: files first, then directories.
    async fn list(&self, path: &str) -> Result<Vec<String>>;

    async fn move_object(&self, source: &str, dest: &str) -> Result<()>;

    async fn delete(&self, path: &str) -> Result<()>;

    /// Presigned URL for `path`. `method` defaults to `GET`; `expiry` to the
    /// configured lifetime.
    async fn url_for(
        &self,
        path: &str,
        method: Option<&str>,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<String>;

    /// Pre-order traversal of everything beneath `from`.
    async fn walk(
        &self,
        from: &str,
        options: WalkOptions,
        visitor: &mut dyn WalkFn,
    ) -> Result<WalkSummary>;
}

/// Driver over one bucket and root directory.
pub struct ShardDriver {
    client: Arc<dyn ObjectStoreClient>,
    keys: KeySpace,
    lister: Lister,
    engine: WalkEngine,
    translator: PathTranslator,
    presign_expiry: Duration,
}

impl ShardDriver {
    /// Assemble a driver from an already loaded metadata map.
    ///
    /// Use [`DriverFactory::create`] to validate configuration and load the
    /// map from the store.
    pub fn new(
        config: &DriverConfig,
        client: Arc<dyn ObjectStoreClient>,
        metadata: MetadataMap,
    ) -> Self {
        let keys = KeySpace::new(&config.root_directory);
        let lister = Lister::with_page_size(client.clone(), keys.clone(), config.list_page_size);
        Self {
            client,
            keys,
            engine: WalkEngine::new(lister.clone()),
            lister,
            translator: PathTranslator::new(metadata),
            presign_expiry: config.presign_expiry(),
        }
    }

    pub fn translator(&self) -> &PathTranslator {
        &self.translator
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// Physical key backing a virtual path.
    pub fn key_of(&self, path: &VirtualPath) -> Result<String> {
        let physical = self.translator.translate(path)?;
        Ok(self.keys.key_for(physical.as_str()).into_string())
    }

    async fn list_page(&self, path: &VirtualPath, request: &ListRequest) -> Result<ListPage> {
        self.client
            .list_objects(request)
            .await
            .map_err(|e| DriverError::from_store(path.as_str(), e))
    }

    /// A sibling such as `a/b.txt` sorts ahead of `a/b/...`, so a miss on the
    /// first probe is retried under the directory prefix.
    async fn has_children(&self, path: &VirtualPath, key: &str) -> Result<bool> {
        let request = ListRequest::new(format!("{}/", key), 1);
        let page = self.list_page(path, &request).await?;
        Ok(!page.contents.is_empty() || !page.common_prefixes.is_empty())
    }
}

fn presign_method(method: Option<&str>) -> Result<PresignMethod> {
    match method.unwrap_or("GET") {
        "GET" => Ok(PresignMethod::Get),
        "HEAD" => Ok(PresignMethod::Head),
        _ => Err(DriverError::Unsupported {
            operation: "url_for method",
        }),
    }
}

#[async_trait]
impl StorageDriver for ShardDriver {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    async fn get_content(&self, path: &str) -> Result<Vec<u8>> {
        let vpath = VirtualPath::new(path)?;
        if PathTranslator::is_descriptor(&vpath) {
            let descriptor = self.translator.descriptor(&vpath)?;
            debug!(path = %vpath, "synthesized descriptor");
            return Ok(descriptor.into_bytes());
        }
        self.reader(path, 0).await
    }

    async fn put_content(&self, _path: &str, _contents: &[u8]) -> Result<()> {
        Err(DriverError::Unsupported {
            operation: "put_content",
        })
    }

    async fn reader(&self, path: &str, offset: u64) -> Result<Vec<u8>> {
        let vpath = VirtualPath::new(path)?;
        let key = self.key_of(&vpath)?;
        match self.client.get_object(&key, offset).await {
            Ok(bytes) => {
                debug!(path = %vpath, key = %key, offset, bytes = bytes.len(), "read object");
                Ok(bytes)
            }
            Err(StoreError::InvalidRange { .. }) => Ok(Vec::new()),
            Err(e) => Err(DriverError::from_store(vpath.as_str(), e)),
        }
    }

    async fn writer(&self, _path: &str, _append: bool) -> Result<()> {
        Err(DriverError::Unsupported { operation: "writer" })
    }

    async fn stat(&self, path: &str) -> Result<FileInfo> {
        let vpath = VirtualPath::new(path)?;
        let key = self.key_of(&vpath)?;
        let page = self.list_page(&vpath, &ListRequest::new(key.clone(), 1)).await?;

        if let Some(object) = page.contents.first() {
            if object.key == key {
                return Ok(FileInfo::file(
                    vpath.as_str(),
                    object.size,
                    object.last_modified,
                ));
            }
            let under = key.is_empty() || object.key.starts_with(&format!("{}/", key));
            if under || self.has_children(&vpath, &key).await? {
                return Ok(FileInfo::directory(vpath.as_str()));
            }
            return Err(DriverError::not_found(vpath.as_str()));
        }
        if !page.common_prefixes.is_empty() {
            return Ok(FileInfo::directory(vpath.as_str()));
        }
        Err(DriverError::not_found(vpath.as_str()))
    }

    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let vpath = VirtualPath::new(path)?;
        let listing = self.lister.shallow(&vpath).await?;
        if listing.is_empty() && !vpath.is_root() {
            return Err(DriverError::not_found(vpath.as_str()));
        }
        Ok(listing.into_paths())
    }

    async fn move_object(&self, _source: &str, _dest: &str) -> Result<()> {
        Err(DriverError::Unsupported { operation: "move" })
    }

    async fn delete(&self, _path: &str) -> Result<()> {
        Err(DriverError::Unsupported { operation: "delete" })
    }

    async fn url_for(
        &self,
        path: &str,
        method: Option<&str>,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<String> {
        let vpath = VirtualPath::new(path)?;
        let method = presign_method(method)?;
        let key = self.key_of(&vpath)?;
        // An expiry already in the past presigns with zero lifetime.
        let expires_in = match expiry {
            Some(at) => (at - Utc::now()).to_std().unwrap_or(Duration::ZERO),
            None => self.presign_expiry,
        };
        self.client
            .presign(method, &key, expires_in)
            .map_err(|e| DriverError::from_store(vpath.as_str(), e))
    }

    async fn walk(
        &self,
        from: &str,
        options: WalkOptions,
        visitor: &mut dyn WalkFn,
    ) -> Result<WalkSummary> {
        let from = VirtualPath::new(from)?;
        self.engine
            .walk(&from, options.start_after_hint.as_deref(), visitor)
            .await
    }
}
