//! shardfs: Read-Only Registry Storage over Sharded Object Keys
//!
//! Presents a flat object store as a hierarchical filesystem for a container
//! registry. Registry paths are translated through a metadata map into
//! content-addressed shard locations, and directories are inferred from the
//! sorted key space instead of being stored.

pub mod config;
pub mod driver;
pub mod error;
pub mod lister;
pub mod logging;
pub mod store;
pub mod tooling;
pub mod translate;
pub mod types;
pub mod walk;

pub use config::{ConfigLoader, DriverConfig};
pub use driver::{DriverFactory, ShardDriver, StorageDriver};
pub use error::{DriverError, StoreError};
pub use lister::{KeySpace, Lister, Listing, PageCursor};
pub use store::{LocalStore, MemoryStore, ObjectStoreClient};
pub use translate::{MetadataMap, PathTranslator};
pub use types::{FileInfo, ObjectKey, VirtualPath};
pub use walk::{WalkControl, WalkEngine, WalkFn, WalkOptions, WalkSummary};
