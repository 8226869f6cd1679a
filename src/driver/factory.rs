//! Driver construction.
//!
//! A driver only exists once its configuration validated and its metadata map
//! loaded; either failure is reported as `DriverError::Config`.

use super::ShardDriver;
use crate::config::DriverConfig;
use crate::error::{DriverError, Result};
use crate::lister::KeySpace;
use crate::store::ObjectStoreClient;
use crate::translate::MetadataMap;
use std::sync::Arc;
use tracing::info;

pub struct DriverFactory;

impl DriverFactory {
    pub async fn create(
        config: DriverConfig,
        client: Arc<dyn ObjectStoreClient>,
    ) -> Result<ShardDriver> {
        config.validate()?;

        let keys = KeySpace::new(&config.root_directory);
        let key = metadata_key(&keys, &config.metadata_path);
        let bytes = client.get_object(&key, 0).await.map_err(|e| {
            DriverError::Config(format!(
                "failed to read metadata from path: {}: {}",
                config.metadata_location(),
                e
            ))
        })?;
        let metadata = MetadataMap::from_json(&bytes)?;

        info!(
            bucket = %config.bucket,
            root_directory = %config.root_directory,
            metadata_key = %key,
            entries = metadata.len(),
            "driver ready"
        );
        Ok(ShardDriver::new(&config, client, metadata))
    }
}

/// Key of the metadata object relative to the root directory, with `.` and
/// `..` segments resolved.
pub fn metadata_key(keys: &KeySpace, metadata_path: &str) -> String {
    let path = if metadata_path.starts_with('/') {
        metadata_path.to_string()
    } else {
        format!("/{}", metadata_path)
    };
    let raw = keys.key_for(&path);

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.as_str().split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::StorageDriver;
    use crate::store::MemoryStore;

    fn config(root: &str, metadata: &str) -> DriverConfig {
        DriverConfig {
            bucket: "registry".to_string(),
            root_directory: root.to_string(),
            metadata_path: metadata.to_string(),
            ..DriverConfig::default()
        }
    }

    #[test]
    fn test_metadata_key_resolution() {
        assert_eq!(metadata_key(&KeySpace::new(""), "/meta.json"), "meta.json");
        assert_eq!(
            metadata_key(&KeySpace::new("/data/registry"), "/meta.json"),
            "data/registry/meta.json"
        );
        assert_eq!(
            metadata_key(&KeySpace::new("/data/registry"), "../meta.json"),
            "data/meta.json"
        );
        assert_eq!(
            metadata_key(&KeySpace::new("/data"), "./sub/meta.json"),
            "data/sub/meta.json"
        );
    }

    #[tokio::test]
    async fn test_create_loads_metadata() {
        let store = Arc::new(MemoryStore::new("registry"));
        store.put("meta.json", br#"{"/blobs/x": "cafe01"}"#.to_vec());
        store.put("data/ca/cafe01", b"blob".to_vec());

        let driver = DriverFactory::create(config("/data", "../meta.json"), store)
            .await
            .unwrap();
        assert_eq!(driver.translator().metadata().len(), 1);
        assert_eq!(
            driver
                .get_content("/docker/registry/v2/blobs/x")
                .await
                .unwrap(),
            b"blob"
        );
    }

    #[tokio::test]
    async fn test_missing_metadata_fails_construction() {
        let store = Arc::new(MemoryStore::new("registry"));
        let err = DriverFactory::create(config("", "/meta.json"), store)
            .await
            .err()
            .unwrap();
        match err {
            DriverError::Config(msg) => assert!(msg.contains("/meta.json")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_metadata_fails_construction() {
        let store = Arc::new(MemoryStore::new("registry"));
        store.put("meta.json", b"[1, 2, 3]".to_vec());
        let err = DriverFactory::create(config("", "/meta.json"), store)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DriverError::Config(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_skips_store() {
        let store = Arc::new(MemoryStore::new("registry"));
        let mut cfg = config("", "/meta.json");
        cfg.bucket.clear();
        let err = DriverFactory::create(cfg, store.clone()).await.err().unwrap();
        assert!(matches!(err, DriverError::Config(_)));
        assert_eq!(store.list_calls(), 0);
    }
}
