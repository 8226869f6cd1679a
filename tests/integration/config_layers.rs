//! Configuration files feeding driver construction.

use shardfs::{ConfigLoader, DriverError, DriverFactory, MemoryStore};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_driver_from_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shardfs.toml");
    std::fs::write(
        &path,
        "bucket = \"artifacts\"\nroot_directory = \"/r\"\nmetadata_path = \"/m.json\"\npresign_expiry_secs = 60\n",
    )
    .unwrap();
    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(config.presign_expiry().as_secs(), 60);

    let store = Arc::new(MemoryStore::new("artifacts"));
    store.put("r/m.json", b"{}".to_vec());
    let driver = DriverFactory::create(config, store).await.unwrap();
    assert!(driver.translator().metadata().is_empty());
}

#[tokio::test]
async fn test_out_of_range_page_size_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shardfs.toml");
    std::fs::write(
        &path,
        "bucket = \"artifacts\"\nmetadata_path = \"/m.json\"\nlist_page_size = 5000\n",
    )
    .unwrap();
    let config = ConfigLoader::load_from_file(&path).unwrap();

    let store = Arc::new(MemoryStore::new("artifacts"));
    store.put("m.json", b"{}".to_vec());
    let err = DriverFactory::create(config, store).await.err().unwrap();
    assert!(matches!(err, DriverError::Config(_)));
}

#[tokio::test]
async fn test_relative_metadata_without_root_is_rejected() {
    let mut config = ConfigLoader::default();
    config.bucket = "artifacts".to_string();
    config.metadata_path = "../m.json".to_string();
    let store = Arc::new(MemoryStore::new("artifacts"));
    let err = DriverFactory::create(config, store).await.err().unwrap();
    assert!(matches!(err, DriverError::Config(_)));
}
