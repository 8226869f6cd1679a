//! Driver over a directory tree on disk.

use shardfs::{DriverConfig, DriverFactory, LocalStore, ObjectStoreClient, StorageDriver};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn layout() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("data/9f")).unwrap();
    fs::create_dir_all(root.join("data/scratch/nested")).unwrap();
    fs::write(
        root.join("meta.json"),
        r#"{"/blobs/sha256/9f/9f2a/data": "9f2a0c77"}"#,
    )
    .unwrap();
    fs::write(root.join("data/9f/9f2a0c77"), "layer").unwrap();
    fs::write(root.join("data/scratch/nested/a"), "a").unwrap();
    fs::write(root.join("data/scratch/top"), "top").unwrap();
    dir
}

fn config() -> DriverConfig {
    DriverConfig {
        bucket: "local".to_string(),
        root_directory: "/data".to_string(),
        metadata_path: "../meta.json".to_string(),
        ..DriverConfig::default()
    }
}

#[tokio::test]
async fn test_local_registry_reads() {
    let dir = layout();
    let store = Arc::new(LocalStore::new(dir.path().to_path_buf()));
    let driver = DriverFactory::create(config(), store).await.unwrap();

    let blob = "/docker/registry/v2/blobs/sha256/9f/9f2a/data";
    assert_eq!(driver.get_content(blob).await.unwrap(), b"layer");
    assert_eq!(driver.reader(blob, 3).await.unwrap(), b"er");

    let info = driver.stat(blob).await.unwrap();
    assert!(!info.is_dir);
    assert_eq!(info.size, 5);
    assert!(driver.stat("/scratch").await.unwrap().is_dir);
}

#[tokio::test]
async fn test_local_registry_listing() {
    let dir = layout();
    let store = Arc::new(LocalStore::new(dir.path().to_path_buf()));
    let driver = DriverFactory::create(config(), store).await.unwrap();

    assert_eq!(
        driver.list("/scratch").await.unwrap(),
        vec!["/scratch/top", "/scratch/nested"]
    );
    assert_eq!(driver.list("/").await.unwrap(), vec!["/9f", "/scratch"]);
}

#[tokio::test]
async fn test_local_presign_points_at_translated_file() {
    let dir = layout();
    let store = Arc::new(LocalStore::new(dir.path().to_path_buf()));
    let head = store.head_object("data/9f/9f2a0c77").await.unwrap();
    assert_eq!(head.size, 5);

    let driver = DriverFactory::create(config(), store).await.unwrap();
    let url = driver
        .url_for("/docker/registry/v2/blobs/sha256/9f/9f2a/data", Some("HEAD"), None)
        .await
        .unwrap();
    assert!(url.starts_with("file://"));
    assert!(url.contains("data/9f/9f2a0c77?method=HEAD"));
}
