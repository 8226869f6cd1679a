//! Driver behaviour over an in-memory bucket laid out like a sharded registry.

use shardfs::{
    DriverConfig, DriverError, DriverFactory, FileInfo, MemoryStore, ShardDriver, StorageDriver,
    WalkControl, WalkOptions,
};
use std::sync::Arc;

const TAG_LINK: &str =
    "/docker/registry/v2/repositories/library/alpine/_manifests/tags/3.19/current/link";
const LAYER: &str = "/docker/registry/v2/blobs/sha256/4b/4bcff639/data";

async fn registry(page_size: usize) -> (Arc<MemoryStore>, ShardDriver) {
    let store = Arc::new(MemoryStore::new("artifacts"));
    store.put(
        "registry/metadata.json",
        serde_json::json!({
            "/repositories/library/alpine/_manifests/tags/3.19/current/link": "4bcff639aa",
            "/blobs/sha256/4b/4bcff639/data": "4bcff639aa",
        })
        .to_string()
        .into_bytes(),
    );
    store.put("registry/4b/4bcff639aa", b"{\"schemaVersion\":2}".to_vec());
    store.put("registry/library/alpine/_uploads/u1/data", b"partial".to_vec());
    store.put("registry/library/alpine/_uploads/u2/data", b"partial".to_vec());
    store.put("registry/library/busybox/index", b"idx".to_vec());

    let config = DriverConfig {
        bucket: "artifacts".to_string(),
        root_directory: "/registry".to_string(),
        metadata_path: "/metadata.json".to_string(),
        list_page_size: page_size,
        ..DriverConfig::default()
    };
    let driver = DriverFactory::create(config, store.clone()).await.unwrap();
    (store, driver)
}

#[tokio::test]
async fn test_manifest_resolution_through_tag_link() {
    let (_store, driver) = registry(1000).await;
    let digest = driver.get_content(TAG_LINK).await.unwrap();
    assert_eq!(digest, b"sha256:4bcff639aa");

    let manifest = driver.get_content(LAYER).await.unwrap();
    assert_eq!(manifest, b"{\"schemaVersion\":2}");
    assert!(driver.reader(LAYER, 1000).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_walk_with_small_pages_matches_single_page() {
    let (_small_store, small) = registry(1).await;
    let (_large_store, large) = registry(1000).await;

    async fn paths(driver: &ShardDriver) -> Vec<(String, bool)> {
        let mut seen = Vec::new();
        let mut visitor = |info: &FileInfo| {
            seen.push((info.path.clone(), info.is_dir));
            WalkControl::Continue
        };
        driver
            .walk("/library", WalkOptions::default(), &mut visitor)
            .await
            .unwrap();
        seen
    }

    let expected = vec![
        ("/library/alpine".to_string(), true),
        ("/library/alpine/_uploads".to_string(), true),
        ("/library/alpine/_uploads/u1".to_string(), true),
        ("/library/alpine/_uploads/u1/data".to_string(), false),
        ("/library/alpine/_uploads/u2".to_string(), true),
        ("/library/alpine/_uploads/u2/data".to_string(), false),
        ("/library/busybox".to_string(), true),
        ("/library/busybox/index".to_string(), false),
    ];
    assert_eq!(paths(&small).await, expected);
    assert_eq!(paths(&large).await, expected);
}

#[tokio::test]
async fn test_skip_and_resume() {
    let (_store, driver) = registry(2).await;
    let mut seen = Vec::new();
    let mut visitor = |info: &FileInfo| {
        seen.push(info.path.clone());
        if info.path == "/library/alpine/_uploads" {
            WalkControl::SkipSubtree
        } else {
            WalkControl::Continue
        }
    };
    driver
        .walk("/library", WalkOptions::default(), &mut visitor)
        .await
        .unwrap();
    assert_eq!(
        seen,
        vec![
            "/library/alpine",
            "/library/alpine/_uploads",
            "/library/busybox",
            "/library/busybox/index",
        ]
    );

    let mut resumed = Vec::new();
    let mut visitor = |info: &FileInfo| {
        resumed.push(info.path.clone());
        WalkControl::Continue
    };
    let options = WalkOptions {
        start_after_hint: Some("/library/alpine/_uploads/u2/data".to_string()),
    };
    driver.walk("/library", options, &mut visitor).await.unwrap();
    assert_eq!(resumed, vec!["/library/busybox", "/library/busybox/index"]);
}

#[tokio::test]
async fn test_visitor_failure_is_reported() {
    let (_store, driver) = registry(1000).await;
    let mut visitor = |info: &FileInfo| {
        if info.path.ends_with("/index") {
            WalkControl::Fail(format!("unexpected index at {}", info.path))
        } else {
            WalkControl::Continue
        }
    };
    let err = driver
        .walk("/", WalkOptions::default(), &mut visitor)
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::Walk(ref d) if d == "unexpected index at /library/busybox/index"));
}

#[tokio::test]
async fn test_concurrent_walks_share_one_driver() {
    let (store, driver) = registry(1).await;
    let driver = Arc::new(driver);

    let walk = |driver: Arc<ShardDriver>| async move {
        let mut count = 0u64;
        let mut visitor = |_: &FileInfo| {
            count += 1;
            WalkControl::Continue
        };
        driver
            .walk("/", WalkOptions::default(), &mut visitor)
            .await
            .map(|summary| (summary.objects_visited, count))
    };

    let first = tokio::spawn(walk(driver.clone()));
    let second = tokio::spawn(walk(driver.clone()));
    let (a, b) = (first.await.unwrap().unwrap(), second.await.unwrap().unwrap());
    assert_eq!(a, b);
    assert_eq!(a.0, a.1);
    assert!(store.list_calls() >= 2);
}

#[tokio::test]
async fn test_listing_errors() {
    let (store, driver) = registry(1000).await;
    assert!(driver.list("/library/nginx").await.unwrap_err().is_not_found());

    store.fail_listings("bucket unavailable");
    match driver.list("/library").await.unwrap_err() {
        DriverError::Transport { path, .. } => assert_eq!(path, "/library"),
        other => panic!("unexpected error: {other:?}"),
    }
}
