use std::{path::Path, sync::Arc, time::Duration};

use reelcache_client::{
    ClientConfig, ServiceRegistry, infra::testing::FakeBackend,
};
use reelcache_core::StoreKind;
use reelcache_model::{FileId, ThumbnailData};

fn config(dir: &tempfile::TempDir) -> ClientConfig {
    ClientConfig {
        cache_dir: Some(dir.path().join("cache")),
        streaming_server_url: "127.0.0.1:9".to_string(),
        ..ClientConfig::default()
    }
}

#[tokio::test]
async fn registry_wires_services_over_one_cache() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend::default());
    backend.set_thumbnail(Some(ThumbnailData::new("aGk=")));

    let registry =
        ServiceRegistry::from_config(&config(&dir), backend).unwrap();

    for kind in StoreKind::ALL {
        assert!(registry.cache.store_root(kind).is_dir());
    }
    let file = FileId::new("f1").unwrap();
    registry
        .previews
        .generate_preview(&file, Path::new("/a.mp4"), 16, 9, 0.0)
        .await
        .unwrap();
    assert!(registry.cache.contains(StoreKind::Preview, "f1").await.unwrap());
    assert_eq!(registry.cache.limits(), config(&dir).cache_limits());
}

#[tokio::test]
async fn invalid_streaming_url_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        streaming_server_url: "http://[::1".to_string(),
        ..config(&dir)
    };

    let result =
        ServiceRegistry::from_config(&config, Arc::new(FakeBackend::default()));

    assert!(result.is_err());
}

#[tokio::test]
async fn expiry_sweep_removes_aged_records() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ServiceRegistry::from_config(
        &config(&dir),
        Arc::new(FakeBackend::default()),
    )
    .unwrap();
    registry
        .cache
        .write_at(StoreKind::Subtitle, "old", &"stale".to_string(), 0)
        .await
        .unwrap();
    registry
        .cache
        .write(StoreKind::Subtitle, "new", &"fresh".to_string())
        .await
        .unwrap();

    let handle = registry.spawn_expiry_sweep(Duration::from_millis(20));
    let mut swept = false;
    for _ in 0..100 {
        if !registry.cache.contains(StoreKind::Subtitle, "old").await.unwrap() {
            swept = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.abort();

    assert!(swept);
    assert!(registry.cache.contains(StoreKind::Subtitle, "new").await.unwrap());
    assert!(registry.cache.run_stats().cleanup_runs >= 1);
}
