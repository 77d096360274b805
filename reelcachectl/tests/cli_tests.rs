use assert_cmd::cargo::cargo_bin_cmd;
use reelcache_core::{CacheLimits, MultiStoreCache, StoreKind};

fn run(cache_dir: &std::path::Path, args: &[&str]) -> String {
    let mut cmd = cargo_bin_cmd!("reelcachectl");
    let output = cmd
        .arg("--cache-dir")
        .arg(cache_dir)
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8_lossy(&output).into_owned()
}

async fn seeded_cache(root: &std::path::Path) {
    let cache = MultiStoreCache::open(root, CacheLimits::defaults()).unwrap();
    cache
        .write_at(StoreKind::Preview, "old-clip", &"aGVsbG8=".to_string(), 0)
        .await
        .unwrap();
    cache
        .write(StoreKind::Frames, "new-clip", &vec![1, 2, 3])
        .await
        .unwrap();
}

#[test]
fn help_lists_every_command() {
    let mut cmd = cargo_bin_cmd!("reelcachectl");
    let output = cmd
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    for command in ["stats", "sweep", "evict", "clear", "ls"] {
        assert!(text.contains(command), "help missing '{command}'");
    }

    let mut cmd = cargo_bin_cmd!("reelcachectl");
    let output = cmd
        .args(["evict", "--help"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("--bytes"));
}

#[test]
fn unknown_store_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("reelcachectl");
    cmd.arg("--cache-dir")
        .arg(dir.path())
        .args(["clear", "--store", "thumbnails"])
        .assert()
        .failure();
}

#[tokio::test]
async fn stats_ls_and_sweep_operate_on_the_cache_dir() {
    let dir = tempfile::tempdir().unwrap();
    seeded_cache(dir.path()).await;

    let stats = run(dir.path(), &["stats"]);
    assert!(stats.contains("preview-store"), "{stats}");
    assert!(stats.contains("frame-store"), "{stats}");

    let listing = run(dir.path(), &["ls", "--store", "all"]);
    assert!(listing.contains("old-clip"), "{listing}");
    assert!(listing.contains("new-clip"), "{listing}");

    let swept = run(dir.path(), &["sweep"]);
    assert!(swept.contains("swept 1 records"), "{swept}");

    let listing = run(dir.path(), &["ls", "--store", "all"]);
    assert!(!listing.contains("old-clip"), "{listing}");
    assert!(listing.contains("new-clip"), "{listing}");
}

#[tokio::test]
async fn evict_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    seeded_cache(dir.path()).await;

    let evicted = run(dir.path(), &["evict", "--bytes", "1"]);
    assert!(evicted.contains("evicted 1 records"), "{evicted}");

    let cleared = run(dir.path(), &["clear", "--store", "frames"]);
    assert!(cleared.contains("cleared frame-store"), "{cleared}");

    let listing = run(dir.path(), &["ls", "--store", "all"]);
    assert!(listing.trim().is_empty(), "{listing}");
}
