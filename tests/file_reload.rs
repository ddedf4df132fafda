//! Hot reload behaviour of the file backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use dynamic_config::matching::Resource;
use dynamic_config::protocol::ConfigRequest;
use dynamic_config::{ConfigService, ServiceBuilder};

mod common;

const WATCH_TIMEOUT: Duration = Duration::from_secs(10);

fn setup(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schedules.yaml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

async fn fingerprint(service: &ConfigService) -> Vec<u8> {
    service
        .backend()
        .fingerprint(&Resource::new())
        .await
        .unwrap()
}

async fn periods(service: &ConfigService) -> Vec<u32> {
    service
        .get_config(ConfigRequest::default())
        .await
        .unwrap()
        .metric_config
        .unwrap()
        .schedules
        .iter()
        .map(|s| s.period_sec)
        .collect()
}

async fn changed_since(service: &ConfigService, before: &[u8]) -> bool {
    common::wait_until(WATCH_TIMEOUT, move || async move {
        fingerprint(service).await != before
    })
    .await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hot_reload_picks_up_new_schedules() {
    let (_dir, path) = setup(&common::schedule_yaml("MIN_5"));
    let service = ServiceBuilder::new().local_file(&path).build().unwrap();
    let before = fingerprint(&service).await;
    assert_eq!(periods(&service).await, vec![300]);

    common::write_atomically(&path, &common::schedule_yaml("SEC_10"));

    let reloaded = changed_since(&service, &before).await;
    assert!(reloaded, "schedule change was not picked up");
    assert_eq!(periods(&service).await, vec![10]);

    service.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bad_reload_keeps_last_good_config() {
    let (_dir, path) = setup(&common::schedule_yaml("MIN_5"));
    let service = ServiceBuilder::new().local_file(&path).build().unwrap();
    let before = fingerprint(&service).await;

    common::write_atomically(&path, "Schedules:\n  - Period: MIN_5\n    Typo: true\n");
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(fingerprint(&service).await, before);
    assert_eq!(periods(&service).await, vec![300]);

    common::write_atomically(&path, "Schedules:\n  - Period: \"-30\"\n");
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(fingerprint(&service).await, before);

    // The watcher survives bad edits and still applies the next good one.
    common::write_atomically(&path, &common::schedule_yaml("DAY_1"));
    let reloaded = changed_since(&service, &before).await;
    assert!(reloaded);
    assert_eq!(periods(&service).await, vec![86400]);

    service.close();
}

/// Mounted config volumes publish a new version by swapping a `..data`
/// symlink; the schedule file itself is a link through it and never changes.
#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reload_follows_symlink_swap() {
    use std::fs;
    use std::os::unix::fs::symlink;

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::create_dir(root.join("..v1")).unwrap();
    fs::write(root.join("..v1/schedules.yaml"), common::schedule_yaml("MIN_5")).unwrap();
    symlink("..v1", root.join("..data")).unwrap();
    symlink("..data/schedules.yaml", root.join("schedules.yaml")).unwrap();

    let path = root.join("schedules.yaml");
    let service = ServiceBuilder::new().local_file(&path).build().unwrap();
    let before = fingerprint(&service).await;
    assert_eq!(periods(&service).await, vec![300]);

    fs::create_dir(root.join("..v2")).unwrap();
    fs::write(root.join("..v2/schedules.yaml"), common::schedule_yaml("SEC_10")).unwrap();
    symlink("..v2", root.join("..data_tmp")).unwrap();
    fs::rename(root.join("..data_tmp"), root.join("..data")).unwrap();

    let reloaded = changed_since(&service, &before).await;
    assert!(reloaded, "symlink swap was not picked up");
    assert_eq!(periods(&service).await, vec![10]);

    service.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_never_fail_during_reload() {
    let (_dir, path) = setup(&common::schedule_yaml("MIN_1"));
    let service = Arc::new(ServiceBuilder::new().local_file(&path).build().unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            let done = done.clone();
            tokio::spawn(async move {
                let mut polls = 0u32;
                while !done.load(Ordering::Relaxed) {
                    let response = service.get_config(ConfigRequest::default()).await.unwrap();
                    let schedules = response.metric_config.unwrap().schedules;
                    // Every reader sees one whole file version.
                    assert_eq!(schedules.len(), 1);
                    polls += 1;
                    tokio::task::yield_now().await;
                }
                polls
            })
        })
        .collect();

    for period in ["MIN_5", "SEC_30", "HR_2", "MIN_10"] {
        common::write_atomically(&path, &common::schedule_yaml(period));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    done.store(true, Ordering::Relaxed);

    for result in join_all(readers).await {
        assert!(result.unwrap() > 0);
    }

    service.close();
}

#[tokio::test]
async fn test_resource_matching_modes_over_http() {
    let yaml = r#"
Schedules:
  - Period: MIN_1
ConfigBlocks:
  - Resource: ["service:orders"]
    Schedules:
      - Period: SEC_5
"#;
    let (_dir, path) = setup(yaml);
    let client = reqwest::Client::new();
    let body = serde_json::json!({});

    let matching = common::spawn_server(ServiceBuilder::new().local_file(&path).build().unwrap()).await;
    let global = common::spawn_server(
        ServiceBuilder::new()
            .local_file(&path)
            .resource_matching(false)
            .build()
            .unwrap(),
    )
    .await;

    let matched: serde_json::Value = client
        .post(matching.config_url())
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(matched["metric_config"]["schedules"].as_array().unwrap().len(), 1);

    let merged: serde_json::Value = client
        .post(global.config_url())
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(merged["metric_config"]["schedules"].as_array().unwrap().len(), 2);

    matching.stop().await;
    global.stop().await;
}
