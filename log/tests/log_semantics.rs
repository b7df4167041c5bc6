//! End-to-end behavior of the commit log through its public API.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use common::StorageConfig;
use commitlog::{CommitLog, Config, LogEntry, Offset, RetryConfig};

async fn open_log() -> Arc<CommitLog> {
    let config = Config {
        storage: StorageConfig::InMemory,
        retry: RetryConfig {
            initial_backoff: Duration::from_micros(50),
            max_backoff: Duration::from_millis(5),
            timeout: Duration::from_secs(30),
        },
        ..Default::default()
    };
    Arc::new(CommitLog::open(config).await.expect("Failed to open log"))
}

fn offsets(pairs: &[(&str, Offset)]) -> HashMap<String, Offset> {
    pairs.iter().map(|(k, o)| (k.to_string(), *o)).collect()
}

#[tokio::test]
async fn should_send_poll_commit_and_list() {
    // given
    let log = open_log().await;

    // when
    let first = log.send("x", 10).await.unwrap();
    let second = log.send("x", 20).await.unwrap();
    let polled = log.poll(offsets(&[("x", 1000)])).await.unwrap();
    log.commit_offsets(offsets(&[("x", 1000)])).await.unwrap();
    let committed = log.list_committed_offsets(&["x".to_string()]).await.unwrap();

    // then
    assert_eq!(first, 1000);
    assert_eq!(second, 1001);
    assert_eq!(
        polled["x"],
        vec![LogEntry::new(1000, 10), LogEntry::new(1001, 20)]
    );
    assert_eq!(committed, offsets(&[("x", 1000)]));
}

#[tokio::test]
async fn should_cap_poll_at_batch_size() {
    // given
    let log = open_log().await;
    for msg in 1..=5 {
        log.send("k", msg).await.unwrap();
    }

    // when
    let first = log.poll(offsets(&[("k", 0)])).await.unwrap();
    let rest = log.poll(offsets(&[("k", 1003)])).await.unwrap();

    // then
    assert_eq!(
        first["k"],
        vec![
            LogEntry::new(1000, 1),
            LogEntry::new(1001, 2),
            LogEntry::new(1002, 3)
        ]
    );
    assert_eq!(rest["k"], vec![LogEntry::new(1003, 4), LogEntry::new(1004, 5)]);
}

#[tokio::test]
async fn should_number_each_key_independently() {
    // given
    let log = open_log().await;

    // when
    let a = log.send("a", 1).await.unwrap();
    let b = log.send("b", 2).await.unwrap();
    let a2 = log.send("a", 3).await.unwrap();

    // then
    assert_eq!((a, b, a2), (1000, 1000, 1001));
}

#[tokio::test]
async fn should_return_empty_sequence_for_unknown_key() {
    // given
    let log = open_log().await;

    // when
    let polled = log.poll(offsets(&[("missing", 0)])).await.unwrap();

    // then
    assert_eq!(polled.len(), 1);
    assert!(polled["missing"].is_empty());
}

#[tokio::test]
async fn should_keep_highest_committed_offset() {
    // given
    let log = open_log().await;
    log.commit_offsets(offsets(&[("k", 5)])).await.unwrap();

    // when
    log.commit_offsets(offsets(&[("k", 3)])).await.unwrap();
    let committed = log.list_committed_offsets(&["k".to_string()]).await.unwrap();

    // then
    assert_eq!(committed, offsets(&[("k", 5)]));
}

#[tokio::test]
async fn should_omit_never_committed_keys_from_listing() {
    // given
    let log = open_log().await;
    log.send("sent-only", 1).await.unwrap();

    // when
    let committed = log
        .list_committed_offsets(&["sent-only".to_string(), "unknown".to_string()])
        .await
        .unwrap();

    // then
    assert!(committed.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_assign_unique_contiguous_offsets_under_concurrent_sends() {
    // given
    let log = open_log().await;
    let senders = 16;
    let per_sender = 10;

    // when
    let mut handles = Vec::new();
    for sender in 0..senders {
        let log = log.clone();
        handles.push(tokio::spawn(async move {
            let mut assigned = Vec::new();
            for i in 0..per_sender {
                let msg = (sender * per_sender + i) as i64;
                assigned.push((log.send("shared", msg).await.unwrap(), msg));
            }
            assigned
        }));
    }
    let mut assigned = Vec::new();
    for handle in handles {
        assigned.extend(handle.await.unwrap());
    }

    // then
    let total = (senders * per_sender) as u64;
    let unique: HashSet<Offset> = assigned.iter().map(|(offset, _)| *offset).collect();
    assert_eq!(unique.len() as u64, total);
    assert_eq!(unique, (1000..1000 + total).collect::<HashSet<_>>());
    for (offset, msg) in assigned {
        let polled = log.poll(offsets(&[("shared", offset)])).await.unwrap();
        assert_eq!(polled["shared"][0], LogEntry::new(offset, msg));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_preserve_per_sender_order_under_concurrent_sends() {
    // given
    let log = open_log().await;

    // when
    let mut handles = Vec::new();
    for _ in 0..8 {
        let log = log.clone();
        handles.push(tokio::spawn(async move {
            let mut offsets = Vec::new();
            for msg in 0..10 {
                offsets.push(log.send("ordered", msg).await.unwrap());
            }
            offsets
        }));
    }

    // then
    for handle in handles {
        let offsets = handle.await.unwrap();
        assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_never_regress_committed_offset_under_concurrent_commits() {
    // given
    let log = open_log().await;

    // when
    let mut handles = Vec::new();
    for offset in [1003, 1000, 1007, 1001, 1005, 1002, 1006, 1004] {
        let log = log.clone();
        handles.push(tokio::spawn(async move {
            log.commit_offsets(offsets(&[("k", offset)])).await.unwrap();
            log.list_committed_offsets(&["k".to_string()]).await.unwrap()["k"]
        }));
    }
    let mut observed = Vec::new();
    for handle in handles {
        observed.push(handle.await.unwrap());
    }

    // then
    assert!(observed.iter().all(|committed| *committed >= 1000));
    let committed = log.list_committed_offsets(&["k".to_string()]).await.unwrap();
    assert_eq!(committed["k"], 1007);
}
