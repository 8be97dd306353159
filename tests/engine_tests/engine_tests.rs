//! Tests for Engine
//!
//! These tests verify:
//! - Open/create/destroy lifecycle
//! - Basic get/put and atomic batches
//! - Range iteration order and bounds
//! - Snapshot isolation
//! - Persistence across reopen
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;

use sharedkv::config::WalSyncStrategy;
use sharedkv::engine::{Engine, EngineOptions};
use sharedkv::{KeyValue, KvError, WriteBatch};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn options(create_if_missing: bool) -> EngineOptions {
    EngineOptions {
        create_if_missing,
        sync: WalSyncStrategy::EveryWrite,
    }
}

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(&temp_dir.path().join("db"), options(true)).unwrap();
    (temp_dir, engine)
}

fn keys(entries: &[KeyValue]) -> Vec<Vec<u8>> {
    entries.iter().map(|kv| kv.key.clone()).collect()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_open_missing_without_create_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing");

    match Engine::open(&path, options(false)) {
        Err(KvError::DatabaseNotFound) => {}
        other => panic!("expected DatabaseNotFound, got {:?}", other.err()),
    }
    assert!(!path.exists());
}

#[test]
fn test_open_creates_directory_and_wal() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    let _engine = Engine::open(&path, options(true)).unwrap();

    assert!(path.is_dir());
    assert!(path.join("wal.log").exists());
}

#[test]
fn test_close_rejects_further_operations() {
    let (_temp, engine) = setup_temp_engine();

    engine.close().unwrap();

    assert!(engine.is_closed());
    assert!(matches!(engine.get(b"k"), Err(KvError::DatabaseClosed)));
    assert!(matches!(engine.put(b"k", b"v"), Err(KvError::DatabaseClosed)));
    assert!(matches!(engine.close(), Err(KvError::DatabaseClosed)));
}

#[test]
fn test_destroy_removes_directory() {
    let (temp, engine) = setup_temp_engine();
    engine.put(b"k", b"v").unwrap();
    engine.close().unwrap();
    drop(engine);

    let path = temp.path().join("db");
    Engine::destroy(&path).unwrap();

    assert!(!path.exists());
    assert!(matches!(Engine::destroy(&path), Err(KvError::DatabaseNotFound)));
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_put_get() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(engine.memtable_size(), 0);
    engine.put(b"hello", b"world").unwrap();

    assert_eq!(engine.get(b"hello").unwrap(), Some(b"world".to_vec()));
    assert_eq!(engine.memtable_size(), b"hello".len() + b"world".len());
    assert_eq!(engine.get(b"nonexistent").unwrap(), None);
}

#[test]
fn test_put_overwrite() {
    let (_temp, engine) = setup_temp_engine();

    engine.put(b"key", b"value1").unwrap();
    engine.put(b"key", b"value2").unwrap();

    assert_eq!(engine.get(b"key").unwrap(), Some(b"value2".to_vec()));
    assert_eq!(engine.version_count(b"key"), 1);
}

#[test]
fn test_empty_value_distinct_from_missing() {
    let (_temp, engine) = setup_temp_engine();

    engine.put(b"empty", b"").unwrap();

    assert_eq!(engine.get(b"empty").unwrap(), Some(Vec::new()));
    assert_eq!(engine.get(b"absent").unwrap(), None);
}

#[test]
fn test_write_batch_applies_all_entries() {
    let (_temp, engine) = setup_temp_engine();

    let mut batch = WriteBatch::new();
    batch.put("a", "1").put("b", "2").put("a", "3");
    engine.write(batch).unwrap();

    assert_eq!(engine.get(b"a").unwrap(), Some(b"3".to_vec()));
    assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
    assert_eq!(engine.last_sequence(), 1);
}

#[test]
fn test_empty_batch_is_noop() {
    let (_temp, engine) = setup_temp_engine();

    engine.write(WriteBatch::new()).unwrap();

    assert_eq!(engine.last_sequence(), 0);
}

// =============================================================================
// Iteration Tests
// =============================================================================

#[test]
fn test_lookup_all_in_order() {
    let (_temp, engine) = setup_temp_engine();
    engine.put(b"c", b"3").unwrap();
    engine.put(b"a", b"1").unwrap();
    engine.put(b"b", b"2").unwrap();

    let entries: Vec<KeyValue> = engine.lookup(b"", b"").unwrap().collect();

    assert_eq!(
        entries,
        vec![
            KeyValue::new("a", "1"),
            KeyValue::new("b", "2"),
            KeyValue::new("c", "3")
        ]
    );
}

#[test]
fn test_lookup_half_open_range() {
    let (_temp, engine) = setup_temp_engine();
    for key in ["a", "b", "c", "d"] {
        engine.put(key.as_bytes(), b"v").unwrap();
    }

    let entries: Vec<KeyValue> = engine.lookup(b"b", b"d").unwrap().collect();

    assert_eq!(keys(&entries), vec![b"b".to_vec(), b"c".to_vec()]);
}

#[test]
fn test_lookup_is_stable_against_later_writes() {
    let (_temp, engine) = setup_temp_engine();
    engine.put(b"a", b"1").unwrap();
    engine.put(b"c", b"3").unwrap();

    let mut iter = engine.lookup(b"", b"").unwrap();
    assert_eq!(iter.next().unwrap().key, b"a");

    engine.put(b"b", b"2").unwrap();
    engine.put(b"c", b"changed").unwrap();

    let rest: Vec<KeyValue> = iter.collect();
    assert_eq!(rest, vec![KeyValue::new("c", "3")]);
}

#[test]
fn test_dropped_iterator_releases_snapshot() {
    let (_temp, engine) = setup_temp_engine();

    let iter = engine.lookup(b"", b"").unwrap();
    assert_eq!(engine.live_snapshots(), 1);

    drop(iter);
    assert_eq!(engine.live_snapshots(), 0);
}

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_snapshot_isolation() {
    let (_temp, engine) = setup_temp_engine();
    engine.put(b"k", b"before").unwrap();

    let snapshot = engine.snapshot().unwrap();
    engine.put(b"k", b"after").unwrap();
    engine.put(b"new", b"x").unwrap();

    assert_eq!(snapshot.get(b"k"), Some(b"before".to_vec()));
    assert_eq!(snapshot.get(b"new"), None);
    assert_eq!(engine.get(b"k").unwrap(), Some(b"after".to_vec()));

    let seen: Vec<KeyValue> = snapshot.lookup(b"", b"").collect();
    assert_eq!(seen, vec![KeyValue::new("k", "before")]);
}

#[test]
fn test_dropping_snapshot_allows_pruning() {
    let (_temp, engine) = setup_temp_engine();
    engine.put(b"k", b"v1").unwrap();

    let snapshot = engine.snapshot().unwrap();
    engine.put(b"k", b"v2").unwrap();
    assert_eq!(engine.version_count(b"k"), 2);

    drop(snapshot);
    engine.put(b"k", b"v3").unwrap();
    assert_eq!(engine.version_count(b"k"), 1);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_recovers_data() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");

    {
        let engine = Engine::open(&path, options(true)).unwrap();
        engine.put(b"k1", b"v1").unwrap();
        let mut batch = WriteBatch::new();
        batch.put("k2", "v2").put("k3", "v3");
        engine.write(batch).unwrap();
        engine.close().unwrap();
    }

    let engine = Engine::open(&path, options(false)).unwrap();
    assert_eq!(engine.get(b"k1").unwrap(), Some(b"v1".to_vec()));
    assert_eq!(engine.get(b"k3").unwrap(), Some(b"v3".to_vec()));
    assert_eq!(engine.last_sequence(), 2);

    engine.put(b"k4", b"v4").unwrap();
    assert_eq!(engine.last_sequence(), 3);
}

#[test]
fn test_corrupted_wal_fails_open() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");
    {
        let engine = Engine::open(&path, options(true)).unwrap();
        engine.put(b"k1", b"v1").unwrap();
        engine.put(b"k2", b"v2").unwrap();
        engine.close().unwrap();
    }

    let wal = path.join("wal.log");
    let mut data = std::fs::read(&wal).unwrap();
    data[20] ^= 0xFF;
    std::fs::write(&wal, &data).unwrap();

    assert!(matches!(
        Engine::open(&path, options(false)),
        Err(KvError::Corrupted(_))
    ));
}

#[test]
fn test_damaged_record_length_fails_open_without_truncating() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db");
    {
        let engine = Engine::open(&path, options(true)).unwrap();
        engine.put(b"k1", b"v1").unwrap();
        engine.put(b"k2", b"v2").unwrap();
        engine.put(b"k3", b"v3").unwrap();
        engine.close().unwrap();
    }

    let wal = path.join("wal.log");
    let mut data = std::fs::read(&wal).unwrap();
    let len_before = data.len() as u64;
    data[12..16].copy_from_slice(&[0xFF, 0xFF, 0xFF, 0x7F]);
    std::fs::write(&wal, &data).unwrap();

    assert!(matches!(
        Engine::open(&path, options(false)),
        Err(KvError::Corrupted(_))
    ));
    assert_eq!(std::fs::metadata(&wal).unwrap().len(), len_before);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_and_readers() {
    let (_temp, engine) = setup_temp_engine();
    let engine = Arc::new(engine);

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("t{}-{:03}", t, i);
                    engine.put(key.as_bytes(), b"v").unwrap();
                }
            })
        })
        .collect();

    let reader = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..20 {
                let entries: Vec<KeyValue> = engine.lookup(b"", b"").unwrap().collect();
                let mut sorted = keys(&entries);
                sorted.sort();
                assert_eq!(sorted, keys(&entries));
            }
        })
    };

    for w in writers {
        w.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(engine.lookup(b"", b"").unwrap().count(), 200);
    assert_eq!(engine.last_sequence(), 200);
}
