//! Tests for the WAL
//!
//! These tests verify:
//! - Append and read back in LSN order
//! - Recovery truncates a torn final record
//! - A damaged record followed by valid data is reported as corruption,
//!   including a damaged length field

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use sharedkv::config::WalSyncStrategy;
use sharedkv::wal::{Operation, WalReader, WalRecovery, WalWriter, HEADER_SIZE};
use sharedkv::{KeyValue, KvError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("wal.log");
    (temp_dir, path)
}

fn put(key: &str, value: &str) -> Operation {
    Operation::Batch(vec![KeyValue::new(key, value)])
}

fn write_entries(path: &PathBuf, ops: Vec<Operation>) {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite, 0).unwrap();
    for op in ops {
        writer.append(op).unwrap();
    }
}

// =============================================================================
// Append / Read Tests
// =============================================================================

#[test]
fn test_append_assigns_increasing_lsns() {
    let (_temp, path) = setup_wal();
    let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite, 0).unwrap();

    assert_eq!(writer.append(put("a", "1")).unwrap(), 1);
    assert_eq!(writer.append(put("b", "2")).unwrap(), 2);
    assert_eq!(writer.current_lsn(), 2);
}

#[test]
fn test_reopen_continues_from_last_lsn() {
    let (_temp, path) = setup_wal();
    write_entries(&path, vec![put("a", "1"), put("b", "2")]);

    let mut writer = WalWriter::open(&path, WalSyncStrategy::EveryWrite, 2).unwrap();
    assert_eq!(writer.append(put("c", "3")).unwrap(), 3);

    let entries: Vec<_> = WalReader::open(&path)
        .unwrap()
        .entries()
        .collect::<Result<_, _>>()
        .unwrap();
    let lsns: Vec<u64> = entries.iter().map(|e| e.lsn).collect();
    assert_eq!(lsns, vec![1, 2, 3]);
}

#[test]
fn test_batch_is_one_record() {
    let (_temp, path) = setup_wal();
    let batch = Operation::Batch(vec![KeyValue::new("k1", "v1"), KeyValue::new("k2", "v2")]);
    write_entries(&path, vec![batch.clone()]);

    let (entries, result) = WalRecovery::recover(&path).unwrap();
    assert_eq!(result.entries_recovered, 1);
    assert_eq!(entries[0].operation, batch);
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_recover_clean_log() {
    let (_temp, path) = setup_wal();
    write_entries(&path, vec![put("a", "1"), put("b", "2")]);

    let (entries, result) = WalRecovery::recover(&path).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(result.last_lsn, 2);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_truncates_partial_header() {
    let (_temp, path) = setup_wal();
    write_entries(&path, vec![put("a", "1")]);
    let valid_len = std::fs::metadata(&path).unwrap().len();

    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[0u8; HEADER_SIZE - 3]).unwrap();
    drop(file);

    let (entries, result) = WalRecovery::recover(&path).unwrap();

    assert_eq!(entries.len(), 1);
    assert!(result.was_truncated);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), valid_len);
}

#[test]
fn test_recover_truncates_torn_last_record() {
    let (_temp, path) = setup_wal();
    write_entries(&path, vec![put("a", "1"), put("b", "2")]);

    // Flip a byte in the last payload byte
    let mut data = std::fs::read(&path).unwrap();
    let last = data.len() - 1;
    data[last] ^= 0xFF;
    std::fs::write(&path, &data).unwrap();

    let (entries, result) = WalRecovery::recover(&path).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(result.last_lsn, 1);
    assert!(result.was_truncated);
}

#[test]
fn test_corruption_before_valid_data_is_an_error() {
    let (_temp, path) = setup_wal();
    write_entries(&path, vec![put("a", "1"), put("b", "2")]);

    // Damage the first record's payload
    let mut data = std::fs::read(&path).unwrap();
    data[HEADER_SIZE] ^= 0xFF;
    std::fs::write(&path, &data).unwrap();

    match WalRecovery::recover(&path) {
        Err(KvError::Corrupted(_)) => {}
        other => panic!("expected corruption, got {:?}", other.map(|(e, _)| e.len())),
    }
}

#[test]
fn test_damaged_length_before_valid_data_is_an_error() {
    let (_temp, path) = setup_wal();
    write_entries(&path, vec![put("a", "1"), put("b", "2"), put("c", "3")]);
    let len_before = std::fs::metadata(&path).unwrap().len();

    // Length field of the first record now runs far past the end of file
    let mut data = std::fs::read(&path).unwrap();
    data[12..16].copy_from_slice(&[0xFF, 0xFF, 0xFF, 0x7F]);
    std::fs::write(&path, &data).unwrap();

    match WalRecovery::recover(&path) {
        Err(KvError::Corrupted(_)) => {}
        other => panic!("expected corruption, got {:?}", other.map(|(e, _)| e.len())),
    }
    assert_eq!(std::fs::metadata(&path).unwrap().len(), len_before);
}

#[test]
fn test_torn_payload_of_last_record_is_truncated() {
    let (_temp, path) = setup_wal();
    write_entries(&path, vec![put("a", "1"), put("b", "2")]);
    let first_len = {
        let mut reader = WalReader::open(&path).unwrap();
        reader.next_entry().unwrap().unwrap();
        reader.valid_offset()
    };

    // Cut the second record in the middle of its payload
    let data = std::fs::read(&path).unwrap();
    let cut = first_len as usize + HEADER_SIZE + 2;
    std::fs::write(&path, &data[..cut]).unwrap();

    let (entries, result) = WalRecovery::recover(&path).unwrap();

    assert_eq!(entries.len(), 1);
    assert!(result.was_truncated);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), first_len);
}

#[test]
fn test_verify_does_not_modify_file() {
    let (_temp, path) = setup_wal();
    write_entries(&path, vec![put("a", "1")]);

    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[1, 2, 3]).unwrap();
    drop(file);
    let len_before = std::fs::metadata(&path).unwrap().len();

    let result = WalRecovery::verify(&path).unwrap();

    assert_eq!(result.entries_recovered, 1);
    assert!(result.was_truncated);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), len_before);
}
