//! Tests for BinaryBlock
//!
//! These tests verify:
//! - put/get round-trips at arbitrary cursors
//! - Length and short-read checks
//! - Mode gating (READ, WRITE, READ_WRITE)
//! - Zero-fill
//! - Close semantics
//! - File locks and the bounded retry on contention
//! - Serialized access from many threads

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use sectiondb::block::{FileStream, MemoryStream};
use sectiondb::{BinaryBlock, BlockMode, Cursor, RetryPolicy, StoreError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_file() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("section.bin");
    (temp_dir, path)
}

fn memory_block(bytes: Vec<u8>) -> BinaryBlock<MemoryStream> {
    BinaryBlock::attach(MemoryStream::new(bytes), BlockMode::READ_WRITE).unwrap()
}

/// Retry policy that never sleeps and counts how often it was asked to
fn counting_policy(attempts: u32) -> (RetryPolicy, Arc<AtomicU32>) {
    let sleeps = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&sleeps);
    let policy = RetryPolicy::new(attempts, Duration::from_millis(100)).with_sleeper(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (policy, sleeps)
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_put_then_get_returns_same_bytes() {
    let block = memory_block(Vec::new());
    let cursor = Cursor::new(0, 5);

    block.put(cursor, b"hello").unwrap();

    assert_eq!(block.get(cursor).unwrap(), b"hello");
}

#[test]
fn test_put_at_offset_extends_stream() {
    let block = memory_block(Vec::new());
    let cursor = Cursor::new(100, 4);

    block.put(cursor, &[1, 2, 3, 4]).unwrap();

    assert_eq!(block.len().unwrap(), 104);
    assert_eq!(block.get(cursor).unwrap(), vec![1, 2, 3, 4]);
    // Gap before the write reads back as zeros
    assert_eq!(block.get(Cursor::new(0, 100)).unwrap(), vec![0u8; 100]);
}

#[test]
fn test_round_trip_many_cursors() {
    let block = memory_block(Vec::new());

    for i in 0..32u64 {
        let data: Vec<u8> = (0..i).map(|b| (b * 7 + i) as u8).collect();
        let cursor = Cursor::new(i * 64, i);
        block.put(cursor, &data).unwrap();
        assert_eq!(block.get(cursor).unwrap(), data);
    }
}

#[test]
fn test_overlapping_put_overwrites() {
    let block = memory_block(b"aaaaaaaaaa".to_vec());

    block.put(Cursor::new(3, 4), b"bbbb").unwrap();

    assert_eq!(block.get(Cursor::new(0, 10)).unwrap(), b"aaabbbbaaa");
}

#[test]
fn test_empty_cursor_round_trip() {
    let block = memory_block(b"abc".to_vec());
    let cursor = Cursor::new(1, 0);

    block.put(cursor, &[]).unwrap();

    assert!(block.get(cursor).unwrap().is_empty());
}

// =============================================================================
// Length and Short Read Tests
// =============================================================================

#[test]
fn test_put_length_mismatch() {
    let block = memory_block(Vec::new());

    for len in [0usize, 3, 5, 100] {
        let result = block.put(Cursor::new(0, 4), &vec![7u8; len]);
        match result {
            Err(StoreError::LengthMismatch { expected, actual }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, len);
            }
            other => panic!("expected LengthMismatch for {} bytes, got {:?}", len, other),
        }
    }

    // Nothing was written
    assert_eq!(block.len().unwrap(), 0);
}

#[test]
fn test_get_past_end_is_short_read() {
    let block = memory_block(b"0123456789".to_vec());

    let result = block.get(Cursor::new(8, 5));

    match result {
        Err(StoreError::ShortRead { expected, actual }) => {
            assert_eq!(expected, 5);
            assert_eq!(actual, 2);
        }
        other => panic!("expected ShortRead, got {:?}", other),
    }
}

#[test]
fn test_get_beyond_stream_start_is_short_read() {
    let block = memory_block(b"abc".to_vec());

    let result = block.get(Cursor::new(50, 1));

    assert!(matches!(
        result,
        Err(StoreError::ShortRead { expected: 1, actual: 0 })
    ));
}

// =============================================================================
// Zero Tests
// =============================================================================

#[test]
fn test_zero_clears_range() {
    let block = memory_block(b"abcdefgh".to_vec());

    block.zero(Cursor::new(2, 3)).unwrap();

    assert_eq!(block.get(Cursor::new(0, 8)).unwrap(), b"ab\0\0\0fgh");
}

#[test]
fn test_zero_extends_stream() {
    let block = memory_block(Vec::new());

    block.zero(Cursor::new(0, 200_000)).unwrap();

    assert_eq!(block.len().unwrap(), 200_000);
    assert!(block
        .get(Cursor::new(0, 200_000))
        .unwrap()
        .iter()
        .all(|&b| b == 0));
}

// =============================================================================
// Mode Tests
// =============================================================================

#[test]
fn test_read_mode_rejects_writes() {
    let block = BinaryBlock::attach(MemoryStream::new(b"data".to_vec()), BlockMode::READ).unwrap();

    assert_eq!(block.get(Cursor::new(0, 4)).unwrap(), b"data");
    assert!(matches!(
        block.put(Cursor::new(0, 4), b"nope"),
        Err(StoreError::Capability { .. })
    ));
    assert!(matches!(
        block.zero(Cursor::new(0, 4)),
        Err(StoreError::Capability { .. })
    ));
}

#[test]
fn test_read_mode_reports_capability_before_length() {
    let block = BinaryBlock::attach(MemoryStream::new(Vec::new()), BlockMode::READ).unwrap();

    let result = block.put(Cursor::new(0, 4), b"too long");

    assert!(matches!(result, Err(StoreError::Capability { .. })));
}

#[test]
fn test_write_mode_rejects_reads() {
    let block = BinaryBlock::attach(MemoryStream::write_only(), BlockMode::WRITE).unwrap();

    block.put(Cursor::new(0, 2), b"ok").unwrap();
    assert!(matches!(
        block.get(Cursor::new(0, 2)),
        Err(StoreError::Capability { .. })
    ));
}

#[test]
fn test_read_write_mode_allows_both() {
    let block = memory_block(Vec::new());

    assert_eq!(block.mode(), BlockMode::READ | BlockMode::WRITE);
    block.put(Cursor::new(0, 3), b"xyz").unwrap();
    assert_eq!(block.get(Cursor::new(0, 3)).unwrap(), b"xyz");
}

#[test]
fn test_attach_rejects_unsupported_mode() {
    let result = BinaryBlock::attach(MemoryStream::read_only(Vec::new()), BlockMode::WRITE);
    assert!(matches!(result, Err(StoreError::Capability { .. })));

    let result = BinaryBlock::attach(MemoryStream::write_only(), BlockMode::READ_WRITE);
    assert!(matches!(result, Err(StoreError::Capability { .. })));
}

#[test]
fn test_attach_rejects_empty_mode() {
    let result = BinaryBlock::attach(MemoryStream::new(Vec::new()), BlockMode::empty());
    assert!(matches!(result, Err(StoreError::Config(_))));
}

// =============================================================================
// Close Tests
// =============================================================================

#[test]
fn test_operations_fail_after_close() {
    let block = memory_block(b"abcd".to_vec());

    block.close().unwrap();

    assert!(block.is_closed());
    assert!(matches!(block.get(Cursor::new(0, 1)), Err(StoreError::Closed)));
    assert!(matches!(block.put(Cursor::new(0, 1), b"z"), Err(StoreError::Closed)));
    assert!(matches!(block.zero(Cursor::new(0, 1)), Err(StoreError::Closed)));
    assert!(matches!(block.close(), Err(StoreError::Closed)));
}

#[test]
fn test_into_inner_returns_written_bytes() {
    let block = memory_block(Vec::new());
    block.put(Cursor::new(0, 3), b"abc").unwrap();

    let stream = block.into_inner().unwrap();

    assert_eq!(stream.into_inner(), b"abc");
}

// =============================================================================
// File Tests
// =============================================================================

#[test]
fn test_file_round_trip_persists() {
    let (_temp, path) = setup_temp_file();
    let policy = RetryPolicy::default();

    {
        let block = BinaryBlock::open(&path, BlockMode::WRITE, &policy).unwrap();
        block.put(Cursor::new(0, 6), b"sector").unwrap();
        block.flush().unwrap();
        block.close().unwrap();
    }

    let block = BinaryBlock::open(&path, BlockMode::READ, &policy).unwrap();
    assert_eq!(block.get(Cursor::new(0, 6)).unwrap(), b"sector");
}

#[test]
fn test_read_mode_requires_existing_file() {
    let (_temp, path) = setup_temp_file();

    let result = BinaryBlock::open(&path, BlockMode::READ, &RetryPolicy::default());

    assert!(matches!(result, Err(StoreError::Io(_))));
    assert!(!path.exists());
}

#[test]
fn test_write_mode_creates_file() {
    let (_temp, path) = setup_temp_file();

    let block = BinaryBlock::open(&path, BlockMode::READ_WRITE, &RetryPolicy::default()).unwrap();

    assert!(path.exists());
    assert!(block.is_empty().unwrap());
}

#[test]
fn test_shared_readers_do_not_wait() {
    let (_temp, path) = setup_temp_file();
    std::fs::write(&path, b"shared").unwrap();
    let (policy, sleeps) = counting_policy(3);

    let first = BinaryBlock::open(&path, BlockMode::READ, &policy).unwrap();
    let second = BinaryBlock::open(&path, BlockMode::READ, &policy).unwrap();

    assert_eq!(first.get(Cursor::new(0, 6)).unwrap(), b"shared");
    assert_eq!(second.get(Cursor::new(0, 6)).unwrap(), b"shared");
    assert_eq!(sleeps.load(Ordering::SeqCst), 0);
}

#[test]
fn test_lock_timeout_after_full_retry_budget() {
    let (_temp, path) = setup_temp_file();
    let _writer = BinaryBlock::open(&path, BlockMode::WRITE, &RetryPolicy::default()).unwrap();
    let (policy, sleeps) = counting_policy(5);

    let result = BinaryBlock::open(&path, BlockMode::READ_WRITE, &policy);

    match result {
        Err(StoreError::LockTimeout { path: locked, attempts }) => {
            assert_eq!(locked, path);
            assert_eq!(attempts, 6);
        }
        other => panic!("expected LockTimeout, got {:?}", other.map(|_| ())),
    }
    assert_eq!(sleeps.load(Ordering::SeqCst), 5);
}

#[test]
fn test_default_policy_budget() {
    let policy = RetryPolicy::default();

    assert_eq!(policy.attempts, 50);
    assert_eq!(policy.delay, Duration::from_millis(100));
}

#[test]
fn test_reader_waits_for_writer() {
    let (_temp, path) = setup_temp_file();
    let (policy, sleeps) = counting_policy(5);
    let writer = BinaryBlock::open(&path, BlockMode::WRITE, &policy).unwrap();
    writer.put(Cursor::new(0, 2), b"ok").unwrap();

    // Closing the writer on the first wait releases the lock
    let writer = Arc::new(Mutex::new(Some(writer)));
    let holder = Arc::clone(&writer);
    let counter = Arc::clone(&sleeps);
    let policy = policy.with_sleeper(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(block) = holder.lock().take() {
            block.close().unwrap();
        }
    });

    let reader = BinaryBlock::open(&path, BlockMode::READ, &policy).unwrap();

    assert_eq!(reader.get(Cursor::new(0, 2)).unwrap(), b"ok");
    assert_eq!(sleeps.load(Ordering::SeqCst), 1);
    assert!(writer.lock().is_none());
}

#[test]
fn test_file_stream_reports_access() {
    let (_temp, path) = setup_temp_file();
    let block: BinaryBlock<FileStream> =
        BinaryBlock::open(&path, BlockMode::WRITE, &RetryPolicy::default()).unwrap();

    assert_eq!(block.mode(), BlockMode::WRITE);
    assert!(matches!(block.get(Cursor::new(0, 0)), Err(StoreError::Capability { .. })));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_do_not_interleave() {
    let block = Arc::new(memory_block(vec![0u8; 8 * 1024]));
    let mut handles = vec![];

    for t in 0..8u8 {
        let block = Arc::clone(&block);
        handles.push(thread::spawn(move || {
            let cursor = Cursor::new(u64::from(t) * 1024, 1024);
            for _ in 0..50 {
                block.put(cursor, &[t; 1024]).unwrap();
                assert_eq!(block.get(cursor).unwrap(), vec![t; 1024]);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..8u8 {
        let chunk = block.get(Cursor::new(u64::from(t) * 1024, 1024)).unwrap();
        assert!(chunk.iter().all(|&b| b == t));
    }
}
