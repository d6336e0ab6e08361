//! Tests for the Event Log Writer
//!
//! These tests verify:
//! - ID assignment starting at 1, strictly increasing
//! - One global order across concurrent producers
//! - Wait / Close drain every queued event
//! - Lifecycle errors (writing before activation or after close)
//! - Failure sink and acknowledged mode on a failing device

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use yakv::wal::{Event, EventLog, FileEventLog, LogReader, LogState};
use yakv::{Durability, KvError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("transaction.log");
    (temp_dir, log_path)
}

fn open_active(path: &Path) -> FileEventLog {
    let log = FileEventLog::open(path).unwrap();
    log.activate().unwrap();
    log
}

fn read_all(path: &Path) -> Vec<Event> {
    LogReader::open(path)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

// =============================================================================
// Basic Writing Tests
// =============================================================================

#[test]
fn test_open_creates_file() {
    let (_temp, log_path) = setup_temp_log();

    let log = FileEventLog::open(&log_path).unwrap();

    assert!(log_path.exists());
    assert_eq!(log.state(), LogState::Opened);
    assert_eq!(log.last_id(), 0);
}

#[test]
fn test_write_single_event() {
    let (_temp, log_path) = setup_temp_log();

    let log = open_active(&log_path);
    log.write_put("key1", "value1").unwrap();
    log.close().unwrap();

    assert_eq!(log.last_id(), 1);
    assert_eq!(fs::read_to_string(&log_path).unwrap(), "1\t2\t\"key1\"\t\"value1\"\n");
}

#[test]
fn test_ids_start_at_one_and_increase() {
    let (_temp, log_path) = setup_temp_log();

    let log = open_active(&log_path);
    for i in 0..100 {
        log.write_put(&format!("key{}", i), &format!("val{}", i)).unwrap();
    }
    log.close().unwrap();

    let events = read_all(&log_path);
    assert_eq!(events.len(), 100);
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.id, (i + 1) as u64);
        assert_eq!(event.key, format!("key{}", i));
    }
    assert_eq!(log.last_id(), 100);
}

#[test]
fn test_put_and_delete_records() {
    let (_temp, log_path) = setup_temp_log();

    let log = open_active(&log_path);
    log.write_put("a", "1").unwrap();
    log.write_delete("a").unwrap();
    log.close().unwrap();

    assert_eq!(
        fs::read_to_string(&log_path).unwrap(),
        "1\t2\t\"a\"\t\"1\"\n2\t1\t\"a\"\t\"\"\n"
    );
}

#[test]
fn test_existing_contents_are_kept() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, "1\t2\t\"old\"\t\"v\"\n").unwrap();

    // Without replay the writer does not know about ID 1
    let log = open_active(&log_path);
    log.write_put("new", "v").unwrap();
    log.close().unwrap();

    let contents = fs::read_to_string(&log_path).unwrap();
    assert!(contents.starts_with("1\t2\t\"old\""));
    assert_eq!(contents.lines().count(), 2);
}

#[test]
fn test_activate_terminates_unfinished_line() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, "1\t2\t\"old\"\t\"v\"").unwrap();

    let log = open_active(&log_path);
    log.close().unwrap();

    assert_eq!(fs::read_to_string(&log_path).unwrap(), "1\t2\t\"old\"\t\"v\"\n");
}

#[test]
fn test_activate_leaves_terminated_file_alone() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, "1\t2\t\"old\"\t\"v\"\n").unwrap();

    let log = open_active(&log_path);
    log.close().unwrap();

    assert_eq!(fs::read_to_string(&log_path).unwrap(), "1\t2\t\"old\"\t\"v\"\n");
}

// =============================================================================
// Ordering / Draining Tests
// =============================================================================

#[test]
fn test_concurrent_producers_single_global_order() {
    let (_temp, log_path) = setup_temp_log();

    let log = Arc::new(open_active(&log_path));
    let producers: Vec<_> = (0..8)
        .map(|t| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for i in 0..200 {
                    log.write_put(&format!("t{}", t), &i.to_string()).unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }
    log.close().unwrap();

    let events = read_all(&log_path);
    assert_eq!(events.len(), 1600);

    // IDs are dense and each producer's events keep their call order
    let mut last_seen: HashMap<String, i64> = HashMap::new();
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.id, (i + 1) as u64);
        let value: i64 = event.value.parse().unwrap();
        let previous = last_seen.insert(event.key.clone(), value).unwrap_or(-1);
        assert!(value > previous);
    }
}

#[test]
fn test_wait_drains_without_closing() {
    let (_temp, log_path) = setup_temp_log();

    let log = open_active(&log_path);
    for i in 0..50 {
        log.write_put(&format!("k{}", i), "v").unwrap();
    }
    log.wait();

    assert_eq!(log.in_flight(), 0);
    assert_eq!(read_all(&log_path).len(), 50);
    assert_eq!(log.state(), LogState::Active);

    log.write_delete("k0").unwrap();
    log.close().unwrap();
    assert_eq!(read_all(&log_path).len(), 51);
}

#[test]
fn test_close_writes_every_accepted_event() {
    let (_temp, log_path) = setup_temp_log();

    let log = FileEventLog::open_with(&log_path, 1, Durability::Async).unwrap();
    log.activate().unwrap();

    let mut accepted = 0;
    for i in 0..500 {
        if log.write_put(&format!("k{}", i), "v").is_ok() {
            accepted += 1;
        }
    }
    log.close().unwrap();

    assert_eq!(accepted, 500);
    assert_eq!(read_all(&log_path).len(), accepted);
}

#[test]
fn test_drop_closes_log() {
    let (_temp, log_path) = setup_temp_log();

    {
        let log = open_active(&log_path);
        log.write_put("a", "1").unwrap();
    }

    assert_eq!(read_all(&log_path).len(), 1);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_write_before_activate_fails() {
    let (_temp, log_path) = setup_temp_log();

    let log = FileEventLog::open(&log_path).unwrap();
    let result = log.write_put("a", "1");

    assert!(matches!(
        result,
        Err(KvError::LogState { state: LogState::Opened, .. })
    ));
}

#[test]
fn test_write_after_close_fails() {
    let (_temp, log_path) = setup_temp_log();

    let log = open_active(&log_path);
    log.close().unwrap();

    assert_eq!(log.state(), LogState::Closed);
    assert!(matches!(
        log.write_delete("a"),
        Err(KvError::LogState { state: LogState::Closed, .. })
    ));
}

#[test]
fn test_close_is_idempotent() {
    let (_temp, log_path) = setup_temp_log();

    let log = open_active(&log_path);
    log.close().unwrap();
    log.close().unwrap();
    assert_eq!(log.state(), LogState::Closed);
}

#[test]
fn test_activate_twice_fails() {
    let (_temp, log_path) = setup_temp_log();

    let log = open_active(&log_path);
    assert!(matches!(
        log.activate(),
        Err(KvError::LogState { state: LogState::Active, .. })
    ));
}

#[test]
fn test_read_events_after_activate_fails() {
    let (_temp, log_path) = setup_temp_log();

    let log = open_active(&log_path);
    assert!(log.read_events().is_err());
}

#[test]
fn test_close_without_activation() {
    let (_temp, log_path) = setup_temp_log();

    let log = FileEventLog::open(&log_path).unwrap();
    log.close().unwrap();
    assert_eq!(log.state(), LogState::Closed);
    assert!(log.activate().is_err());
}

// =============================================================================
// Failure Tests (Linux: /dev/full rejects every write)
// =============================================================================

fn dev_full() -> Option<&'static Path> {
    let path = Path::new("/dev/full");
    let writable = fs::OpenOptions::new().read(true).append(true).open(path).is_ok();
    writable.then_some(path)
}

#[test]
fn test_write_failure_goes_to_sink() {
    let Some(path) = dev_full() else { return };

    let log = open_active(path);
    log.write_put("a", "1").unwrap();
    log.wait();

    match log.err().try_recv() {
        Ok(KvError::LogWrite { id, .. }) => assert_eq!(id, 1),
        other => panic!("expected a queued write failure, got {:?}", other),
    }
    assert_eq!(log.failure_count(), 1);
    assert_eq!(log.state(), LogState::Active);
}

#[test]
fn test_failure_sink_holds_one_failure() {
    let Some(path) = dev_full() else { return };

    let log = open_active(path);
    for i in 0..3 {
        log.write_put(&format!("k{}", i), "v").unwrap();
    }
    log.wait();

    let sink = log.err();
    assert!(matches!(sink.try_recv(), Ok(KvError::LogWrite { id: 1, .. })));
    assert!(sink.try_recv().is_err());

    // The writer kept going and counted every failure
    assert_eq!(log.failure_count(), 3);
    assert_eq!(log.last_id(), 3);
}

#[test]
fn test_acknowledged_write_returns_failure() {
    let Some(path) = dev_full() else { return };

    let log = FileEventLog::open_with(path, 16, Durability::Acknowledged).unwrap();
    log.activate().unwrap();

    let result = log.write_put("a", "1");

    assert!(matches!(result, Err(KvError::LogWrite { id: 1, .. })));
    assert!(log.err().try_recv().is_err());
    assert_eq!(log.failure_count(), 1);
}

#[test]
fn test_acknowledged_write_is_on_disk_when_it_returns() {
    let (_temp, log_path) = setup_temp_log();

    let log = FileEventLog::open_with(&log_path, 16, Durability::Acknowledged).unwrap();
    log.activate().unwrap();
    log.write_put("a", "1").unwrap();

    // No wait() needed
    assert_eq!(read_all(&log_path).len(), 1);
    assert_eq!(log.last_id(), 1);
}
