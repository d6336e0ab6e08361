//! Store Tests
//!
//! Tests verify:
//! - Put / Get / Delete semantics
//! - NotFound signalling
//! - Concurrent readers racing a writer

use std::sync::Arc;
use std::thread;

use yakv::{KvError, Store};

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_store_is_empty() {
    let store = Store::new();
    assert_eq!(store.len(), 0);
    assert!(store.is_empty());
}

#[test]
fn test_put_and_get() {
    let store = Store::new();

    store.put("key1", "value1");

    assert_eq!(store.get("key1").unwrap(), "value1");
}

#[test]
fn test_get_nonexistent_key() {
    let store = Store::new();

    let result = store.get("nonexistent");
    assert!(matches!(result, Err(KvError::KeyNotFound)));
}

#[test]
fn test_put_overwrites_existing() {
    let store = Store::new();

    store.put("key1", "value1");
    store.put("key1", "value2");

    assert_eq!(store.len(), 1);
    assert_eq!(store.get("key1").unwrap(), "value2");
}

#[test]
fn test_delete_removes_key() {
    let store = Store::new();

    store.put("key1", "value1");
    store.delete("key1");

    assert!(!store.contains("key1"));
    assert!(matches!(store.get("key1"), Err(KvError::KeyNotFound)));
    assert!(store.is_empty());
}

#[test]
fn test_delete_nonexistent_key_is_noop() {
    let store = Store::new();
    store.put("other", "v");

    assert!(!store.delete("nonexistent"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_put_after_delete() {
    let store = Store::new();

    store.put("key1", "value1");
    store.delete("key1");
    store.put("key1", "value2");

    assert_eq!(store.get("key1").unwrap(), "value2");
}

#[test]
fn test_snapshot_is_a_copy() {
    let store = Store::new();
    store.put("a", "1");

    let snapshot = store.snapshot();
    store.put("b", "2");

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get("a").map(String::as_str), Some("1"));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_gets_see_old_or_new_value() {
    let store = Arc::new(Store::new());
    let old = "o".repeat(4096);
    let new = "n".repeat(8192);
    store.put("key", old.as_str());

    let mut readers = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        let (old, new) = (old.clone(), new.clone());
        readers.push(thread::spawn(move || {
            for _ in 0..1000 {
                let value = store.get("key").unwrap();
                assert!(value == old || value == new, "torn read of {} bytes", value.len());
            }
        }));
    }

    store.put("key", new.as_str());

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(store.get("key").unwrap(), new);
}

#[test]
fn test_concurrent_writers_distinct_keys() {
    let store = Arc::new(Store::new());

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..250 {
                    store.put(format!("t{}-k{}", t, i), format!("{}", i));
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(store.len(), 1000);
    assert_eq!(store.get("t3-k249").unwrap(), "249");
}

#[test]
fn test_concurrent_deletes_and_puts() {
    let store = Arc::new(Store::new());
    for i in 0..500 {
        store.put(format!("k{}", i), "v");
    }

    let deleter = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..500 {
                store.delete(&format!("k{}", i));
            }
        })
    };
    let putter = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 500..1000 {
                store.put(format!("k{}", i), "v");
            }
        })
    };

    deleter.join().unwrap();
    putter.join().unwrap();

    assert_eq!(store.len(), 500);
    assert!(!store.contains("k0"));
    assert!(store.contains("k999"));
}
