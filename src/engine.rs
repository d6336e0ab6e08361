//! Engine Module
//!
//! The top-level context that owns the store and the transaction log.
//!
//! ## Responsibilities
//! - Recover the store from the log on startup
//! - Route mutations to the store and the log
//! - Expose lifecycle (wait/close) and health to the HTTP layer

use std::fs;
use std::path::Path;

use crossbeam::channel::Receiver;
use parking_lot::RwLock;
use serde::Serialize;

use crate::config::{Config, Durability};
use crate::error::{KvError, Result};
use crate::store::Store;
use crate::wal::{normalize_value, EventLog, FileEventLog, LogState, Recovery, RecoveryResult};

/// The key-value engine
///
/// ## Write Ordering
///
/// - `Durability::Async`: the store is mutated first, then the event is
///   queued. A crash before the writer reaches it loses that mutation.
///   Mutations share the write gate and may run in parallel.
/// - `Durability::Acknowledged`: the event is appended first and the store
///   is only mutated once the append succeeded. Each mutation holds the
///   write gate exclusively for the append and the store update, so the
///   store applies events in log order. Writers are serialized behind one
///   disk append at a time.
///
/// Either way the store is never touched once the log stops accepting
/// writes. Reads never touch the log.
pub struct Engine {
    config: Config,

    /// Authoritative in-memory state
    store: Store,

    /// Transaction log, Active for the lifetime of the engine
    log: Box<dyn EventLog>,

    /// What startup replay found
    recovery: RecoveryResult,

    /// Held shared by async mutations, exclusively by acknowledged
    /// mutations and by `close`
    write_gate: RwLock<()>,
}

/// Snapshot reported by the health endpoint
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Health {
    /// `ok`, `degraded` once any append has failed, or `unavailable`
    pub status: &'static str,
    pub state: String,
    pub last_id: u64,
    pub keys: usize,
    pub write_failures: u64,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Validate config, create the log's directory
    /// 2. Open (or create) the transaction log
    /// 3. Replay it into an empty store
    /// 4. Activate the log writer
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.log_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let log = FileEventLog::open_with(&config.log_path, config.queue_capacity, config.durability)?;
        Self::with_log(config, Box::new(log))
    }

    /// Open with a log path (convenience method)
    ///
    /// Uses default config with the specified log file
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().log_path(path).build())
    }

    /// Build an engine over any log backend, replaying it first
    pub fn with_log(config: Config, log: Box<dyn EventLog>) -> Result<Self> {
        let store = Store::new();

        let recovery = match Recovery::recover(&*log, &store) {
            Ok(result) => result,
            Err(e) => {
                if let Err(close_err) = log.close() {
                    tracing::warn!(error = %close_err, "failed to release log after failed recovery");
                }
                return Err(e);
            }
        };

        Ok(Self {
            config,
            store,
            log,
            recovery,
            write_gate: RwLock::new(()),
        })
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Result<String> {
        self.store.get(key)
    }

    /// Put a key-value pair
    ///
    /// The value is normalized (newlines stripped, trailing whitespace
    /// trimmed) so the store and the log hold the same bytes.
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() {
            return Err(KvError::EmptyKey);
        }
        let value = normalize_value(value);

        match self.config.durability {
            Durability::Async => {
                let _gate = self.write_gate.read();
                self.ensure_writable()?;
                self.store.put(key, value.as_str());
                self.log.write_put(key, &value)
            }
            Durability::Acknowledged => {
                let _gate = self.write_gate.write();
                self.log.write_put(key, &value)?;
                self.store.put(key, value);
                Ok(())
            }
        }
    }

    /// Delete a key
    ///
    /// Deleting an absent key succeeds and is still logged.
    pub fn delete(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(KvError::EmptyKey);
        }

        match self.config.durability {
            Durability::Async => {
                let _gate = self.write_gate.read();
                self.ensure_writable()?;
                self.store.delete(key);
                self.log.write_delete(key)
            }
            Durability::Acknowledged => {
                let _gate = self.write_gate.write();
                self.log.write_delete(key)?;
                self.store.delete(key);
                Ok(())
            }
        }
    }

    /// Block until every queued event is written (durability checkpoint)
    pub fn wait(&self) {
        self.log.wait();
    }

    /// Drain the log and release it
    ///
    /// Reads keep working afterwards; writes fail.
    pub fn close(&self) -> Result<()> {
        let _gate = self.write_gate.write();
        self.log.close()
    }

    /// Fail before the store is touched if the log no longer takes writes
    fn ensure_writable(&self) -> Result<()> {
        match self.log.state() {
            LogState::Active => Ok(()),
            state => Err(KvError::LogState {
                operation: "write",
                state,
            }),
        }
    }

    /// Highest sequence ID assigned so far
    pub fn last_id(&self) -> u64 {
        self.log.last_id()
    }

    /// Failed appends since startup
    pub fn failure_count(&self) -> u64 {
        self.log.failure_count()
    }

    /// Sink of asynchronous write failures
    pub fn write_failures(&self) -> Receiver<KvError> {
        self.log.err()
    }

    /// `status` is `unavailable` whenever the log does not take writes,
    /// otherwise `degraded` once any append has failed
    pub fn health(&self) -> Health {
        let write_failures = self.failure_count();
        let state = self.log.state();
        let status = if state != LogState::Active {
            "unavailable"
        } else if write_failures > 0 {
            "degraded"
        } else {
            "ok"
        };

        Health {
            status,
            state: state.to_string(),
            last_id: self.last_id(),
            keys: self.store.len(),
            write_failures,
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// The in-memory store
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The transaction log
    pub fn log(&self) -> &dyn EventLog {
        &*self.log
    }

    /// What startup replay found
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
