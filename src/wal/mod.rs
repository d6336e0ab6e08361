//! Transaction Log Module
//!
//! Provides durability through an append-only, line-oriented event log that
//! is replayed at startup.
//!
//! ## Responsibilities
//! - Assign strictly increasing sequence IDs to mutations
//! - Append events from a single background worker, in enqueue order
//! - Replay the log into a store, rejecting malformed or out-of-order records
//!
//! ## File Format
//! ```text
//! ┌────────┬────┬──────┬────┬─────────┬────┬───────────┬────┐
//! │ ID     │ \t │ Type │ \t │ "Key"   │ \t │ "Value"   │ \n │
//! └────────┴────┴──────┴────┴─────────┴────┴───────────┴────┘
//! ```
//! Type `1` is Delete (empty value), `2` is Put.
//!
//! ## Lifecycle
//! ```text
//! Closed → Opened → Replaying → Active → Draining → Closed
//! ```

mod codec;
mod event;
mod reader;
mod recovery;
mod writer;

use std::fmt;

use crossbeam::channel::Receiver;

use crate::error::{KvError, Result};

pub use codec::{decode_event, encode_event, parse_quoted, quote, FIELD_SEPARATOR};
pub use event::{normalize_value, Event, EventType};
pub use reader::{LogReader, ReplayStream};
pub use recovery::{Recovery, RecoveryResult};
pub use writer::FileEventLog;

/// Lifecycle state of an event log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogState {
    /// Resources released
    Closed,

    /// File handle acquired, nothing running
    Opened,

    /// Background reader streaming events out of the file
    Replaying,

    /// Background writer accepting events
    Active,

    /// Close in progress, waiting for in-flight writes
    Draining,
}

impl fmt::Display for LogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogState::Closed => "closed",
            LogState::Opened => "opened",
            LogState::Replaying => "replaying",
            LogState::Active => "active",
            LogState::Draining => "draining",
        };
        f.write_str(name)
    }
}

/// Capability interface of a transaction log backend
///
/// The store and the recovery orchestrator only see this trait, so other
/// backends (segmented files, remote logs) can be swapped in.
pub trait EventLog: Send + Sync {
    /// Queue a Put event. Blocks only while the writer queue is full,
    /// or until appended when the log runs in acknowledged mode.
    fn write_put(&self, key: &str, value: &str) -> Result<()>;

    /// Queue a Delete event, with the same blocking rules as `write_put`
    fn write_delete(&self, key: &str) -> Result<()>;

    /// Block until every queued event has been written
    fn wait(&self);

    /// Drain queued events, stop the writer and release the file
    fn close(&self) -> Result<()>;

    /// Sink of asynchronous write failures (holds at most one)
    fn err(&self) -> Receiver<KvError>;

    /// Highest ID assigned or replayed so far
    fn last_id(&self) -> u64;

    /// Stream the persisted events, for replay
    fn read_events(&self) -> Result<ReplayStream>;

    /// Switch to append mode and start the background writer
    fn activate(&self) -> Result<()>;

    /// Current lifecycle state
    fn state(&self) -> LogState;

    /// Number of failed appends since the log was opened
    fn failure_count(&self) -> u64;
}
