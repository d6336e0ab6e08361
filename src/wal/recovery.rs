//! Log Recovery
//!
//! Rebuilds the store from the transaction log on startup, then switches
//! the log into append mode.

use std::path::Path;

use crossbeam::channel;
use crossbeam::select;

use crate::error::{KvError, Result};
use crate::store::Store;

use super::reader::ReplayStream;
use super::{Event, EventLog, EventType, FileEventLog};

/// Drives a log from Opened through Replaying to Active
pub struct Recovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of events applied to the store
    pub events_replayed: u64,

    /// Of which Put events
    pub puts: u64,

    /// Of which Delete events
    pub deletes: u64,

    /// Last replayed ID; the writer continues from here
    pub last_id: u64,

    /// Live keys in the store once replay finished
    pub keys: usize,
}

impl Recovery {
    /// Replay `log` into `store` and activate it
    ///
    /// Any malformed or out-of-sequence record aborts recovery: the log is
    /// left unactivated and the error is returned.
    pub fn recover<L>(log: &L, store: &Store) -> Result<RecoveryResult>
    where
        L: EventLog + ?Sized,
    {
        tracing::info!("replaying transaction log");
        let result = Self::replay(log, store)?;
        log.activate()?;

        tracing::info!(
            events = result.events_replayed,
            puts = result.puts,
            deletes = result.deletes,
            keys = result.keys,
            last_id = result.last_id,
            "transaction log replayed"
        );
        Ok(result)
    }

    /// Replay phase only; the log stays in the Replaying state
    pub fn replay<L>(log: &L, store: &Store) -> Result<RecoveryResult>
    where
        L: EventLog + ?Sized,
    {
        let stream = log.read_events()?;
        let mut result = RecoveryResult::default();

        let outcome = drain(&stream, store, &mut result);
        stream.join();

        if let Err(e) = outcome {
            tracing::error!(
                error = %e,
                applied = result.events_replayed,
                "transaction log replay failed"
            );
            return Err(e);
        }

        result.last_id = log.last_id();
        result.keys = store.len();
        Ok(result)
    }

    /// Check a log file without serving from it
    ///
    /// Replays into a scratch store and closes the log without ever
    /// appending to it.
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        if !path.exists() {
            return Err(KvError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }

        let log = FileEventLog::open(path)?;
        let store = Store::new();
        let result = Self::replay(&log, &store);
        log.close()?;
        result
    }
}

/// Apply events until both streams close or an error arrives
fn drain(stream: &ReplayStream, store: &Store, result: &mut RecoveryResult) -> Result<()> {
    // A disconnected channel is always ready, so swap it out once closed
    let no_events = channel::never::<Event>();
    let no_errors = channel::never::<KvError>();
    let mut events_open = true;
    let mut errors_open = true;

    while events_open || errors_open {
        let events = if events_open { &stream.events } else { &no_events };
        let errors = if errors_open { &stream.errors } else { &no_errors };

        select! {
            recv(events) -> msg => match msg {
                Ok(event) => apply(store, event, result),
                Err(_) => events_open = false,
            },
            recv(errors) -> msg => match msg {
                Ok(error) => return Err(error),
                Err(_) => errors_open = false,
            },
        }
    }

    Ok(())
}

/// Mirror one event into the store, without logging it again
fn apply(store: &Store, event: Event, result: &mut RecoveryResult) {
    match event.kind {
        EventType::Put => {
            store.put(event.key, event.value);
            result.puts += 1;
        }
        EventType::Delete => {
            store.delete(&event.key);
            result.deletes += 1;
        }
    }
    result.events_replayed += 1;
}
