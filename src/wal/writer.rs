//! Event Log Writer
//!
//! File-backed transaction log with a single background writer.
//!
//! ## Write Path
//! ```text
//! write_put ──┐                         ┌──────────────┐
//! write_put ──┼──▶ bounded queue (16) ──▶│ writer thread │──▶ append to file
//! write_delete┘                         └──────────────┘
//! ```
//! - Callers block only while the queue is full
//! - The writer assigns `last_id + 1` to each event, in queue order
//! - A failed append goes to the failure sink; the writer keeps going

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex, RwLock};

use crate::config::Durability;
use crate::error::{KvError, Result};

use super::codec::encode_event;
use super::reader::ReplayStream;
use super::{Event, EventLog, LogState};

/// Default capacity of the writer queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// An event waiting in the writer queue
struct Pending {
    event: Event,

    /// Receives the append result (acknowledged mode only)
    ack: Option<Sender<Result<u64>>>,
}

/// Number of queued events not yet written
#[derive(Default)]
struct InFlight {
    count: Mutex<u64>,
    drained: Condvar,
}

impl InFlight {
    fn add(&self) {
        *self.count.lock() += 1;
    }

    fn done(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.drained.wait(&mut count);
        }
    }

    fn get(&self) -> u64 {
        *self.count.lock()
    }
}

/// State shared with the writer thread
struct Shared {
    /// Also handed to the replay reader, which publishes accepted IDs here
    last_id: Arc<AtomicU64>,
    in_flight: InFlight,
    failures: Sender<KvError>,
    failure_count: AtomicU64,
}

/// Append-only, file-backed event log
///
/// ## Concurrency:
/// - `sender`: cloned under a read lock by every writer, taken on close
/// - `state`/`file`/`worker`: short Mutex sections, never held across I/O waits
/// - The file itself is only touched by the one thread that owns it
pub struct FileEventLog {
    path: PathBuf,
    durability: Durability,
    queue_capacity: usize,

    /// Open handle until activation moves it into the writer thread
    file: Mutex<Option<File>>,

    state: Mutex<LogState>,

    /// Producer side of the writer queue (`Some` only while Active)
    sender: RwLock<Option<Sender<Pending>>>,

    /// Consumer side of the single-slot failure sink
    failures: Receiver<KvError>,

    shared: Arc<Shared>,

    worker: Mutex<Option<JoinHandle<()>>>,
}

impl FileEventLog {
    /// Open or create a log with the default queue and async durability
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, DEFAULT_QUEUE_CAPACITY, Durability::Async)
    }

    /// Open or create a log
    ///
    /// The file is opened for reading and appending and is never truncated.
    pub fn open_with(path: &Path, queue_capacity: usize, durability: Durability) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let (failure_tx, failures) = channel::bounded(1);

        tracing::debug!(path = %path.display(), %durability, queue_capacity, "event log opened");

        Ok(Self {
            path: path.to_path_buf(),
            durability,
            queue_capacity,
            file: Mutex::new(Some(file)),
            state: Mutex::new(LogState::Opened),
            sender: RwLock::new(None),
            failures,
            shared: Arc::new(Shared {
                last_id: Arc::new(AtomicU64::new(0)),
                in_flight: InFlight::default(),
                failures: failure_tx,
                failure_count: AtomicU64::new(0),
            }),
            worker: Mutex::new(None),
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durability mode writers run under
    pub fn durability(&self) -> Durability {
        self.durability
    }

    /// Number of events queued but not yet written
    pub fn in_flight(&self) -> u64 {
        self.shared.in_flight.get()
    }

    fn submit(&self, event: Event) -> Result<()> {
        let sender = self.sender.read().clone();
        let sender = sender.ok_or_else(|| KvError::LogState {
            operation: "write",
            state: self.state(),
        })?;

        let (ack, ack_rx) = match self.durability {
            Durability::Async => (None, None),
            Durability::Acknowledged => {
                let (tx, rx) = channel::bounded(1);
                (Some(tx), Some(rx))
            }
        };

        self.shared.in_flight.add();
        if sender.send(Pending { event, ack }).is_err() {
            self.shared.in_flight.done();
            return Err(KvError::LogState {
                operation: "write",
                state: LogState::Closed,
            });
        }
        drop(sender);

        match ack_rx {
            None => Ok(()),
            Some(rx) => rx
                .recv()
                .map_err(|_| KvError::LogState {
                    operation: "acknowledge write",
                    state: LogState::Closed,
                })?
                .map(|_id| ()),
        }
    }
}

impl EventLog for FileEventLog {
    fn write_put(&self, key: &str, value: &str) -> Result<()> {
        self.submit(Event::put(key, value))
    }

    fn write_delete(&self, key: &str) -> Result<()> {
        self.submit(Event::delete(key))
    }

    fn wait(&self) {
        self.shared.in_flight.wait();
    }

    fn close(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            match *state {
                LogState::Closed | LogState::Draining => return Ok(()),
                _ => *state = LogState::Draining,
            }
        }

        // The writer exits once the queue is empty and every sender is gone
        self.sender.write().take();
        let worker = self.worker.lock().take();
        let joined = match worker {
            Some(handle) => handle.join(),
            None => Ok(()),
        };
        self.shared.in_flight.wait();

        // Release the handle if the writer never took it
        drop(self.file.lock().take());
        *self.state.lock() = LogState::Closed;

        tracing::debug!(
            path = %self.path.display(),
            last_id = self.last_id(),
            "event log closed"
        );

        joined.map_err(|_| KvError::Io(std::io::Error::other("log writer thread panicked")))
    }

    fn err(&self) -> Receiver<KvError> {
        self.failures.clone()
    }

    fn last_id(&self) -> u64 {
        self.shared.last_id.load(Ordering::SeqCst)
    }

    fn read_events(&self) -> Result<ReplayStream> {
        let mut state = self.state.lock();
        if *state != LogState::Opened {
            return Err(KvError::LogState {
                operation: "read events",
                state: *state,
            });
        }

        let file = match self.file.lock().as_ref() {
            Some(file) => file.try_clone()?,
            None => {
                return Err(KvError::LogState {
                    operation: "read events",
                    state: LogState::Closed,
                })
            }
        };

        let stream = ReplayStream::spawn(BufReader::new(file), Arc::clone(&self.shared.last_id))?;
        *state = LogState::Replaying;
        Ok(stream)
    }

    fn activate(&self) -> Result<()> {
        let mut state = self.state.lock();
        if !matches!(*state, LogState::Opened | LogState::Replaying) {
            return Err(KvError::LogState {
                operation: "activate",
                state: *state,
            });
        }

        let mut file = self.file.lock().take().ok_or(KvError::LogState {
            operation: "activate",
            state: LogState::Closed,
        })?;

        if end_torn_record(&mut file)? {
            tracing::warn!(path = %self.path.display(), "last record had no newline, terminated it");
        }

        let (tx, rx) = channel::bounded(self.queue_capacity);
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("yakv-log-writer".to_string())
            .spawn(move || run_writer(file, rx, shared))?;

        *self.sender.write() = Some(tx);
        *self.worker.lock() = Some(handle);
        *state = LogState::Active;

        tracing::debug!(last_id = self.last_id(), "event log active");
        Ok(())
    }

    fn state(&self) -> LogState {
        *self.state.lock()
    }

    fn failure_count(&self) -> u64 {
        self.shared.failure_count.load(Ordering::SeqCst)
    }
}

impl Drop for FileEventLog {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "failed to close event log");
        }
    }
}

/// Append a newline if the file does not end with one
///
/// The reader accepts a final record without its newline. Appending right
/// after it would glue the next record onto the same line.
fn end_torn_record(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] == b'\n' {
        return Ok(false);
    }

    file.write_all(b"\n")?;
    Ok(true)
}

/// Writer thread body: one event at a time, in queue order
fn run_writer(mut file: File, queue: Receiver<Pending>, shared: Arc<Shared>) {
    for Pending { event, ack } in queue.iter() {
        let id = shared.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let event = event.with_id(id);

        match file.write_all(encode_event(&event).as_bytes()) {
            Ok(()) => {
                tracing::trace!(id, kind = %event.kind, key = %event.key, "event appended");
                if let Some(ack) = ack {
                    let _ = ack.send(Ok(id));
                }
            }
            Err(source) => {
                shared.failure_count.fetch_add(1, Ordering::SeqCst);
                let error = KvError::LogWrite { id, source };
                tracing::error!(id, key = %event.key, error = %error, "failed to append event");

                match ack {
                    Some(ack) => {
                        let _ = ack.send(Err(error));
                    }
                    None => {
                        if shared.failures.try_send(error).is_err() {
                            tracing::warn!(id, "failure sink full, failure counted but not queued");
                        }
                    }
                }
            }
        }

        shared.in_flight.done();
    }
}
