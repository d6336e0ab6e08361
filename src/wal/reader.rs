//! Log Reader
//!
//! Scans a transaction log back into an ordered stream of events.
//!
//! Each line is decoded and its ID checked against the last accepted one.
//! The first malformed or out-of-sequence line ends the stream with an
//! error; no line is ever skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver};

use crate::error::{KvError, Result};

use super::codec::decode_event;
use super::Event;

/// Sequential reader over log lines
pub struct LogReader<R> {
    reader: R,

    /// ID of the last accepted event
    last_id: u64,

    /// 1-based number of the last line read
    line_no: u64,

    /// Set once EOF or an error has been returned
    done: bool,

    buf: Vec<u8>,
}

impl LogReader<BufReader<File>> {
    /// Open a log file for reading from its first line
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), 0))
    }
}

impl<R: BufRead> LogReader<R> {
    /// Wrap a reader; events must have IDs greater than `last_id`
    pub fn new(reader: R, last_id: u64) -> Self {
        Self {
            reader,
            last_id,
            line_no: 0,
            done: false,
            buf: Vec::new(),
        }
    }

    /// ID of the last accepted event
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    /// Number of lines consumed so far
    pub fn lines_read(&self) -> u64 {
        self.line_no
    }

    /// Read the next event
    ///
    /// Returns `Ok(None)` at a clean end of file.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        let mut line: &[u8] = &self.buf;
        if let Some(stripped) = line.strip_suffix(b"\n") {
            line = stripped;
        }
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }

        let text = std::str::from_utf8(line).map_err(|e| KvError::MalformedRecord {
            line: self.line_no,
            reason: format!("invalid UTF-8: {}", e),
        })?;

        let event = decode_event(text, self.line_no)?;

        if event.id <= self.last_id {
            return Err(KvError::Sequence {
                line: self.line_no,
                last: self.last_id,
                found: event.id,
            });
        }

        self.last_id = event.id;
        Ok(Some(event))
    }
}

impl<R: BufRead> Iterator for LogReader<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

// =============================================================================
// Background Replay Stream
// =============================================================================

/// Events and errors produced by a background reader thread
///
/// `events` is a rendezvous channel: the reader only moves on once the
/// previous event has been taken. `errors` holds at most one, terminal, error.
/// Both channels disconnect when the reader finishes.
pub struct ReplayStream {
    pub events: Receiver<Event>,
    pub errors: Receiver<KvError>,
    handle: JoinHandle<()>,
}

impl ReplayStream {
    /// Start a reader thread over `reader`
    ///
    /// `last_id` is both the starting point of the sequence check and where
    /// every accepted ID is published.
    pub fn spawn<R>(reader: R, last_id: Arc<AtomicU64>) -> Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (event_tx, events) = channel::bounded(0);
        let (error_tx, errors) = channel::bounded(1);
        let mut log_reader = LogReader::new(reader, last_id.load(Ordering::SeqCst));

        let handle = thread::Builder::new()
            .name("yakv-log-reader".to_string())
            .spawn(move || {
                for item in &mut log_reader {
                    match item {
                        Ok(event) => {
                            last_id.store(event.id, Ordering::SeqCst);
                            if event_tx.send(event).is_err() {
                                // Consumer went away
                                return;
                            }
                        }
                        Err(e) => {
                            let _ = error_tx.send(e);
                            return;
                        }
                    }
                }
                tracing::debug!(lines = log_reader.lines_read(), "log reader reached end of file");
            })?;

        Ok(Self {
            events,
            errors,
            handle,
        })
    }

    /// Wait for the reader thread to exit
    ///
    /// The thread exits once both streams are drained or dropped.
    pub fn join(self) {
        let ReplayStream {
            events,
            errors,
            handle,
        } = self;
        drop(events);
        drop(errors);
        if handle.join().is_err() {
            tracing::error!("log reader thread panicked");
        }
    }
}
