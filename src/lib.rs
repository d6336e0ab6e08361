//! # yakv
//!
//! A key-value store served over HTTP with:
//! - An append-only transaction log for durability
//! - Crash recovery by replaying the log at startup
//! - Concurrent readers, exclusive writers on the in-memory store
//! - A single background log writer fed by a bounded queue
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Server                             │
//! │                 (one task per request)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │              (store + transaction log)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Store    │          │  Event Log  │
//!   │  (RwLock)   │          │ (1 writer)  │
//!   └─────────────┘          └──────┬──────┘
//!          ▲                        │
//!          │      replay at startup │
//!          └────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod wal;
pub mod engine;
pub mod http;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{Config, Durability};
pub use engine::Engine;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of yakv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
