//! Store Module
//!
//! The authoritative in-memory key-value state.
//!
//! ## Responsibilities
//! - Upsert, lookup and removal of string keys
//! - Many concurrent readers, one exclusive writer
//! - Rebuilt from the transaction log at startup, never persisted itself
//!
//! ## Data Structure Choice
//! HashMap wrapped in RwLock: no ordering requirement on keys,
//! and Put/Delete hold the same exclusive lock.

mod table;

pub use table::Store;
