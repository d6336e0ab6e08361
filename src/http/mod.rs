//! HTTP Module
//!
//! Thin JSON-over-HTTP front end for the engine.
//!
//! ## Routes
//! - `GET    /yakv/v0/get`    body `{"key": ...}`              → 200 value / 404
//! - `PUT    /yakv/v0/put`    body `{"key": ..., "value": ...}` → 201
//! - `DELETE /yakv/v0/delete` body `{"key": ...}`              → 200
//! - `GET    /yakv/v0/health`                                  → 200 JSON
//!
//! ## Architecture
//! - axum router sharing one `Arc<Engine>`
//! - Mutations run on the blocking pool, since the log queue may block

mod handler;
mod request;
mod response;
mod server;

pub use request::{decode_json_body, KeyBody, PutBody};
pub use response::ApiError;
pub use server::Server;
