//! Request handlers
//!
//! One handler per route; each decodes its body, calls the engine and maps
//! the outcome to a response.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bytes::Bytes;

use crate::engine::{Engine, Health};
use crate::error::Result;

use super::{decode_json_body, ApiError, KeyBody, PutBody};

/// `GET /yakv/v0/get`
pub async fn get_value(
    State(engine): State<Arc<Engine>>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<String, ApiError> {
    let request: KeyBody = decode_json_body(&headers, &body)?;
    if request.key.is_empty() {
        return Err(ApiError::bad_request("key must not be empty"));
    }

    let value = engine.get(&request.key)?;
    tracing::debug!(key = %request.key, "value found");
    Ok(value)
}

/// `PUT /yakv/v0/put`
pub async fn put_value(
    State(engine): State<Arc<Engine>>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<StatusCode, ApiError> {
    let request: PutBody = decode_json_body(&headers, &body)?;
    tracing::debug!(key = %request.key, "putting value");

    run_blocking(engine, move |engine| engine.put(&request.key, &request.value)).await?;
    Ok(StatusCode::CREATED)
}

/// `DELETE /yakv/v0/delete`
pub async fn delete_value(
    State(engine): State<Arc<Engine>>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<StatusCode, ApiError> {
    let request: KeyBody = decode_json_body(&headers, &body)?;
    tracing::debug!(key = %request.key, "deleting key");

    run_blocking(engine, move |engine| engine.delete(&request.key)).await?;
    Ok(StatusCode::OK)
}

/// `GET /yakv/v0/health`
pub async fn health(State(engine): State<Arc<Engine>>) -> Json<Health> {
    Json(engine.health())
}

/// Run a mutation off the async workers; it may block on the log queue
async fn run_blocking<F>(engine: Arc<Engine>, mutation: F) -> std::result::Result<(), ApiError>
where
    F: FnOnce(&Engine) -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(move || mutation(&engine))
        .await
        .map_err(|e| ApiError::internal(format!("mutation task failed: {}", e)))?
        .map_err(ApiError::from)
}
