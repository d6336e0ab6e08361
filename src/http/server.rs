//! HTTP Server
//!
//! Binds the listener and serves the router until shutdown.

use std::future::Future;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, put};
use axum::Router;
use tokio::net::TcpListener;

use crate::engine::Engine;
use crate::error::Result;

use super::handler;

/// HTTP server for yakv
pub struct Server {
    engine: Arc<Engine>,
}

impl Server {
    /// Create a new server over a recovered engine
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Routes, body limit and shared state
    pub fn router(&self) -> Router {
        let max_body_bytes = self.engine.config().max_body_bytes;

        Router::new()
            .route("/yakv/v0/get", get(handler::get_value))
            .route("/yakv/v0/put", put(handler::put_value))
            .route("/yakv/v0/delete", delete(handler::delete_value))
            .route("/yakv/v0/health", get(handler::health))
            .layer(DefaultBodyLimit::max(max_body_bytes))
            .with_state(Arc::clone(&self.engine))
    }

    /// Bind the configured address and serve until `shutdown` resolves
    ///
    /// In-flight requests finish before this returns. The engine is left
    /// open; closing it is the caller's job.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.engine.config().listen_addr();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "yakv is up and running");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
