//! yakv Server Binary
//!
//! Replays the transaction log, then serves the store over HTTP.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use yakv::http::Server;
use yakv::{Config, Durability, Engine};

/// yakv Server
#[derive(Parser, Debug)]
#[command(name = "yakv-server")]
#[command(about = "Key-value store over HTTP, backed by a transaction log")]
#[command(version)]
struct Args {
    /// Listen host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Listen port
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Transaction log file
    #[arg(short, long, default_value = "transaction.log")]
    filename: PathBuf,

    /// Durability mode: async or acknowledged
    #[arg(short, long, default_value = "async")]
    durability: Durability,

    /// Capacity of the log writer queue
    #[arg(short, long, default_value = "16")]
    queue_capacity: usize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,yakv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("yakv Server v{}", yakv::VERSION);
    tracing::info!("Transaction log: {}", args.filename.display());
    tracing::info!("Durability: {}", args.durability);

    // Build config from args
    let config = Config::builder()
        .host(&args.host)
        .port(args.port)
        .log_path(&args.filename)
        .durability(args.durability)
        .queue_capacity(args.queue_capacity)
        .build();

    // Replay must finish before any request is accepted
    let engine = match tokio::task::spawn_blocking(move || Engine::open(config)).await {
        Ok(Ok(e)) => Arc::new(e),
        Ok(Err(e)) => {
            tracing::error!("Failed to initialize transaction log: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Startup task failed: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized successfully");

    watch_write_failures(&engine);

    let server = Server::new(Arc::clone(&engine));
    if let Err(e) = server.run(shutdown_signal()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    // Drain queued events before exiting
    let closing = Arc::clone(&engine);
    match tokio::task::spawn_blocking(move || closing.close()).await {
        Ok(Ok(())) => tracing::info!(last_id = engine.last_id(), "Transaction log closed"),
        Ok(Err(e)) => tracing::error!("Failed to close transaction log: {}", e),
        Err(e) => tracing::error!("Shutdown task failed: {}", e),
    }

    tracing::info!("Server stopped");
}

/// Resolve on Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, initiating shutdown...");
}

/// Log every asynchronous append failure as it is reported
fn watch_write_failures(engine: &Engine) {
    let failures = engine.write_failures();
    let spawned = thread::Builder::new()
        .name("yakv-failure-watch".to_string())
        .spawn(move || {
            for failure in failures.iter() {
                tracing::error!("Transaction log write failed: {}", failure);
            }
        });

    if let Err(e) = spawned {
        tracing::warn!("Could not watch for write failures: {}", e);
    }
}
