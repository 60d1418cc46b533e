//! Atelier MCP server binary.
//!
//! Opens the shared business store, runs migrations, and serves the MCP
//! streamable HTTP endpoint under /mcp.

use std::net::IpAddr;
use std::path::PathBuf;

use atelier::db::{DbError, SqliteDatabase};
use atelier::mcp::create_mcp_service;
use axum::Router;
use clap::Parser;
use miette::Diagnostic;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Error, Diagnostic, Debug)]
enum BinaryError {
    #[error("Database error: {0}")]
    #[diagnostic(code(atelier::binary::database))]
    Database(#[from] DbError),

    #[error("I/O error: {0}")]
    #[diagnostic(code(atelier::binary::io))]
    Io(#[from] std::io::Error),
}

#[derive(Parser)]
#[command(name = "atelier-mcp")]
#[command(author, version, about = "Atelier MCP server", long_about = None)]
struct Cli {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Database file path
    #[arg(long, default_value = "atelier.db")]
    db: PathBuf,
}

/// Initialize tracing subscriber with env filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), BinaryError> {
    init_tracing();

    let cli = Cli::parse();

    if let Some(parent) = cli.db.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    info!("Opening database at {:?}", cli.db);
    let db = SqliteDatabase::open(&cli.db).await?;
    db.migrate().await?;
    info!("Database migrations complete");

    let cancellation_token = CancellationToken::new();
    let mcp_service = create_mcp_service(db.pool().clone(), cancellation_token.clone());

    let app = Router::new()
        .nest_service("/mcp", mcp_service)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("MCP server listening on http://{}/mcp", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
            cancellation_token.cancel();
        })
        .await?;

    Ok(())
}
