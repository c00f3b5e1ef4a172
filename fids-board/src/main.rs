//! Flight Board (fids-board) - Main entry point
//!
//! This is the flight-information dashboard service: it serves the board
//! and history views, runs the timer-driven announcement scheduler, and
//! exposes the user management API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fids_board::announce::AnnouncementScheduler;
use fids_board::api::{self, AppContext};
use fids_board::audio::LibraryAudioSink;
use fids_board::config::Config;
use fids_board::db;
use fids_common::events::EventBus;

/// Command-line arguments for fids-board
#[derive(Parser, Debug)]
#[command(name = "fids-board")]
#[command(about = "Flight board and announcement service for FIDS")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5760", env = "FIDS_PORT")]
    port: u16,

    /// SQLite database path
    #[arg(short, long, default_value = "fids.db", env = "FIDS_DATABASE")]
    database: PathBuf,

    /// Root folder containing announcement clips
    #[arg(short, long, env = "FIDS_AUDIO_ROOT")]
    audio_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fids_board=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    let audio_root = fids_common::config::resolve_audio_root(
        args.audio_root.as_deref().and_then(|p| p.to_str()),
        "FIDS_AUDIO_ROOT",
        Some("audio_root"),
    )
    .context("Failed to resolve audio root folder")?;

    let config = Config {
        port: args.port,
        db_path: args.database.clone(),
        audio_root: audio_root.clone(),
    };

    info!("Starting FIDS flight board on port {}", config.port);
    info!("Audio root: {}", config.audio_root.display());

    // Open the database and prepare the schema
    let db_pool = db::init::connect(&config.db_path)
        .await
        .context("Failed to open database")?;
    db::init::init_schema(&db_pool)
        .await
        .context("Failed to initialize schema")?;
    db::init::seed_admin(&db_pool)
        .await
        .context("Failed to seed admin account")?;

    // Event bus shared by the scheduler, handlers, and SSE
    let bus = EventBus::new(1000);

    // Audio sink backed by the clip library
    let sink = Arc::new(LibraryAudioSink::new(audio_root));

    // Spawn the announcement scheduler actor
    let scheduler = AnnouncementScheduler::spawn(db_pool.clone(), sink, bus.clone());
    info!("Announcement scheduler spawned");

    // Build the application router
    let ctx = AppContext {
        db_pool,
        bus,
        scheduler,
    };
    let app = api::create_router(ctx);

    // Create socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    // Create and run the server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
