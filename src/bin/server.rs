use std::{
    error::Error,
    fs::OpenOptions,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use ofc_rs::{AppState, FeedConfig, build_router, graceful_shutdown, logging_middleware};

/// The REST API server for ofc_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "OFC_DB_PATH", default_value = "ofc.db")]
    db_path: String,

    /// The address to listen on.
    #[arg(long, env = "OFC_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, env = "OFC_PORT", default_value_t = 8000)]
    port: u16,

    /// How often, in milliseconds, the transaction feed checks for new transactions.
    #[arg(long, env = "OFC_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    setup_logging()?;

    let addr = SocketAddr::from((args.host, args.port));

    let connection = Connection::open(&args.db_path)?;
    let state = AppState::new(
        connection,
        FeedConfig {
            poll_interval: Duration::from_millis(args.poll_interval_ms.max(1)),
        },
    )?;

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive());
    let router = add_tracing_layer(router);

    tracing::info!("HTTP server listening on {addr} using database {}", args.db_path);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn setup_logging() -> Result<(), Box<dyn Error>> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ofc_rs=debug,info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let path = req.uri().path();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %path, matched_path)
        })
        // Errors are logged where they are converted into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
