//! # Newscast
//!
//! A tech-news service that keeps ranked listings of HackerNews and GeekNews
//! items fresh, serves them over HTTP, and turns a batch of article URLs into
//! a two-host podcast episode on demand.
//!
//! ## Features
//!
//! - Scrapes each provider's front page on a fixed interval into a ranked store
//! - Serves paged listings of items and generated podcasts
//! - Generates podcasts in stages (script, chunked speech, upload) and streams
//!   each stage's status token to the caller as it starts
//! - Serves and deletes the resulting `.txt` / `.mp3` files
//!
//! ## Usage
//!
//! ```sh
//! OPENAI_API_KEY=... GOOGLE_API_KEY=... newscast -o ./output -c ./config.yaml
//! ```
//!
//! ## Architecture
//!
//! 1. **Scraping**: one interval task per provider refreshes `{provider}:items`
//! 2. **Listing**: reverse-rank reads over the store
//! 3. **Generation**: a per-request job task feeding a status channel that the
//!    HTTP response streams
//! 4. **Artifacts**: files under `{output_dir}/podcasts`, indexed in
//!    `{provider}:podcasts`

use clap::Parser;
use reqwest::Client;
use std::error::Error;
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod models;
mod news;
mod podcast;
mod routes;
mod scrapers;
mod store;
mod utils;

use cli::Cli;
use models::Provider;
use podcast::{ArtifactStore, CloudSpeechSynthesizer, OpenAiScriptWriter, PodcastPipeline};
use routes::AppState;
use store::FileRankedStore;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("newscast starting up");

    let args = Cli::parse();
    debug!(output_dir = %args.output_dir.display(), store = %args.store_path().display(), "Parsed CLI arguments");

    let config = config::load_config(args.config.as_deref()).await?;

    // Fail fast if podcasts cannot be written.
    ensure_writable_dir(&args.podcast_dir()).await?;

    let store = Arc::new(FileRankedStore::open(args.store_path()).await?);
    let client = Client::builder()
        .timeout(config.request_timeout())
        .user_agent(concat!("newscast/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let writer = OpenAiScriptWriter::new(client.clone(), &config.openai_base_url, &args.openai_api_key);
    let speech = CloudSpeechSynthesizer::new(client.clone(), &config.tts_base_url, &args.google_api_key);
    let pipeline = PodcastPipeline::new(
        Arc::new(writer),
        Arc::new(speech),
        Arc::clone(&store),
        ArtifactStore::new(args.podcast_dir()),
    )
    .with_max_chunk_bytes(config.max_chunk_bytes)
    .with_chunk_encoding(config.chunk_encoding)
    .with_flush_delay(config.flush_delay());
    info!(
        dir = %pipeline.artifacts().dir().display(),
        max_chunk_bytes = config.max_chunk_bytes,
        chunk_encoding = ?config.chunk_encoding,
        "Podcast pipeline ready"
    );

    // ---- Scrapers ----
    let scrapers = if args.no_scrape {
        info!("Scrapers disabled");
        Vec::new()
    } else {
        Provider::ALL
            .into_iter()
            .map(|provider| {
                info!(%provider, every_secs = config.scrape_interval_secs, "Scheduling scraper");
                scrapers::spawn_refresh_loop(
                    client.clone(),
                    Arc::clone(&store),
                    provider,
                    config.scrape_interval(),
                )
            })
            .collect()
    };

    // ---- HTTP ----
    let state = AppState {
        pipeline: Arc::new(pipeline),
        store,
        config: Arc::new(config),
    };
    let app = routes::create_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for handle in scrapers {
        handle.abort();
    }
    info!("newscast stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
