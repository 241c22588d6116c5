//! # parley
//!
//! Parley relay server binary — loads settings, builds the collaborator
//! clients, and starts the WebSocket server.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use parley_enrich::{
    HttpClassifier, HttpFactSource, HttpKeywordExtractor, HttpNewsSource, HttpRoomAuthority,
};
use parley_enrich::{FactSource, KeywordExtractor, NewsSource};
use parley_rooms::{DisabledAuthority, RoomAuthority, TopicClassifier};
use parley_server::AppState;
use parley_settings::{LoggingSettings, ParleySettings};

/// Parley room relay server.
#[derive(Parser, Debug)]
#[command(name = "parley", about = "Parley room relay server")]
struct Cli {
    /// Path to the settings file.
    #[arg(long, default_value = "parley.json")]
    settings: PathBuf,

    /// Bind address (overrides settings if specified).
    #[arg(long)]
    bind: Option<String>,

    /// Port to bind (overrides settings if specified; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,
}

/// Initialize the tracing subscriber from the logging settings.
///
/// `RUST_LOG` takes priority over the configured level when set.
fn init_logging(logging: &LoggingSettings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Wire the collaborator clients and assemble the server state.
///
/// Without a configured Room Authority every room is public and membership
/// stays in-process.
fn build_state(settings: ParleySettings, metrics: PrometheusHandle) -> Result<AppState> {
    let timeout = Duration::from_millis(settings.enrichment.timeout_ms);

    let authority: Arc<dyn RoomAuthority> = if settings.authority.enabled {
        tracing::info!(url = %settings.authority.base_url, "room authority enabled");
        Arc::new(
            HttpRoomAuthority::new(&settings.authority)
                .context("Failed to build room authority client")?,
        )
    } else {
        tracing::info!("no room authority configured — all rooms public");
        Arc::new(DisabledAuthority)
    };

    let classifier: Arc<dyn TopicClassifier> = Arc::new(
        HttpClassifier::new(&settings.enrichment.classifier_url, timeout)
            .context("Failed to build classifier client")?,
    );
    let keywords: Arc<dyn KeywordExtractor> = Arc::new(
        HttpKeywordExtractor::new(&settings.enrichment.keyword_url, timeout)
            .context("Failed to build keyword client")?,
    );
    let facts: Arc<dyn FactSource> = Arc::new(
        HttpFactSource::new(&settings.enrichment.fact_url, timeout)
            .context("Failed to build fact client")?,
    );
    let news: Arc<dyn NewsSource> = Arc::new(
        HttpNewsSource::new(
            &settings.enrichment.news_url,
            timeout,
            settings.enrichment.max_news_items,
        )
        .context("Failed to build news client")?,
    );

    Ok(AppState::new(
        settings, authority, classifier, keywords, facts, news, metrics,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let mut settings = parley_settings::load_settings_from_path(&args.settings)
        .context("Failed to load settings")?;
    if let Some(bind) = args.bind {
        settings.server.bind_addr = bind;
    }
    if let Some(port) = args.port {
        settings.server.ws_port = port;
    }

    init_logging(&settings.logging);
    tracing::info!(
        settings = %args.settings.display(),
        capacity = settings.rooms.default_capacity,
        window = settings.rooms.transcript_window,
        "starting parley relay"
    );

    let metrics = parley_server::metrics::install_recorder();
    let state = build_state(settings, metrics)?;

    let handle = parley_server::start(state)
        .await
        .context("Failed to bind server")?;
    tracing::info!(port = handle.port, "parley relay ready");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down");
    Ok(())
}
