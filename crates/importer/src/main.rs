mod metrics;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardvault_core::{
    load_config, validate_config, CardCatalog, Config, ImportJob, ImportPipeline, LogFormat,
    ScryfallClient, SqliteCardStore,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("CARDVAULT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration first so the log format is known
    let loaded = load_config(&config_path);
    let format = loaded
        .as_ref()
        .map(|c| c.log.format)
        .unwrap_or_default();
    init_logging(format);

    let config = loaded.with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded from {:?}", config_path);
    info!("Database path: {:?}", config.database.path);
    info!("Bulk data directory: {:?}", config.import.data_dir);

    metrics::register_metrics()?;

    run_import(&config).await?;

    match metrics::encode_metrics() {
        Ok(text) => debug!("Metrics after import:\n{}", text),
        Err(e) => warn!("Failed to encode metrics: {:#}", e),
    }

    Ok(())
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn run_import(config: &Config) -> Result<()> {
    let store = Arc::new(
        SqliteCardStore::new(&config.database.path)
            .context("Failed to open card store")?
            .with_search_config(&config.search),
    );
    info!("Card store initialized");

    let source = Arc::new(
        ScryfallClient::new(config.scryfall.clone()).context("Failed to create Scryfall client")?,
    );
    info!("Using Scryfall API at {}", source.base_url());

    let pipeline = ImportPipeline::new(source, store.clone(), config.import.clone());
    let job = ImportJob::new(pipeline);

    let report = tokio::select! {
        result = job.run() => result.context("Import failed")?,
        _ = shutdown_signal() => {
            warn!("Interrupted; batches committed so far are kept, run again to finish");
            anyhow::bail!("Import interrupted");
        }
    };

    info!(
        "Imported {} of {} records ({} skipped) in {} batches",
        report.rows_written,
        report.records_seen,
        report.skipped_total(),
        report.batches
    );
    for (reason, count) in &report.skipped {
        info!("  skipped {}: {}", reason, count);
    }

    let stats = store.stats().context("Failed to read catalog stats")?;
    info!(
        "Catalog: {} printings, {} cards, {} sets, search index {}",
        stats.total_cards,
        stats.distinct_oracle_ids,
        stats.distinct_sets,
        if stats.search_index_available {
            "ready"
        } else {
            "missing"
        }
    );
    debug!(
        "Import report: {}",
        serde_json::to_string(&report).unwrap_or_default()
    );

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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
}
