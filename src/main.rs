use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod cache;
mod config;
mod messaging;
mod metrics;
mod models;
mod pipeline;
mod read;
mod storage;
mod validator;

#[cfg(test)]
mod fixtures;

use cache::OrderCache;
use config::Config;
use pipeline::{IngestPipeline, PipelineStatus};
use read::OrderReader;
use storage::{OrderStore, PgOrderStore};
use validator::Validator;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_ingest=debug")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(
        http_addr = %config.http_addr,
        topic = %config.kafka.topic,
        cache_capacity = config.cache_capacity,
        "starting order ingestion service"
    );

    // === 1. Durable store ===
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&config.db_dsn)
        .await
        .context("connecting to postgres")?;
    storage::ensure_schema(&pool)
        .await
        .context("ensuring database schema")?;
    let store: Arc<dyn OrderStore> = Arc::new(PgOrderStore::new(pool));

    // === 2. Metrics registry and scrape server ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    let registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = metrics::start_metrics_server(registry, metrics_port).await {
            tracing::error!(error = %e, "metrics server error");
        }
    });

    // === 3. Shared cache ===
    let cache = Arc::new(OrderCache::new(config.cache_capacity));

    // === 4. Ingestion pipeline ===
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    if config.kafka_disabled {
        tracing::warn!("KAFKA_DISABLED=1, ingestion pipeline not started");
    } else {
        messaging::ensure_topic(&config.kafka).await;
        let consumer =
            messaging::create_consumer(&config.kafka).context("creating Kafka consumer")?;

        let pipeline = IngestPipeline::new(
            Validator::new(config.validation_rules),
            store.clone(),
            cache.clone(),
            config.cache_write_policy,
            metrics.clone(),
        );

        let (status_tx, status_rx) = watch::channel(PipelineStatus::Running);
        tokio::spawn(pipeline.run(consumer, status_tx, shutdown_rx));
        tokio::spawn(pipeline::supervise(status_rx));
    }

    // === 5. Order API ===
    let state = web::Data::new(api::AppState {
        validator: Validator::new(config.validation_rules),
        reader: OrderReader::new(cache, store, metrics),
    });

    HttpServer::new(move || App::new().app_data(state.clone()).configure(api::configure))
        .bind(config.http_addr.as_str())?
        .run()
        .await?;

    // The HTTP server has exited (signal received); stop the consumer too.
    tracing::info!("shutting down");
    let _ = shutdown_tx.send(true);

    Ok(())
}
