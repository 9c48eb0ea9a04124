//! Housing Price Estimation Service - Main Entry Point
//!
//! Consumes estimation requests from NATS, runs the loaded regression
//! model, and publishes price estimates. Supports parallel request
//! processing.

use anyhow::{Context, Result};
use futures::StreamExt;
use housing_price_estimator::{
    config::AppConfig,
    consumer::RequestConsumer,
    metrics::{MetricsReporter, ServiceMetrics},
    models::engine::EstimationEngine,
    producer::EstimateProducer,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("housing_price_estimator=info".parse()?),
        )
        .init();

    info!("Starting Housing Price Estimation Service");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");
    info!(
        artifact_path = %config.model.artifact_path,
        workers = config.pipeline.workers,
        "Service configuration"
    );

    // Initialize metrics
    let metrics = Arc::new(ServiceMetrics::new());

    // Initialize the estimation engine and load the artifact up front:
    // a service that cannot answer requests should not accept them.
    let engine = Arc::new(EstimationEngine::new(&config));
    engine
        .warm_up()
        .context("Failed to load the model artifact")?;

    if let Some(metadata) = engine.metadata() {
        info!(
            variant = %metadata.variant,
            mae = %metadata.display_mae(),
            "Estimation engine initialized"
        );
        for (name, value) in &metadata.hyperparameters {
            info!(param = %name, value = %value, "Model hyperparameter");
        }
    }

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    // Initialize consumer and producer
    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let producer = Arc::new(EstimateProducer::new(
        client.clone(),
        &config.nats.estimate_subject,
    ));

    let num_workers = config.pipeline.workers;
    info!(
        "Starting request processing loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", config.nats.request_subject);
    info!("Publishing estimates to: {}", config.nats.estimate_subject);

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Process requests in parallel; the engine's model handle is
    // read-only after warm-up and shared across all workers.
    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore.clone().acquire_owned().await?;

        let engine = engine.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            match RequestConsumer::decode(&message.payload) {
                Ok(request) => {
                    let request_id = request.request_id.clone();

                    let features = match request.feature_vector() {
                        Ok(features) => features,
                        Err(e) => {
                            metrics.record_rejection();
                            warn!(request_id = %request_id, error = %e, "Rejected request");
                            drop(permit);
                            return;
                        }
                    };

                    match engine.estimate(features.as_slice()) {
                        Ok(median_value) => {
                            let processing_time = start_time.elapsed();
                            metrics.record_request(processing_time, median_value);

                            let variant = engine
                                .metadata()
                                .map(|m| m.variant.clone())
                                .unwrap_or_else(|| "unavailable".to_string());
                            let mae = engine.metadata().and_then(|m| m.mae);

                            let estimate =
                                housing_price_estimator::PriceEstimate::new(
                                    request_id.clone(),
                                    median_value,
                                    variant,
                                )
                                .with_mae(mae);

                            if let Err(e) = producer.publish(&estimate).await {
                                error!(
                                    request_id = %request_id,
                                    error = %e,
                                    "Failed to publish estimate"
                                );
                            } else {
                                metrics.record_published();
                                debug!(
                                    request_id = %request_id,
                                    price = estimate.price,
                                    processing_time_us = processing_time.as_micros(),
                                    "Estimate published"
                                );
                            }

                            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

                            // Log progress every 100 requests
                            if count % 100 == 0 {
                                let throughput = metrics.get_throughput();
                                let processing_stats = metrics.get_processing_stats();
                                info!(
                                    processed = count,
                                    throughput = format!("{:.1} req/s", throughput),
                                    avg_latency_us = processing_stats.mean_us,
                                    "Processing milestone"
                                );
                            }
                        }
                        Err(e) => {
                            error!(
                                request_id = %request_id,
                                error = %e,
                                "Estimation failed"
                            );
                        }
                    }
                }
                Err(e) => {
                    metrics.record_rejection();
                    warn!(error = %e, "Failed to deserialize request");
                }
            }

            drop(permit);
        });
    }

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}
