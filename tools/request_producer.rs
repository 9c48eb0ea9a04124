//! Test Request Producer
//!
//! Generates and publishes randomized housing estimation requests to
//! NATS for service testing.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Request structure matching the service's expected format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EstimateRequest {
    request_id: String,
    crim: f64,
    zn: f64,
    indus: f64,
    chas: u8,
    nox: f64,
    rm: f64,
    age: f64,
    dis: f64,
    rad: f64,
    tax: f64,
    ptratio: f64,
    b: f64,
    lstat: f64,
    timestamp: chrono::DateTime<Utc>,
}

/// Request generator sampling within the observed dataset ranges
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    request_counter: u64,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            request_counter: 0,
        }
    }

    fn generate(&mut self) -> EstimateRequest {
        self.request_counter += 1;

        EstimateRequest {
            request_id: format!("req_{:012}", self.request_counter),
            crim: self.rng.gen_range(0.006..89.0),
            zn: self.rng.gen_range(0.0..100.0),
            indus: self.rng.gen_range(0.46..27.74),
            // The only categorical attribute; always 0 or 1
            chas: if self.rng.gen_bool(0.07) { 1 } else { 0 },
            nox: self.rng.gen_range(0.385..0.871),
            rm: self.rng.gen_range(3.56..8.78),
            age: self.rng.gen_range(2.9..100.0),
            dis: self.rng.gen_range(1.13..12.13),
            rad: self.rng.gen_range(1.0_f64..24.0).round(),
            tax: self.rng.gen_range(187.0_f64..711.0).round(),
            ptratio: self.rng.gen_range(12.6..22.0),
            b: self.rng.gen_range(0.32..396.9),
            lstat: self.rng.gen_range(1.73..37.97),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_requests_stay_in_range() {
        let mut generator = RequestGenerator::new();

        for _ in 0..100 {
            let request = generator.generate();
            assert!(request.chas <= 1);
            assert!((1.0..=24.0).contains(&request.rad));
            assert!((187.0..=711.0).contains(&request.tax));
            assert_eq!(request.rad, request.rad.round());
        }
    }

    #[test]
    fn test_request_ids_are_sequential() {
        let mut generator = RequestGenerator::new();
        assert_eq!(generator.generate().request_id, "req_000000000001");
        assert_eq!(generator.generate().request_id, "req_000000000002");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("request_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Request Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("housing.requests");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, delay_ms).await;
        }
    };

    // Generate and publish requests
    let mut generator = RequestGenerator::new();

    info!("Starting to publish {} requests...", count);

    for i in 0..count {
        let request = generator.generate();
        let payload = serde_json::to_vec(&request)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!("Published {}/{} requests", i + 1, count);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!("Completed! Published {} requests", count);

    Ok(())
}

async fn run_dry_mode(count: u64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = RequestGenerator::new();

    for i in 0..count {
        let request = generator.generate();
        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
