//! Performance metrics and statistics tracking for the estimation service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Width of one estimate distribution bucket, in thousands.
const BUCKET_WIDTH: f64 = 5.0;

/// Metrics collector for service performance
pub struct ServiceMetrics {
    /// Total requests processed
    pub requests_processed: AtomicU64,
    /// Requests rejected before reaching the model
    pub requests_rejected: AtomicU64,
    /// Estimates published
    pub estimates_published: AtomicU64,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Estimate distribution buckets, 5k-wide from 0 to 50k+
    value_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            requests_processed: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            estimates_published: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            value_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a processed request and its estimate
    pub fn record_request(&self, processing_time: Duration, median_value: f64) {
        self.requests_processed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = ((median_value / BUCKET_WIDTH).max(0.0) as usize).min(9);
        if let Ok(mut buckets) = self.value_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a request rejected at the boundary
    pub fn record_rejection(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a published estimate
    pub fn record_published(&self) {
        self.estimates_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read().unwrap();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get estimate value distribution
    pub fn get_value_distribution(&self) -> [u64; 10] {
        *self.value_buckets.read().unwrap()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let request_count = self.requests_processed.load(Ordering::Relaxed);
        let rejected_count = self.requests_rejected.load(Ordering::Relaxed);
        let published_count = self.estimates_published.load(Ordering::Relaxed);

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let value_dist = self.get_value_distribution();

        info!("==== Housing Price Estimation - Metrics Summary ====");
        info!(
            "Requests processed: {} ({:.1} req/s), rejected: {}, estimates published: {}",
            request_count, throughput, rejected_count, published_count
        );
        info!(
            "Processing time (us): mean={} p50={} p95={} p99={} max={}",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us,
            processing.max_us
        );

        let total: u64 = value_dist.iter().sum();
        if total > 0 {
            info!("Estimate distribution (thousands):");
            for (i, &count) in value_dist.iter().enumerate() {
                let pct = (count as f64 / total as f64) * 100.0;
                let low = i as f64 * BUCKET_WIDTH;
                let high = low + BUCKET_WIDTH;
                info!("  {:>4.0}-{:<4.0}: {:>6} ({:>5.1}%)", low, high, count, pct);
            }
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
