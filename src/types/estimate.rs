//! Price estimate data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conversion between model output (thousands) and display currency.
const THOUSANDS_TO_CURRENCY: f64 = 1000.0;

/// Price estimate published for a processed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEstimate {
    /// Unique estimate identifier
    pub estimate_id: String,

    /// Associated request ID
    pub request_id: String,

    /// Raw model output, in thousands of currency units
    pub median_value: f64,

    /// Display price in currency units
    pub price: f64,

    /// Model variant that produced the estimate
    pub model_variant: String,

    /// Mean absolute error bundled with the artifact, when available
    pub mae: Option<f64>,

    /// Estimate generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl PriceEstimate {
    /// Create a new estimate from a raw model output.
    pub fn new(request_id: String, median_value: f64, model_variant: String) -> Self {
        Self {
            estimate_id: uuid::Uuid::new_v4().to_string(),
            request_id,
            median_value,
            price: median_value * THOUSANDS_TO_CURRENCY,
            model_variant,
            mae: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the artifact's accuracy metric.
    pub fn with_mae(mut self, mae: Option<f64>) -> Self {
        self.mae = mae;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_conversion() {
        let estimate = PriceEstimate::new("req_1".to_string(), 24.5, "svr".to_string());
        assert_eq!(estimate.median_value, 24.5);
        assert_eq!(estimate.price, 24500.0);
    }

    #[test]
    fn test_estimate_serialization() {
        let estimate = PriceEstimate::new("req_2".to_string(), 18.0, "elastic_net".to_string())
            .with_mae(Some(2.4));

        let json = serde_json::to_string(&estimate).unwrap();
        let deserialized: PriceEstimate = serde_json::from_str(&json).unwrap();

        assert_eq!(estimate.estimate_id, deserialized.estimate_id);
        assert_eq!(deserialized.price, 18000.0);
        assert_eq!(deserialized.mae, Some(2.4));
    }
}
