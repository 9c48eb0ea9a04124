//! NATS message producer for price estimates

use crate::types::estimate::PriceEstimate;
use anyhow::Result;
use async_nats::Client;
use tracing::debug;

/// Producer for publishing price estimates to NATS
#[derive(Clone)]
pub struct EstimateProducer {
    client: Client,
    subject: String,
}

impl EstimateProducer {
    /// Create a new estimate producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a price estimate
    pub async fn publish(&self, estimate: &PriceEstimate) -> Result<()> {
        let payload = serde_json::to_vec(estimate)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            estimate_id = %estimate.estimate_id,
            request_id = %estimate.request_id,
            price = estimate.price,
            "Published price estimate"
        );

        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
