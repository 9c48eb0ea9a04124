//! NATS message consumer for incoming estimation requests

use anyhow::{Context, Result};
use async_nats::{Client, Subscriber};
use tracing::info;

use crate::types::request::EstimateRequest;

/// Consumer for receiving estimation requests from NATS
pub struct RequestConsumer {
    client: Client,
    subject: String,
}

impl RequestConsumer {
    /// Create a new request consumer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the request subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, "Subscribed to request subject");
        Ok(subscriber)
    }

    /// Decode a raw message payload into an estimation request.
    ///
    /// Accepts both the service's snake_case field names and the
    /// dataset's uppercase column aliases.
    pub fn decode(payload: &[u8]) -> Result<EstimateRequest> {
        serde_json::from_slice(payload).context("malformed estimation request")
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
