//! Error taxonomy for artifact loading and prediction

use std::path::PathBuf;
use thiserror::Error;

/// Failure while locating, decoding, or validating the model artifact.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The artifact file does not exist.
    #[error("model artifact not found at {0}")]
    NotFound(PathBuf),

    /// The artifact exists but could not be decompressed or parsed,
    /// or a compound artifact is missing its nested model entry.
    #[error("failed to deserialize model artifact")]
    Deserialization(#[source] anyhow::Error),

    /// The artifact parsed but does not describe a usable predictor.
    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),
}

/// Failure while invoking the loaded predictor.
#[derive(Debug, Error)]
pub enum PredictionError {
    /// Input vector length does not match the trained feature count.
    #[error("expected {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    /// Any other invocation-time failure, surfaced with its cause.
    #[error("prediction failed: {0}")]
    Failed(String),
}
