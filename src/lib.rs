//! Housing Price Estimation Service Library
//!
//! Loads a persisted regression model once per process and answers
//! estimation requests carrying the 13 Boston housing attributes.

pub mod config;
pub mod consumer;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod types;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use error::{LoadError, PredictionError};
pub use features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use models::engine::EstimationEngine;
pub use models::loader::ArtifactLoader;
pub use producer::EstimateProducer;
pub use types::{estimate::PriceEstimate, request::EstimateRequest};
