//! Model artifact handling and inference components

pub mod artifact;
pub mod engine;
pub mod loader;
pub mod predictor;

pub use artifact::{ModelMetadata, ModelSpec};
pub use engine::EstimationEngine;
pub use loader::{ArtifactLoader, LoadedModel};
pub use predictor::Predictor;
