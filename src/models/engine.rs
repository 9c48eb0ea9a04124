//! Estimation engine for housing price inference
//!
//! Wraps the artifact loader behind a load-on-first-use cache and
//! exposes the prediction contract consumed by the service shell.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{LoadError, PredictionError};
use crate::features::FeatureVector;
use crate::models::artifact::ModelMetadata;
use crate::models::loader::{ArtifactLoader, LoadedModel};

/// Single-model estimation engine.
///
/// The underlying model is loaded at most once per engine and shared
/// read-only afterwards, so an `Arc<EstimationEngine>` is safe to
/// call from any number of concurrent workers.
pub struct EstimationEngine {
    /// Path to the persisted model artifact
    artifact_path: PathBuf,
    /// Lazily-initialized, immutable model handle
    model: OnceCell<Arc<LoadedModel>>,
}

impl EstimationEngine {
    /// Create an engine from configuration. The artifact is not read
    /// until the first prediction or an explicit [`warm_up`].
    ///
    /// [`warm_up`]: EstimationEngine::warm_up
    pub fn new(config: &AppConfig) -> Self {
        Self::with_artifact_path(&config.model.artifact_path)
    }

    /// Create an engine for a specific artifact path.
    pub fn with_artifact_path(path: impl Into<PathBuf>) -> Self {
        Self {
            artifact_path: path.into(),
            model: OnceCell::new(),
        }
    }

    /// Get the cached model handle, loading it on first use.
    ///
    /// Repeated calls never re-read the file; a successful load is
    /// reused for the lifetime of the engine.
    pub fn handle(&self) -> Result<&Arc<LoadedModel>, LoadError> {
        self.model
            .get_or_try_init(|| ArtifactLoader::load(&self.artifact_path).map(Arc::new))
    }

    /// Force the one-time load now instead of on the first request.
    pub fn warm_up(&self) -> Result<(), LoadError> {
        self.handle().map(|_| ())
    }

    /// Estimate the price for an ordered 13-value feature vector.
    ///
    /// The result is in thousands of currency units, as produced by
    /// the model; display conversion belongs to the caller.
    pub fn estimate(&self, values: &[f64]) -> Result<f64, PredictionError> {
        let model = self
            .handle()
            .map_err(|e| PredictionError::Failed(e.to_string()))?;

        let row = FeatureVector::from_slice(values)?.to_row();
        let value = model.predictor.predict_row(row.view())?;

        if !value.is_finite() {
            return Err(PredictionError::Failed(format!(
                "model produced a non-finite value: {value}"
            )));
        }

        debug!(value = value, "Estimate computed");
        Ok(value)
    }

    /// Metadata of the loaded model, or `None` before the first
    /// successful load.
    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.model.get().map(|m| &m.metadata)
    }

    /// Hyperparameters of the loaded model for display; empty when
    /// the adapter reports none.
    pub fn describe(&self) -> HashMap<String, String> {
        self.metadata()
            .map(|m| m.hyperparameters.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_COUNT;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_unit_model(dir: &TempDir) -> PathBuf {
        let json = serde_json::json!({
            "modelo": {
                "type": "elastic_net",
                "coefficients": vec![1.0; FEATURE_COUNT],
                "intercept": 0.0,
            },
            "mae": 1.9,
        });
        let path = dir.path().join("model.json.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(serde_json::to_vec(&json).unwrap().as_slice())
            .unwrap();
        encoder.finish().unwrap();
        path
    }

    #[test]
    fn test_estimate_sums_unit_coefficients() {
        let dir = TempDir::new().unwrap();
        let engine = EstimationEngine::with_artifact_path(write_unit_model(&dir));

        let value = engine.estimate(&[1.0; FEATURE_COUNT]).unwrap();
        assert_eq!(value, 13.0);
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let engine = EstimationEngine::with_artifact_path(write_unit_model(&dir));

        let input = [0.3; FEATURE_COUNT];
        assert_eq!(
            engine.estimate(&input).unwrap(),
            engine.estimate(&input).unwrap()
        );
    }

    #[test]
    fn test_cached_handle_survives_artifact_deletion() {
        // The file is read exactly once; deleting it after warm-up
        // must not affect subsequent predictions.
        let dir = TempDir::new().unwrap();
        let path = write_unit_model(&dir);
        let engine = EstimationEngine::with_artifact_path(&path);

        engine.warm_up().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(engine.estimate(&[1.0; FEATURE_COUNT]).unwrap(), 13.0);
    }

    #[test]
    fn test_estimate_rejects_wrong_length() {
        let dir = TempDir::new().unwrap();
        let engine = EstimationEngine::with_artifact_path(write_unit_model(&dir));

        let err = engine.estimate(&[1.0; 12]).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::FeatureCountMismatch {
                expected: 13,
                actual: 12
            }
        ));

        let err = engine.estimate(&[1.0; 14]).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::FeatureCountMismatch { actual: 14, .. }
        ));
    }

    #[test]
    fn test_missing_artifact_surfaces_as_prediction_error() {
        let dir = TempDir::new().unwrap();
        let engine = EstimationEngine::with_artifact_path(dir.path().join("absent.json.gz"));

        assert!(matches!(engine.warm_up(), Err(LoadError::NotFound(_))));
        assert!(matches!(
            engine.estimate(&[1.0; FEATURE_COUNT]),
            Err(PredictionError::Failed(_))
        ));
    }

    #[test]
    fn test_metadata_available_after_warm_up() {
        let dir = TempDir::new().unwrap();
        let engine = EstimationEngine::with_artifact_path(write_unit_model(&dir));

        assert!(engine.metadata().is_none());
        engine.warm_up().unwrap();

        let metadata = engine.metadata().unwrap();
        assert_eq!(metadata.variant, "elastic_net");
        assert_eq!(metadata.mae, Some(1.9));
        assert_eq!(engine.describe().get("n_features").unwrap(), "13");
    }
}
