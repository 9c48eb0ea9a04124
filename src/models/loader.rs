//! Model artifact loader
//!
//! Locates the gzip-compressed artifact on disk, deserializes it,
//! extracts the nested model from compound bundles, and validates
//! that the result exposes a prediction capability.

use anyhow::anyhow;
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

use crate::error::LoadError;
use crate::models::artifact::{ArtifactPayload, ModelMetadata, ModelSpec};
use crate::models::predictor::Predictor;

/// Loaded model with display metadata
pub struct LoadedModel {
    /// Validated prediction capability
    pub predictor: Box<dyn Predictor>,
    /// Best-effort metadata for display
    pub metadata: ModelMetadata,
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The predictor is an opaque capability; only the metadata is
        // meaningful in debug output.
        f.debug_struct("LoadedModel")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Loader for persisted regression artifacts
pub struct ArtifactLoader;

impl ArtifactLoader {
    /// Load a model artifact from a gzip-compressed JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<LoadedModel, LoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        info!(path = %path.display(), "Loading model artifact");

        let file = File::open(path)
            .map_err(|e| LoadError::Deserialization(anyhow!(e).context("opening artifact")))?;
        let reader = GzDecoder::new(BufReader::new(file));

        let payload: ArtifactPayload = serde_json::from_reader(reader)
            .map_err(|e| LoadError::Deserialization(anyhow!(e).context("decoding artifact")))?;

        let (spec, mae) = match payload {
            ArtifactPayload::Bundle(bundle) => (bundle.modelo, bundle.mae),
            ArtifactPayload::Bare(spec) => (spec, None),
        };

        spec.validate().map_err(LoadError::InvalidArtifact)?;

        let model = Self::assemble(spec, mae);

        info!(
            variant = %model.metadata.variant,
            mae = %model.metadata.display_mae(),
            "Model artifact loaded"
        );

        Ok(model)
    }

    fn assemble(spec: ModelSpec, mae: Option<f64>) -> LoadedModel {
        let variant = spec.variant_name().to_string();
        let predictor = spec.into_predictor();
        let hyperparameters: HashMap<String, String> = predictor.describe().unwrap_or_default();

        LoadedModel {
            predictor,
            metadata: ModelMetadata {
                variant,
                mae,
                hyperparameters,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureVector, FEATURE_COUNT};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_artifact(dir: &TempDir, name: &str, json: &serde_json::Value) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(serde_json::to_vec(json).unwrap().as_slice())
            .unwrap();
        encoder.finish().unwrap();
        path
    }

    fn unit_elastic_net() -> serde_json::Value {
        serde_json::json!({
            "type": "elastic_net",
            "coefficients": vec![1.0; FEATURE_COUNT],
            "intercept": 0.0,
        })
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = ArtifactLoader::load(dir.path().join("absent.json.gz")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_load_bare_model() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(&dir, "model.json.gz", &unit_elastic_net());

        let model = ArtifactLoader::load(&path).unwrap();
        assert_eq!(model.metadata.variant, "elastic_net");
        assert_eq!(model.metadata.mae, None);

        let row = FeatureVector::from_slice(&[1.0; FEATURE_COUNT])
            .unwrap()
            .to_row();
        assert_eq!(model.predictor.predict_row(row.view()).unwrap(), 13.0);
    }

    #[test]
    fn test_load_bundle_preserves_metadata() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(
            &dir,
            "bundle.json.gz",
            &serde_json::json!({ "modelo": unit_elastic_net(), "mae": 2.43 }),
        );

        let model = ArtifactLoader::load(&path).unwrap();
        assert_eq!(model.metadata.mae, Some(2.43));
        assert_eq!(
            model.metadata.hyperparameters.get("n_features").unwrap(),
            "13"
        );
    }

    #[test]
    fn test_load_corrupt_artifact_is_deserialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.json.gz");
        std::fs::write(&path, b"not gzip at all").unwrap();

        let err = ArtifactLoader::load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Deserialization(_)));
    }

    #[test]
    fn test_load_bundle_without_model_key_is_deserialization_error() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(&dir, "no_model.json.gz", &serde_json::json!({ "mae": 2.43 }));

        let err = ArtifactLoader::load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Deserialization(_)));
    }

    #[test]
    fn test_load_unusable_model_is_invalid_artifact() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(
            &dir,
            "empty_forest.json.gz",
            &serde_json::json!({ "type": "random_forest", "trees": [] }),
        );

        let err = ArtifactLoader::load(&path).unwrap_err();
        match err {
            LoadError::InvalidArtifact(reason) => assert!(reason.contains("no trees")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_loaded_model_debug_shows_metadata_only() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(&dir, "model.json.gz", &unit_elastic_net());

        let model = ArtifactLoader::load(&path).unwrap();
        let text = format!("{model:?}");
        assert!(text.contains("elastic_net"));
        assert!(!text.contains("predictor"));
    }

    #[test]
    fn test_load_twice_behaves_identically() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(&dir, "model.json.gz", &unit_elastic_net());

        let first = ArtifactLoader::load(&path).unwrap();
        let second = ArtifactLoader::load(&path).unwrap();

        let row = FeatureVector::from_slice(&[0.5; FEATURE_COUNT])
            .unwrap()
            .to_row();
        assert_eq!(
            first.predictor.predict_row(row.view()).unwrap(),
            second.predictor.predict_row(row.view()).unwrap()
        );
    }
}
