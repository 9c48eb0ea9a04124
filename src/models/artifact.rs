//! Serde data model of the persisted regression artifact.
//!
//! The artifact on disk is a gzip-compressed JSON document holding
//! either a bare model specification or a bundle that wraps the model
//! together with training metadata (for example its mean absolute
//! error on a held-out set).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::features::FEATURE_COUNT;

/// Standard-scaler parameters applied before an inner model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-feature mean subtracted from the input.
    pub mean: Vec<f64>,
    /// Per-feature standard deviation the centered input is divided by.
    pub scale: Vec<f64>,
}

/// One node of an axis-aligned decision tree, stored in a flat arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single regression tree; evaluation starts at node 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

/// Supported regressor variants.
///
/// The loader never assumes a specific variant; each one is adapted
/// behind the [`Predictor`](crate::models::predictor::Predictor)
/// trait after validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Linear model with elastic-net trained coefficients.
    ElasticNet {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    /// Kernel ridge regression with an RBF kernel.
    KernelRidge {
        support: Vec<Vec<f64>>,
        dual_coefficients: Vec<f64>,
        gamma: f64,
    },
    /// Ensemble of regression trees, averaged.
    RandomForest { trees: Vec<DecisionTree> },
    /// Support vector regression with an RBF kernel.
    Svr {
        support_vectors: Vec<Vec<f64>>,
        dual_coefficients: Vec<f64>,
        intercept: f64,
        gamma: f64,
    },
    /// Scaler followed by an inner model.
    Pipeline {
        scaler: StandardScaler,
        model: Box<ModelSpec>,
    },
}

impl ModelSpec {
    /// Variant name for display and logging.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::ElasticNet { .. } => "elastic_net",
            Self::KernelRidge { .. } => "kernel_ridge",
            Self::RandomForest { .. } => "random_forest",
            Self::Svr { .. } => "svr",
            Self::Pipeline { .. } => "pipeline",
        }
    }

    /// Number of input features the model was trained on, when the
    /// parameters encode it.
    pub fn n_features(&self) -> Option<usize> {
        match self {
            Self::ElasticNet { coefficients, .. } => Some(coefficients.len()),
            Self::KernelRidge { support, .. } => support.first().map(Vec::len),
            Self::Svr {
                support_vectors, ..
            } => support_vectors.first().map(Vec::len),
            Self::RandomForest { .. } => None,
            Self::Pipeline { scaler, .. } => Some(scaler.mean.len()),
        }
    }

    /// Check that the parsed parameters describe a usable predictor.
    ///
    /// Returns a human-readable reason on failure; the loader maps it
    /// to `LoadError::InvalidArtifact`.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(n) = self.n_features() {
            if n != FEATURE_COUNT {
                return Err(format!(
                    "model expects {n} features, this service provides {FEATURE_COUNT}"
                ));
            }
        }

        match self {
            Self::ElasticNet { coefficients, .. } => {
                if coefficients.is_empty() {
                    return Err("empty coefficient vector".to_string());
                }
                if coefficients.iter().any(|c| !c.is_finite()) {
                    return Err("non-finite coefficient".to_string());
                }
            }
            Self::KernelRidge {
                support,
                dual_coefficients,
                ..
            } => {
                if support.is_empty() {
                    return Err("kernel ridge model has no support points".to_string());
                }
                if support.len() != dual_coefficients.len() {
                    return Err(format!(
                        "{} support points but {} dual coefficients",
                        support.len(),
                        dual_coefficients.len()
                    ));
                }
                validate_rows(support, "support point")?;
            }
            Self::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err("random forest has no trees".to_string());
                }
                for (i, tree) in trees.iter().enumerate() {
                    validate_tree(tree).map_err(|reason| format!("tree {i}: {reason}"))?;
                }
            }
            Self::Svr {
                support_vectors,
                dual_coefficients,
                ..
            } => {
                if support_vectors.is_empty() {
                    return Err("svr model has no support vectors".to_string());
                }
                if support_vectors.len() != dual_coefficients.len() {
                    return Err(format!(
                        "{} support vectors but {} dual coefficients",
                        support_vectors.len(),
                        dual_coefficients.len()
                    ));
                }
                validate_rows(support_vectors, "support vector")?;
            }
            Self::Pipeline { scaler, model } => {
                if scaler.mean.len() != scaler.scale.len() {
                    return Err("scaler mean/scale length mismatch".to_string());
                }
                if scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                    return Err("scaler contains a zero or non-finite scale".to_string());
                }
                model.validate()?;
            }
        }

        Ok(())
    }
}

// Every kernel row must carry the full feature arity; a ragged row
// would otherwise shorten the distance sum and skew the prediction
// without any error.
fn validate_rows(rows: &[Vec<f64>], label: &str) -> Result<(), String> {
    for (i, row) in rows.iter().enumerate() {
        if row.len() != FEATURE_COUNT {
            return Err(format!(
                "{label} {i} has {} features, expected {FEATURE_COUNT}",
                row.len()
            ));
        }
    }
    Ok(())
}

fn validate_tree(tree: &DecisionTree) -> Result<(), String> {
    if tree.nodes.is_empty() {
        return Err("empty tree".to_string());
    }
    for node in &tree.nodes {
        if let TreeNode::Split {
            feature,
            left,
            right,
            ..
        } = node
        {
            if *feature >= FEATURE_COUNT {
                return Err(format!("split on unknown feature index {feature}"));
            }
            if *left >= tree.nodes.len() || *right >= tree.nodes.len() {
                return Err("child index out of range".to_string());
            }
        }
    }
    Ok(())
}

/// Compound artifact layout: the model bundled with training metadata
/// under a fixed key. The key is treated as fallible; a mapping
/// without it does not deserialize.
#[derive(Debug, Deserialize)]
pub struct ModelBundle {
    /// The nested model specification.
    pub modelo: ModelSpec,
    /// Mean absolute error on a held-out set, display-only.
    pub mae: Option<f64>,
    /// Any other bundled metadata, preserved for display.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Top-level artifact payload: either a bundle or a bare model.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ArtifactPayload {
    Bundle(ModelBundle),
    Bare(ModelSpec),
}

/// Best-effort display metadata extracted at load time.
///
/// Everything here degrades to absence rather than failure; only the
/// prediction capability itself is guaranteed.
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    /// Model variant name.
    pub variant: String,
    /// Bundled mean absolute error, when present.
    pub mae: Option<f64>,
    /// Hyperparameters reported by the predictor adapter.
    pub hyperparameters: HashMap<String, String>,
}

impl ModelMetadata {
    /// Value of one metadata field as display text, with an explicit
    /// marker when the artifact did not carry it.
    pub fn display_mae(&self) -> String {
        match self.mae {
            Some(mae) => format!("{mae:.3}"),
            None => "unavailable".to_string(),
        }
    }
}
