//! Prediction capability and per-variant adapters.
//!
//! Each supported model variant is adapted behind the [`Predictor`]
//! trait so that callers never depend on a concrete regressor type.

use ndarray::ArrayView2;
use std::collections::HashMap;

use crate::error::PredictionError;
use crate::features::FEATURE_COUNT;
use crate::models::artifact::{DecisionTree, ModelSpec, StandardScaler, TreeNode};

/// Capability of producing a numeric estimate from a single-row
/// feature matrix.
pub trait Predictor: Send + Sync {
    /// Predict from a 1-row, [`FEATURE_COUNT`]-column input.
    fn predict_row(&self, row: ArrayView2<f64>) -> Result<f64, PredictionError>;

    /// Optional introspection for display. Adapters that cannot
    /// report hyperparameters return `None` ("unavailable") instead
    /// of failing.
    fn describe(&self) -> Option<HashMap<String, String>> {
        None
    }
}

fn check_shape(row: &ArrayView2<f64>) -> Result<(), PredictionError> {
    if row.nrows() != 1 || row.ncols() != FEATURE_COUNT {
        return Err(PredictionError::FeatureCountMismatch {
            expected: FEATURE_COUNT,
            actual: row.ncols(),
        });
    }
    Ok(())
}

fn rbf_kernel(a: &[f64], b: &[f64], gamma: f64) -> f64 {
    let squared_distance: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    (-gamma * squared_distance).exp()
}

/// Linear model with elastic-net trained coefficients.
pub struct ElasticNetModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl Predictor for ElasticNetModel {
    fn predict_row(&self, row: ArrayView2<f64>) -> Result<f64, PredictionError> {
        check_shape(&row)?;
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(row.row(0))
            .map(|(c, x)| c * x)
            .sum();
        Ok(dot + self.intercept)
    }

    fn describe(&self) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        params.insert("n_features".to_string(), self.coefficients.len().to_string());
        params.insert("intercept".to_string(), format!("{:.6}", self.intercept));
        Some(params)
    }
}

/// Kernel ridge regression with an RBF kernel.
pub struct KernelRidgeModel {
    support: Vec<Vec<f64>>,
    dual_coefficients: Vec<f64>,
    gamma: f64,
}

impl Predictor for KernelRidgeModel {
    fn predict_row(&self, row: ArrayView2<f64>) -> Result<f64, PredictionError> {
        check_shape(&row)?;
        let x: Vec<f64> = row.row(0).to_vec();
        let value = self
            .support
            .iter()
            .zip(&self.dual_coefficients)
            .map(|(s, alpha)| alpha * rbf_kernel(&x, s, self.gamma))
            .sum();
        Ok(value)
    }

    fn describe(&self) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        params.insert("kernel".to_string(), "rbf".to_string());
        params.insert("gamma".to_string(), format!("{:.6}", self.gamma));
        params.insert("n_support".to_string(), self.support.len().to_string());
        Some(params)
    }
}

/// Ensemble of regression trees, averaged.
pub struct RandomForestModel {
    trees: Vec<DecisionTree>,
}

impl RandomForestModel {
    fn eval_tree(tree: &DecisionTree, x: &[f64]) -> Result<f64, PredictionError> {
        let mut index = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has
        // nodes; the bound rejects cyclic node references.
        for _ in 0..tree.nodes.len() {
            match &tree.nodes[index] {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = x.get(*feature).ok_or_else(|| {
                        PredictionError::Failed(format!("split on missing feature {feature}"))
                    })?;
                    index = if *value <= *threshold { *left } else { *right };
                }
            }
        }
        Err(PredictionError::Failed(
            "tree evaluation did not reach a leaf".to_string(),
        ))
    }
}

impl Predictor for RandomForestModel {
    fn predict_row(&self, row: ArrayView2<f64>) -> Result<f64, PredictionError> {
        check_shape(&row)?;
        let x: Vec<f64> = row.row(0).to_vec();
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += Self::eval_tree(tree, &x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn describe(&self) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        params.insert("n_estimators".to_string(), self.trees.len().to_string());
        Some(params)
    }
}

/// Support vector regression with an RBF kernel.
pub struct SvrModel {
    support_vectors: Vec<Vec<f64>>,
    dual_coefficients: Vec<f64>,
    intercept: f64,
    gamma: f64,
}

impl Predictor for SvrModel {
    fn predict_row(&self, row: ArrayView2<f64>) -> Result<f64, PredictionError> {
        check_shape(&row)?;
        let x: Vec<f64> = row.row(0).to_vec();
        let kernel_sum: f64 = self
            .support_vectors
            .iter()
            .zip(&self.dual_coefficients)
            .map(|(s, alpha)| alpha * rbf_kernel(&x, s, self.gamma))
            .sum();
        Ok(kernel_sum + self.intercept)
    }

    fn describe(&self) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        params.insert("kernel".to_string(), "rbf".to_string());
        params.insert("gamma".to_string(), format!("{:.6}", self.gamma));
        params.insert(
            "n_support".to_string(),
            self.support_vectors.len().to_string(),
        );
        Some(params)
    }
}

/// Standard scaler applied before an inner predictor.
pub struct ScaledModel {
    scaler: StandardScaler,
    inner: Box<dyn Predictor>,
}

impl Predictor for ScaledModel {
    fn predict_row(&self, row: ArrayView2<f64>) -> Result<f64, PredictionError> {
        check_shape(&row)?;
        let mut scaled = row.to_owned();
        for (j, value) in scaled.row_mut(0).iter_mut().enumerate() {
            *value = (*value - self.scaler.mean[j]) / self.scaler.scale[j];
        }
        self.inner.predict_row(scaled.view())
    }

    fn describe(&self) -> Option<HashMap<String, String>> {
        let mut params = self.inner.describe().unwrap_or_default();
        params.insert("scaler".to_string(), "standard".to_string());
        Some(params)
    }
}

impl ModelSpec {
    /// Adapt a validated specification into its predictor.
    pub fn into_predictor(self) -> Box<dyn Predictor> {
        match self {
            ModelSpec::ElasticNet {
                coefficients,
                intercept,
            } => Box::new(ElasticNetModel {
                coefficients,
                intercept,
            }),
            ModelSpec::KernelRidge {
                support,
                dual_coefficients,
                gamma,
            } => Box::new(KernelRidgeModel {
                support,
                dual_coefficients,
                gamma,
            }),
            ModelSpec::RandomForest { trees } => Box::new(RandomForestModel { trees }),
            ModelSpec::Svr {
                support_vectors,
                dual_coefficients,
                intercept,
                gamma,
            } => Box::new(SvrModel {
                support_vectors,
                dual_coefficients,
                intercept,
                gamma,
            }),
            ModelSpec::Pipeline { scaler, model } => Box::new(ScaledModel {
                scaler,
                inner: model.into_predictor(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;

    fn row_of(values: [f64; FEATURE_COUNT]) -> ndarray::Array2<f64> {
        FeatureVector::from_slice(&values).unwrap().to_row()
    }

    #[test]
    fn test_elastic_net_sums_inputs_with_unit_coefficients() {
        let model = ElasticNetModel {
            coefficients: vec![1.0; FEATURE_COUNT],
            intercept: 0.0,
        };
        let row = row_of([1.0; FEATURE_COUNT]);
        assert_eq!(model.predict_row(row.view()).unwrap(), 13.0);
    }

    #[test]
    fn test_elastic_net_is_deterministic() {
        let model = ElasticNetModel {
            coefficients: vec![0.5; FEATURE_COUNT],
            intercept: 1.5,
        };
        let row = row_of([2.0; FEATURE_COUNT]);
        let first = model.predict_row(row.view()).unwrap();
        let second = model.predict_row(row.view()).unwrap();
        assert_eq!(first, second);
        assert!((first - 14.5).abs() < 1e-12);
    }

    #[test]
    fn test_kernel_ridge_at_support_point() {
        // At a support point the RBF kernel is 1, so with a single
        // support the prediction equals its dual coefficient.
        let support = vec![vec![1.0; FEATURE_COUNT]];
        let model = KernelRidgeModel {
            support,
            dual_coefficients: vec![24.0],
            gamma: 0.1,
        };
        let row = row_of([1.0; FEATURE_COUNT]);
        let value = model.predict_row(row.view()).unwrap();
        assert!((value - 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_svr_includes_intercept() {
        let model = SvrModel {
            support_vectors: vec![vec![0.0; FEATURE_COUNT]],
            dual_coefficients: vec![10.0],
            intercept: 2.0,
            gamma: 0.5,
        };
        let row = row_of([0.0; FEATURE_COUNT]);
        let value = model.predict_row(row.view()).unwrap();
        assert!((value - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_random_forest_averages_trees() {
        let leaf = |value| DecisionTree {
            nodes: vec![TreeNode::Leaf { value }],
        };
        let model = RandomForestModel {
            trees: vec![leaf(20.0), leaf(30.0)],
        };
        let row = row_of([0.0; FEATURE_COUNT]);
        assert_eq!(model.predict_row(row.view()).unwrap(), 25.0);
    }

    #[test]
    fn test_random_forest_split_routing() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 5, // RM
                    threshold: 6.5,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: 18.0 },
                TreeNode::Leaf { value: 35.0 },
            ],
        };
        let model = RandomForestModel { trees: vec![tree] };

        let mut small_house = [0.0; FEATURE_COUNT];
        small_house[5] = 5.0;
        let mut large_house = [0.0; FEATURE_COUNT];
        large_house[5] = 8.0;

        assert_eq!(
            model.predict_row(row_of(small_house).view()).unwrap(),
            18.0
        );
        assert_eq!(
            model.predict_row(row_of(large_house).view()).unwrap(),
            35.0
        );
    }

    #[test]
    fn test_pipeline_scales_before_inner_model() {
        // Scaling maps the input to all-ones, so the unit-coefficient
        // linear model returns 13.
        let spec = ModelSpec::Pipeline {
            scaler: StandardScaler {
                mean: vec![10.0; FEATURE_COUNT],
                scale: vec![2.0; FEATURE_COUNT],
            },
            model: Box::new(ModelSpec::ElasticNet {
                coefficients: vec![1.0; FEATURE_COUNT],
                intercept: 0.0,
            }),
        };
        let predictor = spec.into_predictor();
        let row = row_of([12.0; FEATURE_COUNT]);
        assert_eq!(predictor.predict_row(row.view()).unwrap(), 13.0);
    }

    #[test]
    fn test_describe_reports_hyperparameters() {
        let model = SvrModel {
            support_vectors: vec![vec![0.0; FEATURE_COUNT]],
            dual_coefficients: vec![1.0],
            intercept: 0.0,
            gamma: 0.25,
        };
        let params = model.describe().unwrap();
        assert_eq!(params.get("kernel").unwrap(), "rbf");
        assert_eq!(params.get("n_support").unwrap(), "1");
    }
}
