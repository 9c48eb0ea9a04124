//! Fixed-order feature vector for housing price model inference.
//!
//! The attribute order matches the order used during model training
//! and must never change.

use crate::error::PredictionError;
use ndarray::Array2;

/// Number of features the regression model was trained on.
pub const FEATURE_COUNT: usize = 13;

/// Feature names in training order (Boston housing attributes).
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "CRIM", "ZN", "INDUS", "CHAS", "NOX", "RM", "AGE", "DIS", "RAD", "TAX", "PTRATIO", "B",
    "LSTAT",
];

/// Index of the CHAS attribute, the only binary field (0 or 1).
pub const CHAS_INDEX: usize = 3;

/// Ordered 13-value numeric input describing one housing sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Build a feature vector from an ordered slice.
    ///
    /// Fails if the slice length is not exactly [`FEATURE_COUNT`];
    /// the input is never truncated or padded.
    pub fn from_slice(values: &[f64]) -> Result<Self, PredictionError> {
        let values: [f64; FEATURE_COUNT] =
            values
                .try_into()
                .map_err(|_| PredictionError::FeatureCountMismatch {
                    expected: FEATURE_COUNT,
                    actual: values.len(),
                })?;
        Ok(Self(values))
    }

    /// Values in training order.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Reshape into the single-row matrix layout the model expects.
    pub fn to_row(&self) -> Array2<f64> {
        Array2::from_shape_vec((1, FEATURE_COUNT), self.0.to_vec())
            .expect("13-element vector always reshapes to 1x13")
    }
}
