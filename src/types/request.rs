//! Estimation request carrying the 13 Boston housing attributes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{FeatureVector, FEATURE_COUNT};

/// Request-boundary validation failure.
#[derive(Debug, Error)]
#[error("CHAS must be 0 or 1, got {0}")]
pub struct InvalidChas(pub u8);

/// One housing sample submitted for price estimation.
///
/// Field order mirrors the order used at model training time; the
/// uppercase aliases match the dataset column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateRequest {
    /// Unique request identifier
    #[serde(alias = "ID")]
    pub request_id: String,

    /// Per-capita crime rate by town
    #[serde(alias = "CRIM")]
    pub crim: f64,

    /// Proportion of residential land zoned for large lots
    #[serde(alias = "ZN")]
    pub zn: f64,

    /// Proportion of non-retail business acres per town
    #[serde(alias = "INDUS")]
    pub indus: f64,

    /// Charles River dummy variable (1 if tract bounds river, else 0)
    #[serde(alias = "CHAS")]
    pub chas: u8,

    /// Nitric oxides concentration (parts per 10 million)
    #[serde(alias = "NOX")]
    pub nox: f64,

    /// Average number of rooms per dwelling
    #[serde(alias = "RM")]
    pub rm: f64,

    /// Proportion of owner-occupied units built prior to 1940
    #[serde(alias = "AGE")]
    pub age: f64,

    /// Weighted distances to five employment centres
    #[serde(alias = "DIS")]
    pub dis: f64,

    /// Index of accessibility to radial highways
    #[serde(alias = "RAD")]
    pub rad: f64,

    /// Full-value property-tax rate per $10,000
    #[serde(alias = "TAX")]
    pub tax: f64,

    /// Pupil-teacher ratio by town
    #[serde(alias = "PTRATIO")]
    pub ptratio: f64,

    /// 1000(Bk - 0.63)^2 where Bk is the proportion of Black residents
    #[serde(alias = "B")]
    pub b: f64,

    /// Percentage of lower-status population
    #[serde(alias = "LSTAT")]
    pub lstat: f64,

    /// Submission timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl EstimateRequest {
    /// Build the fixed-order feature vector for the model.
    ///
    /// CHAS is the only categorical field; any value other than 0 or
    /// 1 is rejected here, before the vector reaches the predictor.
    pub fn feature_vector(&self) -> Result<FeatureVector, InvalidChas> {
        if self.chas > 1 {
            return Err(InvalidChas(self.chas));
        }

        let values: [f64; FEATURE_COUNT] = [
            self.crim,
            self.zn,
            self.indus,
            f64::from(self.chas),
            self.nox,
            self.rm,
            self.age,
            self.dis,
            self.rad,
            self.tax,
            self.ptratio,
            self.b,
            self.lstat,
        ];

        Ok(FeatureVector::from_slice(&values)
            .expect("named fields always produce a 13-element vector"))
    }
}
