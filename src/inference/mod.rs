//! Inference module
//!
//! Scores complete feature tables with a pre-trained classifier:
//! - `Classifier` trait implemented by loadable models
//! - `LinearClassifier`, a logistic scorer serialized as JSON
//! - Feature table validation (missing values, required columns)
//! - PassengerId reconstruction and 0.5 thresholding

mod config;
mod engine;
mod linear;

pub use config::{InferenceConfig, REQUIRED_COLUMNS};
pub use engine::{records_to_frame, validate_feature_table, InferenceEngine, PredictionRecord};
pub use linear::LinearClassifier;

use crate::error::Result;
use ndarray::Array1;
use polars::prelude::*;

/// A trained model that scores feature rows
pub trait Classifier: Send + Sync {
    /// One score per row; higher means more likely transported
    fn predict(&self, table: &DataFrame) -> Result<Array1<f64>>;

    /// Model name for logs
    fn name(&self) -> &str;
}
