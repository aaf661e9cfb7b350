//! Serialized logistic scorer

use super::Classifier;
use crate::error::{Result, StarlinerError};
use crate::training::sigmoid;
use crate::utils::frame::{numeric_values, text_values};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Logistic model over numeric and one-hot categorical features.
///
/// The score of a row is `sigmoid(intercept + Σ w·x + Σ w[column][value])`;
/// a category the model has no weight for contributes nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub intercept: f64,
    #[serde(default)]
    pub numeric_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub categorical_weights: BTreeMap<String, BTreeMap<String, f64>>,
}

impl LinearClassifier {
    pub fn new(intercept: f64) -> Self {
        Self {
            intercept,
            ..Default::default()
        }
    }

    /// Builder method to add a numeric weight
    pub fn with_numeric(mut self, column: &str, weight: f64) -> Self {
        self.numeric_weights.insert(column.to_string(), weight);
        self
    }

    /// Builder method to add a weight for one category of a column
    pub fn with_category(mut self, column: &str, value: &str, weight: f64) -> Self {
        self.categorical_weights
            .entry(column.to_string())
            .or_default()
            .insert(value.to_string(), weight);
        self
    }

    /// Save model to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load model from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            StarlinerError::ModelError(format!("Cannot read model {}: {}", path.display(), e))
        })?;
        let model: Self = serde_json::from_str(&json)?;
        Ok(model)
    }

    fn feature<T>(table: &DataFrame, column: &str, read: fn(&DataFrame, &str) -> Result<T>) -> Result<T> {
        if table.get_column_index(column).is_none() {
            return Err(StarlinerError::ModelError(format!(
                "Feature '{}' not found in input",
                column
            )));
        }
        read(table, column)
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, table: &DataFrame) -> Result<Array1<f64>> {
        let mut logits = Array1::from_elem(table.height(), self.intercept);

        for (column, weight) in &self.numeric_weights {
            let values = Self::feature(table, column, numeric_values)?;
            for (logit, value) in logits.iter_mut().zip(values) {
                *logit += weight * value.unwrap_or(0.0);
            }
        }

        for (column, weights) in &self.categorical_weights {
            let values = Self::feature(table, column, text_values)?;
            for (logit, value) in logits.iter_mut().zip(values) {
                if let Some(w) = value.as_deref().and_then(|v| weights.get(v)) {
                    *logit += w;
                }
            }
        }

        Ok(logits.mapv(sigmoid))
    }

    fn name(&self) -> &str {
        "linear_classifier"
    }
}
