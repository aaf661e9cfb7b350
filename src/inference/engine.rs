//! Inference engine implementation
//!
//! Validates an incoming feature table, scores it with the loaded classifier
//! and reshapes the scores into `PassengerId` / `Transported` records.

use super::{Classifier, InferenceConfig};
use crate::error::{Result, StarlinerError};
use crate::utils::frame::{self, is_numeric_dtype, null_counts, numeric_values, text_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// One prediction in the service's output schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(rename = "PassengerId")]
    pub passenger_id: String,
    #[serde(rename = "Transported")]
    pub transported: bool,
}

/// Check that a feature table is complete and has every required column.
///
/// Missing values are reported before missing columns.
pub fn validate_feature_table(table: &DataFrame, required: &[String]) -> Result<()> {
    let nulls = null_counts(table);
    if !nulls.is_empty() {
        let detail: Vec<String> = nulls
            .iter()
            .map(|(column, count)| format!("{}: {}", column, count))
            .collect();
        return Err(StarlinerError::ValidationError(format!(
            "Null values: {}",
            detail.join(", ")
        )));
    }

    let missing: Vec<&str> = required
        .iter()
        .filter(|c| table.get_column_index(c).is_none())
        .map(|c| c.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(StarlinerError::ValidationError(format!(
            "Missing columns: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

/// Left-pad with zeros to `width`, like Python's `str.zfill`
fn zfill(value: &str, width: usize) -> String {
    let (sign, digits) = match value.strip_prefix(|c: char| c == '-' || c == '+') {
        Some(rest) => (&value[..1], rest),
        None => ("", value),
    };
    let pad = width.saturating_sub(value.len());
    format!("{}{}{}", sign, "0".repeat(pad), digits)
}

/// Column values as zero-padded strings; numeric values are written as integers
fn padded_values(table: &DataFrame, column: &str, width: usize) -> Result<Vec<String>> {
    let dtype = frame::column(table, column)?.dtype().clone();
    if is_numeric_dtype(&dtype) {
        Ok(numeric_values(table, column)?
            .into_iter()
            .map(|v| zfill(&(v.unwrap_or(0.0) as i64).to_string(), width))
            .collect())
    } else {
        Ok(text_values(table, column)?
            .into_iter()
            .map(|v| zfill(v.as_deref().unwrap_or(""), width))
            .collect())
    }
}

/// Scores validated feature tables with a shared classifier
#[derive(Clone)]
pub struct InferenceEngine {
    config: InferenceConfig,
    classifier: Arc<dyn Classifier>,
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("config", &self.config)
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

impl InferenceEngine {
    pub fn new(config: InferenceConfig, classifier: Arc<dyn Classifier>) -> Self {
        Self { config, classifier }
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Rebuild `GroupId_GroupSize` passenger identifiers
    pub fn passenger_ids(&self, table: &DataFrame) -> Result<Vec<String>> {
        let groups = padded_values(table, "GroupId", self.config.group_id_width)?;
        let sizes = padded_values(table, "GroupSize", self.config.group_size_width)?;
        Ok(groups
            .into_iter()
            .zip(sizes)
            .map(|(group, size)| format!("{}_{}", group, size))
            .collect())
    }

    /// Validate, score and label a feature table
    pub fn predict(&self, table: &DataFrame) -> Result<Vec<PredictionRecord>> {
        let start = Instant::now();
        validate_feature_table(table, &self.config.required_columns)?;

        let scores = self.classifier.predict(table).map_err(|e| match e {
            StarlinerError::ModelError(msg) => StarlinerError::ModelError(msg),
            other => StarlinerError::ModelError(other.to_string()),
        })?;
        if scores.len() != table.height() {
            return Err(StarlinerError::ShapeError {
                expected: format!("{} scores", table.height()),
                actual: format!("{} scores", scores.len()),
            });
        }

        let records: Vec<PredictionRecord> = self
            .passenger_ids(table)?
            .into_iter()
            .zip(scores.iter())
            .map(|(passenger_id, &score)| PredictionRecord {
                passenger_id,
                transported: score > self.config.classification_threshold,
            })
            .collect();

        debug!(
            rows = records.len(),
            model = self.classifier.name(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Predictions computed"
        );
        Ok(records)
    }
}

/// Predictions as a `PassengerId,Transported` table with `True`/`False` labels
pub fn records_to_frame(records: &[PredictionRecord]) -> Result<DataFrame> {
    let ids: Vec<&str> = records.iter().map(|r| r.passenger_id.as_str()).collect();
    let labels: Vec<&str> = records
        .iter()
        .map(|r| if r.transported { "True" } else { "False" })
        .collect();
    Ok(DataFrame::new(vec![
        Column::new("PassengerId".into(), ids),
        Column::new("Transported".into(), labels),
    ])?)
}
