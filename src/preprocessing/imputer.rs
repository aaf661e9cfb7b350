//! Group-wise missing value imputation
//!
//! A [`GroupImputer`] fills missing values of one target column with the mode
//! or median of that column within groups defined by key columns. Groups with
//! no observed value leave their rows missing; coarser fallbacks are expressed
//! as an [`ImputeCascade`], an ordered list of steps run one after another.

use crate::error::Result;
use crate::utils::frame::{self, group_keys, is_numeric_dtype};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Statistic used to fill a group's missing values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImputeMethod {
    /// Most frequent value; ties go to the smallest value
    Mode,
    /// Median of the observed values (numeric columns only)
    Median,
}

/// Constant used by a terminal cascade step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FillValue {
    Text(String),
}

/// Fills missing target values from per-group statistics
#[derive(Debug, Clone)]
pub struct GroupImputer {
    keys: Vec<String>,
    target: String,
    method: ImputeMethod,
}

impl GroupImputer {
    /// Create an imputer grouping by `keys`; an empty key list means the whole table
    pub fn new(keys: &[&str], target: impl Into<String>, method: ImputeMethod) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            target: target.into(),
            method,
        }
    }

    /// Fill missing target values in place, returning how many were filled
    pub fn apply(&self, df: &mut DataFrame) -> Result<usize> {
        let keys = group_keys(df, &self.keys)?;
        let dtype = frame::column(df, &self.target)?.dtype().clone();

        let filled = if is_numeric_dtype(&dtype) {
            let mut values = frame::numeric_values(df, &self.target)?;
            let stats = group_statistics(&keys, &values, |observed| match self.method {
                ImputeMethod::Mode => numeric_mode(observed),
                ImputeMethod::Median => median(observed),
            });
            let filled = fill_from_groups(&keys, &mut values, &stats);
            frame::put_numeric(df, &self.target, values)?;
            filled
        } else {
            let mut values = frame::text_values(df, &self.target)?;
            // Median over text falls back to the middle value in sort order
            let stats = group_statistics(&keys, &values, |observed| match self.method {
                ImputeMethod::Mode => text_mode(observed),
                ImputeMethod::Median => text_median(observed),
            });
            let filled = fill_from_groups(&keys, &mut values, &stats);
            frame::put_text(df, &self.target, values)?;
            filled
        };

        debug!(
            target_column = %self.target,
            keys = ?self.keys,
            method = ?self.method,
            filled,
            "Group imputation step"
        );
        Ok(filled)
    }
}

/// Compute one statistic per group over the observed (non-missing) values
fn group_statistics<T: Clone>(
    keys: &[Option<String>],
    values: &[Option<T>],
    stat: impl Fn(&[T]) -> Option<T>,
) -> HashMap<String, T> {
    let mut groups: HashMap<&str, Vec<T>> = HashMap::new();
    for (key, value) in keys.iter().zip(values) {
        if let (Some(key), Some(value)) = (key, value) {
            groups.entry(key.as_str()).or_default().push(value.clone());
        }
    }

    groups
        .into_iter()
        .filter_map(|(key, observed)| stat(&observed).map(|s| (key.to_string(), s)))
        .collect()
}

fn fill_from_groups<T: Clone>(
    keys: &[Option<String>],
    values: &mut [Option<T>],
    stats: &HashMap<String, T>,
) -> usize {
    let mut filled = 0;
    for (key, value) in keys.iter().zip(values.iter_mut()) {
        if value.is_some() {
            continue;
        }
        if let Some(stat) = key.as_ref().and_then(|k| stats.get(k)) {
            *value = Some(stat.clone());
            filled += 1;
        }
    }
    filled
}

/// Most frequent value; the smallest wins a tie
pub fn numeric_mode(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let run = j - i;
        if best.map_or(true, |(_, count)| run > count) {
            best = Some((sorted[i], run));
        }
        i = j;
    }
    best.map(|(value, _)| value)
}

/// Most frequent string; the lexicographically smallest wins a tie
pub fn text_mode(values: &[String]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then_with(|| b.cmp(a)))
        .map(|(v, _)| v.to_string())
}

/// Median, averaging the two middle values for even counts
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn text_median(values: &[String]) -> Option<String> {
    let mut sorted = values.to_vec();
    sorted.sort();
    sorted.get(sorted.len().saturating_sub(1) / 2).cloned()
}

/// One step of an imputation cascade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStep {
    /// Group-wise statistic keyed by these columns
    ByGroup(Vec<String>),
    /// Statistic over the whole table
    Overall,
    /// Fixed value
    Constant(FillValue),
}

impl ImputeStep {
    pub fn by(keys: &[&str]) -> Self {
        ImputeStep::ByGroup(keys.iter().map(|k| k.to_string()).collect())
    }
}

/// Ordered imputation steps for one target column.
///
/// Each step only sees values left missing by the steps before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputeCascade {
    pub target: String,
    pub method: ImputeMethod,
    pub steps: Vec<ImputeStep>,
}

impl ImputeCascade {
    pub fn new(target: impl Into<String>, method: ImputeMethod) -> Self {
        Self {
            target: target.into(),
            method,
            steps: Vec::new(),
        }
    }

    /// Append a group-wise step
    pub fn then_by(mut self, keys: &[&str]) -> Self {
        self.steps.push(ImputeStep::by(keys));
        self
    }

    /// Append a whole-table step
    pub fn then_overall(mut self) -> Self {
        self.steps.push(ImputeStep::Overall);
        self
    }

    /// Append a constant step
    pub fn then_constant(mut self, value: FillValue) -> Self {
        self.steps.push(ImputeStep::Constant(value));
        self
    }

    /// Run every step in order, returning the total number of filled values
    pub fn run(&self, df: &mut DataFrame) -> Result<usize> {
        let mut total = 0;
        for step in &self.steps {
            total += match step {
                ImputeStep::ByGroup(keys) => {
                    let keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
                    GroupImputer::new(&keys, &self.target, self.method).apply(df)?
                }
                ImputeStep::Overall => GroupImputer::new(&[], &self.target, self.method).apply(df)?,
                ImputeStep::Constant(value) => fill_constant(df, &self.target, value)?,
            };
        }
        Ok(total)
    }
}

/// Fill every remaining missing value of `target` with a constant
pub fn fill_constant(df: &mut DataFrame, target: &str, value: &FillValue) -> Result<usize> {
    let FillValue::Text(text) = value;
    let mut values = frame::text_values(df, target)?;
    let mut filled = 0;
    for v in values.iter_mut().filter(|v| v.is_none()) {
        *v = Some(text.clone());
        filled += 1;
    }
    frame::put_text(df, target, values)?;
    Ok(filled)
}
