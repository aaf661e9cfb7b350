//! Derived spending and travel features
//!
//! Builds `TotalSpending`, `SpentMoney`, `GroupSpentMoney` and `TravelingAlone`,
//! caps `TotalSpending` at a dataset quantile, and fills the raw spend columns.

use super::config::PipelineConfig;
use crate::error::Result;
use crate::utils::frame::{group_keys, numeric_values, put_flags, put_numeric, text_values};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

pub const TOTAL_SPENDING: &str = "TotalSpending";
pub const SPENT_MONEY: &str = "SpentMoney";
pub const GROUP_SPENT_MONEY: &str = "GroupSpentMoney";
pub const TRAVELING_ALONE: &str = "TravelingAlone";

/// Computes derived features from the raw passenger columns
pub struct DerivedFeatureBuilder<'a> {
    config: &'a PipelineConfig,
}

impl<'a> DerivedFeatureBuilder<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Run every derived-feature step in order
    pub fn build(&self, df: &mut DataFrame) -> Result<()> {
        self.total_spending(df)?;
        self.spent_money(df)?;
        self.group_spent_money(df)?;
        let cap = self.cap_total_spending(df)?;
        self.traveling_alone(df)?;
        self.fill_spend_columns(df)?;

        debug!(rows = df.height(), cap = ?cap, "Derived features built");
        Ok(())
    }

    /// TotalSpending: row sum of the spend columns, missing counted as 0
    pub fn total_spending(&self, df: &mut DataFrame) -> Result<()> {
        let mut totals = vec![0.0; df.height()];
        for name in &self.config.spend_columns {
            for (total, value) in totals.iter_mut().zip(numeric_values(df, name)?) {
                *total += value.unwrap_or(0.0);
            }
        }
        put_numeric(df, TOTAL_SPENDING, totals.into_iter().map(Some).collect())
    }

    /// SpentMoney: 1 when TotalSpending is positive
    pub fn spent_money(&self, df: &mut DataFrame) -> Result<()> {
        let flags = numeric_values(df, TOTAL_SPENDING)?
            .into_iter()
            .map(|t| i64::from(t.map_or(false, |t| t > 0.0)))
            .collect();
        put_flags(df, SPENT_MONEY, flags)
    }

    /// GroupSpentMoney: max of SpentMoney over the passenger's group.
    ///
    /// A passenger without a GroupId keeps their own SpentMoney.
    pub fn group_spent_money(&self, df: &mut DataFrame) -> Result<()> {
        let keys = group_keys(df, &["GroupId".to_string()])?;
        let spent = flag_values(df, SPENT_MONEY)?;

        let mut group_max: HashMap<&str, i64> = HashMap::new();
        for (key, flag) in keys.iter().zip(&spent) {
            if let Some(key) = key {
                let entry = group_max.entry(key.as_str()).or_insert(0);
                *entry = (*entry).max(*flag);
            }
        }

        let flags = keys
            .iter()
            .zip(&spent)
            .map(|(key, own)| {
                key.as_deref()
                    .and_then(|k| group_max.get(k).copied())
                    .unwrap_or(*own)
            })
            .collect();
        put_flags(df, GROUP_SPENT_MONEY, flags)
    }

    /// Clip TotalSpending at the configured quantile, returning the cap used
    pub fn cap_total_spending(&self, df: &mut DataFrame) -> Result<Option<f64>> {
        let totals = numeric_values(df, TOTAL_SPENDING)?;
        let observed: Vec<f64> = totals.iter().flatten().copied().collect();
        let Some(cap) = quantile(&observed, self.config.spending_cap_quantile) else {
            return Ok(None);
        };

        let capped = totals.into_iter().map(|t| t.map(|t| t.min(cap))).collect();
        put_numeric(df, TOTAL_SPENDING, capped)?;
        Ok(Some(cap))
    }

    /// TravelingAlone: 1 when GroupSize is the single-occupant encoding
    pub fn traveling_alone(&self, df: &mut DataFrame) -> Result<()> {
        let flags = text_values(df, "GroupSize")?
            .into_iter()
            .map(|size| i64::from(size.as_deref() == Some(self.config.single_occupant.as_str())))
            .collect();
        put_flags(df, TRAVELING_ALONE, flags)
    }

    /// Zero every spend value of children, then fill the remaining gaps
    /// with the row's mean spend (taken before children were zeroed).
    pub fn fill_spend_columns(&self, df: &mut DataFrame) -> Result<()> {
        let columns: Vec<Vec<Option<f64>>> = self
            .config
            .spend_columns
            .iter()
            .map(|name| numeric_values(df, name))
            .collect::<Result<_>>()?;

        let row_means: Vec<Option<f64>> = (0..df.height())
            .map(|row| {
                let observed: Vec<f64> = columns.iter().filter_map(|c| c[row]).collect();
                (!observed.is_empty()).then(|| observed.iter().sum::<f64>() / observed.len() as f64)
            })
            .collect();

        let is_child: Vec<bool> = numeric_values(df, "Age")?
            .into_iter()
            .map(|age| age.map_or(false, |a| a < self.config.child_age_limit))
            .collect();

        for (name, values) in self.config.spend_columns.iter().zip(columns) {
            let filled = values
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    if is_child[row] {
                        Some(0.0)
                    } else {
                        Some(value.or(row_means[row]).unwrap_or(0.0))
                    }
                })
                .collect();
            put_numeric(df, name, filled)?;
        }
        Ok(())
    }
}

fn flag_values(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    Ok(numeric_values(df, name)?
        .into_iter()
        .map(|v| v.unwrap_or(0.0) as i64)
        .collect())
}

/// Quantile with linear interpolation between the closest ranks
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}
