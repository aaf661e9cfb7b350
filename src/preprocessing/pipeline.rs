//! Passenger feature pipeline

use super::{
    cabin::CabinExtrapolator,
    config::PipelineConfig,
    derived::DerivedFeatureBuilder,
    resolver::{CategoricalResolver, DeckSpendTable},
    splitter::ColumnSplitter,
};
use crate::error::Result;
use crate::utils::frame::{null_counts, numeric_values, put_numeric, text_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// Raw columns consumed by the splitters and dropped afterwards
const DROPPED_AFTER_SPLIT: [&str; 4] = ["PassengerId", "Cabin", "Name", "FirstName"];

/// Columns only used as imputation inputs
const DROPPED_AT_END: [&str; 2] = ["VIP", "LastName"];

/// Boolean-string columns mapped to 1/0
const FLAG_COLUMNS: [&str; 2] = ["CryoSleep", "VIP"];

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub rows: usize,
    pub columns: usize,
    pub elapsed_ms: f64,
    /// Columns still holding missing values, with their counts
    pub residual_nulls: Vec<(String, usize)>,
}

impl PipelineReport {
    pub fn is_complete(&self) -> bool {
        self.residual_nulls.is_empty()
    }
}

/// Turns raw passenger records into the classifier's feature table
#[derive(Debug, Clone, Default)]
pub struct FeaturePipeline {
    config: PipelineConfig,
}

impl FeaturePipeline {
    /// Create a pipeline with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline with custom configuration
    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run every stage and return the feature table
    pub fn transform(&self, df: DataFrame) -> Result<DataFrame> {
        self.transform_with_report(df).map(|(df, _)| df)
    }

    /// Run every stage, also reporting timing and residual missing values.
    ///
    /// Residual nulls are logged, not treated as an error; the prediction
    /// service rejects incomplete tables.
    pub fn transform_with_report(&self, df: DataFrame) -> Result<(DataFrame, PipelineReport)> {
        let start = Instant::now();
        let input_rows = df.height();

        let mut df = Self::split_identifiers(df)?;
        Self::map_flags(&mut df)?;
        Self::normalize_numbers(&mut df)?;

        DerivedFeatureBuilder::new(&self.config).build(&mut df)?;
        let deck_spend = DeckSpendTable::from_frame(&df)?;

        let resolver = CategoricalResolver::new(&self.config, &deck_spend);
        resolver.resolve_categoricals(&mut df)?;

        let group_ids: Vec<Option<i64>> = numeric_values(&df, "GroupId")?
            .into_iter()
            .map(|id| id.map(|id| id as i64))
            .collect();
        df.with_column(Column::new("GroupId".into(), group_ids))?;

        let cabins = CabinExtrapolator::new().extrapolate(&mut df)?;
        resolver.resolve_age(&mut df)?;

        for name in DROPPED_AT_END {
            df = df.drop(name)?;
        }

        let report = PipelineReport {
            rows: df.height(),
            columns: df.width(),
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
            residual_nulls: null_counts(&df),
        };

        info!(
            rows = input_rows,
            columns = report.columns,
            cabins_extrapolated = cabins,
            elapsed_ms = report.elapsed_ms,
            "Feature pipeline finished"
        );
        for (column, count) in &report.residual_nulls {
            warn!(column = %column, nulls = count, "Missing values remain after preprocessing");
        }

        Ok((df, report))
    }

    /// Split PassengerId, Cabin and Name, then drop the composite columns
    fn split_identifiers(df: DataFrame) -> Result<DataFrame> {
        let splitters = [
            ColumnSplitter::new("PassengerId", &["GroupId", "GroupSize"], "_"),
            ColumnSplitter::new("Cabin", &["Deck", "CabinNumber", "Side"], "/"),
            ColumnSplitter::new("Name", &["FirstName", "LastName"], " "),
        ];

        let mut df = df;
        for splitter in &splitters {
            df = splitter.transform(&df)?;
        }
        for name in DROPPED_AFTER_SPLIT {
            df = df.drop(name)?;
        }
        Ok(df)
    }

    /// Map "True"/"False" (any case) to 1/0; anything else becomes missing
    fn map_flags(df: &mut DataFrame) -> Result<()> {
        for name in FLAG_COLUMNS {
            let flags = text_values(df, name)?
                .into_iter()
                .map(|v| match v.as_deref().map(str::to_ascii_lowercase).as_deref() {
                    Some("true") => Some(1.0),
                    Some("false") => Some(0.0),
                    _ => None,
                })
                .collect();
            put_numeric(df, name, flags)?;
        }
        Ok(())
    }

    /// CabinNumber to float, Age rounded half to even
    fn normalize_numbers(df: &mut DataFrame) -> Result<()> {
        let cabins = numeric_values(df, "CabinNumber")?;
        put_numeric(df, "CabinNumber", cabins)?;

        let ages = numeric_values(df, "Age")?
            .into_iter()
            .map(|a| a.map(f64::round_ties_even))
            .collect();
        put_numeric(df, "Age", ages)
    }
}
