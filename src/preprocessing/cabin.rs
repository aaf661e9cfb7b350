//! Cabin number extrapolation
//!
//! Within a deck, cabin numbers are handed out in GroupId order, so a missing
//! cabin number is predicted from a least-squares line of CabinNumber against
//! GroupId fitted on the deck's known cabins.

use crate::error::{Result, StarlinerError};
use crate::training::LinearRegression;
use crate::utils::frame::{numeric_values, put_numeric, text_values};
use ndarray::Array1;
use polars::prelude::*;
use tracing::debug;

/// Lowest valid cabin number
const FIRST_CABIN: f64 = 1.0;

/// Per-deck linear extrapolation of missing cabin numbers
#[derive(Debug, Clone, Default)]
pub struct CabinExtrapolator;

impl CabinExtrapolator {
    pub fn new() -> Self {
        Self
    }

    /// Fill missing CabinNumber values deck by deck, returning how many were filled.
    ///
    /// Decks without missing numbers are skipped. A deck with missing numbers
    /// but no known ones cannot be fitted and fails the run.
    pub fn extrapolate(&self, df: &mut DataFrame) -> Result<usize> {
        let decks = text_values(df, "Deck")?;
        let group_ids = numeric_values(df, "GroupId")?;
        let mut cabins = numeric_values(df, "CabinNumber")?;

        let mut filled = 0;
        for deck in distinct(&decks) {
            let rows: Vec<usize> = (0..decks.len())
                .filter(|&r| decks[r].as_deref() == Some(deck))
                .collect();
            let (known, unknown): (Vec<usize>, Vec<usize>) =
                rows.into_iter().partition(|&r| cabins[r].is_some());
            let unknown: Vec<usize> = unknown
                .into_iter()
                .filter(|&r| group_ids[r].is_some())
                .collect();

            if unknown.is_empty() {
                continue;
            }
            if known.is_empty() {
                return Err(StarlinerError::ValidationError(format!(
                    "Cannot extrapolate cabin numbers for deck '{}': no known cabin numbers",
                    deck
                )));
            }

            let x: Array1<f64> = known.iter().filter_map(|&r| group_ids[r]).collect();
            let y: Array1<f64> = known
                .iter()
                .filter(|&&r| group_ids[r].is_some())
                .filter_map(|&r| cabins[r])
                .collect();

            let mut model = LinearRegression::new();
            model.fit(&x, &y)?;

            let targets: Array1<f64> = unknown.iter().filter_map(|&r| group_ids[r]).collect();
            let predictions = model.predict(&targets)?;
            for (&row, prediction) in unknown.iter().zip(predictions.iter()) {
                cabins[row] = Some(prediction.round_ties_even().max(FIRST_CABIN));
            }

            debug!(
                deck,
                known = x.len(),
                filled = unknown.len(),
                slope = ?model.slope,
                "Cabin numbers extrapolated"
            );
            filled += unknown.len();
        }

        put_numeric(df, "CabinNumber", cabins)?;
        Ok(filled)
    }
}

/// Distinct present values in order of first appearance
fn distinct(values: &[Option<String>]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for value in values.iter().flatten() {
        if !seen.contains(&value.as_str()) {
            seen.push(value.as_str());
        }
    }
    seen
}
