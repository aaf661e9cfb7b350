//! Linear model implementations

use crate::error::{Result, StarlinerError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Ordinary least squares line `y = intercept + slope * x` over one predictor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted slope
    pub slope: Option<f64>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    /// Whether model is fitted
    pub is_fitted: bool,
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the line to paired observations.
    ///
    /// A predictor with zero variance yields a flat line through the mean of `y`.
    pub fn fit(&mut self, x: &Array1<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if x.len() != y.len() {
            return Err(StarlinerError::ShapeError {
                expected: format!("y length = {}", x.len()),
                actual: format!("y length = {}", y.len()),
            });
        }
        let (Some(x_mean), Some(y_mean)) = (x.mean(), y.mean()) else {
            return Err(StarlinerError::ComputationError(
                "Cannot fit a line to zero observations".to_string(),
            ));
        };

        // Center data
        let x_centered = x - x_mean;
        let y_centered = y - y_mean;

        let sxx = x_centered.dot(&x_centered);
        let slope = if sxx > 0.0 {
            x_centered.dot(&y_centered) / sxx
        } else {
            0.0
        };

        self.slope = Some(slope);
        self.intercept = Some(y_mean - slope * x_mean);
        self.is_fitted = true;

        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        match (self.is_fitted, self.slope, self.intercept) {
            (true, Some(slope), Some(intercept)) => Ok(x.mapv(|v| intercept + slope * v)),
            _ => Err(StarlinerError::ModelNotFitted),
        }
    }
}

/// Logistic function
pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
