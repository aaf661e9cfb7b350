//! Starliner - passenger feature pipeline and transport prediction service
//!
//! This crate turns raw, partially missing spaceship passenger records into a
//! complete feature table and serves a pre-trained classifier over it.
//!
//! # Modules
//!
//! ## Feature pipeline
//! - [`preprocessing`] - Column splitting, group-wise imputation cascades,
//!   derived features, categorical rules, cabin number extrapolation
//! - [`training`] - Least-squares line used for extrapolation
//!
//! ## Prediction
//! - [`inference`] - Classifier trait, logistic scorer, feature table validation
//! - [`server`] - HTTP prediction service
//! - [`client`] - HTTP client for the service
//!
//! ## Services
//! - [`cli`] - Command-line interface
//!
//! ## Utilities
//! - [`utils`] - Data loading and typed column access

// Core error handling
pub mod error;

// Feature pipeline
pub mod preprocessing;
pub mod training;

// Prediction
pub mod inference;
pub mod client;

// Utilities
pub mod utils;

// Services
pub mod server;
pub mod cli;

pub use error::{Result, StarlinerError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, StarlinerError};

    // Feature pipeline
    pub use crate::preprocessing::{
        FeaturePipeline, ImputeCascade, ImputeMethod, PipelineConfig, PipelineReport,
    };

    // Inference
    pub use crate::inference::{
        Classifier, InferenceConfig, InferenceEngine, LinearClassifier, PredictionRecord,
    };

    // Client
    pub use crate::client::PredictionClient;

    // Data loading
    pub use crate::utils::{DataLoader, DataSaver};
}
