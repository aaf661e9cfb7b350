//! Model fitting
//!
//! Only the univariate least-squares line used to extrapolate cabin numbers
//! is fitted in-process; the transport classifier is loaded pre-trained.

pub mod linear_models;

pub use linear_models::{sigmoid, LinearRegression};
