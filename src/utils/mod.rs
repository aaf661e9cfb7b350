//! Utility functions and types

pub mod data_loader;
pub mod frame;

pub use data_loader::{records_from_json, records_to_json, DataLoader, DataSaver};
