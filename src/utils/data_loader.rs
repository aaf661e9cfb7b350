//! Data loading utilities

use crate::error::{Result, StarlinerError};
use polars::prelude::*;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

/// Loader for raw passenger manifests and feature tables
pub struct DataLoader {
    /// Rows scanned when inferring the CSV schema
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
        }
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)
            .map_err(|e| StarlinerError::DataError(format!("{}: {}", path.display(), e)))?;

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| StarlinerError::DataError(e.to_string()))
    }

    /// Load a JSON file holding an array of row objects
    pub fn load_json(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)
            .map_err(|e| StarlinerError::DataError(format!("{}: {}", path.display(), e)))?;

        JsonReader::new(file)
            .finish()
            .map_err(|e| StarlinerError::DataError(e.to_string()))
    }

    /// Detect file format from extension and load
    pub fn load_auto(&self, path: &Path) -> Result<DataFrame> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => self.load_json(path),
            // CSV is the manifest format, so it is also the default
            _ => self.load_csv(path),
        }
    }
}

/// Parse a JSON array of row objects into a DataFrame
pub fn records_from_json(bytes: &[u8]) -> Result<DataFrame> {
    JsonReader::new(Cursor::new(bytes))
        .finish()
        .map_err(|e| StarlinerError::ValidationError(format!("Invalid JSON records: {}", e)))
}

/// Serialize a DataFrame as a JSON array of row objects
pub fn records_to_json(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    JsonWriter::new(&mut buf)
        .with_json_format(JsonFormat::Json)
        .finish(&mut df.clone())?;
    Ok(buf)
}

/// Save DataFrame to disk
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV with a header row
    pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .map_err(|e| StarlinerError::DataError(e.to_string()))
    }

    /// Save to JSON as an array of row objects
    pub fn save_json(df: &mut DataFrame, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;

        JsonWriter::new(&mut file)
            .with_json_format(JsonFormat::Json)
            .finish(df)
            .map_err(|e| StarlinerError::DataError(e.to_string()))
    }

    /// Pick the writer from the file extension (JSON or CSV)
    pub fn save_auto(df: &mut DataFrame, path: &Path) -> Result<()> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::save_json(df, path),
            _ => Self::save_csv(df, path),
        }
    }
}
