//! Column splitting
//!
//! Decomposes one delimited string column into several ordered columns that
//! are inserted right after the source column's position.

use crate::error::{Result, StarlinerError};
use crate::utils::frame::text_values;
use polars::prelude::*;

/// Splits a delimited column into named parts
#[derive(Debug, Clone)]
pub struct ColumnSplitter {
    source: String,
    new_columns: Vec<String>,
    delimiter: String,
}

impl ColumnSplitter {
    /// Create a splitter for `source` into `new_columns` on `delimiter`
    pub fn new(source: impl Into<String>, new_columns: &[&str], delimiter: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            new_columns: new_columns.iter().map(|s| s.to_string()).collect(),
            delimiter: delimiter.into(),
        }
    }

    fn validate(&self, df: &DataFrame) -> Result<usize> {
        let index = df.get_column_index(&self.source).ok_or_else(|| {
            StarlinerError::ValidationError(format!(
                "Column '{}' does not exist in the DataFrame.",
                self.source
            ))
        })?;
        if self.new_columns.len() < 2 {
            return Err(StarlinerError::ValidationError(
                "The list of new columns must hold at least 2 names for splitting.".to_string(),
            ));
        }
        if self.delimiter.is_empty() {
            return Err(StarlinerError::ValidationError(
                "You must provide the symbol by which the column will be split.".to_string(),
            ));
        }
        Ok(index)
    }

    /// Split one value into exactly `new_columns.len()` parts.
    ///
    /// Surplus text stays in the last part; absent or empty parts are missing.
    pub fn split_value(&self, value: Option<&str>) -> Vec<Option<String>> {
        let arity = self.new_columns.len();
        let mut parts: Vec<Option<String>> = match value {
            Some(v) => v
                .splitn(arity, self.delimiter.as_str())
                .map(|p| (!p.is_empty()).then(|| p.to_string()))
                .collect(),
            None => Vec::new(),
        };
        parts.resize(arity, None);
        parts
    }

    /// Apply the split, keeping the source column in place
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut index = self.validate(df)?;
        let values = text_values(df, &self.source)?;

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(values.len()); self.new_columns.len()];
        for value in &values {
            for (column, part) in columns.iter_mut().zip(self.split_value(value.as_deref())) {
                column.push(part);
            }
        }

        let mut result = df.clone();

        // Existing columns with a target name are overwritten
        for name in &self.new_columns {
            if name != &self.source && result.get_column_index(name).is_some() {
                result = result.drop(name)?;
            }
        }
        index = result.get_column_index(&self.source).unwrap_or(index);

        for (offset, (name, parts)) in self.new_columns.iter().zip(columns).enumerate() {
            result.insert_column(index + 1 + offset, Column::new(name.as_str().into(), parts))?;
        }

        Ok(result)
    }
}

/// Split `source` into `new_columns` on `delimiter`
pub fn split_and_insert(df: &DataFrame, source: &str, new_columns: &[&str], delimiter: &str) -> Result<DataFrame> {
    ColumnSplitter::new(source, new_columns, delimiter).transform(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    fn manifest() -> DataFrame {
        DataFrame::new(vec![
            Column::new("PassengerId".into(), &[Some("0001_01"), Some("0002_02")]),
            Column::new("Cabin".into(), &[Some("B/12/P"), None]),
            Column::new("Age".into(), &[Some(39.0), Some(24.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_split_inserts_after_source() {
        let df = split_and_insert(&manifest(), "Cabin", &["Deck", "CabinNumber", "Side"], "/").unwrap();

        assert_eq!(
            names(&df),
            vec!["PassengerId", "Cabin", "Deck", "CabinNumber", "Side", "Age"]
        );
        let deck = text_values(&df, "Deck").unwrap();
        assert_eq!(deck, vec![Some("B".to_string()), None]);
        let number = text_values(&df, "CabinNumber").unwrap();
        assert_eq!(number[0].as_deref(), Some("12"));
    }

    #[test]
    fn test_split_rejoin_reconstructs_source() {
        let splitter = ColumnSplitter::new("PassengerId", &["GroupId", "GroupSize"], "_");
        for id in ["0001_01", "9280_02", "0456_07"] {
            let parts: Vec<String> = splitter.split_value(Some(id)).into_iter().flatten().collect();
            assert_eq!(parts.join("_"), id);
        }
    }

    #[test]
    fn test_split_pads_short_values() {
        let splitter = ColumnSplitter::new("Cabin", &["Deck", "CabinNumber", "Side"], "/");
        assert_eq!(
            splitter.split_value(Some("B/12")),
            vec![Some("B".to_string()), Some("12".to_string()), None]
        );
    }

    #[test]
    fn test_split_keeps_surplus_in_last_part() {
        let splitter = ColumnSplitter::new("Name", &["FirstName", "LastName"], " ");
        assert_eq!(
            splitter.split_value(Some("Anna Maria Doe")),
            vec![Some("Anna".to_string()), Some("Maria Doe".to_string())]
        );
    }

    #[test]
    fn test_split_missing_column() {
        let result = split_and_insert(&manifest(), "Name", &["FirstName", "LastName"], " ");
        assert!(matches!(result, Err(StarlinerError::ValidationError(_))));
    }

    #[test]
    fn test_split_requires_two_names() {
        let result = split_and_insert(&manifest(), "Cabin", &["Deck"], "/");
        assert!(matches!(result, Err(StarlinerError::ValidationError(_))));
    }

    #[test]
    fn test_split_requires_delimiter() {
        let result = split_and_insert(&manifest(), "Cabin", &["Deck", "Rest"], "");
        assert!(matches!(result, Err(StarlinerError::ValidationError(_))));
    }
}
