//! Typed column access over polars DataFrames
//!
//! Pipeline stages read a column into a plain `Vec<Option<_>>`, apply their
//! row logic, and write the column back in place. Missing values are `None`;
//! NaN is never stored.

use crate::error::{Result, StarlinerError};
use polars::prelude::*;

/// Separator used when several key columns form one group key
const KEY_SEPARATOR: char = '\u{1f}';

/// Look up a column, mapping absence to `FeatureNotFound`
pub fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| StarlinerError::FeatureNotFound(name.to_string()))
}

/// Check if dtype is numeric
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Read a column as strings (any dtype is cast)
pub fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = column(df, name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let ca = series.str()?;
    Ok(ca.into_iter().map(|v| v.map(|s| s.to_string())).collect())
}

/// Read a column as f64; unparsable strings and NaN become `None`
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = column(df, name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let ca = series.f64()?;
    Ok(ca
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Write (or replace in place) a string column
pub fn put_text(df: &mut DataFrame, name: &str, values: Vec<Option<String>>) -> Result<()> {
    df.with_column(Column::new(name.into(), values))?;
    Ok(())
}

/// Write (or replace in place) a float column
pub fn put_numeric(df: &mut DataFrame, name: &str, values: Vec<Option<f64>>) -> Result<()> {
    df.with_column(Column::new(name.into(), values))?;
    Ok(())
}

/// Write (or replace in place) a 0/1 indicator column
pub fn put_flags(df: &mut DataFrame, name: &str, values: Vec<i64>) -> Result<()> {
    df.with_column(Column::new(name.into(), values))?;
    Ok(())
}

/// Build one composite key per row from the given key columns.
///
/// A row whose key has any missing component gets `None` and belongs to no
/// group. An empty key list puts every row in a single group.
pub fn group_keys(df: &DataFrame, keys: &[String]) -> Result<Vec<Option<String>>> {
    let mut composite: Vec<Option<String>> = vec![Some(String::new()); df.height()];

    for (pos, key) in keys.iter().enumerate() {
        let values = text_values(df, key)?;
        for (slot, value) in composite.iter_mut().zip(values) {
            *slot = match (slot.take(), value) {
                (Some(mut acc), Some(v)) => {
                    if pos > 0 {
                        acc.push(KEY_SEPARATOR);
                    }
                    acc.push_str(&v);
                    Some(acc)
                }
                _ => None,
            };
        }
    }

    Ok(composite)
}

/// Columns that still hold missing values, with their null counts
pub fn null_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .filter(|col| col.null_count() > 0)
        .map(|col| (col.name().to_string(), col.null_count()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        DataFrame::new(vec![
            Column::new("Deck".into(), &[Some("B"), None, Some("F")]),
            Column::new("CabinNumber".into(), &[Some(12.0), Some(3.0), None]),
            Column::new("Side".into(), &[Some("P"), Some("S"), Some("S")]),
        ])
        .unwrap()
    }

    #[test]
    fn test_text_values_casts_numbers() {
        let df = sample_df();
        let values = text_values(&df, "CabinNumber").unwrap();
        assert_eq!(values[2], None);
        assert!(values[0].as_deref().unwrap().starts_with("12"));
    }

    #[test]
    fn test_numeric_values_parses_strings() {
        let df = df!("CabinNumber" => &["12", "x", "7"]).unwrap();
        let values = numeric_values(&df, "CabinNumber").unwrap();
        assert_eq!(values, vec![Some(12.0), None, Some(7.0)]);
    }

    #[test]
    fn test_group_keys_skip_missing_component() {
        let df = sample_df();
        let keys = group_keys(&df, &["Deck".to_string(), "Side".to_string()]).unwrap();
        assert!(keys[0].is_some());
        assert_eq!(keys[1], None);
        assert_ne!(keys[0], keys[2]);
    }

    #[test]
    fn test_group_keys_empty_is_single_group() {
        let df = sample_df();
        let keys = group_keys(&df, &[]).unwrap();
        assert!(keys.iter().all(|k| k.as_deref() == Some("")));
    }

    #[test]
    fn test_put_text_replaces_in_place() {
        let mut df = sample_df();
        put_text(&mut df, "Deck", vec![Some("A".into()), Some("A".into()), Some("A".into())]).unwrap();

        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["Deck", "CabinNumber", "Side"]);
        assert_eq!(df.column("Deck").unwrap().null_count(), 0);
    }

    #[test]
    fn test_null_counts() {
        let df = sample_df();
        let counts = null_counts(&df);
        assert_eq!(counts, vec![("Deck".to_string(), 1), ("CabinNumber".to_string(), 1)]);
    }

    #[test]
    fn test_missing_column() {
        let df = sample_df();
        assert!(matches!(
            text_values(&df, "Name"),
            Err(StarlinerError::FeatureNotFound(_))
        ));
    }
}
