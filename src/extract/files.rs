//! Local-file parsers used after an object has been materialized: delimited
//! text and JSON, both producing a [`Batch`].

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::batch::Batch;
use crate::error::{EtlError, Result};

/// Read a CSV file into a batch. Cells stay strings except that empty cells
/// become the null marker, matching how the cleaners treat missing data.
pub fn read_csv_batch(path: &Path) -> Result<Batch> {
    let mut reader = csv::ReaderBuilder::new().flexible(false).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (i, cell) in record.iter().enumerate() {
            let value = if cell.is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            columns[i].push(value);
        }
    }

    Batch::from_columns(headers.into_iter().zip(columns).collect())
}

/// Read a JSON file into a batch. Accepts either an array of records or a
/// column-oriented object (`{"col": {"0": v0, "1": v1, ...}}`).
pub fn read_json_batch(path: &Path) -> Result<Batch> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    match value {
        Value::Array(items) => {
            let records: Vec<Map<String, Value>> = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    other => Err(EtlError::Upstream {
                        message: format!("expected a JSON object record, got: {}", other),
                    }),
                })
                .collect::<Result<_>>()?;
            Ok(Batch::from_records(&records))
        }
        Value::Object(columns) => {
            let mut out = Vec::with_capacity(columns.len());
            for (name, cells) in columns {
                match cells {
                    Value::Object(indexed) => {
                        // Column cells are keyed by stringified row index
                        let mut pairs: Vec<(usize, Value)> = indexed
                            .into_iter()
                            .map(|(k, v)| {
                                k.parse::<usize>().map(|i| (i, v)).map_err(|_| {
                                    EtlError::Upstream {
                                        message: format!(
                                            "non-numeric row index '{}' in column '{}'",
                                            k, name
                                        ),
                                    }
                                })
                            })
                            .collect::<Result<_>>()?;
                        pairs.sort_by_key(|(i, _)| *i);
                        out.push((name, pairs.into_iter().map(|(_, v)| v).collect()));
                    }
                    other => {
                        return Err(EtlError::Upstream {
                            message: format!(
                                "expected indexed cells for column '{}', got: {}",
                                name, other
                            ),
                        })
                    }
                }
            }
            Batch::from_columns(out)
        }
        other => Err(EtlError::Upstream {
            message: format!("unsupported JSON batch shape: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn csv_empty_cells_become_null() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "product_name,weight\nTrivial Pursuit,480g\nChess,").unwrap();
        let batch = read_csv_batch(file.path()).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.column("weight").unwrap().values[0], json!("480g"));
        assert_eq!(batch.column("weight").unwrap().values[1], Value::Null);
    }

    #[test]
    fn json_array_of_records() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"timestamp": "22:00:10", "time_period": "Evening"}}]"#
        )
        .unwrap();
        let batch = read_json_batch(file.path()).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch.column("time_period").unwrap().values[0],
            json!("Evening")
        );
    }

    #[test]
    fn json_column_oriented_object() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"time_period": {{"1": "Midday", "0": "Evening"}}}}"#
        )
        .unwrap();
        let batch = read_json_batch(file.path()).unwrap();
        // Rows come back in index order regardless of key order
        assert_eq!(
            batch.column("time_period").unwrap().values,
            vec![json!("Evening"), json!("Midday")]
        );
    }

    #[test]
    fn json_scalar_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "42").unwrap();
        assert!(read_json_batch(file.path()).is_err());
    }
}
