use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EtlError, Result};

/// A single named column of cell values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// An in-memory rectangular collection of same-schema records for one
/// entity type. Storage is columnar: transformations map over whole columns
/// and filter with row masks rather than mutating individual rows in place.
///
/// `Value::Null` is the missing-value marker throughout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Batch {
    columns: Vec<Column>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from named columns. All columns must share one length.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<Value>)>) -> Result<Self> {
        let mut batch = Batch::new();
        for (name, values) in columns {
            batch.push_column(name.into(), values)?;
        }
        Ok(batch)
    }

    /// Build a batch from a sequence of JSON objects. Column order follows
    /// first appearance across the records; keys absent from a record become
    /// `Null` cells, so ragged inputs are squared off rather than rejected.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut batch = Batch::new();
        for key in records.iter().flat_map(|r| r.keys()) {
            if batch.column(key).is_none() {
                batch.columns.push(Column {
                    name: key.clone(),
                    values: Vec::with_capacity(records.len()),
                });
            }
        }
        for record in records {
            for column in &mut batch.columns {
                column
                    .values
                    .push(record.get(&column.name).cloned().unwrap_or(Value::Null));
            }
        }
        batch
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like [`Batch::column`], but a missing column is a hard error.
    pub fn expect_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| EtlError::ColumnMissing(name.to_string()))
    }

    /// Replace every value in a column through `f`. Missing column is fatal.
    pub fn map_column(&mut self, name: &str, f: impl Fn(&Value) -> Value) -> Result<()> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| EtlError::ColumnMissing(name.to_string()))?;
        for value in &mut column.values {
            *value = f(value);
        }
        Ok(())
    }

    /// Append a new column, or overwrite the values of an existing one.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        if !self.columns.is_empty() && values.len() != self.len() {
            return Err(EtlError::RaggedBatch {
                column: name.to_string(),
                expected: self.len(),
                actual: values.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    /// Insert a new column at the front of the schema (used for assigned ids).
    pub fn set_column_front(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        self.set_column(name, values)?;
        if let Some(pos) = self.columns.iter().position(|c| c.name == name) {
            let column = self.columns.remove(pos);
            self.columns.insert(0, column);
        }
        Ok(())
    }

    fn push_column(&mut self, name: String, values: Vec<Value>) -> Result<()> {
        if !self.columns.is_empty() && values.len() != self.len() {
            return Err(EtlError::RaggedBatch {
                column: name,
                expected: self.len(),
                actual: values.len(),
            });
        }
        if let Some(existing) = self.columns.iter().position(|c| c.name == name) {
            self.columns[existing].values = values;
        } else {
            self.columns.push(Column { name, values });
        }
        Ok(())
    }

    /// Remove a column. Absence is fatal; use
    /// [`Batch::drop_column_if_present`] for the tolerant variant.
    pub fn drop_column(&mut self, name: &str) -> Result<()> {
        if self.drop_column_if_present(name) {
            Ok(())
        } else {
            Err(EtlError::ColumnMissing(name.to_string()))
        }
    }

    pub fn drop_column_if_present(&mut self, name: &str) -> bool {
        match self.columns.iter().position(|c| c.name == name) {
            Some(pos) => {
                self.columns.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Keep only the rows whose mask entry is `true`. The mask must cover
    /// every row.
    pub fn retain_rows(&mut self, mask: &[bool]) {
        debug_assert_eq!(mask.len(), self.len());
        for column in &mut self.columns {
            let mut it = mask.iter();
            column.values.retain(|_| *it.next().unwrap_or(&false));
        }
    }

    /// A stable serialized identity for one row, used for exact-duplicate
    /// detection.
    pub fn row_fingerprint(&self, index: usize) -> String {
        let row: Vec<&Value> = self.columns.iter().map(|c| &c.values[index]).collect();
        serde_json::to_string(&row).unwrap_or_default()
    }

    /// Materialize the batch back into JSON objects, preserving column order
    /// within each record.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        (0..self.len())
            .map(|i| {
                self.columns
                    .iter()
                    .map(|c| (c.name.clone(), c.values[i].clone()))
                    .collect()
            })
            .collect()
    }
}

/// Interpret a cell as a float: JSON numbers pass through, strings must
/// parse in full. Everything else is non-numeric.
pub fn cell_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Wrap a float back into a JSON cell. Non-finite values become `Null`.
pub fn f64_cell(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}
