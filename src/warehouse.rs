//! Destination store. One operation: a full-batch upload that replaces any
//! existing contents for a named destination. No upsert, no append, no
//! transactional rollback across destinations.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;
use tracing::{debug, info};

use crate::batch::Batch;
use crate::config::DbCredentials;
use crate::error::{EtlError, Result};

#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Replace the contents of `destination` with `batch`.
    async fn replace(&self, destination: &str, batch: &Batch) -> Result<()>;
}

/// SQLite-backed warehouse. Column affinity is inferred from the first
/// non-null cell of each column.
pub struct SqliteWarehouse {
    path: PathBuf,
}

impl SqliteWarehouse {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_credentials(creds: &DbCredentials) -> Self {
        Self::new(creds.database.clone())
    }

    fn open(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }
}

fn column_affinity(values: &[Value]) -> &'static str {
    match values.iter().find(|v| !v.is_null()) {
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => "INTEGER",
        Some(Value::Number(_)) => "REAL",
        _ => "TEXT",
    }
}

fn sql_param(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as SqlValue;
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else {
                SqlValue::Real(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[async_trait]
impl Warehouse for SqliteWarehouse {
    async fn replace(&self, destination: &str, batch: &Batch) -> Result<()> {
        if batch.width() == 0 {
            return Err(EtlError::Config(format!(
                "refusing to load an empty schema into '{}'",
                destination
            )));
        }

        let mut conn = self.open()?;
        let tx = conn.transaction()?;

        let table = quote_ident(destination);
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", table))?;

        let column_defs: Vec<String> = batch
            .column_names()
            .map(|name| {
                let values = &batch.column(name).expect("enumerated column").values;
                format!("{} {}", quote_ident(name), column_affinity(values))
            })
            .collect();
        tx.execute_batch(&format!(
            "CREATE TABLE {} ({})",
            table,
            column_defs.join(", ")
        ))?;

        let placeholders: Vec<&str> = (0..batch.width()).map(|_| "?").collect();
        let insert = format!("INSERT INTO {} VALUES ({})", table, placeholders.join(", "));
        {
            let mut stmt = tx.prepare(&insert)?;
            // Walk columns by position so values line up with the schema
            let columns: Vec<_> = batch
                .column_names()
                .map(|name| batch.column(name).expect("enumerated column"))
                .collect();
            for i in 0..batch.len() {
                let row = columns.iter().map(|c| sql_param(&c.values[i]));
                stmt.execute(params_from_iter(row))?;
            }
        }
        tx.commit()?;

        info!(destination, rows = batch.len(), "replaced warehouse table");
        Ok(())
    }
}

/// In-memory warehouse for development and testing.
#[derive(Default)]
pub struct InMemoryWarehouse {
    tables: Arc<Mutex<HashMap<String, Batch>>>,
}

impl InMemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a loaded table, if present.
    pub fn table(&self, destination: &str) -> Option<Batch> {
        self.tables.lock().unwrap().get(destination).cloned()
    }

    pub fn destinations(&self) -> Vec<String> {
        self.tables.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl Warehouse for InMemoryWarehouse {
    async fn replace(&self, destination: &str, batch: &Batch) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        tables.insert(destination.to_string(), batch.clone());
        debug!(destination, rows = batch.len(), "replaced in-memory table");
        Ok(())
    }
}
