//! Relational table reader over SQLite.

use std::path::PathBuf;

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::Value;
use tracing::debug;

use crate::batch::{f64_cell, Batch};
use crate::config::DbCredentials;
use crate::error::Result;
use crate::extract::TableSource;

/// Reads whole tables from a SQLite database file into batches.
pub struct SqliteTableSource {
    path: PathBuf,
}

impl SqliteTableSource {
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

#[async_trait]
impl TableSource for SqliteTableSource {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.open()?;
        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    async fn read_table(&self, name: &str) -> Result<Batch> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!("SELECT * FROM \"{}\"", name.replace('"', "\"\"")))?;
        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); column_names.len()];
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (i, column) in columns.iter_mut().enumerate() {
                column.push(cell_from_sql(row.get_ref(i)?));
            }
        }
        debug!(table = name, rows = columns.first().map_or(0, Vec::len), "read table");
        Batch::from_columns(column_names.into_iter().zip(columns).collect())
    }
}

fn cell_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => f64_cell(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn seeded_db(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("source.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE legacy_users (first_name TEXT, age INTEGER, height REAL);
             INSERT INTO legacy_users VALUES ('Ada', 36, 1.65);
             INSERT INTO legacy_users VALUES ('Alan', NULL, 1.78);",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn reads_table_with_mixed_types() {
        let dir = tempdir().unwrap();
        let source = SqliteTableSource::new(seeded_db(dir.path()));

        let tables = source.list_tables().await.unwrap();
        assert_eq!(tables, vec!["legacy_users"]);

        let batch = source.read_table("legacy_users").await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.column("first_name").unwrap().values[0], json!("Ada"));
        assert_eq!(batch.column("age").unwrap().values[1], Value::Null);
        assert_eq!(batch.column("height").unwrap().values[1], json!(1.78));
    }
}
