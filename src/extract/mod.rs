//! Extraction ports and adapters. Everything here is thin I/O plumbing:
//! each upstream is reached through a trait so the pipeline (and its tests)
//! never touch a network or database directly.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::batch::Batch;
use crate::error::Result;

pub mod document;
pub mod files;
pub mod http;
pub mod sql;

/// A relational source returning whole tables as rectangular batches.
#[async_trait]
pub trait TableSource: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>>;
    async fn read_table(&self, name: &str) -> Result<Batch>;
}

/// A multi-page tabular document, returned as one concatenated batch.
#[async_trait]
pub trait DocumentTableSource: Send + Sync {
    async fn extract_tables(&self, url: &str) -> Result<Batch>;
}

/// The paginated store-listing API: a directory endpoint reporting the total
/// count, and a per-index endpoint returning one store as a JSON object
/// whose keys become the batch's columns.
#[async_trait]
pub trait StoreDirectory: Send + Sync {
    async fn store_count(&self) -> Result<usize>;
    async fn fetch_store(&self, index: usize) -> Result<Map<String, Value>>;
}

/// Object storage: download `bucket/key` to a local file before parsing.
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> Result<PathBuf>;
}

/// Assemble the full store batch by walking the directory in index order.
pub async fn retrieve_stores(directory: &dyn StoreDirectory) -> Result<Batch> {
    let count = directory.store_count().await?;
    debug!(count, "retrieving stores from directory");
    let mut records = Vec::with_capacity(count);
    for index in 0..count {
        records.push(directory.fetch_store(index).await?);
    }
    Ok(Batch::from_records(&records))
}
