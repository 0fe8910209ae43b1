//! HTTP-backed extraction adapters: the paginated store-listing API and
//! public object-storage downloads.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::{EtlError, Result};
use crate::extract::{ObjectFetcher, StoreDirectory};

const API_KEY_HEADER: &str = "x-api-key";

/// Client for the store-listing API. The directory endpoint reports
/// `number_stores`; the per-index endpoint returns one store as a JSON
/// object.
pub struct StoreApiClient {
    client: reqwest::Client,
    directory_url: String,
    store_url: String,
    api_key: String,
}

impl StoreApiClient {
    pub fn new(directory_url: String, store_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            directory_url,
            store_url,
            api_key,
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            // A non-success status is a distinguishable error, not a
            // sentinel return
            return Err(EtlError::Upstream {
                message: format!("GET {} returned status {}", url, status.as_u16()),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl StoreDirectory for StoreApiClient {
    async fn store_count(&self) -> Result<usize> {
        let body = self.get_json(&self.directory_url).await?;
        body.get("number_stores")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .ok_or_else(|| EtlError::Upstream {
                message: format!(
                    "directory endpoint did not report number_stores: {}",
                    body
                ),
            })
    }

    #[instrument(skip(self))]
    async fn fetch_store(&self, index: usize) -> Result<Map<String, Value>> {
        let url = format!("{}/{}", self.store_url.trim_end_matches('/'), index);
        match self.get_json(&url).await? {
            Value::Object(record) => Ok(record),
            other => Err(EtlError::Upstream {
                message: format!("store {} was not a JSON object: {}", index, other),
            }),
        }
    }
}

/// Downloads objects from a public bucket over HTTPS and materializes them
/// locally before parsing.
pub struct HttpObjectFetcher {
    client: reqwest::Client,
}

impl HttpObjectFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpObjectFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectFetcher for HttpObjectFetcher {
    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> Result<PathBuf> {
        let url = format!("https://{}.s3.amazonaws.com/{}", bucket, key);
        debug!(%url, "downloading object");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::Upstream {
                message: format!("GET {} returned status {}", url, status.as_u16()),
            });
        }
        let bytes = response.bytes().await?;

        fs::create_dir_all(dest)?;
        let file_name = Path::new(key)
            .file_name()
            .ok_or_else(|| EtlError::Config(format!("object key has no file name: {}", key)))?;
        let path = dest.join(file_name);
        fs::write(&path, &bytes)?;
        Ok(path)
    }
}
