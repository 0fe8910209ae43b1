use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::STORES_API_KEY_ENV;
use crate::error::{EtlError, Result};

/// Top-level pipeline configuration, loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source_db: SourceDbConfig,
    pub warehouse: WarehouseConfig,
    pub stores_api: StoresApiConfig,
    pub objects: ObjectsConfig,
    pub documents: DocumentsConfig,
}

/// Relational source: where the users and orders tables live.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDbConfig {
    pub credentials: PathBuf,
    pub users_table: String,
    pub orders_table: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    pub credentials: PathBuf,
}

/// Paginated store-listing API: a directory endpoint reporting the total
/// count, and a per-index endpoint returning one store as a JSON object.
#[derive(Debug, Clone, Deserialize)]
pub struct StoresApiConfig {
    pub directory_url: String,
    pub store_url: String,
    pub api_key: String,
}

/// Object storage holding the products CSV and the events JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectsConfig {
    pub bucket: String,
    pub products_key: String,
    pub events_key: String,
    pub download_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsConfig {
    pub card_details_url: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut config: Config = toml::from_str(&config_content)?;

        // The API key may be supplied via the environment instead of config
        if let Ok(key) = std::env::var(STORES_API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.stores_api.api_key = key;
            }
        }

        Ok(config)
    }
}

/// Database credentials, read from a YAML file and passed explicitly into
/// the collaborators that need them. Nothing in the crate reads credentials
/// from ambient state.
#[derive(Debug, Clone, Deserialize)]
pub struct DbCredentials {
    pub driver: String,
    /// File path for the sqlite-backed implementations.
    pub database: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl DbCredentials {
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read credentials file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let creds: DbCredentials = serde_yaml::from_str(&content)?;
        Ok(creds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_credentials_yaml() {
        let yaml = "driver: sqlite\ndatabase: data/source.db\nuser: etl\n";
        let creds: DbCredentials = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(creds.driver, "sqlite");
        assert_eq!(creds.database, "data/source.db");
        assert_eq!(creds.user.as_deref(), Some("etl"));
        assert!(creds.password.is_none());
    }

    #[test]
    fn parses_full_config() {
        let toml_str = r#"
            [source_db]
            credentials = "credentials/source.yaml"
            users_table = "legacy_users"
            orders_table = "orders_table"

            [warehouse]
            credentials = "credentials/warehouse.yaml"

            [stores_api]
            directory_url = "https://api.example.com/number_stores"
            store_url = "https://api.example.com/store_details"
            api_key = "secret"

            [objects]
            bucket = "retail-data-public"
            products_key = "products.csv"
            events_key = "date_details.json"
            download_dir = "downloads"

            [documents]
            card_details_url = "https://docs.example.com/card_details.pdf"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.source_db.users_table, "legacy_users");
        assert_eq!(config.objects.bucket, "retail-data-public");
    }
}
