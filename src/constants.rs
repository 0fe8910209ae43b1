/// Destination table names in the warehouse. These are fixed: reruns fully
/// replace the destination, so the loader needs a stable name per entity.

pub const USERS_DESTINATION: &str = "dim_users";
pub const CARDS_DESTINATION: &str = "dim_card_details";
pub const STORES_DESTINATION: &str = "dim_store_details";
pub const PRODUCTS_DESTINATION: &str = "dim_products";
pub const ORDERS_DESTINATION: &str = "orders_table";
pub const EVENTS_DESTINATION: &str = "dim_date_times";

/// Default location of the pipeline configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Environment variable that overrides the store API key from config.
pub const STORES_API_KEY_ENV: &str = "STORES_API_KEY";
