use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use retail_etl::cleaning::{CleanOutcome, CleanerRegistry, EntityKind};
use retail_etl::config::{Config, DbCredentials};
use retail_etl::extract::document::PopplerTableSource;
use retail_etl::extract::http::{HttpObjectFetcher, StoreApiClient};
use retail_etl::extract::sql::SqliteTableSource;
use retail_etl::extract::{files, TableSource};
use retail_etl::pipeline::{EtlPipeline, SourceSettings};
use retail_etl::warehouse::SqliteWarehouse;
use retail_etl::{constants, logging};

#[derive(Parser)]
#[command(name = "retail_etl")]
#[command(about = "Batch ETL pipeline for multinational retail sales data")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the pipeline configuration file
    #[arg(long, default_value = constants::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, clean, and load entity batches into the warehouse
    Run {
        /// Specific entities to process (comma-separated).
        /// Available: users, cards, stores, products, orders, events
        #[arg(long)]
        entities: Option<String>,
    },
    /// Clean a local batch file (CSV or JSON) without touching any upstream
    Clean {
        /// Entity kind to clean the batch as
        #[arg(long)]
        entity: EntityKind,
        /// Input batch file (.csv or .json)
        #[arg(long)]
        input: PathBuf,
        /// Where to write the cleaned records as JSON (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the tables available in the relational source
    ListTables,
}

fn parse_entities(entities: Option<String>) -> Result<Vec<EntityKind>, String> {
    match entities {
        None => Ok(EntityKind::ALL.to_vec()),
        Some(list) => list.split(',').map(|s| s.parse()).collect(),
    }
}

fn build_pipeline(config: &Config) -> anyhow::Result<EtlPipeline> {
    let source_creds = DbCredentials::from_yaml(&config.source_db.credentials)?;
    let warehouse_creds = DbCredentials::from_yaml(&config.warehouse.credentials)?;

    let tables = Arc::new(SqliteTableSource::from_credentials(&source_creds));
    let documents = Arc::new(PopplerTableSource::new());
    let stores = Arc::new(StoreApiClient::new(
        config.stores_api.directory_url.clone(),
        config.stores_api.store_url.clone(),
        config.stores_api.api_key.clone(),
    ));
    let objects = Arc::new(HttpObjectFetcher::new());
    let warehouse = Arc::new(SqliteWarehouse::from_credentials(&warehouse_creds));

    Ok(EtlPipeline::new(
        tables,
        documents,
        stores,
        objects,
        warehouse,
        SourceSettings::from_config(config),
    ))
}

async fn run_pipeline(config: &Config, entities: Option<String>) -> anyhow::Result<()> {
    let kinds = parse_entities(entities).map_err(|e| anyhow::anyhow!(e))?;
    let pipeline = build_pipeline(config)?;

    let summary = pipeline.run(&kinds).await?;
    println!("\n📊 ETL run {}:", summary.run_id);
    for result in &summary.results {
        println!(
            "   {} -> {}: extracted {}, loaded {}, rejected {}",
            result.entity,
            result.destination,
            result.extracted_rows,
            result.loaded_rows,
            result.report.rejected_rows(),
        );
        for (reason, count) in result.report.rejects() {
            println!("      - {}: {}", reason, count);
        }
    }
    println!(
        "   Total: {} rows loaded, {} rejected",
        summary.total_loaded(),
        summary.total_rejected()
    );
    Ok(())
}

fn clean_local_batch(
    entity: EntityKind,
    input: &PathBuf,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let batch = match input.extension().and_then(|e| e.to_str()) {
        Some("csv") => files::read_csv_batch(input)?,
        Some("json") => files::read_json_batch(input)?,
        _ => anyhow::bail!("unsupported input format: {}", input.display()),
    };

    let registry = CleanerRegistry::new();
    let CleanOutcome { batch, report } = registry.clean(entity, batch)?;

    let records = serde_json::to_string_pretty(&batch.to_records())?;
    match output {
        Some(path) => std::fs::write(&path, records)?,
        None => println!("{}", records),
    }
    eprintln!(
        "🧹 {}: {} rows in, {} rows out, {} rejected",
        entity,
        report.input_rows,
        report.output_rows,
        report.rejected_rows()
    );
    for (reason, count) in report.rejects() {
        eprintln!("   - {}: {}", reason, count);
    }
    Ok(())
}

async fn list_tables(config: &Config) -> anyhow::Result<()> {
    let creds = DbCredentials::from_yaml(&config.source_db.credentials)?;
    let source = SqliteTableSource::from_credentials(&creds);
    for table in source.list_tables().await? {
        println!("{}", table);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { entities } => {
            println!("🔄 Running ETL pipeline...");
            let config = Config::load(&cli.config)?;
            if let Err(e) = run_pipeline(&config, entities).await {
                error!("Pipeline failed: {}", e);
                return Err(e);
            }
            info!("Pipeline finished");
        }
        Commands::Clean {
            entity,
            input,
            output,
        } => {
            clean_local_batch(entity, &input, output)?;
        }
        Commands::ListTables => {
            let config = Config::load(&cli.config)?;
            list_tables(&config).await?;
        }
    }

    Ok(())
}
