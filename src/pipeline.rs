use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn, Instrument};
use uuid::Uuid;

use crate::batch::Batch;
use crate::cleaning::{CleanOutcome, CleanReport, CleanerRegistry, EntityKind};
use crate::config::Config;
use crate::error::Result;
use crate::extract::{
    files, retrieve_stores, DocumentTableSource, ObjectFetcher, StoreDirectory, TableSource,
};
use crate::warehouse::Warehouse;

/// Where each entity's raw batch comes from.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub users_table: String,
    pub orders_table: String,
    pub card_details_url: String,
    pub bucket: String,
    pub products_key: String,
    pub events_key: String,
    pub download_dir: PathBuf,
}

impl SourceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            users_table: config.source_db.users_table.clone(),
            orders_table: config.source_db.orders_table.clone(),
            card_details_url: config.documents.card_details_url.clone(),
            bucket: config.objects.bucket.clone(),
            products_key: config.objects.products_key.clone(),
            events_key: config.objects.events_key.clone(),
            download_dir: config.objects.download_dir.clone(),
        }
    }
}

/// Result of extracting, cleaning, and loading one entity batch.
#[derive(Debug, Clone, Serialize)]
pub struct EntityRunResult {
    pub entity: EntityKind,
    pub destination: String,
    pub extracted_rows: usize,
    pub loaded_rows: usize,
    pub report: CleanReport,
}

/// Result of a complete pipeline run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub results: Vec<EntityRunResult>,
}

impl RunSummary {
    pub fn total_loaded(&self) -> usize {
        self.results.iter().map(|r| r.loaded_rows).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.results.iter().map(|r| r.report.rejected_rows()).sum()
    }
}

/// The linear batch pipeline: one entity at a time, extract the whole table,
/// clean it end-to-end, replace the destination.
pub struct EtlPipeline {
    tables: Arc<dyn TableSource>,
    documents: Arc<dyn DocumentTableSource>,
    stores: Arc<dyn StoreDirectory>,
    objects: Arc<dyn ObjectFetcher>,
    warehouse: Arc<dyn Warehouse>,
    registry: CleanerRegistry,
    sources: SourceSettings,
}

impl EtlPipeline {
    pub fn new(
        tables: Arc<dyn TableSource>,
        documents: Arc<dyn DocumentTableSource>,
        stores: Arc<dyn StoreDirectory>,
        objects: Arc<dyn ObjectFetcher>,
        warehouse: Arc<dyn Warehouse>,
        sources: SourceSettings,
    ) -> Self {
        Self {
            tables,
            documents,
            stores,
            objects,
            warehouse,
            registry: CleanerRegistry::new(),
            sources,
        }
    }

    async fn extract(&self, kind: EntityKind) -> Result<Batch> {
        match kind {
            EntityKind::User => self.tables.read_table(&self.sources.users_table).await,
            EntityKind::Order => self.tables.read_table(&self.sources.orders_table).await,
            EntityKind::Card => {
                self.documents
                    .extract_tables(&self.sources.card_details_url)
                    .await
            }
            EntityKind::Store => retrieve_stores(self.stores.as_ref()).await,
            EntityKind::Product => {
                let path = self
                    .objects
                    .fetch(
                        &self.sources.bucket,
                        &self.sources.products_key,
                        &self.sources.download_dir,
                    )
                    .await?;
                files::read_csv_batch(&path)
            }
            EntityKind::Event => {
                let path = self
                    .objects
                    .fetch(
                        &self.sources.bucket,
                        &self.sources.events_key,
                        &self.sources.download_dir,
                    )
                    .await?;
                files::read_json_batch(&path)
            }
        }
    }

    /// Extract, clean, and load one entity batch.
    #[instrument(skip(self), fields(entity = %kind))]
    pub async fn run_entity(&self, kind: EntityKind) -> Result<EntityRunResult> {
        let raw = self.extract(kind).await?;
        let extracted_rows = raw.len();
        info!(rows = extracted_rows, "extracted batch");

        let CleanOutcome { batch, report } = self.registry.clean(kind, raw)?;
        if report.rejected_rows() > 0 {
            warn!(
                rejected = report.rejected_rows(),
                "rows rejected during cleaning"
            );
        }

        let destination = kind.destination();
        self.warehouse.replace(destination, &batch).await?;
        info!(destination, rows = batch.len(), "loaded batch");

        Ok(EntityRunResult {
            entity: kind,
            destination: destination.to_string(),
            extracted_rows,
            loaded_rows: batch.len(),
            report,
        })
    }

    /// Run the pipeline for the given entity kinds in order.
    pub async fn run(&self, kinds: &[EntityKind]) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("etl_run", %run_id);

        async {
            let mut results = Vec::with_capacity(kinds.len());
            for kind in kinds {
                results.push(self.run_entity(*kind).await?);
            }
            Ok(RunSummary { run_id, results })
        }
        .instrument(span)
        .await
    }
}
