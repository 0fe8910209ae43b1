use crate::batch::Batch;
use crate::cleaning::{CleanOutcome, CleanReport, EntityCleaner, EntityKind};
use crate::error::Result;

/// Columns the orders feed carries that the warehouse schema does not: two
/// name fields duplicated from users, two positional artifacts from earlier
/// exports, and a stray numeric-named column.
const DROPPED_COLUMNS: [&str; 5] = ["first_name", "last_name", "1", "level_0", "index"];

/// Cleaner for the orders table. A pure projection: the listed columns are
/// removed and every row is kept. A missing column is fatal for the whole
/// batch, since it means the upstream schema has drifted.
pub struct OrderCleaner;

impl EntityCleaner for OrderCleaner {
    fn kind(&self) -> EntityKind {
        EntityKind::Order
    }

    fn clean(&self, mut batch: Batch) -> Result<CleanOutcome> {
        let report = CleanReport::new(EntityKind::Order, batch.len());
        for name in DROPPED_COLUMNS {
            batch.drop_column(name)?;
        }
        Ok(CleanOutcome { batch, report })
    }
}
