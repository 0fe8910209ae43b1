use serde_json::Value;

use crate::batch::Batch;
use crate::cleaning::{filters, weight, CleanOutcome, CleanReport, EntityCleaner, EntityKind};
use crate::error::Result;

/// Index-like columns carried over from the CSV export. Dropped when
/// present; the name list replaces the legacy job's positional
/// first-column drop so re-cleaning never eats the assigned `id`.
const INDEX_COLUMNS: [&str; 3] = ["", "Unnamed: 0", "index"];

/// Cleaner for the products CSV: weight normalization to kilograms,
/// availability repair, date coercion, and dense id assignment.
pub struct ProductCleaner;

impl EntityCleaner for ProductCleaner {
    fn kind(&self) -> EntityKind {
        EntityKind::Product
    }

    fn clean(&self, mut batch: Batch) -> Result<CleanOutcome> {
        let mut report = CleanReport::new(EntityKind::Product, batch.len());

        for name in INDEX_COLUMNS {
            batch.drop_column_if_present(name);
        }

        filters::drop_missing(&mut batch, &mut report);
        filters::drop_duplicates(&mut batch, &mut report);
        weight::convert_weights(&mut batch, &mut report)?;

        // Known typo in the availability status
        batch.map_column("removed", |v| match v.as_str() {
            Some("Still_avaliable") => Value::String("Available".to_string()),
            _ => v.clone(),
        })?;

        filters::coerce_dates(&mut batch, &mut report, "date_added")?;

        // The unit tag is transient; the warehouse schema carries kilograms
        // only
        batch.drop_column_if_present("unit");

        // Dense zero-based ids from final row position. Contiguous within a
        // batch, NOT stable across reruns.
        let ids: Vec<Value> = (0..batch.len()).map(|i| Value::from(i as u64)).collect();
        batch.set_column_front("id", ids)?;

        Ok(CleanOutcome { batch, report })
    }
}
