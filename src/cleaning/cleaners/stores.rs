use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::batch::Batch;
use crate::cleaning::{filters, CleanOutcome, CleanReport, EntityCleaner, EntityKind, RejectReason};
use crate::error::Result;

static ANY_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").unwrap());

/// Cleaner for store details fetched from the store-listing API.
///
/// The raw `lat` field duplicates `latitude` and is always discarded; the
/// drop is tolerant so the cleaner stays idempotent on its own output.
pub struct StoreCleaner;

impl EntityCleaner for StoreCleaner {
    fn kind(&self) -> EntityKind {
        EntityKind::Store
    }

    fn clean(&self, mut batch: Batch) -> Result<CleanOutcome> {
        let mut report = CleanReport::new(EntityKind::Store, batch.len());

        batch.drop_column_if_present("lat");
        filters::drop_missing(&mut batch, &mut report);
        filters::drop_duplicates(&mut batch, &mut report);

        // A locality containing a digit is a shifted or corrupted row
        let mask: Vec<bool> = batch
            .expect_column("locality")?
            .values
            .iter()
            .map(|v| v.as_str().is_some_and(|s| !ANY_DIGIT.is_match(s)))
            .collect();
        filters::apply_mask(&mut batch, &mut report, &mask, RejectReason::UnparseableValue);

        filters::retain_numeric(&mut batch, &mut report, "latitude")?;
        filters::retain_numeric(&mut batch, &mut report, "staff_numbers")?;

        // Two known malformed prefixes; unmapped continents pass through
        batch.map_column("continent", |v| match v.as_str() {
            Some("eeEurope") => Value::String("Europe".to_string()),
            Some("eeAmerica") => Value::String("America".to_string()),
            _ => v.clone(),
        })?;

        filters::coerce_dates(&mut batch, &mut report, "opening_date")?;

        Ok(CleanOutcome { batch, report })
    }
}
