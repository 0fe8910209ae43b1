use crate::batch::Batch;
use crate::cleaning::{filters, CleanOutcome, CleanReport, EntityCleaner, EntityKind};
use crate::error::Result;

const ALLOWED_TIME_PERIODS: [&str; 4] = ["Midday", "Late_Hours", "Evening", "Morning"];

/// Cleaner for the sale events feed.
pub struct EventCleaner;

impl EntityCleaner for EventCleaner {
    fn kind(&self) -> EntityKind {
        EntityKind::Event
    }

    fn clean(&self, mut batch: Batch) -> Result<CleanOutcome> {
        let mut report = CleanReport::new(EntityKind::Event, batch.len());

        filters::drop_missing(&mut batch, &mut report);
        filters::drop_duplicates(&mut batch, &mut report);
        filters::retain_allowed(&mut batch, &mut report, "time_period", &ALLOWED_TIME_PERIODS)?;

        Ok(CleanOutcome { batch, report })
    }
}
