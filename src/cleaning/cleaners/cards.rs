use crate::batch::Batch;
use crate::cleaning::{filters, CleanOutcome, CleanReport, EntityCleaner, EntityKind};
use crate::error::Result;

/// The ten card schemes the payments system accepts.
const ALLOWED_PROVIDERS: [&str; 10] = [
    "VISA 16 digit",
    "JCB 16 digit",
    "VISA 13 digit",
    "JCB 15 digit",
    "VISA 19 digit",
    "Diners Club / Carte Blanche",
    "American Express",
    "Maestro",
    "Discover",
    "Mastercard",
];

/// Cleaner for card details extracted from the payments PDF.
pub struct CardCleaner;

impl EntityCleaner for CardCleaner {
    fn kind(&self) -> EntityKind {
        EntityKind::Card
    }

    fn clean(&self, mut batch: Batch) -> Result<CleanOutcome> {
        let mut report = CleanReport::new(EntityKind::Card, batch.len());

        filters::drop_missing(&mut batch, &mut report);
        filters::drop_duplicates(&mut batch, &mut report);
        filters::retain_allowed(&mut batch, &mut report, "card_provider", &ALLOWED_PROVIDERS)?;
        filters::coerce_dates(&mut batch, &mut report, "date_payment_confirmed")?;

        Ok(CleanOutcome { batch, report })
    }
}
