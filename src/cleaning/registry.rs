use std::collections::HashMap;

use crate::batch::Batch;
use crate::cleaning::cleaners::{
    CardCleaner, EventCleaner, OrderCleaner, ProductCleaner, StoreCleaner, UserCleaner,
};
use crate::cleaning::{CleanOutcome, EntityCleaner, EntityKind};
use crate::error::{EtlError, Result};

/// Registry dispatching a batch to the cleaner for its declared entity kind.
pub struct CleanerRegistry {
    cleaners: HashMap<EntityKind, Box<dyn EntityCleaner>>,
}

impl CleanerRegistry {
    /// Create a registry with the six built-in entity cleaners.
    pub fn new() -> Self {
        let mut cleaners: HashMap<EntityKind, Box<dyn EntityCleaner>> = HashMap::new();
        cleaners.insert(EntityKind::User, Box::new(UserCleaner));
        cleaners.insert(EntityKind::Card, Box::new(CardCleaner));
        cleaners.insert(EntityKind::Store, Box::new(StoreCleaner));
        cleaners.insert(EntityKind::Product, Box::new(ProductCleaner));
        cleaners.insert(EntityKind::Order, Box::new(OrderCleaner));
        cleaners.insert(EntityKind::Event, Box::new(EventCleaner));
        Self { cleaners }
    }

    /// Register (or replace) a cleaner for an entity kind.
    pub fn register(&mut self, cleaner: Box<dyn EntityCleaner>) {
        self.cleaners.insert(cleaner.kind(), cleaner);
    }

    pub fn get(&self, kind: EntityKind) -> Option<&dyn EntityCleaner> {
        self.cleaners.get(&kind).map(|c| c.as_ref())
    }

    /// Clean a batch with the cleaner registered for `kind`.
    pub fn clean(&self, kind: EntityKind, batch: Batch) -> Result<CleanOutcome> {
        match self.get(kind) {
            Some(cleaner) => cleaner.clean(batch),
            None => Err(EtlError::Config(format!(
                "No cleaner registered for entity kind: {}",
                kind
            ))),
        }
    }
}

impl Default for CleanerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
