use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::batch::Batch;
use crate::constants;
use crate::error::Result;

pub mod cleaners;
pub mod filters;
pub mod phone;
pub mod registry;
pub mod weight;

pub use registry::CleanerRegistry;

/// The six fixed record types the pipeline knows how to clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Card,
    Store,
    Product,
    Order,
    Event,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::User,
        EntityKind::Card,
        EntityKind::Store,
        EntityKind::Product,
        EntityKind::Order,
        EntityKind::Event,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Card => "cards",
            EntityKind::Store => "stores",
            EntityKind::Product => "products",
            EntityKind::Order => "orders",
            EntityKind::Event => "events",
        }
    }

    /// Warehouse table this entity is loaded into.
    pub fn destination(&self) -> &'static str {
        match self {
            EntityKind::User => constants::USERS_DESTINATION,
            EntityKind::Card => constants::CARDS_DESTINATION,
            EntityKind::Store => constants::STORES_DESTINATION,
            EntityKind::Product => constants::PRODUCTS_DESTINATION,
            EntityKind::Order => constants::ORDERS_DESTINATION,
            EntityKind::Event => constants::EVENTS_DESTINATION,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" | "users" => Ok(EntityKind::User),
            "card" | "cards" => Ok(EntityKind::Card),
            "store" | "stores" => Ok(EntityKind::Store),
            "product" | "products" => Ok(EntityKind::Product),
            "order" | "orders" => Ok(EntityKind::Order),
            "event" | "events" => Ok(EntityKind::Event),
            other => Err(format!("unknown entity kind: {}", other)),
        }
    }
}

/// Why a row was excluded from a cleaned batch. Rejections are accounting,
/// not errors: cleaners accumulate counts instead of silently dropping data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// A field in the row was the null marker.
    FieldMissing,
    /// The row was an exact duplicate of an earlier row.
    Duplicate,
    /// A categorical field was outside its allow-list.
    CategoryRejected,
    /// A numeric or date field could not be parsed.
    UnparseableValue,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::FieldMissing => "field_missing",
            RejectReason::Duplicate => "duplicate",
            RejectReason::CategoryRejected => "category_rejected",
            RejectReason::UnparseableValue => "unparseable_value",
        };
        f.write_str(s)
    }
}

/// Per-batch rejection accounting produced by a cleaner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanReport {
    pub entity: EntityKind,
    pub input_rows: usize,
    pub output_rows: usize,
    rejects: BTreeMap<RejectReason, usize>,
}

impl CleanReport {
    pub fn new(entity: EntityKind, input_rows: usize) -> Self {
        Self {
            entity,
            input_rows,
            output_rows: input_rows,
            rejects: BTreeMap::new(),
        }
    }

    /// Record `count` rows rejected for `reason`.
    pub fn reject(&mut self, reason: RejectReason, count: usize) {
        if count > 0 {
            *self.rejects.entry(reason).or_insert(0) += count;
            self.output_rows = self.output_rows.saturating_sub(count);
        }
    }

    pub fn rejected_rows(&self) -> usize {
        self.rejects.values().sum()
    }

    pub fn count(&self, reason: RejectReason) -> usize {
        self.rejects.get(&reason).copied().unwrap_or(0)
    }

    pub fn rejects(&self) -> &BTreeMap<RejectReason, usize> {
        &self.rejects
    }
}

/// A cleaned batch together with its rejection accounting.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub batch: Batch,
    pub report: CleanReport,
}

/// One per-entity cleaning transform. Implementations are deterministic and,
/// with the exception of the order projection, idempotent on their own
/// output.
pub trait EntityCleaner: Send + Sync {
    fn kind(&self) -> EntityKind;

    fn clean(&self, batch: Batch) -> Result<CleanOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_round_trips_through_str() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("warehouse".parse::<EntityKind>().is_err());
    }

    #[test]
    fn report_accounting_sums() {
        let mut report = CleanReport::new(EntityKind::User, 10);
        report.reject(RejectReason::FieldMissing, 2);
        report.reject(RejectReason::Duplicate, 1);
        report.reject(RejectReason::FieldMissing, 1);
        assert_eq!(report.rejected_rows(), 4);
        assert_eq!(report.output_rows, 6);
        assert_eq!(report.count(RejectReason::FieldMissing), 3);
        assert_eq!(report.count(RejectReason::UnparseableValue), 0);
    }
}
