// Individual cleaner implementations, one per entity kind
pub mod cards;
pub mod events;
pub mod orders;
pub mod products;
pub mod stores;
pub mod users;

// Re-export the main components
pub use cards::CardCleaner;
pub use events::EventCleaner;
pub use orders::OrderCleaner;
pub use products::ProductCleaner;
pub use stores::StoreCleaner;
pub use users::UserCleaner;
