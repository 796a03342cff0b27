pub mod models;
pub mod store;

pub use models::{CatalogRecord, Choice, EventKind, OWNER_WILDCARD};
pub use store::{CatalogStore, RosterStore};
