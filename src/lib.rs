//! stockroom - a multi-tenant inventory catalog
//!
//! Users define inventories (schemas with custom fields) and fill them with
//! items. Every item gets a custom identifier composed from the inventory's
//! configured elements and unique within that inventory. Updates are guarded
//! by optimistic version checks, and per-field statistics are computed on
//! demand.

pub mod catalog;
pub mod cli;
pub mod domain;
pub mod storage;

pub use catalog::{Catalog, CatalogError, CatalogResult};
pub use domain::{Actor, Inventory, InventoryId, Item, ItemId, UserId};
pub use storage::{CatalogStore, SqliteStore};
