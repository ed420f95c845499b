//! Persistence contract of the catalog
//!
//! The catalog services are written against [`CatalogStore`] only, so the
//! backing database is swappable. Implementations must provide:
//!
//! - a unique `(inventory_id, custom_id)` constraint on items, reported as
//!   [`StoreError::DuplicateKey`]
//! - conditional updates and deletes that compare and bump `version` in one
//!   atomic operation
//! - an atomic per-inventory sequence counter

use thiserror::Error;

use crate::domain::{
    Inventory, InventoryId, InventoryPatch, Item, ItemId, ItemPatch, UserId,
};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Database is busy: {0}")]
    Busy(String),

    #[error("Value {value} does not fit column {column}")]
    OutOfRange { column: &'static str, value: u64 },

    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns true if retrying the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Busy(_))
    }
}

/// Outcome of a version-conditional write
#[derive(Debug, Clone, PartialEq)]
pub enum VersionedWrite<T> {
    /// The expected version matched; carries the record as written
    Applied(T),
    /// The record exists at a different version; nothing was changed
    Conflict { current: u64 },
    /// No record with that ID exists
    Missing,
}

impl<T> VersionedWrite<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, VersionedWrite::Applied(_))
    }
}

/// Storage operations the catalog core depends on
pub trait CatalogStore {
    // Inventories

    fn insert_inventory(&self, inventory: &Inventory) -> StoreResult<()>;

    fn find_inventory(&self, id: &InventoryId) -> StoreResult<Option<Inventory>>;

    fn list_inventories(&self) -> StoreResult<Vec<Inventory>>;

    /// Inventories created by `owner`, newest first
    fn list_inventories_owned_by(&self, owner: &UserId) -> StoreResult<Vec<Inventory>>;

    /// Inventories `user` can write without owning them: those listing the
    /// user in `allowed_users` and public ones. Newest first.
    fn list_inventories_shared_with(&self, user: &UserId) -> StoreResult<Vec<Inventory>>;

    /// Up to `limit` inventories whose title, description or a tag contains
    /// `query`, ignoring ASCII case. Newest first.
    fn search_inventories(&self, query: &str, limit: usize) -> StoreResult<Vec<Inventory>>;

    /// Applies `patch` and bumps `version` by one, only if the stored version
    /// equals `expected`
    fn update_inventory_if_version_matches(
        &self,
        id: &InventoryId,
        expected: u64,
        patch: &InventoryPatch,
    ) -> StoreResult<VersionedWrite<Inventory>>;

    /// Deletes the inventory only if the stored version equals `expected`.
    /// Items are left in place.
    fn delete_inventory_if_version_matches(
        &self,
        id: &InventoryId,
        expected: u64,
    ) -> StoreResult<VersionedWrite<()>>;

    // Items

    /// Fails with [`StoreError::DuplicateKey`] if the custom ID is taken
    fn insert_item(&self, item: &Item) -> StoreResult<()>;

    fn find_item(&self, id: &ItemId) -> StoreResult<Option<Item>>;

    fn find_item_by_custom_id(
        &self,
        inventory_id: &InventoryId,
        custom_id: &str,
    ) -> StoreResult<Option<Item>>;

    fn count_items(&self, inventory_id: &InventoryId) -> StoreResult<u64>;

    /// All items of an inventory, oldest first
    fn list_items(&self, inventory_id: &InventoryId) -> StoreResult<Vec<Item>>;

    /// Up to `limit` items whose title or custom ID contains `query`,
    /// ignoring ASCII case; `inventory_id` narrows the search to one
    /// inventory. Oldest first.
    fn search_items(
        &self,
        inventory_id: Option<&InventoryId>,
        query: &str,
        limit: usize,
    ) -> StoreResult<Vec<Item>>;

    /// Like [`Self::update_inventory_if_version_matches`]; fails with
    /// [`StoreError::DuplicateKey`] if the patch moves the item onto a
    /// custom ID that is already taken
    fn update_item_if_version_matches(
        &self,
        id: &ItemId,
        expected: u64,
        patch: &ItemPatch,
    ) -> StoreResult<VersionedWrite<Item>>;

    fn delete_item_if_version_matches(
        &self,
        id: &ItemId,
        expected: u64,
    ) -> StoreResult<VersionedWrite<()>>;

    // Sequences

    /// Atomically issues the next sequence number of an inventory (1-based).
    ///
    /// The counter starts from the inventory's item count the first time it
    /// is used, so pre-existing items are not re-numbered.
    fn reserve_sequence(&self, inventory_id: &InventoryId) -> StoreResult<u64>;
}
