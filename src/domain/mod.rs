//! Domain models for the inventory catalog
//!
//! Contains the core business logic without any I/O concerns.

mod access;
mod custom_id;
mod element;
mod ids;
mod inventory;
mod item;
mod stats;

pub use access::{AccessPolicy, AccessScope, Actor, OwnershipPolicy};
pub use custom_id::{compose, default_format, effective_format, is_deterministic, ordered, uses_sequence};
pub use element::{CustomIdElement, ElementKind, GenerationContext, MAX_PAD_WIDTH};
pub use ids::{FieldId, IdError, InventoryId, ItemId, UserId};
pub use inventory::{
    validate_fields, validate_format, Category, FieldDefinition, FieldType, Inventory,
    InventoryPatch, NewInventory, MAX_TITLE_LEN,
};
pub use item::{
    validate_quantity, validate_values, FieldValue, FieldValues, Item, ItemPatch, NewItem, Scalar,
    MAX_QUANTITY,
};
pub use stats::{
    aggregate, BooleanStats, CreatedRange, FieldStatsReport, FieldSummary, InventoryOverview,
    InventoryStats, NumericStats, TextStats, UserOverview, ValueCount, TOP_VALUES,
};

/// Title checks shared by inventories and items
pub mod validate {
    pub use super::inventory::validate_title as inventory_title;
    pub use super::item::validate_title as item_title;
}
