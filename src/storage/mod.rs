//! # Storage Layer
//!
//! Persistence for the catalog.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Inventories, items, sequences | SQLite (WAL) | `.stockroom/catalog.db` |
//! | Config | TOML | `.stockroom/config.toml` |
//! | Global config | TOML | `~/.config/stockroom/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - Version checks are conditional `UPDATE`s, atomic inside SQLite
//! - Sequence numbers come from a single upsert-and-increment statement
//! - A unique index on `(inventory_id, custom_id)` backs custom ID uniqueness
//! - Lock contention beyond the busy timeout surfaces as [`StoreError::Busy`]
//!
//! ## Key Types
//!
//! - [`CatalogStore`] - Persistence contract the catalog is written against
//! - [`SqliteStore`] - Default SQLite implementation
//! - [`Workspace`] - Entry point for a `.stockroom/` directory
//! - [`Config`] - Workspace and global configuration

mod config;
mod project;
mod sqlite;
mod store;

pub use config::{
    Config, ConfigError, GlobalConfig, LogConfig, OutputFormat, ProjectConfig, UserConfig,
    WORKSPACE_DIR,
};
pub use project::{Workspace, WorkspaceError};
pub use sqlite::SqliteStore;
pub use store::{CatalogStore, StoreError, StoreResult, VersionedWrite};
