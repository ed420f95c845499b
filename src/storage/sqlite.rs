//! SQLite catalog store
//!
//! The database lives in `.stockroom/catalog.db`. Inventories and items are
//! rows with JSON columns for their embedded lists; a unique index on
//! `(inventory_id, custom_id)` enforces per-inventory identifier uniqueness.
//!
//! Version-conditional writes are single `UPDATE ... WHERE version = ?
//! RETURNING` statements, so the compare and the increment happen inside
//! SQLite's write lock. Connections run in WAL mode with a busy timeout;
//! several connections (threads or processes) can share one file.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::store::{CatalogStore, StoreError, StoreResult, VersionedWrite};
use crate::domain::{Inventory, InventoryId, InventoryPatch, Item, ItemId, ItemPatch, UserId};

const INVENTORY_COLUMNS: &str = "id, title, description, category, tags, image, is_public, \
     custom_id_format, fields, created_by, allowed_users, version, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, inventory_id, custom_id, title, description, quantity, fields, \
     created_by, version, created_at, updated_at";

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(e, _) => Some((e.code, e.extended_code)),
            _ => None,
        };

        match code {
            Some((ErrorCode::ConstraintViolation, ext))
                if ext == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || ext == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                StoreError::DuplicateKey(err.to_string())
            }
            Some((ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked, _)) => {
                StoreError::Busy(err.to_string())
            }
            _ => StoreError::Sqlite(err),
        }
    }
}

/// SQLite-backed [`CatalogStore`]
pub struct SqliteStore {
    /// Path to the database file (`None` for in-memory stores)
    path: Option<PathBuf>,

    /// Database connection
    conn: Connection,
}

impl SqliteStore {
    /// Schema version - bump when the schema changes
    const SCHEMA_VERSION: i32 = 1;

    /// Opens or creates the database at `path`
    pub fn open(path: &Path, busy_timeout: Duration) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets readers proceed while another connection writes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.busy_timeout(busy_timeout)?;

        Self::init(Some(path.to_path_buf()), conn)
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(None, Connection::open_in_memory()?)
    }

    fn init(path: Option<PathBuf>, conn: Connection) -> StoreResult<Self> {
        let store = Self { path, conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Returns the path to the database file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Creates the schema on a fresh database and refuses unknown versions
    fn ensure_schema(&self) -> StoreResult<()> {
        match self.schema_version()? {
            0 => self.create_schema(),
            v if v == Self::SCHEMA_VERSION => Ok(()),
            v => Err(StoreError::Corrupt {
                id: self
                    .path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| ":memory:".to_string()),
                reason: format!(
                    "schema version {} is not supported (expected {})",
                    v,
                    Self::SCHEMA_VERSION
                ),
            }),
        }
    }

    fn schema_version(&self) -> StoreResult<i32> {
        let version: Option<i32> = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?;

        Ok(version.unwrap_or(0))
    }

    fn create_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(&format!(
            "
            BEGIN;

            CREATE TABLE IF NOT EXISTS inventories (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                tags TEXT NOT NULL,
                image TEXT NOT NULL,
                is_public INTEGER NOT NULL,
                custom_id_format TEXT NOT NULL,
                fields TEXT NOT NULL,
                created_by TEXT NOT NULL,
                allowed_users TEXT NOT NULL,
                version INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                inventory_id TEXT NOT NULL,
                custom_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                fields TEXT NOT NULL,
                created_by TEXT NOT NULL,
                version INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sequences (
                inventory_id TEXT PRIMARY KEY,
                issued INTEGER NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_items_custom_id ON items(inventory_id, custom_id);
            CREATE INDEX IF NOT EXISTS idx_inventories_owner ON inventories(created_by);

            PRAGMA user_version = {};

            COMMIT;
            ",
            Self::SCHEMA_VERSION
        ))?;

        Ok(())
    }

    /// Resolves a failed conditional write into `Conflict` or `Missing`
    fn miss<T>(&self, table: &str, id: &str) -> StoreResult<VersionedWrite<T>> {
        let current: Option<i64> = self
            .conn
            .query_row(
                &format!("SELECT version FROM {} WHERE id = ?1", table),
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(match current {
            Some(v) => VersionedWrite::Conflict { current: v as u64 },
            None => VersionedWrite::Missing,
        })
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> StoreResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Fixed-width RFC 3339, so stored timestamps sort as text
fn stamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Converts an unsigned value for an INTEGER column
fn signed(column: &'static str, value: u64) -> StoreResult<i64> {
    i64::try_from(value).map_err(|_| StoreError::OutOfRange { column, value })
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// `%query%` for LIKE, with wildcards in `query` escaped by `\`
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn parse_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: T::Err| conversion_error(idx, e.to_string()))
}

fn json_col<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn time_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn unsigned_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let raw: i64 = row.get(idx)?;
    u64::try_from(raw).map_err(|e| conversion_error(idx, e))
}

fn inventory_from_row(row: &Row<'_>) -> rusqlite::Result<Inventory> {
    Ok(Inventory {
        id: parse_col(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: parse_col(row, 3)?,
        tags: json_col(row, 4)?,
        image: row.get(5)?,
        is_public: row.get(6)?,
        custom_id_format: json_col(row, 7)?,
        fields: json_col(row, 8)?,
        created_by: parse_col(row, 9)?,
        allowed_users: json_col(row, 10)?,
        version: unsigned_col(row, 11)?,
        created_at: time_col(row, 12)?,
        updated_at: time_col(row, 13)?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: parse_col(row, 0)?,
        inventory_id: parse_col(row, 1)?,
        custom_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        quantity: unsigned_col(row, 5)?,
        fields: json_col(row, 6)?,
        created_by: parse_col(row, 7)?,
        version: unsigned_col(row, 8)?,
        created_at: time_col(row, 9)?,
        updated_at: time_col(row, 10)?,
    })
}

impl CatalogStore for SqliteStore {
    fn insert_inventory(&self, inventory: &Inventory) -> StoreResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO inventories ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                INVENTORY_COLUMNS
            ),
            params![
                inventory.id.to_string(),
                inventory.title,
                inventory.description,
                inventory.category.as_str(),
                to_json(&inventory.tags)?,
                inventory.image,
                inventory.is_public,
                to_json(&inventory.custom_id_format)?,
                to_json(&inventory.fields)?,
                inventory.created_by.as_str(),
                to_json(&inventory.allowed_users)?,
                inventory.version as i64,
                stamp(&inventory.created_at),
                stamp(&inventory.updated_at),
            ],
        )?;

        Ok(())
    }

    fn find_inventory(&self, id: &InventoryId) -> StoreResult<Option<Inventory>> {
        let inventory = self
            .conn
            .query_row(
                &format!("SELECT {} FROM inventories WHERE id = ?1", INVENTORY_COLUMNS),
                params![id.to_string()],
                inventory_from_row,
            )
            .optional()?;

        Ok(inventory)
    }

    fn list_inventories(&self) -> StoreResult<Vec<Inventory>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM inventories ORDER BY created_at DESC, rowid DESC",
            INVENTORY_COLUMNS
        ))?;

        let inventories = stmt
            .query_map([], inventory_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(inventories)
    }

    fn list_inventories_owned_by(&self, owner: &UserId) -> StoreResult<Vec<Inventory>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM inventories WHERE created_by = ?1 ORDER BY created_at DESC, rowid DESC",
            INVENTORY_COLUMNS
        ))?;

        let inventories = stmt
            .query_map(params![owner.as_str()], inventory_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(inventories)
    }

    fn list_inventories_shared_with(&self, user: &UserId) -> StoreResult<Vec<Inventory>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM inventories
             WHERE created_by <> ?1
               AND (is_public = 1
                    OR EXISTS (SELECT 1 FROM json_each(inventories.allowed_users) WHERE value = ?1))
             ORDER BY created_at DESC, rowid DESC",
            INVENTORY_COLUMNS
        ))?;

        let inventories = stmt
            .query_map(params![user.as_str()], inventory_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(inventories)
    }

    fn search_inventories(&self, query: &str, limit: usize) -> StoreResult<Vec<Inventory>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM inventories
             WHERE title LIKE ?1 ESCAPE '\\'
                OR description LIKE ?1 ESCAPE '\\'
                OR EXISTS (SELECT 1 FROM json_each(inventories.tags) WHERE value LIKE ?1 ESCAPE '\\')
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
            INVENTORY_COLUMNS
        ))?;

        let inventories = stmt
            .query_map(params![like_pattern(query), sql_limit(limit)], inventory_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(inventories)
    }

    fn update_inventory_if_version_matches(
        &self,
        id: &InventoryId,
        expected: u64,
        patch: &InventoryPatch,
    ) -> StoreResult<VersionedWrite<Inventory>> {
        let tags = patch.tags.as_ref().map(to_json).transpose()?;
        let format = patch.custom_id_format.as_ref().map(to_json).transpose()?;
        let fields = patch.fields.as_ref().map(to_json).transpose()?;
        let allowed = patch.allowed_users.as_ref().map(to_json).transpose()?;

        let updated = self
            .conn
            .query_row(
                &format!(
                    "UPDATE inventories SET
                        title = COALESCE(?3, title),
                        description = COALESCE(?4, description),
                        category = COALESCE(?5, category),
                        tags = COALESCE(?6, tags),
                        image = COALESCE(?7, image),
                        is_public = COALESCE(?8, is_public),
                        custom_id_format = COALESCE(?9, custom_id_format),
                        fields = COALESCE(?10, fields),
                        allowed_users = COALESCE(?11, allowed_users),
                        version = version + 1,
                        updated_at = ?12
                     WHERE id = ?1 AND version = ?2
                     RETURNING {}",
                    INVENTORY_COLUMNS
                ),
                params![
                    id.to_string(),
                    expected as i64,
                    patch.title.as_deref(),
                    patch.description.as_deref(),
                    patch.category.map(|c| c.as_str()),
                    tags,
                    patch.image.as_deref(),
                    patch.is_public,
                    format,
                    fields,
                    allowed,
                    stamp(&Utc::now()),
                ],
                inventory_from_row,
            )
            .optional()?;

        match updated {
            Some(inventory) => Ok(VersionedWrite::Applied(inventory)),
            None => self.miss("inventories", &id.to_string()),
        }
    }

    fn delete_inventory_if_version_matches(
        &self,
        id: &InventoryId,
        expected: u64,
    ) -> StoreResult<VersionedWrite<()>> {
        let deleted = self.conn.execute(
            "DELETE FROM inventories WHERE id = ?1 AND version = ?2",
            params![id.to_string(), expected as i64],
        )?;

        if deleted == 1 {
            Ok(VersionedWrite::Applied(()))
        } else {
            self.miss("inventories", &id.to_string())
        }
    }

    fn insert_item(&self, item: &Item) -> StoreResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO items ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                ITEM_COLUMNS
            ),
            params![
                item.id.to_string(),
                item.inventory_id.to_string(),
                item.custom_id,
                item.title,
                item.description,
                signed("quantity", item.quantity)?,
                to_json(&item.fields)?,
                item.created_by.as_str(),
                item.version as i64,
                stamp(&item.created_at),
                stamp(&item.updated_at),
            ],
        )?;

        Ok(())
    }

    fn find_item(&self, id: &ItemId) -> StoreResult<Option<Item>> {
        let item = self
            .conn
            .query_row(
                &format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS),
                params![id.to_string()],
                item_from_row,
            )
            .optional()?;

        Ok(item)
    }

    fn find_item_by_custom_id(
        &self,
        inventory_id: &InventoryId,
        custom_id: &str,
    ) -> StoreResult<Option<Item>> {
        let item = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM items WHERE inventory_id = ?1 AND custom_id = ?2",
                    ITEM_COLUMNS
                ),
                params![inventory_id.to_string(), custom_id],
                item_from_row,
            )
            .optional()?;

        Ok(item)
    }

    fn count_items(&self, inventory_id: &InventoryId) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE inventory_id = ?1",
            params![inventory_id.to_string()],
            |row| row.get(0),
        )?;

        Ok(count as u64)
    }

    fn list_items(&self, inventory_id: &InventoryId) -> StoreResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM items WHERE inventory_id = ?1 ORDER BY created_at, rowid",
            ITEM_COLUMNS
        ))?;

        let items = stmt
            .query_map(params![inventory_id.to_string()], item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn search_items(
        &self,
        inventory_id: Option<&InventoryId>,
        query: &str,
        limit: usize,
    ) -> StoreResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM items
             WHERE (?1 IS NULL OR inventory_id = ?1)
               AND (title LIKE ?2 ESCAPE '\\' OR custom_id LIKE ?2 ESCAPE '\\')
             ORDER BY created_at, rowid
             LIMIT ?3",
            ITEM_COLUMNS
        ))?;

        let items = stmt
            .query_map(
                params![
                    inventory_id.map(|id| id.to_string()),
                    like_pattern(query),
                    sql_limit(limit)
                ],
                item_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn update_item_if_version_matches(
        &self,
        id: &ItemId,
        expected: u64,
        patch: &ItemPatch,
    ) -> StoreResult<VersionedWrite<Item>> {
        let fields = patch.fields.as_ref().map(to_json).transpose()?;
        let quantity = patch.quantity.map(|q| signed("quantity", q)).transpose()?;

        let updated = self
            .conn
            .query_row(
                &format!(
                    "UPDATE items SET
                        custom_id = COALESCE(?3, custom_id),
                        title = COALESCE(?4, title),
                        description = COALESCE(?5, description),
                        quantity = COALESCE(?6, quantity),
                        fields = COALESCE(?7, fields),
                        version = version + 1,
                        updated_at = ?8
                     WHERE id = ?1 AND version = ?2
                     RETURNING {}",
                    ITEM_COLUMNS
                ),
                params![
                    id.to_string(),
                    expected as i64,
                    patch.custom_id.as_deref(),
                    patch.title.as_deref(),
                    patch.description.as_deref(),
                    quantity,
                    fields,
                    stamp(&Utc::now()),
                ],
                item_from_row,
            )
            .optional()?;

        match updated {
            Some(item) => Ok(VersionedWrite::Applied(item)),
            None => self.miss("items", &id.to_string()),
        }
    }

    fn delete_item_if_version_matches(
        &self,
        id: &ItemId,
        expected: u64,
    ) -> StoreResult<VersionedWrite<()>> {
        let deleted = self.conn.execute(
            "DELETE FROM items WHERE id = ?1 AND version = ?2",
            params![id.to_string(), expected as i64],
        )?;

        if deleted == 1 {
            Ok(VersionedWrite::Applied(()))
        } else {
            self.miss("items", &id.to_string())
        }
    }

    fn reserve_sequence(&self, inventory_id: &InventoryId) -> StoreResult<u64> {
        let issued: i64 = self.conn.query_row(
            "INSERT INTO sequences (inventory_id, issued)
             VALUES (?1, (SELECT COUNT(*) FROM items WHERE inventory_id = ?1) + 1)
             ON CONFLICT(inventory_id) DO UPDATE SET issued = issued + 1
             RETURNING issued",
            params![inventory_id.to_string()],
            |row| row.get(0),
        )?;

        Ok(issued as u64)
    }
}
