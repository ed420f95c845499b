//! Errors reported by catalog operations

use std::fmt;

use thiserror::Error;

use crate::domain::{InventoryId, UserId};
use crate::storage::StoreError;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Which kind of record an error is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Inventory,
    Item,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Inventory => f.write_str("inventory"),
            RecordKind::Item => f.write_str("item"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("{actor} is not allowed to modify {kind} {id}")]
    AccessDenied {
        kind: RecordKind,
        id: String,
        actor: UserId,
    },

    #[error("Version conflict on {kind} {id}: expected version {expected}, current is {current}")]
    VersionConflict {
        kind: RecordKind,
        id: String,
        expected: u64,
        current: u64,
    },

    #[error("Custom ID '{custom_id}' already exists in inventory {inventory_id}")]
    DuplicateIdentifier {
        inventory_id: InventoryId,
        custom_id: String,
    },

    #[error("Could not generate a unique custom ID for inventory {inventory_id}: {reason}")]
    GenerationFailure {
        inventory_id: InventoryId,
        reason: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl CatalogError {
    pub(crate) fn not_found(kind: RecordKind, id: impl fmt::Display) -> Self {
        CatalogError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Returns true if the same call may succeed when retried later
    pub fn is_transient(&self) -> bool {
        matches!(self, CatalogError::Storage(e) if e.is_transient())
    }

    /// Returns true if the caller can fix the request (re-read, change input,
    /// change format); false for faults on the catalog's side
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            CatalogError::NotFound { .. }
                | CatalogError::AccessDenied { .. }
                | CatalogError::VersionConflict { .. }
                | CatalogError::DuplicateIdentifier { .. }
                | CatalogError::Validation(_)
        )
    }

    /// The stored version, if this is a version conflict
    pub fn current_version(&self) -> Option<u64> {
        match self {
            CatalogError::VersionConflict { current, .. } => Some(*current),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let busy = CatalogError::from(StoreError::Busy("database is locked".into()));
        assert!(busy.is_transient());
        assert!(!busy.is_caller_error());

        let conflict = CatalogError::VersionConflict {
            kind: RecordKind::Item,
            id: "itm-1".into(),
            expected: 1,
            current: 2,
        };
        assert!(conflict.is_caller_error());
        assert!(!conflict.is_transient());
        assert_eq!(conflict.current_version(), Some(2));

        let failure = CatalogError::GenerationFailure {
            inventory_id: InventoryId::new(),
            reason: "exhausted".into(),
        };
        assert!(!failure.is_caller_error());
    }

    #[test]
    fn messages() {
        let err = CatalogError::not_found(RecordKind::Inventory, "inv-x");
        assert_eq!(err.to_string(), "inventory not found: inv-x");
    }
}
