//! Version guard
//!
//! The compare-and-swap itself happens in the store. This module turns its
//! outcome into the catalog's errors.

use std::fmt::Display;

use super::error::{CatalogError, CatalogResult, RecordKind};
use crate::storage::VersionedWrite;

/// Resolves the outcome of a version-conditional write
pub(crate) fn settle<T>(
    outcome: VersionedWrite<T>,
    kind: RecordKind,
    id: impl Display,
    expected: u64,
) -> CatalogResult<T> {
    match outcome {
        VersionedWrite::Applied(value) => Ok(value),
        VersionedWrite::Conflict { current } => {
            tracing::debug!(%kind, %id, expected, current, "version conflict");
            Err(CatalogError::VersionConflict {
                kind,
                id: id.to_string(),
                expected,
                current,
            })
        }
        // Deleted between our read and the write
        VersionedWrite::Missing => Err(CatalogError::not_found(kind, id)),
    }
}
