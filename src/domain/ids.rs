//! Record identifiers
//!
//! ID Format:
//! - Inventory IDs: `inv-{uuid}` (e.g., `inv-5f0c6f1e-...`)
//! - Item IDs: `itm-{uuid}`
//! - Field IDs: `fld-{uuid}`
//! - User IDs: opaque, non-empty strings supplied by the auth layer
//!
//! The prefix makes IDs self-describing on the command line; the UUID is
//! random (v4) so IDs never leak creation order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid inventory ID format: expected 'inv-{{uuid}}', got '{0}'")]
    InvalidInventoryId(String),

    #[error("Invalid item ID format: expected 'itm-{{uuid}}', got '{0}'")]
    InvalidItemId(String),

    #[error("Invalid field ID format: expected 'fld-{{uuid}}', got '{0}'")]
    InvalidFieldId(String),

    #[error("User ID must not be empty")]
    EmptyUserId,
}

/// Parses `{prefix}-{uuid}`, also accepting a bare UUID
fn parse_prefixed(s: &str, prefix: &str) -> Option<Uuid> {
    let s = s.trim();
    let raw = s
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or(s);
    Uuid::parse_str(raw).ok()
}

macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal, $err:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the underlying UUID
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_prefixed(s, $prefix)
                    .map(Self)
                    .ok_or_else(|| IdError::$err(s.to_string()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }
    };
}

prefixed_id!(
    /// Inventory ID in the format `inv-{uuid}`
    InventoryId,
    "inv",
    InvalidInventoryId
);

prefixed_id!(
    /// Item ID in the format `itm-{uuid}`
    ItemId,
    "itm",
    InvalidItemId
);

prefixed_id!(
    /// Field definition ID in the format `fld-{uuid}`
    ///
    /// Item values are keyed by this ID, so renaming a field keeps its data.
    FieldId,
    "fld",
    InvalidFieldId
);

/// Identity of a user as issued by the surrounding auth layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(IdError::EmptyUserId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}
