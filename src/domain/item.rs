//! Item domain model
//!
//! Items belong to exactly one inventory and carry a custom identifier that
//! is unique within it. Custom field values are stored as a map from
//! [`FieldId`] to a [`FieldValue`] tagged with the field's type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ids::{FieldId, InventoryId, ItemId, UserId};
use super::inventory::{FieldType, Inventory, MAX_TITLE_LEN};

/// Largest quantity an item can hold; storage keeps it as a signed integer
pub const MAX_QUANTITY: u64 = i64::MAX as u64;

/// A loosely typed scalar as submitted by clients
///
/// Number and boolean fields keep whatever the client sent; the statistics
/// aggregator decides later what converts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Numeric reading, if the value is a finite number or a numeric string
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Scalar::Number(n) => *n,
            Scalar::Text(s) => s.trim().parse::<f64>().ok()?,
            Scalar::Bool(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Boolean reading of `true`/`false` and the exact strings `"true"`/`"false"`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            Scalar::Text(s) if s == "true" => Some(true),
            Scalar::Text(s) if s == "false" => Some(false),
            _ => None,
        }
    }

    /// Parses CLI input: numbers and booleans become typed, anything else text
    pub fn parse_loose(s: &str) -> Self {
        if let Ok(b) = s.trim().parse::<bool>() {
            return Scalar::Bool(b);
        }
        match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Scalar::Number(n),
            _ => Scalar::Text(s.to_string()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

/// A custom field value, tagged with the type of field it fills
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Textarea(String),
    Number(Scalar),
    Boolean(Scalar),
    Document(String),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Text(_) => FieldType::Text,
            FieldValue::Textarea(_) => FieldType::Textarea,
            FieldValue::Number(_) => FieldType::Number,
            FieldValue::Boolean(_) => FieldType::Boolean,
            FieldValue::Document(_) => FieldType::Document,
        }
    }

    /// Builds a value of the given field type from raw text input
    pub fn from_input(field_type: FieldType, raw: &str) -> Self {
        match field_type {
            FieldType::Text => FieldValue::Text(raw.to_string()),
            FieldType::Textarea => FieldValue::Textarea(raw.to_string()),
            FieldType::Number => FieldValue::Number(Scalar::parse_loose(raw)),
            FieldType::Boolean => FieldValue::Boolean(Scalar::parse_loose(raw)),
            FieldType::Document => FieldValue::Document(raw.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) | FieldValue::Textarea(s) | FieldValue::Document(s) => {
                f.write_str(s)
            }
            FieldValue::Number(v) | FieldValue::Boolean(v) => write!(f, "{}", v),
        }
    }
}

/// Custom field values of one item
pub type FieldValues = BTreeMap<FieldId, FieldValue>;

/// A record in an inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub inventory_id: InventoryId,
    pub custom_id: String,
    pub title: String,
    pub description: String,
    pub quantity: u64,
    pub fields: FieldValues,
    pub created_by: UserId,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Builds a fresh item at version 0 with an already chosen custom ID
    pub fn from_draft(
        draft: &NewItem,
        inventory_id: InventoryId,
        custom_id: String,
        creator: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ItemId::new(),
            inventory_id,
            custom_id,
            title: draft.title.trim().to_string(),
            description: draft.description.clone(),
            quantity: draft.quantity,
            fields: draft.fields.clone(),
            created_by: creator,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating an item; the custom ID is always generated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub quantity: u64,
    pub fields: FieldValues,
}

impl NewItem {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, id: FieldId, value: FieldValue) -> Self {
        self.fields.insert(id, value);
        self
    }
}

/// Partial update of an item; `None` leaves the stored value untouched
///
/// `fields` replaces the whole value map when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemPatch {
    pub custom_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<u64>,
    pub fields: Option<FieldValues>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Checks an item title, returning the trimmed form
pub fn validate_title(title: &str) -> Result<String, String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err("title: must not be empty".to_string());
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(format!("title: must be at most {} characters", MAX_TITLE_LEN));
    }
    Ok(trimmed.to_string())
}

/// Checks an item quantity against [`MAX_QUANTITY`]
pub fn validate_quantity(quantity: u64) -> Result<u64, String> {
    if quantity > MAX_QUANTITY {
        return Err(format!("quantity: must be at most {}", MAX_QUANTITY));
    }
    Ok(quantity)
}

/// Checks that every value refers to a field of the inventory and carries
/// that field's type
pub fn validate_values(inventory: &Inventory, values: &FieldValues) -> Result<(), String> {
    for (id, value) in values {
        let field = inventory
            .field(id)
            .ok_or_else(|| format!("fields: {} is not defined in inventory {}", id, inventory.id))?;
        if field.field_type != value.field_type() {
            return Err(format!(
                "fields: '{}' expects a {} value, got {}",
                field.title,
                field.field_type,
                value.field_type()
            ));
        }
        // JSON has no NaN or infinity
        if let FieldValue::Number(Scalar::Number(n)) | FieldValue::Boolean(Scalar::Number(n)) =
            value
        {
            if !n.is_finite() {
                return Err(format!("fields: '{}' must be a finite number", field.title));
            }
        }
    }
    Ok(())
}
