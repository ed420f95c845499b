//! Inventory domain model
//!
//! An inventory is a user-defined schema: it embeds the custom ID format
//! and the field definitions its items are filled in against. Items live
//! outside the inventory and reference it by [`InventoryId`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::access::AccessScope;
use super::element::{CustomIdElement, ElementKind, MAX_PAD_WIDTH};
use super::ids::{FieldId, InventoryId, UserId};

/// Longest accepted inventory title, in characters
pub const MAX_TITLE_LEN: usize = 100;

/// Broad inventory category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    Equipment,
    Furniture,
    Book,
    Document,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Equipment => "Equipment",
            Category::Furniture => "Furniture",
            Category::Book => "Book",
            Category::Document => "Document",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equipment" => Ok(Category::Equipment),
            "furniture" => Ok(Category::Furniture),
            "book" => Ok(Category::Book),
            "document" => Ok(Category::Document),
            "other" => Ok(Category::Other),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

/// Value type of a custom field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Boolean,
    Document,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Document => "document",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(FieldType::Text),
            "textarea" => Ok(FieldType::Textarea),
            "number" => Ok(FieldType::Number),
            "boolean" | "bool" => Ok(FieldType::Boolean),
            "document" => Ok(FieldType::Document),
            _ => Err(format!("Invalid field type: {}", s)),
        }
    }
}

/// A user-defined typed attribute of an inventory's items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: FieldId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default = "default_true")]
    pub show_in_table_view: bool,
    #[serde(default)]
    pub order: i64,
}

fn default_true() -> bool {
    true
}

impl FieldDefinition {
    pub fn new(title: impl Into<String>, field_type: FieldType, order: i64) -> Self {
        Self {
            id: FieldId::new(),
            title: title.into().trim().to_string(),
            description: String::new(),
            field_type,
            show_in_table_view: true,
            order,
        }
    }
}

/// A user-defined collection of items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub id: InventoryId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub image: String,
    pub is_public: bool,
    pub custom_id_format: Vec<CustomIdElement>,
    pub fields: Vec<FieldDefinition>,
    pub created_by: UserId,
    pub allowed_users: Vec<UserId>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    /// Builds a fresh inventory at version 0 from a draft
    pub fn from_draft(draft: NewInventory, owner: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: InventoryId::new(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            category: draft.category,
            tags: draft.tags,
            image: draft.image,
            is_public: draft.is_public,
            custom_id_format: draft.custom_id_format,
            fields: draft.fields,
            created_by: owner,
            allowed_users: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Ownership and sharing data used by authorization checks
    pub fn access(&self) -> AccessScope<'_> {
        AccessScope {
            owner: &self.created_by,
            is_public: self.is_public,
            allowed_users: &self.allowed_users,
        }
    }

    /// Looks up a field by ID
    pub fn field(&self, id: &FieldId) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| &f.id == id)
    }

    /// Looks up a field by ID or (case-insensitive) title
    pub fn find_field(&self, key: &str) -> Option<&FieldDefinition> {
        if let Ok(id) = key.parse::<FieldId>() {
            return self.field(&id);
        }
        let key = key.trim();
        self.fields
            .iter()
            .find(|f| f.title.eq_ignore_ascii_case(key))
    }

    /// Field definitions in display order (stable on ties)
    pub fn ordered_fields(&self) -> Vec<&FieldDefinition> {
        let mut fields: Vec<_> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.order);
        fields
    }
}

/// Input for creating an inventory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewInventory {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub image: String,
    pub is_public: bool,
    pub custom_id_format: Vec<CustomIdElement>,
    pub fields: Vec<FieldDefinition>,
}

impl NewInventory {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update of an inventory; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InventoryPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
    pub is_public: Option<bool>,
    pub custom_id_format: Option<Vec<CustomIdElement>>,
    pub fields: Option<Vec<FieldDefinition>>,
    pub allowed_users: Option<Vec<UserId>>,
}

impl InventoryPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns true if the patch changes who may access the inventory
    pub fn touches_sharing(&self) -> bool {
        self.allowed_users.is_some()
    }
}

/// Checks an inventory title, returning the trimmed form
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

/// Checks a custom ID format for malformed elements
pub fn validate_format(elements: &[CustomIdElement]) -> Result<(), String> {
    for (idx, el) in elements.iter().enumerate() {
        if el.kind != ElementKind::Sequence || el.format.trim().is_empty() {
            continue;
        }
        match el.requested_width() {
            None => {
                return Err(format!(
                    "customIdFormat[{}]: sequence format must be a number, got '{}'",
                    idx, el.format
                ))
            }
            Some(width) if width > MAX_PAD_WIDTH as u64 => {
                return Err(format!(
                    "customIdFormat[{}]: sequence width must be at most {}, got {}",
                    idx, MAX_PAD_WIDTH, width
                ))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Checks field definitions for empty titles and duplicate IDs
pub fn validate_fields(fields: &[FieldDefinition]) -> Result<(), String> {
    for (idx, field) in fields.iter().enumerate() {
        if field.title.trim().is_empty() {
            return Err(format!("fields[{}]: title must not be empty", idx));
        }
        if fields[..idx].iter().any(|f| f.id == field.id) {
            return Err(format!("fields[{}]: duplicate field id {}", idx, field.id));
        }
    }
    Ok(())
}
