//! Inventory CLI commands

use anyhow::{bail, Result};
use clap::Subcommand;

use super::output::Output;
use super::session::Session;
use crate::domain::{
    ordered, Category, CustomIdElement, ElementKind, FieldDefinition, FieldType, Inventory,
    InventoryId, InventoryPatch, NewInventory, UserId,
};

#[derive(Subcommand)]
pub enum InventoryCommands {
    /// Create an inventory
    ///
    /// Examples:
    ///   stockroom inventory create "Tools" --id fixed:T- --id sequence:4
    ///   stockroom inventory create "Books" --field number:Pages --field text:Author
    Create {
        /// Inventory title
        title: String,

        /// Description
        #[arg(long, short, default_value = "")]
        description: String,

        /// Category (equipment, furniture, book, document, other)
        #[arg(long, short)]
        category: Option<Category>,

        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Let any user add and edit items
        #[arg(long)]
        public: bool,

        /// Custom ID element as type[:value] (repeatable, in order)
        #[arg(long = "id", value_name = "ELEMENT")]
        elements: Vec<String>,

        /// Custom field as type:Title (repeatable)
        #[arg(long = "field", value_name = "FIELD")]
        fields: Vec<String>,
    },

    /// List inventories
    List {
        /// Only inventories you created
        #[arg(long, conflicts_with = "shared")]
        mine: bool,

        /// Only inventories shared with you or public ones you do not own
        #[arg(long)]
        shared: bool,
    },

    /// Show inventory details
    Show {
        /// Inventory ID
        id: String,
    },

    /// Update inventory metadata
    Update {
        /// Inventory ID
        id: String,

        /// Version you last saw
        #[arg(long)]
        version: u64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        category: Option<Category>,

        /// Replace tags (repeatable)
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,

        #[arg(long)]
        image: Option<String>,

        /// Make the inventory public or private
        #[arg(long)]
        public: Option<bool>,
    },

    /// Replace the custom ID format
    ///
    /// Elements are type[:value], e.g. fixed:INV- random32 sequence:4.
    /// No elements resets to the default format.
    IdFormat {
        /// Inventory ID
        id: String,

        /// Version you last saw
        #[arg(long)]
        version: u64,

        /// Elements in order
        elements: Vec<String>,
    },

    /// Add a custom field
    AddField {
        /// Inventory ID
        id: String,

        /// Field as type:Title (text, textarea, number, boolean, document)
        field: String,

        /// Version you last saw
        #[arg(long)]
        version: u64,

        /// Field description
        #[arg(long, default_value = "")]
        description: String,

        /// Hide the field from table views
        #[arg(long)]
        hidden: bool,
    },

    /// Give a user write access
    Share {
        /// Inventory ID
        id: String,

        /// User to add
        user: String,

        /// Version you last saw
        #[arg(long)]
        version: u64,
    },

    /// Take write access away from a user
    Unshare {
        /// Inventory ID
        id: String,

        /// User to remove
        user: String,

        /// Version you last saw
        #[arg(long)]
        version: u64,
    },

    /// Delete an inventory
    Delete {
        /// Inventory ID
        id: String,

        /// Version you last saw
        #[arg(long)]
        version: u64,
    },

    /// Show what the next custom ID could look like
    PreviewId {
        /// Inventory ID
        id: String,
    },
}

pub fn run(cmd: InventoryCommands, output: &Output, session: &Session) -> Result<()> {
    match cmd {
        InventoryCommands::Create {
            title,
            description,
            category,
            tags,
            public,
            elements,
            fields,
        } => {
            let draft = NewInventory {
                title,
                description,
                category: category.unwrap_or_default(),
                tags,
                image: String::new(),
                is_public: public,
                custom_id_format: parse_elements(&elements)?,
                fields: parse_fields(&fields)?,
            };
            create_inventory(output, session, draft)
        }
        InventoryCommands::List { mine, shared } => list_inventories(output, session, mine, shared),
        InventoryCommands::Show { id } => show_inventory(output, session, &id),
        InventoryCommands::Update {
            id,
            version,
            title,
            description,
            category,
            tags,
            image,
            public,
        } => {
            let patch = InventoryPatch {
                title,
                description,
                category,
                tags,
                image,
                is_public: public,
                ..Default::default()
            };
            update_inventory(output, session, &id, version, patch)
        }
        InventoryCommands::IdFormat {
            id,
            version,
            elements,
        } => set_format(output, session, &id, version, &elements),
        InventoryCommands::AddField {
            id,
            field,
            version,
            description,
            hidden,
        } => {
            let mut field = parse_field(&field, 0)?;
            field.description = description;
            field.show_in_table_view = !hidden;
            add_field(output, session, &id, version, field)
        }
        InventoryCommands::Share { id, user, version } => {
            share(output, session, &id, &user, version, true)
        }
        InventoryCommands::Unshare { id, user, version } => {
            share(output, session, &id, &user, version, false)
        }
        InventoryCommands::Delete { id, version } => delete_inventory(output, session, &id, version),
        InventoryCommands::PreviewId { id } => preview_id(output, session, &id),
    }
}

/// Parses one `type[:value]` element argument
pub fn parse_element(arg: &str, order: i64) -> Result<CustomIdElement> {
    let (kind, value) = match arg.split_once(':') {
        Some((kind, value)) => (kind, value),
        None => (arg, ""),
    };

    let kind = ElementKind::parse(kind);
    if kind.is_unknown() {
        let known: Vec<String> = ElementKind::ALL.iter().map(ToString::to_string).collect();
        bail!(
            "Unknown element type in '{}'. Expected one of: {}",
            arg,
            known.join(", ")
        );
    }

    let mut element = CustomIdElement::new(kind, order);
    if element.kind == ElementKind::Fixed {
        element.value = value.to_string();
    } else {
        element.format = value.to_string();
    }

    Ok(element)
}

fn parse_elements(args: &[String]) -> Result<Vec<CustomIdElement>> {
    args
        .iter()
        .enumerate()
        .map(|(idx, arg)| parse_element(arg, idx as i64))
        .collect()
}

/// Parses one `type:Title` field argument
pub fn parse_field(arg: &str, order: i64) -> Result<FieldDefinition> {
    let Some((field_type, title)) = arg.split_once(':') else {
        bail!("Invalid field '{}'. Expected type:Title, e.g. number:Weight", arg);
    };
    let field_type: FieldType = field_type.parse().map_err(anyhow::Error::msg)?;

    Ok(FieldDefinition::new(title, field_type, order))
}

fn parse_fields(args: &[String]) -> Result<Vec<FieldDefinition>> {
    args
        .iter()
        .enumerate()
        .map(|(idx, arg)| parse_field(arg, idx as i64))
        .collect()
}

fn format_summary(elements: &[CustomIdElement]) -> String {
    if elements.is_empty() {
        return "(default) fixed:ITEM- random32".to_string();
    }
    ordered(elements)
        .into_iter()
        .map(|el| match el.kind {
            ElementKind::Fixed => format!("fixed:{}", el.value),
            _ if el.format.is_empty() => el.kind.to_string(),
            _ => format!("{}:{}", el.kind, el.format),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_inventory(output: &Output, inventory: &Inventory) {
    if output.is_json() {
        output.data(inventory);
        return;
    }

    output.line(&format!("{} - {}", inventory.id, inventory.title));
    output.line(&format!("Version:   {}", inventory.version));
    output.line(&format!("Owner:     {}", inventory.created_by));
    output.line(&format!("Category:  {}", inventory.category));
    output.line(&format!("Public:    {}", inventory.is_public));
    if !inventory.tags.is_empty() {
        output.line(&format!("Tags:      {}", inventory.tags.join(", ")));
    }
    if !inventory.allowed_users.is_empty() {
        let users: Vec<_> = inventory.allowed_users.iter().map(|u| u.as_str()).collect();
        output.line(&format!("Shared:    {}", users.join(", ")));
    }
    output.line(&format!("ID format: {}", format_summary(&inventory.custom_id_format)));
    if !inventory.description.is_empty() {
        output.blank();
        output.line(&inventory.description);
    }

    if !inventory.fields.is_empty() {
        output.blank();
        output.line("Fields:");
        for field in inventory.ordered_fields() {
            let hidden = if field.show_in_table_view { "" } else { " (hidden)" };
            output.line(&format!("  {} [{}] {}{}", field.title, field.field_type, field.id, hidden));
        }
    }
}

fn create_inventory(output: &Output, session: &Session, draft: NewInventory) -> Result<()> {
    let catalog = session.catalog()?;
    let inventory = catalog.create_inventory(session.actor(), draft)?;

    if output.is_json() {
        output.data(&inventory);
    } else {
        output.success(&format!("Created inventory: {} - {}", inventory.id, inventory.title));
    }
    Ok(())
}

fn list_inventories(output: &Output, session: &Session, mine: bool, shared: bool) -> Result<()> {
    let catalog = session.catalog()?;
    let user = &session.actor().id;
    let inventories = if mine {
        catalog.inventories_owned_by(user)?
    } else if shared {
        catalog.inventories_shared_with(user)?
    } else {
        catalog.inventories()?
    };

    if output.is_json() {
        output.data(&inventories);
        return Ok(());
    }

    if inventories.is_empty() {
        output.success("No inventories found");
        return Ok(());
    }

    print_inventory_rows(output, &inventories);
    Ok(())
}

pub(crate) fn print_inventory_rows(output: &Output, inventories: &[Inventory]) {
    for inventory in inventories {
        let version = format!("v{}", inventory.version);
        output.row(&[
            &inventory.id.to_string(),
            &version,
            inventory.created_by.as_str(),
            &inventory.title,
        ]);
    }
}

fn show_inventory(output: &Output, session: &Session, id: &str) -> Result<()> {
    let id: InventoryId = id.parse()?;
    let inventory = session.catalog()?.inventory(&id)?;

    print_inventory(output, &inventory);
    Ok(())
}

fn update_inventory(
    output: &Output,
    session: &Session,
    id: &str,
    version: u64,
    patch: InventoryPatch,
) -> Result<()> {
    let id: InventoryId = id.parse()?;
    let inventory = session
        .catalog()?
        .update_inventory(session.actor(), &id, version, patch)?;

    updated(output, &inventory);
    Ok(())
}

fn set_format(
    output: &Output,
    session: &Session,
    id: &str,
    version: u64,
    elements: &[String],
) -> Result<()> {
    let id: InventoryId = id.parse()?;
    let format = parse_elements(elements)?;
    let inventory = session
        .catalog()?
        .set_custom_id_format(session.actor(), &id, version, format)?;

    updated(output, &inventory);
    Ok(())
}

fn add_field(
    output: &Output,
    session: &Session,
    id: &str,
    version: u64,
    mut field: FieldDefinition,
) -> Result<()> {
    let id: InventoryId = id.parse()?;
    let catalog = session.catalog()?;

    // Append after the existing fields
    let current = catalog.inventory(&id)?;
    field.order = current.fields.iter().map(|f| f.order + 1).max().unwrap_or(0);

    let inventory = catalog.add_field(session.actor(), &id, version, field)?;
    updated(output, &inventory);
    Ok(())
}

fn share(
    output: &Output,
    session: &Session,
    id: &str,
    user: &str,
    version: u64,
    grant: bool,
) -> Result<()> {
    let id: InventoryId = id.parse()?;
    let user = UserId::new(user)?;
    let catalog = session.catalog()?;

    let inventory = if grant {
        catalog.grant_access(session.actor(), &id, version, user)?
    } else {
        catalog.revoke_access(session.actor(), &id, version, &user)?
    };

    updated(output, &inventory);
    Ok(())
}

fn delete_inventory(output: &Output, session: &Session, id: &str, version: u64) -> Result<()> {
    let id: InventoryId = id.parse()?;
    session
        .catalog()?
        .delete_inventory(session.actor(), &id, version)?;

    output.success(&format!("Deleted inventory: {}", id));
    Ok(())
}

fn preview_id(output: &Output, session: &Session, id: &str) -> Result<()> {
    let id: InventoryId = id.parse()?;
    let preview = session.catalog()?.preview_custom_id(&id)?;

    if output.is_json() {
        output.data(&serde_json::json!({ "inventoryId": id, "preview": preview }));
    } else {
        output.line(&preview);
    }
    Ok(())
}

fn updated(output: &Output, inventory: &Inventory) {
    if output.is_json() {
        output.data(inventory);
    } else {
        output.success(&format!(
            "Updated inventory: {} (version {})",
            inventory.id, inventory.version
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_arguments() {
        let fixed = parse_element("fixed:INV-", 0).unwrap();
        assert_eq!(fixed.kind, ElementKind::Fixed);
        assert_eq!(fixed.value, "INV-");

        // only the first colon separates type and value
        let fixed = parse_element("fixed:A:B", 0).unwrap();
        assert_eq!(fixed.value, "A:B");

        let seq = parse_element("SEQUENCE:4", 3).unwrap();
        assert_eq!(seq.kind, ElementKind::Sequence);
        assert_eq!(seq.pad_width(), Some(4));
        assert_eq!(seq.order, 3);

        let random = parse_element("random32", 1).unwrap();
        assert_eq!(random.kind, ElementKind::Random32);
        assert!(random.format.is_empty());

        assert!(parse_element("nonsense", 0).is_err());
    }

    #[test]
    fn field_arguments() {
        let field = parse_field("number: Weight", 2).unwrap();
        assert_eq!(field.field_type, FieldType::Number);
        assert_eq!(field.title, "Weight");
        assert_eq!(field.order, 2);

        assert!(parse_field("Weight", 0).is_err());
        assert!(parse_field("color:Weight", 0).is_err());
    }

    #[test]
    fn summary_lists_elements_in_order() {
        let elements = vec![
            CustomIdElement::sequence(Some(4), 1),
            CustomIdElement::fixed("T-", 0),
        ];
        assert_eq!(format_summary(&elements), "fixed:T- sequence:4");
        assert!(format_summary(&[]).starts_with("(default)"));
    }
}
