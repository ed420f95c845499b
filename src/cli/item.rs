//! Item CLI commands

use anyhow::{anyhow, Result};
use clap::Subcommand;

use super::output::Output;
use super::session::Session;
use crate::domain::{FieldValue, FieldValues, Inventory, InventoryId, Item, ItemId, ItemPatch, NewItem};

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Add an item; its custom ID is generated from the inventory's format
    ///
    /// Example:
    ///   stockroom item add inv-... "Hammer" --set Weight=1.5 --set Brand=Acme
    Add {
        /// Inventory ID
        inventory: String,

        /// Item title
        title: String,

        #[arg(long, short, default_value = "")]
        description: String,

        #[arg(long, short, default_value_t = 0)]
        quantity: u64,

        /// Field value as Title=value (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        values: Vec<String>,
    },

    /// List the items of an inventory
    List {
        /// Inventory ID
        inventory: String,
    },

    /// Show item details
    Show {
        /// Item ID, or custom ID together with --inventory
        id: String,

        /// Look the item up by custom ID in this inventory
        #[arg(long)]
        inventory: Option<String>,
    },

    /// Update an item
    Update {
        /// Item ID
        id: String,

        /// Version you last saw
        #[arg(long)]
        version: u64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        quantity: Option<u64>,

        /// Replace the custom ID
        #[arg(long)]
        custom_id: Option<String>,

        /// Set a field value as Title=value (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        values: Vec<String>,

        /// Clear a field value (repeatable)
        #[arg(long = "unset", value_name = "FIELD")]
        unset: Vec<String>,
    },

    /// Delete an item
    Delete {
        /// Item ID
        id: String,

        /// Version you last saw
        #[arg(long)]
        version: u64,
    },
}

pub fn run(cmd: ItemCommands, output: &Output, session: &Session) -> Result<()> {
    match cmd {
        ItemCommands::Add {
            inventory,
            title,
            description,
            quantity,
            values,
        } => add_item(output, session, &inventory, title, description, quantity, &values),
        ItemCommands::List { inventory } => list_items(output, session, &inventory),
        ItemCommands::Show { id, inventory } => show_item(output, session, &id, inventory.as_deref()),
        ItemCommands::Update {
            id,
            version,
            title,
            description,
            quantity,
            custom_id,
            values,
            unset,
        } => {
            let patch = ItemPatch {
                custom_id,
                title,
                description,
                quantity,
                fields: None,
            };
            update_item(output, session, &id, version, patch, &values, &unset)
        }
        ItemCommands::Delete { id, version } => delete_item(output, session, &id, version),
    }
}

/// Applies `Title=value` assignments to `values`, typed by the inventory's fields
pub fn apply_assignments(
    inventory: &Inventory,
    values: &mut FieldValues,
    assignments: &[String],
) -> Result<()> {
    for assignment in assignments {
        let (key, raw) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid value '{}'. Expected FIELD=VALUE", assignment))?;
        let field = inventory
            .find_field(key)
            .ok_or_else(|| anyhow!("Unknown field '{}' in inventory {}", key.trim(), inventory.id))?;

        values.insert(field.id, FieldValue::from_input(field.field_type, raw));
    }
    Ok(())
}

fn add_item(
    output: &Output,
    session: &Session,
    inventory: &str,
    title: String,
    description: String,
    quantity: u64,
    assignments: &[String],
) -> Result<()> {
    let inventory_id: InventoryId = inventory.parse()?;
    let catalog = session.catalog()?;
    let inventory = catalog.inventory(&inventory_id)?;

    let mut draft = NewItem {
        title,
        description,
        quantity,
        fields: FieldValues::new(),
    };
    apply_assignments(&inventory, &mut draft.fields, assignments)?;

    let item = catalog.create_item(session.actor(), &inventory_id, draft)?;

    if output.is_json() {
        output.data(&item);
    } else {
        output.success(&format!("Created item: {} ({}) - {}", item.custom_id, item.id, item.title));
    }
    Ok(())
}

fn list_items(output: &Output, session: &Session, inventory: &str) -> Result<()> {
    let inventory_id: InventoryId = inventory.parse()?;
    let items = session.catalog()?.items(&inventory_id)?;

    if output.is_json() {
        output.data(&items);
        return Ok(());
    }

    if items.is_empty() {
        output.success("No items found");
        return Ok(());
    }

    print_item_rows(output, &items);
    Ok(())
}

pub(crate) fn print_item_rows(output: &Output, items: &[Item]) {
    for item in items {
        let version = format!("v{}", item.version);
        let quantity = format!("x{}", item.quantity);
        output.row(&[&item.custom_id, &item.id.to_string(), &version, &quantity, &item.title]);
    }
}

fn show_item(output: &Output, session: &Session, id: &str, inventory: Option<&str>) -> Result<()> {
    let catalog = session.catalog()?;
    let item = match inventory {
        Some(inventory) => {
            let inventory_id: InventoryId = inventory.parse()?;
            catalog.item_by_custom_id(&inventory_id, id)?
        }
        None => catalog.item(&id.parse::<ItemId>()?)?,
    };

    if output.is_json() {
        output.data(&item);
        return Ok(());
    }

    let inventory = catalog.inventory(&item.inventory_id).ok();
    print_item(output, &item, inventory.as_ref());
    Ok(())
}

fn print_item(output: &Output, item: &Item, inventory: Option<&Inventory>) {
    output.line(&format!("{} - {}", item.custom_id, item.title));
    output.line(&format!("ID:        {}", item.id));
    output.line(&format!("Inventory: {}", item.inventory_id));
    output.line(&format!("Version:   {}", item.version));
    output.line(&format!("Quantity:  {}", item.quantity));
    output.line(&format!("Created:   {} by {}", item.created_at.format("%Y-%m-%d %H:%M"), item.created_by));
    if !item.description.is_empty() {
        output.blank();
        output.line(&item.description);
    }

    if item.fields.is_empty() {
        return;
    }
    output.blank();
    for (id, value) in &item.fields {
        let title = inventory
            .and_then(|inv| inv.field(id))
            .map(|f| f.title.clone())
            .unwrap_or_else(|| id.to_string());
        output.line(&format!("  {}: {}", title, value));
    }
}

fn update_item(
    output: &Output,
    session: &Session,
    id: &str,
    version: u64,
    mut patch: ItemPatch,
    assignments: &[String],
    unset: &[String],
) -> Result<()> {
    let id: ItemId = id.parse()?;
    let catalog = session.catalog()?;

    if !assignments.is_empty() || !unset.is_empty() {
        let item = catalog.item(&id)?;
        let inventory = catalog.inventory(&item.inventory_id)?;

        let mut values = item.fields;
        apply_assignments(&inventory, &mut values, assignments)?;
        for key in unset {
            let field = inventory
                .find_field(key)
                .ok_or_else(|| anyhow!("Unknown field '{}' in inventory {}", key, inventory.id))?;
            values.remove(&field.id);
        }
        patch.fields = Some(values);
    }

    let item = catalog.update_item(session.actor(), &id, version, patch)?;

    if output.is_json() {
        output.data(&item);
    } else {
        output.success(&format!("Updated item: {} (version {})", item.custom_id, item.version));
    }
    Ok(())
}

fn delete_item(output: &Output, session: &Session, id: &str, version: u64) -> Result<()> {
    let id: ItemId = id.parse()?;
    session.catalog()?.delete_item(session.actor(), &id, version)?;

    output.success(&format!("Deleted item: {}", id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldDefinition, FieldType, NewInventory, Scalar, UserId};

    fn inventory() -> Inventory {
        let mut draft = NewInventory::titled("Tools");
        draft.fields = vec![
            FieldDefinition::new("Weight", FieldType::Number, 0),
            FieldDefinition::new("In stock", FieldType::Boolean, 1),
        ];
        Inventory::from_draft(draft, UserId::new("alice").unwrap())
    }

    #[test]
    fn assignments_are_typed_by_field() {
        let inv = inventory();
        let mut values = FieldValues::new();

        apply_assignments(
            &inv,
            &mut values,
            &["weight=2.5".to_string(), "In stock=true".to_string()],
        )
        .unwrap();

        assert_eq!(
            values[&inv.fields[0].id],
            FieldValue::Number(Scalar::Number(2.5))
        );
        assert_eq!(values[&inv.fields[1].id], FieldValue::Boolean(Scalar::Bool(true)));
    }

    #[test]
    fn bad_assignments_are_rejected() {
        let inv = inventory();
        let mut values = FieldValues::new();

        assert!(apply_assignments(&inv, &mut values, &["Weight".to_string()]).is_err());
        assert!(apply_assignments(&inv, &mut values, &["Color=red".to_string()]).is_err());
        assert!(values.is_empty());
    }
}
