//! Search command

use anyhow::Result;

use super::inventory::print_inventory_rows;
use super::item::print_item_rows;
use super::output::Output;
use super::session::Session;
use crate::catalog::SearchResults;
use crate::domain::InventoryId;

pub fn run(
    output: &Output,
    session: &Session,
    query: &str,
    inventory: Option<&str>,
    limit: usize,
) -> Result<()> {
    let catalog = session.catalog()?;
    let results = match inventory {
        Some(inventory) => {
            let inventory_id: InventoryId = inventory.parse()?;
            SearchResults {
                inventories: Vec::new(),
                items: catalog.search_items(&inventory_id, query, limit)?,
            }
        }
        None => catalog.search(query, limit)?,
    };

    if output.is_json() {
        output.data(&results);
        return Ok(());
    }

    if results.is_empty() {
        output.success(&format!("Nothing matches '{}'", query.trim()));
        return Ok(());
    }

    if !results.inventories.is_empty() {
        output.line("Inventories:");
        print_inventory_rows(output, &results.inventories);
    }
    if !results.items.is_empty() {
        if !results.inventories.is_empty() {
            output.blank();
        }
        output.line("Items:");
        print_item_rows(output, &results.items);
    }
    Ok(())
}
