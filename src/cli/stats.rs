//! Statistics command

use anyhow::Result;

use super::output::Output;
use super::session::Session;
use crate::domain::{InventoryId, InventoryStats, UserOverview};

pub fn run(output: &Output, session: &Session, inventory: &str) -> Result<()> {
    let inventory_id: InventoryId = inventory.parse()?;
    let stats = session.catalog()?.statistics(session.actor(), &inventory_id)?;

    if output.is_json() {
        output.data(&stats);
    } else {
        print_stats(output, &stats);
    }
    Ok(())
}

/// Statistics of every inventory the acting user owns
pub fn overview(output: &Output, session: &Session) -> Result<()> {
    let overview = session.catalog()?.overview(&session.actor().id)?;

    if output.is_json() {
        output.data(&overview);
    } else {
        print_overview(output, &overview);
    }
    Ok(())
}

fn print_overview(output: &Output, overview: &UserOverview) {
    if overview.inventories.is_empty() {
        output.success("You do not own any inventories");
        return;
    }

    output.line(&format!(
        "{} items in {} inventories",
        overview.total_items,
        overview.inventories.len()
    ));
    for entry in &overview.inventories {
        output.blank();
        output.line(&format!("== {} ({}) ==", entry.title, entry.inventory_id));
        print_stats(output, &entry.stats);
    }
}

fn print_stats(output: &Output, stats: &InventoryStats) {
    output.line(&format!("Items: {}", stats.total_items));
    if let (Some(oldest), Some(newest)) = (stats.created_dates.oldest, stats.created_dates.newest) {
        output.line(&format!(
            "Created: {} .. {}",
            oldest.format("%Y-%m-%d"),
            newest.format("%Y-%m-%d")
        ));
    }
    if let Some(updated) = stats.last_updated {
        output.line(&format!("Last updated: {}", updated.format("%Y-%m-%d %H:%M")));
    }

    let fields = &stats.field_stats;
    for summary in fields.number.values() {
        let s = &summary.stats;
        output.blank();
        output.line(&format!("{} (number, {} values)", summary.field, s.count));
        output.line(&format!(
            "  avg {}  min {}  max {}  sum {}",
            s.average, s.min, s.max, s.sum
        ));
    }

    for summary in fields.text.values().chain(fields.textarea.values()) {
        let s = &summary.stats;
        output.blank();
        output.line(&format!(
            "{} (text, {} values, {} unique)",
            summary.field, s.count, s.unique_count
        ));
        for top in &s.top_values {
            output.line(&format!("  {:>4}  {}", top.count, top.value));
        }
    }

    for summary in fields.boolean.values() {
        let s = &summary.stats;
        output.blank();
        output.line(&format!("{} (boolean, {} values)", summary.field, s.count));
        output.line(&format!(
            "  true {} ({}%)  false {} ({}%)",
            s.true_count, s.true_percentage, s.false_count, s.false_percentage
        ));
    }
}
