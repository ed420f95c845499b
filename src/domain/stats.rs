//! Field statistics
//!
//! Aggregates the custom field values of an inventory's items into
//! per-field distributions. Every call is a full scan over
//! `items × fields` and nothing is cached between calls, so the cost grows
//! linearly with the inventory. That is fine for catalogs of a few
//! thousand items; larger inventories would need incrementally maintained
//! aggregates.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::ids::{FieldId, InventoryId};
use super::inventory::{FieldDefinition, FieldType, Inventory};
use super::item::{FieldValue, Item, Scalar};

/// Number of most frequent values reported for text fields
pub const TOP_VALUES: usize = 5;

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericStats {
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
}

impl NumericStats {
    /// Values that do not convert to a finite number are skipped
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a Scalar>) -> Self {
        let numbers: Vec<f64> = values.into_iter().filter_map(Scalar::as_number).collect();
        if numbers.is_empty() {
            return Self::default();
        }

        let sum: f64 = numbers.iter().sum();
        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            count: numbers.len(),
            average: round_to(sum / numbers.len() as f64, 2),
            min: round_to(min, 2),
            max: round_to(max, 2),
            sum: round_to(sum, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStats {
    /// Sum of all frequencies, not only the top values
    pub count: usize,
    pub top_values: Vec<ValueCount>,
    pub unique_count: usize,
}

impl TextStats {
    /// Blank values are skipped; ties keep first-seen order
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut frequencies: Vec<ValueCount> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for value in values {
            let key = value.trim();
            if key.is_empty() {
                continue;
            }
            match index.get(key) {
                Some(&pos) => frequencies[pos].count += 1,
                None => {
                    index.insert(key, frequencies.len());
                    frequencies.push(ValueCount {
                        value: key.to_string(),
                        count: 1,
                    });
                }
            }
        }

        let count = frequencies.iter().map(|v| v.count).sum();
        let unique_count = frequencies.len();

        // stable: equal counts stay in first-seen order
        frequencies.sort_by(|a, b| b.count.cmp(&a.count));
        frequencies.truncate(TOP_VALUES);

        Self {
            count,
            top_values: frequencies,
            unique_count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanStats {
    pub count: usize,
    pub true_count: usize,
    pub false_count: usize,
    pub true_percentage: f64,
    pub false_percentage: f64,
}

impl BooleanStats {
    /// Non-boolean values are skipped
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a Scalar>) -> Self {
        let (mut true_count, mut false_count) = (0usize, 0usize);
        for value in values {
            match value.as_bool() {
                Some(true) => true_count += 1,
                Some(false) => false_count += 1,
                None => {}
            }
        }

        let count = true_count + false_count;
        if count == 0 {
            return Self::default();
        }

        let pct = |n: usize| round_to(n as f64 / count as f64 * 100.0, 1);
        Self {
            count,
            true_count,
            false_count,
            true_percentage: pct(true_count),
            false_percentage: pct(false_count),
        }
    }
}

/// Statistics of one field, with its title for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary<T> {
    pub field: String,
    #[serde(flatten)]
    pub stats: T,
}

/// Per-field statistics grouped by field type and keyed by field ID
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldStatsReport {
    pub text: BTreeMap<FieldId, FieldSummary<TextStats>>,
    pub textarea: BTreeMap<FieldId, FieldSummary<TextStats>>,
    pub number: BTreeMap<FieldId, FieldSummary<NumericStats>>,
    pub boolean: BTreeMap<FieldId, FieldSummary<BooleanStats>>,
}

impl FieldStatsReport {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.textarea.is_empty()
            && self.number.is_empty()
            && self.boolean.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreatedRange {
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

/// Statistics of a whole inventory
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_items: usize,
    pub created_dates: CreatedRange,
    pub last_updated: Option<DateTime<Utc>>,
    pub field_stats: FieldStatsReport,
}

/// One inventory's statistics inside a [`UserOverview`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryOverview {
    pub inventory_id: InventoryId,
    pub title: String,
    #[serde(flatten)]
    pub stats: InventoryStats,
}

/// Statistics across every inventory a user owns
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOverview {
    pub total_items: usize,
    pub inventories: Vec<InventoryOverview>,
}

impl UserOverview {
    pub fn push(&mut self, inventory: &Inventory, items: &[Item]) {
        let stats = aggregate(inventory, items);
        self.total_items += stats.total_items;
        self.inventories.push(InventoryOverview {
            inventory_id: inventory.id,
            title: inventory.title.clone(),
            stats,
        });
    }
}

/// Values of `field` across `items` whose variant matches the field type
fn values_of<'a>(
    field: &'a FieldDefinition,
    items: &'a [Item],
) -> impl Iterator<Item = &'a FieldValue> + 'a {
    items
        .iter()
        .filter_map(move |item| item.fields.get(&field.id))
        .filter(move |value| value.field_type() == field.field_type)
}

/// Aggregates all items of an inventory
pub fn aggregate(inventory: &Inventory, items: &[Item]) -> InventoryStats {
    let mut report = FieldStatsReport::default();

    for field in &inventory.fields {
        let title = field.title.clone();
        match field.field_type {
            FieldType::Text | FieldType::Textarea => {
                let stats = TextStats::from_values(values_of(field, items).filter_map(|v| match v {
                    FieldValue::Text(s) | FieldValue::Textarea(s) => Some(s.as_str()),
                    _ => None,
                }));
                let summary = FieldSummary { field: title, stats };
                if field.field_type == FieldType::Text {
                    report.text.insert(field.id, summary);
                } else {
                    report.textarea.insert(field.id, summary);
                }
            }
            FieldType::Number => {
                let stats = NumericStats::from_values(values_of(field, items).filter_map(|v| match v {
                    FieldValue::Number(n) => Some(n),
                    _ => None,
                }));
                report.number.insert(field.id, FieldSummary { field: title, stats });
            }
            FieldType::Boolean => {
                let stats = BooleanStats::from_values(values_of(field, items).filter_map(|v| match v {
                    FieldValue::Boolean(b) => Some(b),
                    _ => None,
                }));
                report.boolean.insert(field.id, FieldSummary { field: title, stats });
            }
            FieldType::Document => {}
        }
    }

    InventoryStats {
        total_items: items.len(),
        created_dates: CreatedRange {
            oldest: items.iter().map(|i| i.created_at).min(),
            newest: items.iter().map(|i| i.created_at).max(),
        },
        last_updated: items.iter().map(|i| i.updated_at).max(),
        field_stats: report,
    }
}
