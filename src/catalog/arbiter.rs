//! Uniqueness arbiter
//!
//! Picks a custom ID for a new item and inserts it. A candidate is first
//! looked up; the unique index catches anything that slips past the lookup
//! between check and insert. Either kind of collision costs one attempt,
//! and there are exactly [`MAX_ATTEMPTS`] of them.

use rand::Rng;
use tracing::{debug, warn};

use super::error::{CatalogError, CatalogResult};
use crate::domain::{
    compose, effective_format, uses_sequence, GenerationContext, Inventory, Item, NewItem, UserId,
};
use crate::storage::{CatalogStore, StoreError};

/// First try plus one retry
pub const MAX_ATTEMPTS: usize = 2;

/// Generates a unique custom ID for `draft` and persists the new item
pub(crate) fn insert_with_unique_id<S, R>(
    store: &S,
    inventory: &Inventory,
    draft: &NewItem,
    creator: &UserId,
    rng: &mut R,
) -> CatalogResult<Item>
where
    S: CatalogStore + ?Sized,
    R: Rng + ?Sized,
{
    let format = effective_format(&inventory.custom_id_format);
    let needs_sequence = uses_sequence(&format);
    let mut collided: Vec<String> = Vec::with_capacity(MAX_ATTEMPTS);

    for attempt in 1..=MAX_ATTEMPTS {
        // Each attempt takes a fresh number so a retry never reuses one
        let sequence = if needs_sequence {
            store.reserve_sequence(&inventory.id)?
        } else {
            0
        };
        let candidate = compose(&format, &GenerationContext::with_sequence(sequence), rng);

        if candidate.is_empty() {
            warn!(inventory = %inventory.id, "custom ID format produced an empty identifier");
            return Err(CatalogError::GenerationFailure {
                inventory_id: inventory.id,
                reason: "format produced an empty identifier".to_string(),
            });
        }

        if store
            .find_item_by_custom_id(&inventory.id, &candidate)?
            .is_some()
        {
            debug!(inventory = %inventory.id, attempt, custom_id = %candidate, "custom ID already taken");
            collided.push(candidate);
            continue;
        }

        let item = Item::from_draft(draft, inventory.id, candidate, creator.clone());
        match store.insert_item(&item) {
            Ok(()) => return Ok(item),
            Err(StoreError::DuplicateKey(_)) => {
                debug!(inventory = %inventory.id, attempt, custom_id = %item.custom_id, "custom ID taken concurrently");
                collided.push(item.custom_id);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(exhausted(inventory, collided))
}

/// Classifies a failure after every attempt collided
///
/// Identical candidates mean the format cannot produce anything else, which
/// the caller has to fix. Different candidates that all collided point at
/// the generator or the counter instead.
fn exhausted(inventory: &Inventory, collided: Vec<String>) -> CatalogError {
    let all_same = collided.windows(2).all(|pair| pair[0] == pair[1]);

    match collided.first() {
        Some(first) if all_same => CatalogError::DuplicateIdentifier {
            inventory_id: inventory.id,
            custom_id: first.clone(),
        },
        _ => {
            warn!(inventory = %inventory.id, candidates = ?collided, "custom ID generation exhausted");
            CatalogError::GenerationFailure {
                inventory_id: inventory.id,
                reason: format!(
                    "{} candidates collided: {}",
                    collided.len(),
                    collided.join(", ")
                ),
            }
        }
    }
}
