//! # Catalog
//!
//! The catalog services: every operation a collaborator (the CLI, an HTTP
//! layer) may call on inventories and items.
//!
//! Each mutating call follows the same order:
//!
//! 1. load the record (`NotFound`)
//! 2. ask the [`AccessPolicy`] (`AccessDenied`)
//! 3. validate the input (`Validation`)
//! 4. write through the store's version-conditional update
//!    (`VersionConflict`)
//!
//! Item creation goes through the uniqueness arbiter instead of step 4.
//!
//! ## Key Types
//!
//! - [`Catalog`] - The service, generic over store and access policy
//! - [`CatalogError`] - Every failure a caller can observe

mod arbiter;
mod error;
mod guard;

pub use arbiter::MAX_ATTEMPTS;
pub use error::{CatalogError, CatalogResult, RecordKind};

use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::domain::{
    aggregate, compose, effective_format, validate, validate_fields, validate_format,
    validate_quantity, validate_values, AccessPolicy, Actor, CustomIdElement, FieldDefinition,
    GenerationContext, Inventory, InventoryId, InventoryPatch, InventoryStats, Item, ItemId,
    ItemPatch, NewInventory, NewItem, OwnershipPolicy, UserId, UserOverview,
};
use crate::storage::CatalogStore;

/// Hits per record kind when a search does not say otherwise
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Inventories and items matching a text query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub inventories: Vec<Inventory>,
    pub items: Vec<Item>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.inventories.is_empty() && self.items.is_empty()
    }
}

/// Catalog service over a store `S` with access policy `P`
pub struct Catalog<S, P = OwnershipPolicy> {
    store: S,
    policy: P,
}

impl<S: CatalogStore> Catalog<S> {
    /// Creates a catalog with the default ownership policy
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: OwnershipPolicy,
        }
    }
}

impl<S: CatalogStore, P: AccessPolicy> Catalog<S, P> {
    pub fn with_policy(store: S, policy: P) -> Self {
        Self { store, policy }
    }

    /// Returns the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    // Inventories

    pub fn create_inventory(&self, actor: &Actor, mut draft: NewInventory) -> CatalogResult<Inventory> {
        draft.title = validate::inventory_title(&draft.title).map_err(CatalogError::Validation)?;
        validate_format(&draft.custom_id_format).map_err(CatalogError::Validation)?;
        validate_fields(&draft.fields).map_err(CatalogError::Validation)?;

        let inventory = Inventory::from_draft(draft, actor.id.clone());
        self.store.insert_inventory(&inventory)?;

        info!(inventory = %inventory.id, owner = %inventory.created_by, "created inventory");
        Ok(inventory)
    }

    pub fn inventory(&self, id: &InventoryId) -> CatalogResult<Inventory> {
        self.store
            .find_inventory(id)?
            .ok_or_else(|| CatalogError::not_found(RecordKind::Inventory, id))
    }

    /// All inventories, newest first
    pub fn inventories(&self) -> CatalogResult<Vec<Inventory>> {
        Ok(self.store.list_inventories()?)
    }

    /// Inventories created by `owner`, newest first
    pub fn inventories_owned_by(&self, owner: &UserId) -> CatalogResult<Vec<Inventory>> {
        Ok(self.store.list_inventories_owned_by(owner)?)
    }

    /// Inventories `user` can write without owning them, newest first
    pub fn inventories_shared_with(&self, user: &UserId) -> CatalogResult<Vec<Inventory>> {
        Ok(self.store.list_inventories_shared_with(user)?)
    }

    /// Searches inventory titles, descriptions and tags, and item titles and
    /// custom IDs, returning up to `limit` hits of each kind
    ///
    /// Matching is a substring test that ignores ASCII case. A blank query
    /// matches nothing.
    pub fn search(&self, query: &str, limit: usize) -> CatalogResult<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResults::default());
        }

        Ok(SearchResults {
            inventories: self.store.search_inventories(query, limit)?,
            items: self.store.search_items(None, query, limit)?,
        })
    }

    /// Items of one inventory whose title or custom ID contains `query`
    pub fn search_items(
        &self,
        inventory_id: &InventoryId,
        query: &str,
        limit: usize,
    ) -> CatalogResult<Vec<Item>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.search_items(Some(inventory_id), query, limit)?)
    }

    /// Applies `patch` if the inventory is still at version `expected`
    ///
    /// Changing `allowed_users` needs manage rights; everything else needs
    /// write rights.
    pub fn update_inventory(
        &self,
        actor: &Actor,
        id: &InventoryId,
        expected: u64,
        mut patch: InventoryPatch,
    ) -> CatalogResult<Inventory> {
        let inventory = self.inventory(id)?;
        self.authorize_write(&inventory, actor)?;
        if patch.touches_sharing() {
            self.authorize_manage(&inventory, actor)?;
        }

        if patch.is_empty() {
            return Err(CatalogError::Validation("nothing to update".to_string()));
        }
        if let Some(title) = patch.title.as_deref() {
            patch.title =
                Some(validate::inventory_title(title).map_err(CatalogError::Validation)?);
        }
        if let Some(format) = patch.custom_id_format.as_deref() {
            validate_format(format).map_err(CatalogError::Validation)?;
        }
        if let Some(fields) = patch.fields.as_deref() {
            validate_fields(fields).map_err(CatalogError::Validation)?;
        }

        let outcome = self
            .store
            .update_inventory_if_version_matches(id, expected, &patch)?;
        let updated = guard::settle(outcome, RecordKind::Inventory, id, expected)?;

        info!(inventory = %id, version = updated.version, "updated inventory");
        Ok(updated)
    }

    /// Replaces the custom ID format
    pub fn set_custom_id_format(
        &self,
        actor: &Actor,
        id: &InventoryId,
        expected: u64,
        format: Vec<CustomIdElement>,
    ) -> CatalogResult<Inventory> {
        let patch = InventoryPatch {
            custom_id_format: Some(format),
            ..Default::default()
        };
        self.update_inventory(actor, id, expected, patch)
    }

    /// Appends a field definition
    pub fn add_field(
        &self,
        actor: &Actor,
        id: &InventoryId,
        expected: u64,
        field: FieldDefinition,
    ) -> CatalogResult<Inventory> {
        self.modify_inventory(actor, id, expected, |inventory| {
            let mut fields = inventory.fields.clone();
            fields.push(field);
            InventoryPatch {
                fields: Some(fields),
                ..Default::default()
            }
        })
    }

    /// Adds `user` to the inventory's allowed users
    pub fn grant_access(
        &self,
        actor: &Actor,
        id: &InventoryId,
        expected: u64,
        user: UserId,
    ) -> CatalogResult<Inventory> {
        self.modify_inventory(actor, id, expected, |inventory| {
            let mut allowed = inventory.allowed_users.clone();
            if !allowed.contains(&user) {
                allowed.push(user);
            }
            InventoryPatch {
                allowed_users: Some(allowed),
                ..Default::default()
            }
        })
    }

    /// Removes `user` from the inventory's allowed users
    pub fn revoke_access(
        &self,
        actor: &Actor,
        id: &InventoryId,
        expected: u64,
        user: &UserId,
    ) -> CatalogResult<Inventory> {
        self.modify_inventory(actor, id, expected, |inventory| {
            let allowed = inventory
                .allowed_users
                .iter()
                .filter(|u| *u != user)
                .cloned()
                .collect();
            InventoryPatch {
                allowed_users: Some(allowed),
                ..Default::default()
            }
        })
    }

    /// Builds a patch from the stored inventory and applies it
    ///
    /// The patch is derived from whatever version is stored now. If that is
    /// not `expected`, the conditional write rejects it.
    fn modify_inventory(
        &self,
        actor: &Actor,
        id: &InventoryId,
        expected: u64,
        build: impl FnOnce(&Inventory) -> InventoryPatch,
    ) -> CatalogResult<Inventory> {
        let inventory = self.inventory(id)?;
        self.update_inventory(actor, id, expected, build(&inventory))
    }

    /// Deletes an inventory; its items stay in the store
    pub fn delete_inventory(&self, actor: &Actor, id: &InventoryId, expected: u64) -> CatalogResult<()> {
        let inventory = self.inventory(id)?;
        self.authorize_manage(&inventory, actor)?;

        let outcome = self.store.delete_inventory_if_version_matches(id, expected)?;
        guard::settle(outcome, RecordKind::Inventory, id, expected)?;

        info!(inventory = %id, "deleted inventory");
        Ok(())
    }

    /// Composes a custom ID the way item creation would, without storing
    /// anything or reserving a sequence number
    pub fn preview_custom_id(&self, id: &InventoryId) -> CatalogResult<String> {
        self.preview_custom_id_with_rng(id, &mut rand::thread_rng())
    }

    pub fn preview_custom_id_with_rng<R: Rng + ?Sized>(
        &self,
        id: &InventoryId,
        rng: &mut R,
    ) -> CatalogResult<String> {
        let inventory = self.inventory(id)?;
        let count = self.store.count_items(id)?;
        let format = effective_format(&inventory.custom_id_format);

        Ok(compose(&format, &GenerationContext::from_item_count(count), rng))
    }

    // Items

    /// Creates an item with a freshly generated custom ID
    pub fn create_item(
        &self,
        actor: &Actor,
        inventory_id: &InventoryId,
        draft: NewItem,
    ) -> CatalogResult<Item> {
        self.create_item_with_rng(actor, inventory_id, draft, &mut rand::thread_rng())
    }

    pub fn create_item_with_rng<R: Rng + ?Sized>(
        &self,
        actor: &Actor,
        inventory_id: &InventoryId,
        mut draft: NewItem,
        rng: &mut R,
    ) -> CatalogResult<Item> {
        let inventory = self.inventory(inventory_id)?;
        self.authorize_write(&inventory, actor)?;

        draft.title = validate::item_title(&draft.title).map_err(CatalogError::Validation)?;
        validate_quantity(draft.quantity).map_err(CatalogError::Validation)?;
        validate_values(&inventory, &draft.fields).map_err(CatalogError::Validation)?;

        let item = arbiter::insert_with_unique_id(&self.store, &inventory, &draft, &actor.id, rng)?;

        info!(inventory = %inventory_id, item = %item.id, custom_id = %item.custom_id, "created item");
        Ok(item)
    }

    pub fn item(&self, id: &ItemId) -> CatalogResult<Item> {
        self.store
            .find_item(id)?
            .ok_or_else(|| CatalogError::not_found(RecordKind::Item, id))
    }

    /// Looks an item up by its custom ID within one inventory
    pub fn item_by_custom_id(&self, inventory_id: &InventoryId, custom_id: &str) -> CatalogResult<Item> {
        self.store
            .find_item_by_custom_id(inventory_id, custom_id)?
            .ok_or_else(|| CatalogError::not_found(RecordKind::Item, custom_id))
    }

    /// Items of an inventory, oldest first
    ///
    /// Items left behind by a deleted inventory are still listed.
    pub fn items(&self, inventory_id: &InventoryId) -> CatalogResult<Vec<Item>> {
        Ok(self.store.list_items(inventory_id)?)
    }

    /// Applies `patch` if the item is still at version `expected`
    pub fn update_item(
        &self,
        actor: &Actor,
        id: &ItemId,
        expected: u64,
        mut patch: ItemPatch,
    ) -> CatalogResult<Item> {
        let item = self.item(id)?;
        let inventory = self.inventory(&item.inventory_id)?;
        self.authorize_write(&inventory, actor)?;

        if patch.is_empty() {
            return Err(CatalogError::Validation("nothing to update".to_string()));
        }
        if let Some(title) = patch.title.as_deref() {
            patch.title = Some(validate::item_title(title).map_err(CatalogError::Validation)?);
        }
        if let Some(custom_id) = patch.custom_id.as_deref() {
            let trimmed = custom_id.trim();
            if trimmed.is_empty() {
                return Err(CatalogError::Validation(
                    "customId: must not be empty".to_string(),
                ));
            }
            patch.custom_id = Some(trimmed.to_string());
        }
        if let Some(quantity) = patch.quantity {
            validate_quantity(quantity).map_err(CatalogError::Validation)?;
        }
        if let Some(values) = patch.fields.as_ref() {
            validate_values(&inventory, values).map_err(CatalogError::Validation)?;
        }

        let outcome = match self.store.update_item_if_version_matches(id, expected, &patch) {
            Ok(outcome) => outcome,
            Err(crate::storage::StoreError::DuplicateKey(_)) => {
                return Err(CatalogError::DuplicateIdentifier {
                    inventory_id: item.inventory_id,
                    custom_id: patch.custom_id.unwrap_or(item.custom_id),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let updated = guard::settle(outcome, RecordKind::Item, id, expected)?;

        info!(item = %id, version = updated.version, "updated item");
        Ok(updated)
    }

    pub fn delete_item(&self, actor: &Actor, id: &ItemId, expected: u64) -> CatalogResult<()> {
        let item = self.item(id)?;
        let inventory = self.inventory(&item.inventory_id)?;
        self.authorize_write(&inventory, actor)?;

        let outcome = self.store.delete_item_if_version_matches(id, expected)?;
        guard::settle(outcome, RecordKind::Item, id, expected)?;

        info!(item = %id, "deleted item");
        Ok(())
    }

    // Statistics

    /// Per-field statistics of an inventory
    ///
    /// Every call scans all items of the inventory; nothing is cached.
    /// Restricted to actors with write access.
    pub fn statistics(&self, actor: &Actor, inventory_id: &InventoryId) -> CatalogResult<InventoryStats> {
        let inventory = self.inventory(inventory_id)?;
        self.authorize_write(&inventory, actor)?;

        let items = self.store.list_items(inventory_id)?;
        Ok(aggregate(&inventory, &items))
    }

    /// Statistics of every inventory `user` owns, plus their item total
    pub fn overview(&self, user: &UserId) -> CatalogResult<UserOverview> {
        let mut overview = UserOverview::default();
        for inventory in self.store.list_inventories_owned_by(user)? {
            let items = self.store.list_items(&inventory.id)?;
            overview.push(&inventory, &items);
        }
        Ok(overview)
    }

    fn authorize_write(&self, inventory: &Inventory, actor: &Actor) -> CatalogResult<()> {
        if self.policy.can_write(inventory.access(), actor) {
            Ok(())
        } else {
            Err(denied(inventory, actor))
        }
    }

    fn authorize_manage(&self, inventory: &Inventory, actor: &Actor) -> CatalogResult<()> {
        if self.policy.can_manage(inventory.access(), actor) {
            Ok(())
        } else {
            Err(denied(inventory, actor))
        }
    }
}

fn denied(inventory: &Inventory, actor: &Actor) -> CatalogError {
    CatalogError::AccessDenied {
        kind: RecordKind::Inventory,
        id: inventory.id.to_string(),
        actor: actor.id.clone(),
    }
}
