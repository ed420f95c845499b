//! Write-access decisions
//!
//! Authentication happens outside the catalog; callers arrive as an
//! [`Actor`] that is already known to be who it claims. The catalog only
//! asks an [`AccessPolicy`] whether that actor may change a record, and it
//! asks before looking at any version number.

use super::ids::UserId;

/// The authenticated caller of a catalog operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(id: UserId) -> Self {
        Self { id, is_admin: false }
    }

    pub fn admin(id: UserId) -> Self {
        Self { id, is_admin: true }
    }
}

/// Ownership and sharing data of one inventory
#[derive(Debug, Clone, Copy)]
pub struct AccessScope<'a> {
    pub owner: &'a UserId,
    pub is_public: bool,
    pub allowed_users: &'a [UserId],
}

/// Decides what an actor may do with an inventory and its items
pub trait AccessPolicy {
    /// May the actor edit the inventory, or create/edit/delete its items?
    fn can_write(&self, scope: AccessScope<'_>, actor: &Actor) -> bool;

    /// May the actor delete the inventory or change its allowed users?
    fn can_manage(&self, scope: AccessScope<'_>, actor: &Actor) -> bool;
}

/// Default policy: admins and owners may do anything; public inventories and
/// listed users grant write access but not management
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipPolicy;

impl AccessPolicy for OwnershipPolicy {
    fn can_write(&self, scope: AccessScope<'_>, actor: &Actor) -> bool {
        actor.is_admin
            || scope.owner == &actor.id
            || scope.is_public
            || scope.allowed_users.contains(&actor.id)
    }

    fn can_manage(&self, scope: AccessScope<'_>, actor: &Actor) -> bool {
        actor.is_admin || scope.owner == &actor.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[test]
    fn owner_and_admin_can_do_everything() {
        let owner = uid("alice");
        let scope = AccessScope {
            owner: &owner,
            is_public: false,
            allowed_users: &[],
        };

        for actor in [Actor::user(uid("alice")), Actor::admin(uid("root"))] {
            assert!(OwnershipPolicy.can_write(scope, &actor));
            assert!(OwnershipPolicy.can_manage(scope, &actor));
        }
    }

    #[test]
    fn strangers_are_denied_on_private_inventories() {
        let owner = uid("alice");
        let scope = AccessScope {
            owner: &owner,
            is_public: false,
            allowed_users: &[],
        };
        let bob = Actor::user(uid("bob"));

        assert!(!OwnershipPolicy.can_write(scope, &bob));
        assert!(!OwnershipPolicy.can_manage(scope, &bob));
    }

    #[test]
    fn public_and_shared_grant_write_only() {
        let owner = uid("alice");
        let allowed = [uid("carol")];
        let shared = AccessScope {
            owner: &owner,
            is_public: false,
            allowed_users: &allowed,
        };
        let public = AccessScope {
            owner: &owner,
            is_public: true,
            allowed_users: &[],
        };

        let carol = Actor::user(uid("carol"));
        let bob = Actor::user(uid("bob"));

        assert!(OwnershipPolicy.can_write(shared, &carol));
        assert!(!OwnershipPolicy.can_manage(shared, &carol));
        assert!(OwnershipPolicy.can_write(public, &bob));
        assert!(!OwnershipPolicy.can_manage(public, &bob));
    }
}
