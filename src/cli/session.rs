//! Per-invocation state shared by catalog commands

use anyhow::{Context, Result};

use crate::catalog::Catalog;
use crate::domain::{Actor, UserId};
use crate::storage::{SqliteStore, UserConfig, Workspace};

/// The open workspace and the user acting in it
pub struct Session {
    workspace: Workspace,
    actor: Actor,
}

impl Session {
    /// Opens the workspace containing the current directory
    pub fn open(as_user: Option<&str>, admin: bool) -> Result<Self> {
        let workspace = Workspace::open_current()?;
        let actor = resolve_actor(as_user, admin, &workspace.config().project.user)?;
        tracing::debug!(user = %actor.id, admin = actor.is_admin, root = %workspace.root().display(), "opened session");

        Ok(Self { workspace, actor })
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Opens the catalog on a fresh database connection
    pub fn catalog(&self) -> Result<Catalog<SqliteStore>> {
        Ok(Catalog::new(self.workspace.store()?))
    }
}

/// Picks the acting user: `--as` first, then the configured identity
pub fn resolve_actor(as_user: Option<&str>, admin: bool, config: &UserConfig) -> Result<Actor> {
    let name = match as_user {
        Some(name) => name.to_string(),
        None => config.effective_name(),
    };
    let id = UserId::new(name).context("Invalid user name")?;

    Ok(Actor {
        id,
        is_admin: admin || config.admin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_user_wins() {
        let config = UserConfig {
            name: Some("configured".to_string()),
            admin: false,
        };

        let actor = resolve_actor(Some("cli"), false, &config).unwrap();
        assert_eq!(actor.id.as_str(), "cli");
        assert!(!actor.is_admin);
    }

    #[test]
    fn admin_from_flag_or_config() {
        let config = UserConfig {
            name: None,
            admin: true,
        };
        assert!(resolve_actor(Some("x"), false, &config).unwrap().is_admin);
        assert!(resolve_actor(Some("x"), true, &UserConfig::default()).unwrap().is_admin);
    }

    #[test]
    fn blank_user_is_rejected() {
        assert!(resolve_actor(Some("  "), false, &UserConfig::default()).is_err());
    }
}
