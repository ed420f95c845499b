//! Workspace management
//!
//! Handles workspace initialization and opens the catalog store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::WORKSPACE_DIR;
use super::{Config, SqliteStore};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Not in a stockroom workspace. Run 'stockroom init' first.")]
    NotInWorkspace,
}

const DEFAULT_CONFIG: &str = r#"# stockroom configuration

# Database file inside .stockroom/
database = "catalog.db"

# Milliseconds a writer waits for a locked database
busy_timeout_ms = 5000

[log]
# Overridden by RUST_LOG and --verbose
level = "warn"

[user]
# name = "alice"
admin = false
"#;

const GITIGNORE: &str = r#"# SQLite database and its WAL files
*.db
*.db-wal
*.db-shm
"#;

/// A stockroom workspace: a directory containing `.stockroom/`
pub struct Workspace {
    root: PathBuf,
    config: Config,
}

impl Workspace {
    /// Opens an existing workspace at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(WORKSPACE_DIR).is_dir() {
            return Err(WorkspaceError::NotInWorkspace.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the workspace at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(WorkspaceError::NotInWorkspace)?;

        Self::open(root)
    }

    /// Initializes a new workspace at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let dir = root.join(WORKSPACE_DIR);

        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {} directory: {}", WORKSPACE_DIR, dir.display()))?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, GITIGNORE).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        let workspace = Self::open(root)?;

        // Create the schema now so later commands only ever open
        workspace.store()?;
        tracing::info!(root = %workspace.root.display(), "initialized workspace");

        Ok(workspace)
    }

    /// Returns the workspace root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the `.stockroom` directory path
    pub fn dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the database file path
    pub fn database_path(&self) -> PathBuf {
        self.dir().join(&self.config.project.database)
    }

    /// Opens a connection to the catalog database
    pub fn store(&self) -> Result<SqliteStore> {
        let path = self.database_path();
        SqliteStore::open(&path, self.config.project.busy_timeout())
            .with_context(|| format!("Failed to open catalog database: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::init(dir.path()).unwrap();

        assert!(workspace.dir().is_dir());
        assert!(workspace.dir().join("config.toml").is_file());
        assert!(workspace.dir().join(".gitignore").is_file());
        assert!(workspace.database_path().is_file());
    }

    #[test]
    fn default_config_file_parses() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::init(dir.path()).unwrap();

        assert_eq!(workspace.config().project.database, "catalog.db");
        assert_eq!(workspace.config().project.log.level, "warn");
        assert!(!workspace.config().project.user.admin);
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();

        Workspace::init(dir.path()).unwrap();
        Workspace::init(dir.path()).unwrap(); // Should not fail

        assert!(dir.path().join(WORKSPACE_DIR).is_dir());
    }

    #[test]
    fn open_existing_workspace() {
        let dir = TempDir::new().unwrap();
        Workspace::init(dir.path()).unwrap();

        let workspace = Workspace::open(dir.path()).unwrap();
        assert_eq!(workspace.root(), dir.path());
    }

    #[test]
    fn open_non_workspace_fails() {
        let dir = TempDir::new().unwrap();
        let result = Workspace::open(dir.path());

        assert!(result.is_err());
    }

    #[test]
    fn custom_database_name() {
        let dir = TempDir::new().unwrap();
        Workspace::init(dir.path()).unwrap();
        fs::write(
            dir.path().join(WORKSPACE_DIR).join("config.toml"),
            "database = \"other.db\"\n",
        )
        .unwrap();

        let workspace = Workspace::open(dir.path()).unwrap();
        workspace.store().unwrap();
        assert!(workspace.dir().join("other.db").is_file());
    }
}
