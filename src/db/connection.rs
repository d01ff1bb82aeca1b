use rusqlite::Connection;
use std::path::Path;
use anyhow::{Context, Result};
use crate::config::Config;
use crate::db::migrations::MigrationManager;

/// Database connection manager for the pipeline ledger
pub struct DbConnection;

impl DbConnection {
    /// Connect to the ledger configured in `config`
    pub fn connect(config: &Config) -> Result<Connection> {
        Self::connect_at(&config.data_location)
    }

    /// Connect to the database at `db_path`, creating it and parent directories if needed
    pub fn connect_at(db_path: &Path) -> Result<Connection> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

        // Initialize schema
        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }

    /// Connect to an in-memory database (for testing)
    pub fn connect_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory database")?;

        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }
}
