use rusqlite::{Connection, OptionalExtension};
use crate::models::Stage;
use crate::pipeline::StageRegistry;
use anyhow::{Context, Result};

const META_SAVED: &str = "registry.saved";

pub struct StageRepo;

impl StageRepo {
    /// Load the saved registry, or the default pipeline if nothing was saved yet
    pub fn load(conn: &Connection, default_wip_limit: u32) -> Result<StageRegistry> {
        if !Self::has_saved(conn)? {
            return Ok(StageRegistry::with_defaults(default_wip_limit));
        }
        let active = Self::list(conn, false)?;
        let removed = Self::list(conn, true)?;
        Ok(StageRegistry::from_parts(active, removed, default_wip_limit))
    }

    /// Whether a registry has ever been saved
    pub fn has_saved(conn: &Connection) -> Result<bool> {
        let saved: Option<String> = conn
            .query_row(
                "SELECT value FROM registry_meta WHERE key = ?1",
                [META_SAVED],
                |row| row.get(0),
            )
            .optional()?;
        Ok(saved.is_some())
    }

    /// List active or removed stages in their stored order
    pub fn list(conn: &Connection, removed: bool) -> Result<Vec<Stage>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, original_name, wip_limit
             FROM stages WHERE removed = ?1 ORDER BY position"
        )?;

        let rows = stmt.query_map([removed as i64], |row| {
            Ok(Stage {
                id: row.get(0)?,
                name: row.get(1)?,
                original_name: row.get(2)?,
                wip_limit: row.get(3)?,
            })
        })?;

        let mut stages = Vec::new();
        for row in rows {
            stages.push(row?);
        }
        Ok(stages)
    }

    /// Replace the stored registry with `registry`
    pub fn save(conn: &Connection, registry: &StageRegistry) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let tx = conn.unchecked_transaction()
            .context("Failed to start transaction")?;

        tx.execute("DELETE FROM stages", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO stages (id, name, original_name, wip_limit, position, removed, modified_ts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            )?;
            let lists = [(registry.active(), 0i64), (registry.removed(), 1i64)];
            for (stages, removed) in lists {
                for (position, stage) in stages.iter().enumerate() {
                    insert.execute(rusqlite::params![
                        stage.id,
                        stage.name,
                        stage.original_name,
                        stage.wip_limit,
                        position as i64,
                        removed,
                        now,
                    ])
                    .with_context(|| format!("Failed to save stage '{}'", stage.id))?;
                }
            }
        }
        tx.execute(
            "INSERT INTO registry_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![META_SAVED, now.to_string()],
        )?;
        tx.commit().context("Failed to save stage registry")?;

        log::debug!(
            "Saved stage registry: {} active, {} removed",
            registry.active().len(),
            registry.removed().len()
        );
        Ok(())
    }

    /// Forget all customization
    pub fn clear(conn: &Connection) -> Result<()> {
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM stages", [])?;
        tx.execute("DELETE FROM registry_meta WHERE key = ?1", [META_SAVED])?;
        tx.commit().context("Failed to reset stage registry")?;
        Ok(())
    }
}
