//! Entity definitions: which logical names the store accepts.

use jiff::Timestamp;

use super::{Result, Storage, StorageError};

impl Storage {
    /// Registers an entity logical name.
    ///
    /// Returns `false` if it was already registered.
    pub fn register_entity(&self, logical_name: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "INSERT OR IGNORE INTO entity_definition (logical_name, created_at) VALUES (?1, ?2)",
            rusqlite::params![logical_name, Timestamp::now().to_string()],
        )?;
        if rows > 0 {
            tracing::debug!(entity = logical_name, "registered entity");
        }
        Ok(rows > 0)
    }

    /// Lists registered entity logical names, alphabetically.
    pub fn list_entities(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT logical_name FROM entity_definition ORDER BY logical_name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Fails with [`StorageError::UnknownEntity`] unless `logical_name` is registered.
    pub(super) fn require_entity(&self, logical_name: &str) -> Result<()> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM entity_definition WHERE logical_name = ?1)",
            [logical_name],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(StorageError::UnknownEntity(logical_name.to_string()))
        }
    }
}
