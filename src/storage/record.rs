//! Record storage: create, update, load, list, and query records.

use std::collections::BTreeMap;

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::model::{Entity, QueryExpression, Value};

use super::{Result, Storage, StorageError};

impl Storage {
    /// Creates a record and returns its id.
    ///
    /// Uses the entity's id when it carries one, otherwise assigns a new one.
    pub fn create_record(&self, entity: &Entity) -> Result<Uuid> {
        self.require_entity(&entity.logical_name)?;
        let id = entity.id.unwrap_or_else(Uuid::new_v4);
        if record_exists(&self.conn, id)? {
            return Err(StorageError::DuplicateRecord(id));
        }
        self.conn.execute(
            "INSERT INTO record (id, logical_name, attributes, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                id.to_string(),
                &entity.logical_name,
                serde_json::to_string(&entity.attributes)?,
                Timestamp::now().to_string(),
            ],
        )?;
        tracing::debug!(entity = %entity.logical_name, %id, "created record");
        Ok(id)
    }

    /// Replaces the attributes of an existing record.
    pub fn update_record(&self, entity: &Entity) -> Result<()> {
        let id = entity
            .id
            .ok_or_else(|| StorageError::Corrupt("cannot update a record without an id".into()))?;
        let rows = self.conn.execute(
            "UPDATE record SET attributes = ?1 WHERE id = ?2 AND logical_name = ?3",
            rusqlite::params![
                serde_json::to_string(&entity.attributes)?,
                id.to_string(),
                &entity.logical_name,
            ],
        )?;
        if rows == 0 {
            return Err(StorageError::RecordNotFound(id));
        }
        Ok(())
    }

    /// Loads a single record by id.
    pub fn load_record(&self, id: Uuid) -> Result<Entity> {
        let row = self
            .conn
            .query_row(
                "SELECT id, logical_name, attributes FROM record WHERE id = ?1",
                [id.to_string()],
                read_row,
            )
            .optional()?;
        let Some(row) = row else {
            return Err(StorageError::RecordNotFound(id));
        };
        decode(row)
    }

    /// Lists all records of an entity, in creation order.
    pub fn list_records(&self, logical_name: &str) -> Result<Vec<Entity>> {
        self.require_entity(logical_name)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, logical_name, attributes FROM record
             WHERE logical_name = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map([logical_name], read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(decode).collect()
    }

    /// Runs a structured query: records of the entity, filtered, then projected.
    pub fn query(&self, query: &QueryExpression) -> Result<Vec<Entity>> {
        let records = self.list_records(&query.entity_name)?;
        Ok(records
            .iter()
            .filter(|r| query.matches(r))
            .map(|r| query.project(r))
            .collect())
    }
}

type RawRow = (String, String, String);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn decode((id, logical_name, attributes): RawRow) -> Result<Entity> {
    let id = id
        .parse::<Uuid>()
        .map_err(|e| StorageError::Corrupt(format!("invalid record id: {e}")))?;
    let attributes: BTreeMap<String, Value> = serde_json::from_str(&attributes)?;
    Ok(Entity {
        logical_name,
        id: Some(id),
        attributes,
    })
}

fn record_exists(conn: &Connection, id: Uuid) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM record WHERE id = ?1)",
        [id.to_string()],
        |row| row.get(0),
    )?)
}
