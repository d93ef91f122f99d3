//! Local entity store.
//!
//! A single `SQLite` database stands in for the remote store:
//!
//! ```text
//! entity_definition   # one row per registered entity logical name
//! record              # one row per record; attributes as a JSON object
//! ```
//!
//! Records are returned in insertion order.

mod definition;
mod record;

use std::path::Path;

use rusqlite::Connection;
use uuid::Uuid;

use crate::{
    model::{Entity, QueryExpression},
    service::{QueryService, Records, ServiceError, ServiceFault, WriteService},
};

/// Fault code for an entity logical name the store doesn't know.
pub const UNKNOWN_ENTITY: u32 = 0x8004_0217;

/// Fault code for a record id that already exists.
pub const DUPLICATE_RECORD: u32 = 0x8004_0237;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("entity '{0}' does not exist")]
    UnknownEntity(String),

    #[error("record already exists: {0}")]
    DuplicateRecord(Uuid),

    #[error("record not found: {0}")]
    RecordNotFound(Uuid),

    #[error("corrupt store: {0}")]
    Corrupt(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnknownEntity(_) => {
                ServiceFault::new(UNKNOWN_ENTITY, err.to_string()).into()
            }
            StorageError::DuplicateRecord(_) => {
                ServiceFault::new(DUPLICATE_RECORD, err.to_string()).into()
            }
            other => ServiceError::Unexpected(Box::new(other)),
        }
    }
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS entity_definition (
        logical_name TEXT PRIMARY KEY,
        created_at   TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS record (
        seq          INTEGER PRIMARY KEY AUTOINCREMENT,
        id           TEXT NOT NULL UNIQUE,
        logical_name TEXT NOT NULL REFERENCES entity_definition (logical_name),
        attributes   TEXT NOT NULL,
        created_at   TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS record_by_entity ON record (logical_name, seq);
";

/// `SQLite`-backed entity store.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens (or creates) the store at `path`.
    ///
    /// The parent directory is created if it doesn't exist.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// Opens a private in-memory store.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

impl QueryService for Storage {
    fn retrieve_multiple(
        &self,
        query: &QueryExpression,
    ) -> core::result::Result<Records<'_>, ServiceError> {
        let records = self.query(query)?;
        let records: Records<'_> = Box::new(records.into_iter().map(Ok));
        Ok(records)
    }
}

impl WriteService for Storage {
    fn create(&self, entity: &Entity) -> core::result::Result<Uuid, ServiceError> {
        Ok(self.create_record(entity)?)
    }
}
