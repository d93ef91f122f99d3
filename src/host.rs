//! Create pipeline: persist a record, then run the report handler on it.
//!
//! There is no transaction around the two steps. If the handler fails, the
//! created record and any report observations written before the failure
//! stay in the store.

use uuid::Uuid;

use crate::{
    config::Config,
    generator::{CreationReportGenerator, PluginError},
    model::{Entity, ExecutionContext},
    service::Logger,
    storage::{Storage, StorageError},
};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// What a create produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// The id of the record that was created or replayed.
    pub record_id: Uuid,

    /// Report observations created by the handler. `None` if it didn't run.
    pub report_observations: Option<Vec<Uuid>>,
}

/// Runs creates against the store and fires the handler for the trigger entity.
pub struct Host<'a> {
    storage: &'a Storage,
    config: &'a Config,
    logger: &'a dyn Logger,
    user_id: Uuid,
}

impl<'a> Host<'a> {
    pub fn new(storage: &'a Storage, config: &'a Config, logger: &'a dyn Logger) -> Self {
        Self {
            storage,
            config,
            logger,
            user_id: Uuid::nil(),
        }
    }

    #[must_use]
    pub fn acting_as(mut self, user_id: Uuid) -> Self {
        self.user_id = user_id;
        self
    }

    /// Creates `record` and, for the trigger entity, runs the handler.
    pub fn create(&self, record: Entity) -> Result<Dispatch, HostError> {
        let id = self.storage.create_record(&record)?;
        self.fire(record.with_id(id))
    }

    /// Runs the handler again for an existing record.
    pub fn replay(&self, id: Uuid) -> Result<Dispatch, HostError> {
        let record = self.storage.load_record(id)?;
        self.fire(record)
    }

    fn fire(&self, record: Entity) -> Result<Dispatch, HostError> {
        let record_id = record.id.unwrap_or_default();
        if record.logical_name != self.config.trigger_entity {
            tracing::debug!(entity = %record.logical_name, "no handler registered");
            return Ok(Dispatch {
                record_id,
                report_observations: None,
            });
        }

        let ctx = ExecutionContext::create(record, self.user_id);
        tracing::debug!(
            message = %ctx.message_name,
            entity = %ctx.primary_entity_name,
            %record_id,
            user = %ctx.user_id,
            "running report handler"
        );
        let generator = CreationReportGenerator::new(
            self.storage,
            self.storage,
            self.logger,
            &self.config.schema,
        );
        let created = generator.on_record_created(&ctx).inspect_err(|e| {
            tracing::warn!(%record_id, error = %e, "report handler failed");
        })?;

        Ok(Dispatch {
            record_id,
            report_observations: Some(created),
        })
    }
}
