//! Execution context: what the host hands the handler for one invocation.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::entity::{Entity, EntityReference, Value};

/// Input parameter key carrying the record a message operates on.
pub const TARGET: &str = "Target";

/// A message input parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    Entity(Entity),
    #[allow(dead_code)]
    Reference(EntityReference),
    #[allow(dead_code)]
    Value(Value),
}

/// Per-invocation state supplied by the host.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// The message being processed, e.g. `"Create"`.
    pub message_name: String,
    pub primary_entity_name: String,
    pub primary_entity_id: Uuid,
    /// The user the message runs on behalf of.
    pub user_id: Uuid,
    pub input_parameters: BTreeMap<String, Parameter>,
}

impl ExecutionContext {
    /// Context for a `Create` message whose target is `record`.
    ///
    /// The primary entity is taken from the record; a record without an id
    /// gets the nil id.
    pub fn create(record: Entity, user_id: Uuid) -> Self {
        let mut input_parameters = BTreeMap::new();
        let primary_entity_name = record.logical_name.clone();
        let primary_entity_id = record.id.unwrap_or_default();
        input_parameters.insert(TARGET.to_string(), Parameter::Entity(record));
        Self {
            message_name: "Create".to_string(),
            primary_entity_name,
            primary_entity_id,
            user_id,
            input_parameters,
        }
    }

    /// The target record, if one was supplied and it is record-shaped.
    pub fn target(&self) -> Option<&Entity> {
        match self.input_parameters.get(TARGET) {
            Some(Parameter::Entity(entity)) => Some(entity),
            _ => None,
        }
    }

    /// The primary record as a reference.
    pub fn primary_reference(&self) -> EntityReference {
        EntityReference::new(self.primary_entity_name.clone(), self.primary_entity_id)
    }
}
