//! Core data model.
//!
//! Records, the structured queries that select them, and the execution
//! context the host passes to a handler.

mod context;
mod entity;
mod query;

pub use context::ExecutionContext;
#[cfg(test)]
pub use context::{Parameter, TARGET};
pub use entity::{Entity, EntityReference, Value};
pub use query::{ConditionExpression, QueryExpression};
