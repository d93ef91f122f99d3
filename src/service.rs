//! Host capabilities a handler is given: query, write, and trace.
//!
//! Each capability is its own trait so a handler names exactly what it uses
//! and tests can substitute any one of them.

use std::error::Error;

use uuid::Uuid;

use crate::model::{Entity, QueryExpression};

/// A fault reported by the entity store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (code {code:#010x})")]
pub struct ServiceFault {
    pub code: u32,
    pub message: String,
}

impl ServiceFault {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Errors surfaced by a service call.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The store rejected the request.
    #[error("service fault: {0}")]
    Fault(#[from] ServiceFault),

    /// Anything else: transport, storage, decoding.
    #[error(transparent)]
    Unexpected(Box<dyn Error + Send + Sync>),
}

/// Records returned by a query, in store order. Single pass.
pub type Records<'a> = Box<dyn Iterator<Item = Result<Entity, ServiceError>> + 'a>;

/// Runs structured queries against the store.
pub trait QueryService {
    fn retrieve_multiple(&self, query: &QueryExpression) -> Result<Records<'_>, ServiceError>;
}

/// Creates records in the store.
pub trait WriteService {
    /// Creates `entity` and returns the id the store assigned.
    fn create(&self, entity: &Entity) -> Result<Uuid, ServiceError>;
}

/// Best-effort diagnostic trace sink. Must never fail.
pub trait Logger {
    fn trace(&self, message: &str);
}

/// Forwards handler trace lines to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn trace(&self, message: &str) {
        tracing::info!(target: "reportgen::plugin", "{message}");
    }
}
