//! Report observation generation on record creation.
//!
//! When a record is created, every active observation is copied into a new
//! report observation pointing back at the created record. One create call
//! per observation, in query order. A failure stops the pass; records created
//! before it stay.

use std::error::Error;

use uuid::Uuid;

use crate::{
    config::Schema,
    model::{ConditionExpression, Entity, ExecutionContext, QueryExpression},
    service::{Logger, QueryService, ServiceError, ServiceFault, WriteService},
};

/// State code of an active record.
pub const ACTIVE: i64 = 0;

/// Message surfaced to the user when the store faults.
pub const EXECUTION_FAILED: &str = "An error occurred while generating report observations.";

/// Errors that abort a generation pass.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// The store faulted during a query or create.
    #[error("{message}")]
    Execution {
        message: String,
        #[source]
        fault: ServiceFault,
    },

    /// Anything else, passed through unchanged.
    #[error(transparent)]
    Unexpected(Box<dyn Error + Send + Sync>),
}

/// Creates one report observation per active observation when a record is created.
pub struct CreationReportGenerator<'a> {
    query: &'a dyn QueryService,
    write: &'a dyn WriteService,
    logger: &'a dyn Logger,
    schema: &'a Schema,
}

impl<'a> CreationReportGenerator<'a> {
    pub fn new(
        query: &'a dyn QueryService,
        write: &'a dyn WriteService,
        logger: &'a dyn Logger,
        schema: &'a Schema,
    ) -> Self {
        Self {
            query,
            write,
            logger,
            schema,
        }
    }

    /// Handle a record-created event.
    ///
    /// Returns the ids of the report observations created, in query order.
    /// Without a record-shaped target this does nothing and returns no ids.
    pub fn on_record_created(&self, ctx: &ExecutionContext) -> Result<Vec<Uuid>, PluginError> {
        if ctx.target().is_none() {
            return Ok(Vec::new());
        }

        self.generate(ctx).map_err(|err| match err {
            ServiceError::Fault(fault) => PluginError::Execution {
                message: EXECUTION_FAILED.to_string(),
                fault,
            },
            ServiceError::Unexpected(err) => {
                self.logger.trace(&format!("ReportOnCreate: {err}"));
                PluginError::Unexpected(err)
            }
        })
    }

    /// The query selecting active observations, name column only.
    pub fn active_observations(&self) -> QueryExpression {
        QueryExpression::new(&self.schema.observation_entity)
            .select([&self.schema.name_attribute])
            .filter(ConditionExpression::equal(
                &self.schema.state_attribute,
                ACTIVE,
            ))
    }

    fn generate(&self, ctx: &ExecutionContext) -> Result<Vec<Uuid>, ServiceError> {
        let s = self.schema;
        let observations = self.query.retrieve_multiple(&self.active_observations())?;

        let mut created = Vec::new();
        for observation in observations {
            let observation = observation?;
            let name = observation.get_str(&s.name_attribute).map(String::from);

            // The observation is copied by name, not linked.
            let report_observation = Entity::new(&s.report_observation_entity)
                .with(&s.observation_field, name.clone())
                .with(&s.report_field, ctx.primary_reference())
                .with(&s.name_attribute, name);

            let id = self.write.create(&report_observation)?;
            self.logger.trace(&format!(
                "New {} created with id: {id}",
                s.report_observation_entity
            ));
            created.push(id);
        }

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::io;

    use crate::model::{EntityReference, Parameter, TARGET, Value};
    use crate::service::Records;

    /// Returns a fixed observation set and records every query.
    #[derive(Default)]
    struct FakeQuery {
        observations: Vec<Entity>,
        fault: Option<ServiceFault>,
        queries: RefCell<Vec<QueryExpression>>,
    }

    impl QueryService for FakeQuery {
        fn retrieve_multiple(&self, query: &QueryExpression) -> Result<Records<'_>, ServiceError> {
            self.queries.borrow_mut().push(query.clone());
            if let Some(fault) = &self.fault {
                return Err(fault.clone().into());
            }
            let records: Records<'_> = Box::new(self.observations.iter().cloned().map(Ok));
            Ok(records)
        }
    }

    #[derive(Clone, Copy)]
    enum Failure {
        Fault,
        Unexpected,
    }

    /// Keeps created records; optionally fails on the n-th create (1-based).
    #[derive(Default)]
    struct FakeWrite {
        created: RefCell<Vec<Entity>>,
        fail_on: Option<(usize, Failure)>,
    }

    impl WriteService for FakeWrite {
        fn create(&self, entity: &Entity) -> Result<Uuid, ServiceError> {
            let attempt = self.created.borrow().len() + 1;
            if let Some((n, failure)) = self.fail_on
                && n == attempt
            {
                return Err(match failure {
                    Failure::Fault => ServiceFault::new(0x8004_0237, "duplicate record").into(),
                    Failure::Unexpected => {
                        ServiceError::Unexpected(Box::new(io::Error::other("disk full")))
                    }
                });
            }
            let id = Uuid::new_v4();
            self.created.borrow_mut().push(entity.clone().with_id(id));
            Ok(id)
        }
    }

    #[derive(Default)]
    struct FakeLogger {
        lines: RefCell<Vec<String>>,
    }

    impl Logger for FakeLogger {
        fn trace(&self, message: &str) {
            self.lines.borrow_mut().push(message.to_string());
        }
    }

    fn observation(name: &str) -> Entity {
        Entity::new("br_observation")
            .with_id(Uuid::new_v4())
            .with("br_name", name)
    }

    fn account_context() -> (Uuid, ExecutionContext) {
        let id = Uuid::new_v4();
        let ctx = ExecutionContext::create(Entity::new("account").with_id(id), Uuid::new_v4());
        (id, ctx)
    }

    #[test]
    fn creates_one_report_observation_per_active_observation() {
        let schema = Schema::default();
        let query = FakeQuery {
            observations: vec![observation("Temp High"), observation("Pressure Low")],
            ..FakeQuery::default()
        };
        let write = FakeWrite::default();
        let logger = FakeLogger::default();
        let generator = CreationReportGenerator::new(&query, &write, &logger, &schema);
        let (account_id, ctx) = account_context();

        let ids = generator.on_record_created(&ctx).unwrap();

        let created = write.created.borrow();
        assert_eq!(ids.len(), 2);
        assert_eq!(created.len(), 2);
        let report = Value::Reference(EntityReference::new("account", account_id));
        for (record, name) in created.iter().zip(["Temp High", "Pressure Low"]) {
            assert_eq!(record.logical_name, "br_reportobservation");
            assert_eq!(record.get_str("br_name"), Some(name));
            assert_eq!(record.get_str("br_observation"), Some(name));
            assert_eq!(record.get("br_report"), Some(&report));
        }
        assert_eq!(
            ids,
            created.iter().map(|r| r.id.unwrap()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn logs_each_created_id() {
        let schema = Schema::default();
        let query = FakeQuery {
            observations: vec![observation("Temp High")],
            ..FakeQuery::default()
        };
        let write = FakeWrite::default();
        let logger = FakeLogger::default();
        let generator = CreationReportGenerator::new(&query, &write, &logger, &schema);

        let ids = generator.on_record_created(&account_context().1).unwrap();

        assert_eq!(
            *logger.lines.borrow(),
            vec![format!("New br_reportobservation created with id: {}", ids[0])]
        );
    }

    #[test]
    fn queries_active_observation_names() {
        let schema = Schema::default();
        let query = FakeQuery::default();
        let write = FakeWrite::default();
        let logger = FakeLogger::default();
        let generator = CreationReportGenerator::new(&query, &write, &logger, &schema);

        generator.on_record_created(&account_context().1).unwrap();

        let expected = QueryExpression::new("br_observation")
            .select(["br_name"])
            .filter(ConditionExpression::equal("statecode", 0));
        assert_eq!(*query.queries.borrow(), vec![expected]);
    }

    #[test]
    fn no_observations_is_a_quiet_success() {
        let schema = Schema::default();
        let query = FakeQuery::default();
        let write = FakeWrite::default();
        let logger = FakeLogger::default();
        let generator = CreationReportGenerator::new(&query, &write, &logger, &schema);

        let ids = generator.on_record_created(&account_context().1).unwrap();

        assert!(ids.is_empty());
        assert!(write.created.borrow().is_empty());
        assert!(logger.lines.borrow().is_empty());
    }

    #[test]
    fn missing_target_is_a_no_op() {
        let schema = Schema::default();
        let query = FakeQuery {
            observations: vec![observation("Temp High")],
            ..FakeQuery::default()
        };
        let write = FakeWrite::default();
        let logger = FakeLogger::default();
        let generator = CreationReportGenerator::new(&query, &write, &logger, &schema);

        let (_, mut ctx) = account_context();
        ctx.input_parameters.remove(TARGET);
        assert!(generator.on_record_created(&ctx).unwrap().is_empty());

        ctx.input_parameters
            .insert(TARGET.to_string(), Parameter::Value(Value::from("account")));
        assert!(generator.on_record_created(&ctx).unwrap().is_empty());

        assert!(query.queries.borrow().is_empty());
        assert!(write.created.borrow().is_empty());
    }

    #[test]
    fn missing_name_is_copied_as_null() {
        let schema = Schema::default();
        let query = FakeQuery {
            observations: vec![Entity::new("br_observation").with_id(Uuid::new_v4())],
            ..FakeQuery::default()
        };
        let write = FakeWrite::default();
        let logger = FakeLogger::default();
        let generator = CreationReportGenerator::new(&query, &write, &logger, &schema);

        generator.on_record_created(&account_context().1).unwrap();

        let created = write.created.borrow();
        assert_eq!(created[0].get("br_name"), Some(&Value::Null));
        assert_eq!(created[0].get("br_observation"), Some(&Value::Null));
    }

    #[test]
    fn fault_on_kth_create_keeps_earlier_records() {
        let schema = Schema::default();
        let query = FakeQuery {
            observations: vec![observation("a"), observation("b"), observation("c")],
            ..FakeQuery::default()
        };
        let write = FakeWrite {
            fail_on: Some((2, Failure::Fault)),
            ..FakeWrite::default()
        };
        let logger = FakeLogger::default();
        let generator = CreationReportGenerator::new(&query, &write, &logger, &schema);

        let err = generator.on_record_created(&account_context().1).unwrap_err();

        assert_eq!(write.created.borrow().len(), 1);
        assert_eq!(err.to_string(), EXECUTION_FAILED);
        match err {
            PluginError::Execution { fault, .. } => assert_eq!(fault.code, 0x8004_0237),
            PluginError::Unexpected(e) => panic!("expected execution error, got {e}"),
        }
        // Only the one success was traced; faults are not.
        assert_eq!(logger.lines.borrow().len(), 1);
    }

    #[test]
    fn query_fault_becomes_execution_error() {
        let schema = Schema::default();
        let query = FakeQuery {
            fault: Some(ServiceFault::new(0x8004_0217, "entity does not exist")),
            ..FakeQuery::default()
        };
        let write = FakeWrite::default();
        let logger = FakeLogger::default();
        let generator = CreationReportGenerator::new(&query, &write, &logger, &schema);

        let err = generator.on_record_created(&account_context().1).unwrap_err();

        assert!(matches!(err, PluginError::Execution { .. }));
        assert!(write.created.borrow().is_empty());
    }

    #[test]
    fn unexpected_error_is_traced_and_passed_through() {
        let schema = Schema::default();
        let query = FakeQuery {
            observations: vec![observation("a"), observation("b")],
            ..FakeQuery::default()
        };
        let write = FakeWrite {
            fail_on: Some((1, Failure::Unexpected)),
            ..FakeWrite::default()
        };
        let logger = FakeLogger::default();
        let generator = CreationReportGenerator::new(&query, &write, &logger, &schema);

        let err = generator.on_record_created(&account_context().1).unwrap_err();

        assert!(matches!(err, PluginError::Unexpected(_)));
        assert_eq!(err.to_string(), "disk full");
        assert!(write.created.borrow().is_empty());
        assert_eq!(*logger.lines.borrow(), vec!["ReportOnCreate: disk full"]);
    }

    #[test]
    fn repeated_invocations_duplicate_records() {
        let schema = Schema::default();
        let query = FakeQuery {
            observations: vec![observation("a"), observation("b")],
            ..FakeQuery::default()
        };
        let write = FakeWrite::default();
        let logger = FakeLogger::default();
        let generator = CreationReportGenerator::new(&query, &write, &logger, &schema);
        let (_, ctx) = account_context();

        generator.on_record_created(&ctx).unwrap();
        generator.on_record_created(&ctx).unwrap();

        assert_eq!(write.created.borrow().len(), 4);
    }
}
