//! Record commands: create, replay, records.

use uuid::Uuid;

use crate::{
    config::Config,
    host::{Dispatch, Host},
    model::Entity,
    service::TracingLogger,
    storage::Storage,
};

pub(super) fn cmd_create(
    config: &Config,
    storage: &Storage,
    user: Option<Uuid>,
    entity: &str,
    name: Option<&str>,
) -> Result<(), String> {
    let mut record = Entity::new(entity);
    if let Some(name) = name {
        record.set(&config.schema.name_attribute, name);
    }

    let dispatch = host(config, storage, user)
        .create(record)
        .map_err(|e| format!("failed to create {entity}: {e}"))?;

    print_dispatch(&dispatch);
    Ok(())
}

pub(super) fn cmd_replay(
    config: &Config,
    storage: &Storage,
    user: Option<Uuid>,
    id: Uuid,
) -> Result<(), String> {
    let dispatch = host(config, storage, user)
        .replay(id)
        .map_err(|e| format!("failed to replay {id}: {e}"))?;

    if dispatch.report_observations.is_none() {
        return Err(format!(
            "{id} is not a {}; nothing to replay",
            config.trigger_entity
        ));
    }

    print_dispatch(&dispatch);
    Ok(())
}

pub(super) fn cmd_records(storage: &Storage, entity: &str) -> Result<(), String> {
    let records = storage
        .list_records(entity)
        .map_err(|e| format!("failed to list {entity}: {e}"))?;

    for record in &records {
        let json = serde_json::to_string(record)
            .map_err(|e| format!("failed to serialize record: {e}"))?;
        println!("{json}");
    }
    Ok(())
}

fn host<'a>(config: &'a Config, storage: &'a Storage, user: Option<Uuid>) -> Host<'a> {
    let host = Host::new(storage, config, &TracingLogger);
    match user {
        Some(user) => host.acting_as(user),
        None => host,
    }
}

fn print_dispatch(dispatch: &Dispatch) {
    println!("{}", dispatch.record_id);
    match &dispatch.report_observations {
        Some(ids) => {
            for id in ids {
                println!("{id}");
            }
            eprintln!("Created {} report observation(s)", ids.len());
        }
        None => eprintln!("No handler registered for this entity"),
    }
}
