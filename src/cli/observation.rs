//! Observation commands: add, list, deactivate.

use clap::Subcommand;
use uuid::Uuid;

use crate::{
    config::Config,
    generator::ACTIVE,
    model::{Entity, Value},
    storage::Storage,
};

/// State code of an inactive record.
const INACTIVE: i64 = 1;

#[derive(Debug, Subcommand)]
pub enum ObservationCommand {
    /// Add an observation. Prints its id.
    Add {
        /// Display name.
        name: String,

        /// Create it inactive; inactive observations are not reported.
        #[arg(long)]
        inactive: bool,
    },

    /// List active observations.
    List {
        /// Include inactive observations.
        #[arg(long)]
        all: bool,
    },

    /// Mark an observation inactive.
    Deactivate {
        /// Observation id.
        id: Uuid,
    },
}

pub(super) fn cmd_add(
    config: &Config,
    storage: &Storage,
    name: &str,
    inactive: bool,
) -> Result<(), String> {
    let s = &config.schema;
    let state = if inactive { INACTIVE } else { ACTIVE };
    let observation = Entity::new(&s.observation_entity)
        .with(&s.name_attribute, name)
        .with(&s.state_attribute, state);

    let id = storage
        .create_record(&observation)
        .map_err(|e| format!("failed to add observation: {e}"))?;

    println!("{id}");
    Ok(())
}

pub(super) fn cmd_list(config: &Config, storage: &Storage, all: bool) -> Result<(), String> {
    let s = &config.schema;
    let observations = storage
        .list_records(&s.observation_entity)
        .map_err(|e| format!("failed to list observations: {e}"))?;

    let mut shown = 0;
    for o in &observations {
        let active = o.get(&s.state_attribute) == Some(&Value::Integer(ACTIVE));
        if !all && !active {
            continue;
        }
        let short_id = o.id.map(|id| id.to_string()[..8].to_string()).unwrap_or_default();
        let status = if active { "active" } else { "inactive" };
        let name = o.get_str(&s.name_attribute).unwrap_or("(no name)");
        println!("{short_id}  [{status}]  {name}");
        shown += 1;
    }

    if shown == 0 {
        println!("No observations");
    }
    Ok(())
}

pub(super) fn cmd_deactivate(config: &Config, storage: &Storage, id: Uuid) -> Result<(), String> {
    let s = &config.schema;
    let mut observation = storage
        .load_record(id)
        .map_err(|e| format!("failed to load observation: {e}"))?;

    if observation.logical_name != s.observation_entity {
        return Err(format!(
            "{id} is a {}, not a {}",
            observation.logical_name, s.observation_entity
        ));
    }

    observation.set(&s.state_attribute, INACTIVE);
    storage
        .update_record(&observation)
        .map_err(|e| format!("failed to update observation: {e}"))?;

    eprintln!("Observation {} deactivated", &id.to_string()[..8]);
    Ok(())
}
