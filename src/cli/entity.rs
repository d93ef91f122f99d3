//! Entity definition commands: init, register, list.

use clap::Subcommand;

use crate::{config::Config, storage::Storage};

#[derive(Debug, Subcommand)]
pub enum EntityCommand {
    /// Register an entity logical name.
    Register {
        /// Entity logical name (e.g. `account`).
        name: String,
    },

    /// List registered entities.
    List,
}

pub(super) fn cmd_init(config: &Config, storage: &Storage) -> Result<(), String> {
    let s = &config.schema;
    for name in [
        &s.observation_entity,
        &s.report_observation_entity,
        &config.trigger_entity,
    ] {
        cmd_register(storage, name)?;
    }
    Ok(())
}

pub(super) fn cmd_register(storage: &Storage, name: &str) -> Result<(), String> {
    let added = storage
        .register_entity(name)
        .map_err(|e| format!("failed to register entity: {e}"))?;

    if added {
        eprintln!("Registered {name}");
    } else {
        eprintln!("{name} already registered");
    }
    Ok(())
}

pub(super) fn cmd_list(storage: &Storage) -> Result<(), String> {
    let names = storage
        .list_entities()
        .map_err(|e| format!("failed to list entities: {e}"))?;

    if names.is_empty() {
        println!("No entities");
        return Ok(());
    }

    for name in names {
        println!("{name}");
    }
    Ok(())
}
