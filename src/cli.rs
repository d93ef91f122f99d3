//! CLI interface for reportgen.
//!
//! Each subcommand is non-interactive: arguments in, plain output out.
//! Record ids are printed on stdout, one per line; diagnostics go to stderr.

mod entity;
mod observation;
mod record;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::{config::Config, storage::Storage};

use entity::EntityCommand;
use observation::ObservationCommand;

/// Reportgen: generate report observations when records are created.
#[derive(Debug, Parser)]
#[command(name = "reportgen", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Entity store database. Overrides `store` in the config file.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// User id the report handler runs on behalf of.
    #[arg(long, global = true)]
    user: Option<Uuid>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow:
  1. reportgen init
  2. reportgen observation add "Temp High"
  3. reportgen observation add "Pressure Low"
  4. reportgen create br_report --name "Weekly inspection"
     → prints the report id, then one id per report observation
  5. reportgen records br_reportobservation"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register the entities the report handler reads and writes.
    Init,

    /// Manage entity definitions.
    Entity {
        #[command(subcommand)]
        command: EntityCommand,
    },

    /// Manage observations.
    Observation {
        #[command(subcommand)]
        command: ObservationCommand,
    },

    /// Create a record. Creating the trigger entity runs the report handler.
    Create {
        /// Entity logical name.
        entity: String,

        /// Value for the name attribute.
        #[arg(long)]
        name: Option<String>,
    },

    /// Run the report handler again for an existing record.
    Replay {
        /// Record id.
        id: Uuid,
    },

    /// Print all records of an entity as JSON lines.
    Records {
        /// Entity logical name.
        entity: String,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();

    let path = cli
        .store
        .or_else(|| config.store_path())
        .ok_or("could not determine home directory")?;
    let storage = Storage::open(&path)
        .map_err(|e| format!("failed to open store at {}: {e}", path.display()))?;

    match cli.command {
        Command::Init => entity::cmd_init(config, &storage),
        Command::Entity { command } => match command {
            EntityCommand::Register { name } => entity::cmd_register(&storage, &name),
            EntityCommand::List => entity::cmd_list(&storage),
        },
        Command::Observation { command } => match command {
            ObservationCommand::Add { name, inactive } => {
                observation::cmd_add(config, &storage, &name, inactive)
            }
            ObservationCommand::List { all } => observation::cmd_list(config, &storage, all),
            ObservationCommand::Deactivate { id } => {
                observation::cmd_deactivate(config, &storage, id)
            }
        },
        Command::Create { entity, name } => {
            record::cmd_create(config, &storage, cli.user, &entity, name.as_deref())
        }
        Command::Replay { id } => record::cmd_replay(config, &storage, cli.user, id),
        Command::Records { entity } => record::cmd_records(&storage, &entity),
    }
}
