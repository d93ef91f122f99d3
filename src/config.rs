//! Reportgen configuration.
//!
//! Loaded from `~/.reportgen/config.toml`. Defaults apply when the file is missing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Reportgen configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Entity store database. Defaults to `~/.reportgen/store.sqlite`.
    pub store: Option<PathBuf>,

    /// Entity whose creation fires the report handler.
    pub trigger_entity: String,

    /// Entity and attribute names the handler reads and writes.
    pub schema: Schema,
}

/// Logical names used by the report handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Schema {
    /// Entity queried for active observations.
    pub observation_entity: String,

    /// Display-name attribute, shared by observations and report observations.
    pub name_attribute: String,

    /// Integer state attribute; `0` is active.
    pub state_attribute: String,

    /// Entity created once per active observation.
    pub report_observation_entity: String,

    /// Report observation field holding the observation's name.
    pub observation_field: String,

    /// Report observation field referencing the triggering record.
    pub report_field: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: None,
            trigger_entity: "br_report".to_string(),
            schema: Schema::default(),
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            observation_entity: "br_observation".to_string(),
            name_attribute: "br_name".to_string(),
            state_attribute: "statecode".to_string(),
            report_observation_entity: "br_reportobservation".to_string(),
            observation_field: "br_observation".to_string(),
            report_field: "br_report".to_string(),
        }
    }
}

impl Config {
    /// Load config from `~/.reportgen/config.toml`, or defaults if it doesn't exist.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`, or defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if let Some(key) = config.first_empty_key() {
            return Err(format!("{key} is empty in {}", path.display()));
        }

        Ok(config)
    }

    /// The config file path: `~/.reportgen/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".reportgen").join("config.toml"))
    }

    /// The entity store path: `store` if set, otherwise `~/.reportgen/store.sqlite`.
    pub fn store_path(&self) -> Option<PathBuf> {
        self.store.clone().or_else(|| {
            dirs::home_dir().map(|h| h.join(".reportgen").join("store.sqlite"))
        })
    }

    fn first_empty_key(&self) -> Option<&'static str> {
        let s = &self.schema;
        [
            ("trigger-entity", &self.trigger_entity),
            ("schema.observation-entity", &s.observation_entity),
            ("schema.name-attribute", &s.name_attribute),
            ("schema.state-attribute", &s.state_attribute),
            ("schema.report-observation-entity", &s.report_observation_entity),
            ("schema.observation-field", &s.observation_field),
            ("schema.report-field", &s.report_field),
        ]
        .into_iter()
        .find(|(_, value)| value.is_empty())
        .map(|(key, _)| key)
    }
}
