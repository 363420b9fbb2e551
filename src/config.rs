//! YAML configuration.
//!
//! Looked up from `--config`, then `$WORKSPACE_CLI_CONFIG`; with neither set
//! the defaults apply. Example:
//!
//! ```yaml
//! workspace: ./workspace.json
//! batch_size: 25
//! page_size: 50
//! shorthand:
//!   status: Stage
//!   assignee: Owner
//! aliases:
//!   me: 6f1c2a3b-4d5e-4f60-8a7b-9c0d1e2f3a4b
//! ```

use std::{
    collections::BTreeMap,
    env,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{filter::ShorthandProperties, workspace::AliasResolver};

pub const CONFIG_ENV: &str = "WORKSPACE_CLI_CONFIG";
pub const DEFAULT_WORKSPACE_FILE: &str = "workspace.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub workspace: Option<PathBuf>,
    pub batch_size: Option<i64>,
    pub page_size: Option<usize>,
    pub shorthand: ShorthandConfig,
    pub aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShorthandConfig {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config file {path:?}"))?;
        Ok(config)
    }

    /// Loads the explicit path, else the environment's, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match env::var_os(CONFIG_ENV) {
            Some(value) if !value.is_empty() => {
                let path = PathBuf::from(value);
                debug!("Using config from ${CONFIG_ENV}: {path:?}");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `--workspace` wins over the config file.
    pub fn workspace_path(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.workspace.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE_FILE))
    }

    pub fn shorthand_properties(&self) -> ShorthandProperties {
        let defaults = ShorthandProperties::default();
        ShorthandProperties {
            status: self.shorthand.status.clone().unwrap_or(defaults.status),
            priority: self.shorthand.priority.clone().unwrap_or(defaults.priority),
            assignee: self.shorthand.assignee.clone().unwrap_or(defaults.assignee),
        }
    }
}

impl AliasResolver for Config {
    fn resolve(&self, token: &str) -> String {
        self.aliases
            .get(token)
            .or_else(|| {
                self.aliases
                    .iter()
                    .find(|(alias, _)| alias.eq_ignore_ascii_case(token))
                    .map(|(_, id)| id)
            })
            .cloned()
            .unwrap_or_else(|| token.to_string())
    }
}
