//! Runtime configuration for the `aggwalk` binary.
//!
//! Layers, lowest priority first: built-in defaults, the TOML file
//! (`aggwalk.toml`, or whatever `AGGWALK_CONFIG` points at), then
//! `AGGWALK_*` environment variables. A `.env` file is loaded into the
//! process environment before anything is read.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use tracing::debug;

use crate::error::Result;
use crate::source::DEFAULT_SECTION;
use crate::walk::{AccumulatorScope, KeyField, WalkOptions};

pub const DEFAULT_CONFIG_FILE: &str = "aggwalk";
pub const CONFIG_PATH_VAR: &str = "AGGWALK_CONFIG";
pub const ENV_PREFIX: &str = "AGGWALK";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed table of the first `head` rows.
    #[default]
    Table,
    /// Every record as one JSON object per line.
    Jsonl,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Response bodies to flatten.
    pub inputs: Vec<String>,
    /// Section of each response holding the aggregation tree.
    pub section: String,
    pub output: OutputFormat,
    /// Rows shown per input in table output.
    pub head: usize,
    /// Worker threads; rayon's default when unset.
    pub num_threads: Option<usize>,
    /// Directory for a daily rolling log file, in addition to stderr.
    pub log_dir: Option<String>,
    pub scope: AccumulatorScope,
    pub key_field: KeyField,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            section: DEFAULT_SECTION.to_string(),
            output: OutputFormat::Table,
            head: 20,
            num_threads: None,
            log_dir: None,
            scope: AccumulatorScope::Shared,
            key_field: KeyField::Key,
        }
    }
}

impl AppConfig {
    /// Load `.env`, the config file and the environment.
    pub fn load() -> Result<Self> {
        let loaded_env = dotenvy::dotenv().ok();
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        debug!(config = %path, dotenv = ?loaded_env, "loading configuration");

        Self::from_sources(&path, Environment::with_prefix(ENV_PREFIX))
    }

    /// Build from an explicit file path and environment source. The file is
    /// optional unless `path` names one explicitly via `AGGWALK_CONFIG`.
    pub fn from_sources(path: &str, environment: Environment) -> Result<Self> {
        let required = path != DEFAULT_CONFIG_FILE;

        let cfg = Config::builder()
            .add_source(File::with_name(path).required(required))
            .add_source(
                environment
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("inputs"),
            )
            .build()?;

        Ok(cfg.try_deserialize()?)
    }

    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            scope: self.scope,
            key_field: self.key_field,
        }
    }
}
