mod runner;

use counting_blackjack::{BlackjackCountingEnv, Rule};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub use runner::{run_episodes, EpisodeHandler, EpisodeRecord, Statistics};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rule: ConfigRule,
    #[serde(default)]
    pub runner: ConfigRunner,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigRule {
    #[serde(default)]
    pub natural: bool,
    #[serde(default)]
    pub sab: bool,
}

impl From<ConfigRule> for Rule {
    fn from(config_rule: ConfigRule) -> Rule {
        Rule {
            natural: config_rule.natural,
            sab: config_rule.sab,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRunner {
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_episodes")]
    pub episodes: u64,
}

fn default_episodes() -> u64 {
    1000
}

impl Default for ConfigRunner {
    fn default() -> Self {
        ConfigRunner {
            seed: 0,
            episodes: default_episodes(),
        }
    }
}

impl Config {
    /// Builds a seeded environment following the configured rule.
    pub fn build_env(&self) -> BlackjackCountingEnv {
        BlackjackCountingEnv::new(self.rule.clone().into(), self.runner.seed)
    }
}

/// Parses a YAML config.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Reads the content of a given config file and parses it to a Config.
pub fn parse_config_from_file<P: AsRef<Path>>(filename: P) -> Result<Config, ConfigError> {
    let file_content = fs::read_to_string(filename)?;
    parse_config(&file_content)
}
