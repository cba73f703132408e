use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::configuration::Configuration;
use crate::process::ProcessCommand;

/// The JSON document given to the binary.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub wrapper: WrapperSettings,
    #[serde(rename = "match")]
    pub match_config: Option<MatchConfig>,
    pub scenario: Option<ScenarioConfig>,
}

/// The `wrapper` block. Missing values keep the ones of the base [`Configuration`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapperSettings {
    pub timebank_max: Option<u64>,
    pub time_per_move: Option<u64>,
    pub max_timeouts: Option<u32>,
    pub engine_timeout: Option<u64>,
    /// In MB.
    pub max_memory: Option<u64>,
    pub debug: Option<bool>,
    pub propagate_bot_exit_code: Option<bool>,
    pub log: Option<bool>,
    pub result_file: PathBuf,
}

impl WrapperSettings {
    pub fn apply(&self, mut config: Configuration) -> Configuration {
        if let Some(ms) = self.timebank_max {
            config = config.with_timebank_max(Duration::from_millis(ms));
        }
        if let Some(ms) = self.time_per_move {
            config = config.with_time_per_move(Duration::from_millis(ms));
        }
        if let Some(n) = self.max_timeouts {
            config = config.with_max_timeouts(n);
        }
        if let Some(ms) = self.engine_timeout {
            config = config.with_engine_timeout(Duration::from_millis(ms));
        }
        if let Some(mb) = self.max_memory {
            config = config.with_max_memory(mb);
        }
        if let Some(value) = self.debug {
            config = config.with_debug(value);
        }
        if let Some(value) = self.propagate_bot_exit_code {
            config = config.with_propagate_bot_exit_code(value);
        }
        if let Some(value) = self.log {
            config = config.with_log(value);
        }
        config
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub command: ProcessCommand,
    /// Forwarded to the engine as is, serialized on one line.
    #[serde(default = "empty_object")]
    pub configuration: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub command: ProcessCommand,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    pub engine: EngineConfig,
    pub bots: Vec<BotConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Bot,
    Engine,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectConfig {
    #[serde(rename = "type")]
    pub kind: SubjectKind,
    pub command: ProcessCommand,
    #[serde(default = "empty_object")]
    pub configuration: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioConfig {
    pub scenario: Vec<String>,
    pub subject: SubjectConfig,
}

/// What the binary should run.
#[derive(Debug, Clone)]
pub enum RunMode {
    Match(MatchConfig),
    Scenario(ScenarioConfig),
}

impl RunConfig {
    pub fn parse(json: &str) -> anyhow::Result<RunConfig> {
        serde_json::from_str(json).context("invalid run configuration")
    }

    /// `match` wins if both are present.
    pub fn mode(&self) -> anyhow::Result<RunMode> {
        if let Some(match_config) = &self.match_config {
            Ok(RunMode::Match(match_config.clone()))
        } else if let Some(scenario) = &self.scenario {
            Ok(RunMode::Scenario(scenario.clone()))
        } else {
            bail!("Config does not contain either match or scenario")
        }
    }
}
