use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use topica_chat::{Topic, TopicRegistry};
use topica_gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiConfig};

use crate::error::ToolError;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct ChatConfig {
    pub model: Option<String>,
    /// Topic id selected at startup.
    pub topic: Option<String>,
    /// 0 disables the timeout.
    pub request_timeout_secs: Option<u64>,
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LogConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub model: Option<String>,
    pub topic: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub topic: Topic,
    pub timeout: Option<Duration>,
    pub base_url: String,
}

impl ChatSettings {
    pub fn gemini_config(&self) -> GeminiConfig {
        let config = GeminiConfig::new(self.api_key.clone())
            .with_model(self.model.clone())
            .with_base_url(self.base_url.clone());
        match self.timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("topica").join("config.toml"))
}

/// Loads the config file. An explicit `path` must exist; the default location
/// may be absent, in which case defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<Config, ToolError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };

    let content = std::fs::read_to_string(&path)?;
    parse_config(&content).map_err(|source| ToolError::Config { path, source })
}

pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

/// The environment value wins when it is non-empty.
pub fn pick_api_key(env_value: Option<String>, config_value: Option<&str>) -> Option<String> {
    env_value
        .filter(|key| !key.trim().is_empty())
        .or_else(|| config_value.map(String::from))
}

pub fn resolve_api_key(config: &Config) -> Option<String> {
    pick_api_key(
        std::env::var(API_KEY_ENV).ok(),
        config.gemini_api_key.as_deref(),
    )
}

pub fn resolve_topic(registry: &TopicRegistry, id: Option<&str>) -> Result<Topic, ToolError> {
    match id {
        None => Ok(registry.default_topic().clone()),
        Some(id) => registry
            .find(id)
            .cloned()
            .ok_or_else(|| ToolError::UnknownTopic {
                id: id.to_string(),
                available: registry.ids().join(", "),
            }),
    }
}

pub fn resolve_settings(
    config: &Config,
    api_key: Option<String>,
    overrides: &Overrides,
    registry: &TopicRegistry,
) -> Result<ChatSettings, ToolError> {
    let topic_id = overrides.topic.as_deref().or(config.chat.topic.as_deref());
    let topic = resolve_topic(registry, topic_id)?;

    let model = overrides
        .model
        .clone()
        .or_else(|| config.chat.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let timeout_secs = overrides
        .timeout_secs
        .or(config.chat.request_timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

    let base_url = config
        .chat
        .base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    Ok(ChatSettings {
        api_key,
        model,
        topic,
        timeout,
        base_url,
    })
}
