mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use tracing::debug;

/// Environment variables checked, in order, for the model API key.
const API_KEY_VARS: [&str; 2] = ["LLM_API_KEY", "GITHUB_TOKEN"];

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    debug!("Loading configuration from: {}", config_path);

    let config_str = tokio::fs::read_to_string(&config_path).await?;
    let mut config = Config::from_yaml_str(&config_str)?;

    if let Some(key) = API_KEY_VARS.iter().find_map(|var| env::var(var).ok()) {
        config.llm.api_key = key;
    }

    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.trim().is_empty() {
            return Err(Error::config(format!(
                "no model API key: set llm.api_key or one of {}",
                API_KEY_VARS.join(", ")
            )));
        }
        if self.llm.model.trim().is_empty() {
            return Err(Error::config("llm.model must not be empty"));
        }
        Ok(())
    }
}
