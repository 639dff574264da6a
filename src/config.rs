use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use paperboy::agent::HttpAgentConfig;
use paperboy::gateway::HttpGatewayConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub scheduler: SchedulerConfig,
    pub agent: AgentConfig,
    pub storage: StorageConfig,
    pub tui: TuiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub base_url: String,
    pub schedule_id: String,
    pub api_key_env: Option<String>,
    pub timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            schedule_id: "698e0f2debe6fd87d1dcc1c0".to_string(),
            api_key_env: Some("PAPERBOY_API_KEY".to_string()),
            timeout_ms: 15000,
        }
    }
}

impl SchedulerConfig {
    pub fn gateway_config(&self) -> HttpGatewayConfig {
        HttpGatewayConfig {
            base_url: self.base_url.clone(),
            api_key: read_api_key(self.api_key_env.as_deref()),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub base_url: String,
    pub agent_id: String,
    pub api_key_env: Option<String>,
    pub timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            agent_id: "698e0f28a96cf8dd37d6a829".to_string(),
            api_key_env: Some("PAPERBOY_API_KEY".to_string()),
            timeout_ms: 300000,
        }
    }
}

impl AgentConfig {
    pub fn client_config(&self) -> HttpAgentConfig {
        HttpAgentConfig {
            base_url: self.base_url.clone(),
            api_key: read_api_key(self.api_key_env.as_deref()),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("paperboy"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    pub tick_rate_ms: u64,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 250 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            scheduler: SchedulerConfig::default(),
            agent: AgentConfig::default(),
            storage: StorageConfig::default(),
            tui: TuiConfig::default(),
        }
    }
}

fn read_api_key(var: Option<&str>) -> Option<String> {
    var.and_then(|name| std::env::var(name).ok()).filter(|key| !key.is_empty())
}

impl Config {
    /// Resolve the config: explicit path, then the user config dir, then the
    /// working directory, then built-in defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidates() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => log::warn!("Skipping config {}: {:#}", candidate.display(), e),
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// `~/.config/paperboy/paperboy.yml`, then `./paperboy.yml`
    fn candidates() -> Vec<PathBuf> {
        let file_name = format!("{}.yml", env!("CARGO_PKG_NAME"));
        dirs::config_dir()
            .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join(&file_name))
            .into_iter()
            .chain(std::iter::once(PathBuf::from(&file_name)))
            .collect()
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
