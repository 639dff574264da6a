//! HTTP client for the agent invocation service

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{Value, json};

use super::{AgentClient, InvocationError};

/// Default agent endpoint
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Configuration for the agent client
#[derive(Debug, Clone)]
pub struct HttpAgentConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpAgentConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            // Scanning and summarizing takes minutes, not seconds
            timeout: Duration::from_secs(300),
        }
    }
}

impl HttpAgentConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Agent client over HTTP/JSON
pub struct HttpAgentClient {
    client: Client,
    config: HttpAgentConfig,
}

impl HttpAgentClient {
    pub fn new(config: HttpAgentConfig) -> Result<Self, InvocationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InvocationError::Unreachable(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn url(&self, agent_id: &str) -> String {
        format!("{}/agents/{}/invoke", self.config.base_url.trim_end_matches('/'), agent_id)
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn invoke(&self, agent_id: &str, instruction: &str) -> Result<Value, InvocationError> {
        let url = self.url(agent_id);
        debug!("POST {} ({} chars)", url, instruction.len());

        let mut request = self.client.post(&url).json(&json!({ "message": instruction }));
        if let Some(key) = &self.config.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InvocationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<Value>().await?)
    }
}
