//! HTTP implementation of the scheduler gateway.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::wire::{AckEnvelope, LogEnvelope, StatusEnvelope, normalize_log};
use super::{GatewayError, ScheduleGateway};
use crate::domain::{ExecutionLogEntry, ScheduleStatus};

/// Default scheduler endpoint
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Configuration for the HTTP gateway
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(15),
        }
    }
}

impl HttpGatewayConfig {
    /// Create a config pointing at a specific base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Scheduler gateway over HTTP/JSON
pub struct HttpScheduleGateway {
    client: Client,
    config: HttpGatewayConfig,
}

impl HttpScheduleGateway {
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, schedule_id: &str, suffix: &str) -> String {
        format!(
            "{}/schedules/{}{}",
            self.config.base_url.trim_end_matches('/'),
            schedule_id,
            suffix
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.header("x-api-key", key),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, GatewayError> {
        let response = self.authorized(builder).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn acknowledge(&self, schedule_id: &str, action: &str) -> Result<(), GatewayError> {
        let url = self.url(schedule_id, &format!("/{}", action));
        debug!("POST {}", url);
        let ack: AckEnvelope = self.send(self.client.post(&url)).await?;
        if ack.success {
            Ok(())
        } else {
            Err(GatewayError::Remote(
                ack.error.unwrap_or_else(|| format!("{} rejected", action)),
            ))
        }
    }
}

async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(GatewayError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ScheduleGateway for HttpScheduleGateway {
    async fn fetch_status(&self, schedule_id: &str) -> Result<ScheduleStatus, GatewayError> {
        let url = self.url(schedule_id, "");
        debug!("GET {}", url);
        let envelope: StatusEnvelope = self.send(self.client.get(&url)).await?;

        if !envelope.success {
            return Err(GatewayError::Remote(
                envelope.error.unwrap_or_else(|| "schedule lookup failed".to_string()),
            ));
        }

        envelope
            .schedule
            .ok_or_else(|| GatewayError::InvalidResponse("response has no schedule".to_string()))?
            .normalize()
    }

    async fn fetch_recent_log(&self, schedule_id: &str, limit: usize) -> Result<Vec<ExecutionLogEntry>, GatewayError> {
        let url = self.url(schedule_id, "/logs");
        debug!("GET {} (limit {})", url, limit);
        let envelope: LogEnvelope = self
            .send(self.client.get(&url).query(&[("limit", limit)]))
            .await?;

        if !envelope.success {
            return Err(GatewayError::Remote(
                envelope.error.unwrap_or_else(|| "log lookup failed".to_string()),
            ));
        }

        normalize_log(envelope.executions.unwrap_or_default(), limit)
    }

    async fn pause(&self, schedule_id: &str) -> Result<(), GatewayError> {
        self.acknowledge(schedule_id, "pause").await
    }

    async fn resume(&self, schedule_id: &str) -> Result<(), GatewayError> {
        self.acknowledge(schedule_id, "resume").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpGatewayConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_url_building() {
        let gateway = HttpScheduleGateway::new(HttpGatewayConfig::with_base_url("http://sched.local/api/")).unwrap();
        assert_eq!(gateway.url("abc", ""), "http://sched.local/api/schedules/abc");
        assert_eq!(gateway.url("abc", "/logs"), "http://sched.local/api/schedules/abc/logs");
    }
}
