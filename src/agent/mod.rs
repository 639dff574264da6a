//! Digest Run Invoker - external agent integration
//!
//! This module provides:
//! - `AgentClient` trait for the agent invocation service
//! - `HttpAgentClient` implementation over reqwest
//! - `DigestInvoker`, which builds the instruction, enforces one run at a
//!   time and validates the response envelope into a `DigestResult`

mod envelope;
mod http;
mod invoker;

use async_trait::async_trait;

pub use envelope::unwrap_envelope;
pub use http::{HttpAgentClient, HttpAgentConfig};
pub use invoker::DigestInvoker;

/// The agent invocation service: free-text instruction in, JSON out.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Submit one instruction and await the raw response envelope.
    async fn invoke(&self, agent_id: &str, instruction: &str) -> Result<serde_json::Value, InvocationError>;
}

/// Errors that can occur during a digest run
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("A digest run is already in progress")]
    Busy,

    #[error("Agent unreachable: {0}")]
    Unreachable(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Agent reported failure: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for InvocationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            InvocationError::Malformed(err.to_string())
        } else {
            InvocationError::Unreachable(err.to_string())
        }
    }
}

impl InvocationError {
    pub fn is_busy(&self) -> bool {
        matches!(self, InvocationError::Busy)
    }
}
