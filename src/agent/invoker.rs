//! One digest run: instruction in, validated `DigestResult` out.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use super::{AgentClient, InvocationError, unwrap_envelope};
use crate::domain::{DigestResult, Settings};

/// Runs digests through the external agent, one at a time.
pub struct DigestInvoker {
    client: Arc<dyn AgentClient>,
    in_flight: AtomicBool,
}

impl DigestInvoker {
    pub fn new(client: Arc<dyn AgentClient>) -> Self {
        Self {
            client,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a run is currently pending.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The natural-language instruction sent to the agent.
    pub fn build_instruction(settings: &Settings) -> String {
        format!(
            "Generate a research digest for the following categories: {}. Include up to {} papers. Send to: {}. Use {} summary style.",
            settings.category_codes().join(", "),
            settings.paper_limit,
            settings.email,
            settings.summary_depth.as_str()
        )
    }

    /// Run one digest. A second call while one is pending fails with `Busy`.
    pub async fn run(&self, agent_id: &str, settings: &Settings) -> Result<DigestResult, InvocationError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(InvocationError::Busy)?;

        let instruction = Self::build_instruction(settings);
        info!("Invoking agent {} for {} papers", agent_id, settings.paper_limit);

        let envelope = self.client.invoke(agent_id, &instruction).await?;
        match unwrap_envelope(envelope) {
            Ok(result) => {
                info!(
                    "Digest complete: {} of {} papers, sent={}",
                    result.papers_included, result.papers_analyzed, result.digest_sent
                );
                Ok(result)
            }
            Err(e) => {
                warn!("Agent returned an unusable envelope: {}", e);
                Err(e)
            }
        }
    }
}

/// Holds the in-flight flag for the duration of one run.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
