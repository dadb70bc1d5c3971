//! Client side of the reasoning-engine exchange.
//!
//! A consultation publishes `"<label>:<facts>"` on the outbound channel, then
//! reads the shared inbound topic until a frame addressed to this agent's
//! numeric identity arrives. Replies for other agents are dropped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::bus::{Bus, Subscription};
use crate::config::AgentConfig;
use crate::error::{BusError, ConsultError};
use crate::facts::AgentIdentity;
use crate::frame::{format_outbound, parse_frame};

/// Anything that can turn a fact bundle into an action directive.
#[async_trait]
pub trait Reasoner: Send {
    async fn consult(
        &mut self,
        fact_text: &str,
        identity: AgentIdentity,
        agent_label: &str,
    ) -> Result<String, ConsultError>;
}

pub struct ReasoningClient {
    bus: Arc<dyn Bus>,
    inbound: Box<dyn Subscription>,
    outbound_channel: String,
    timeout: Duration,
}

impl std::fmt::Debug for ReasoningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningClient")
            .field("inbound_topic", &self.inbound.topic())
            .field("outbound_channel", &self.outbound_channel)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ReasoningClient {
    /// Subscribes to the inbound topic immediately so no reply can be missed.
    pub async fn connect(bus: Arc<dyn Bus>, config: &AgentConfig) -> Result<Self, BusError> {
        let inbound = bus.subscribe(&config.inbound_topic).await?;
        info!(agent = config.id, topic = %config.inbound_topic, "subscribed to reasoner replies");
        Ok(Self {
            bus,
            inbound,
            outbound_channel: config.outbound_channel.clone(),
            timeout: config.consult_timeout(),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Drops replies left over from earlier consultations, such as one that
    /// arrived after its request timed out.
    fn drain_stale(&mut self, identity: AgentIdentity) -> Result<usize, BusError> {
        let mut dropped = 0;
        while let Some(stale) = self.inbound.try_next_frame()? {
            debug!(agent = %identity, frame = %stale, "dropping stale reply");
            dropped += 1;
        }
        Ok(dropped)
    }

    async fn await_reply(&mut self, identity: AgentIdentity) -> Result<String, ConsultError> {
        loop {
            let raw = self.inbound.next_frame().await?;
            let (addressee, payload) = match parse_frame(&raw) {
                Ok(parts) => parts,
                Err(err) => {
                    warn!(agent = %identity, error = %err, "ignoring malformed frame");
                    continue;
                }
            };
            match addressee.parse::<u32>() {
                Ok(id) if id == identity.numeric_id() => {
                    info!(agent = %identity, action = %payload, "received action");
                    return Ok(payload.to_string());
                }
                Ok(_) => debug!(agent = %identity, addressee, "discarding reply for another agent"),
                Err(_) => {
                    warn!(agent = %identity, addressee, "ignoring frame with non-numeric addressee")
                }
            }
        }
    }
}

#[async_trait]
impl Reasoner for ReasoningClient {
    /// Sends a fact bundle and waits for the first reply addressed to `identity`.
    ///
    /// Only replies that arrive after the bundle is published can answer it.
    async fn consult(
        &mut self,
        fact_text: &str,
        identity: AgentIdentity,
        agent_label: &str,
    ) -> Result<String, ConsultError> {
        self.drain_stale(identity)?;
        let frame = format_outbound(agent_label, fact_text);
        self.bus.publish(&self.outbound_channel, &frame).await?;
        debug!(agent = %agent_label, channel = %self.outbound_channel, "published fact bundle");

        let timeout = self.timeout;
        match tokio::time::timeout(timeout, self.await_reply(identity)).await {
            Ok(reply) => reply,
            Err(_) => Err(ConsultError::Timeout {
                agent: identity.numeric_id(),
                waited: timeout,
            }),
        }
    }
}
