//! Relay from the bus into the reasoning engine's own transport.
//!
//! Each outbound frame `"<addressee>:<payload>"` becomes the term
//! `redis(<atomized payload>)` delivered to `<addressee>`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::bus::{Bus, Subscription};
use crate::error::BusError;
use crate::frame::{atomize, parse_frame};

/// Predicate wrapping every forwarded payload.
pub const REASONER_PREDICATE: &str = "redis";

/// The reasoning engine's native message transport.
#[async_trait]
pub trait ReasonerTransport: Send + Sync {
    /// Delivers `term` to the reasoner on behalf of `addressee`.
    async fn send_message(&self, addressee: &str, term: &str) -> Result<(), BusError>;
}

/// Forwards fact bundles from the bus to the reasoning engine.
pub struct RelayForwarder<T> {
    inbound: Box<dyn Subscription>,
    transport: T,
    forwarded: u64,
}

impl<T: ReasonerTransport> RelayForwarder<T> {
    /// Subscribes to `channel`; frames published before this are not seen.
    pub async fn connect(
        bus: Arc<dyn Bus>,
        channel: &str,
        transport: T,
    ) -> Result<Self, BusError> {
        let inbound = bus.subscribe(channel).await?;
        info!(channel, "relay listening");
        Ok(Self {
            inbound,
            transport,
            forwarded: 0,
        })
    }

    /// `redis(<atomized payload>)`.
    pub fn reasoner_term(payload: &str) -> String {
        format!("{REASONER_PREDICATE}({})", atomize(payload))
    }

    /// Frames delivered to the transport so far.
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Forwards the next well-formed frame, skipping malformed ones.
    ///
    /// Returns the addressee the term was delivered to.
    pub async fn forward_next(&mut self) -> Result<String, BusError> {
        loop {
            let raw = self.inbound.next_frame().await?;
            let (addressee, payload) = match parse_frame(&raw) {
                Ok(parts) => parts,
                Err(err) => {
                    warn!(error = %err, "relay dropping malformed frame");
                    continue;
                }
            };
            let term = Self::reasoner_term(payload);
            debug!(addressee, %term, "forwarding to reasoner");
            self.transport.send_message(addressee, &term).await?;
            self.forwarded += 1;
            return Ok(addressee.to_string());
        }
    }

    /// Forwards until the bus subscription closes.
    pub async fn run(mut self) -> Result<u64, BusError> {
        loop {
            match self.forward_next().await {
                Ok(_) => {}
                Err(BusError::Closed { topic }) => {
                    info!(%topic, forwarded = self.forwarded, "relay subscription closed");
                    return Ok(self.forwarded);
                }
                Err(err) => return Err(err),
            }
        }
    }
}
