//! Control core for robot agents steered by an external reasoning engine.
//!
//! This crate defines:
//! - [`frame`]: the `addressee:payload` bus frame and payload atomization.
//! - [`facts`]: the fact bundle the reasoning engine consumes.
//! - [`perception`]: raw sensor readings and their canonical state.
//! - [`brain::Brain`]: the decision state machine (change detection with
//!   hysteresis, impulse throttling, near-obstacle override).
//! - [`reasoning::ReasoningClient`]: publishes bundles and waits for the reply
//!   addressed to this agent on the shared topic.
//! - [`agent::Agent`]: the sense → think → act loop around a [`agent::Robot`].
//! - [`relay::RelayForwarder`] and [`rules::RuleReasoner`]: the bus side of the
//!   reasoning engine, used to run complete deployments in-process.

pub mod agent;
pub mod brain;
pub mod bus;
pub mod command;
pub mod config;
pub mod error;
pub mod facts;
pub mod frame;
pub mod journal;
pub mod perception;
pub mod reasoning;
pub mod relay;
pub mod rules;
pub mod sim;

pub use agent::{Agent, Robot};
pub use brain::{Brain, Decision, Phase, Trigger};
pub use bus::{Bus, MemoryBus, Subscription};
pub use command::Command;
pub use config::{AgentConfig, DeploymentConfig};
pub use error::{AgentError, AgentResult};
pub use facts::{encode_facts, AgentIdentity};
pub use frame::{atomize, format_outbound, parse_frame};
pub use perception::{normalize, CanonicalState, RawReading};
pub use reasoning::{Reasoner, ReasoningClient};
