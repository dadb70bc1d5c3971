//! Error taxonomy for the agent control core.

use std::time::Duration;

use thiserror::Error;

/// A bus frame without the `addressee:payload` delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("malformed frame (no ':' delimiter): {raw:?}")]
    Malformed { raw: String },
}

/// An action text the actuator cannot route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("unknown action verb: {action:?}")]
    UnknownVerb { action: String },

    #[error("malformed parameter {value:?} in action {action:?}")]
    BadParameter { action: String, value: String },
}

/// The sensing backend could not produce a reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensingError {
    #[error("sensing backend failed with code {code}: {message}")]
    Backend { code: i32, message: String },

    #[error("no more readings available")]
    Exhausted,
}

/// The actuator backend rejected a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("actuator failed executing {command:?}: {message}")]
pub struct ActuatorError {
    pub command: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("subscription to {topic:?} closed")]
    Closed { topic: String },

    #[error("publish to {channel:?} failed: {message}")]
    Publish { channel: String, message: String },
}

/// Failure to obtain a correlated reply from the reasoning engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsultError {
    #[error("no reply for agent {agent} within {waited:?}")]
    Timeout { agent: u32, waited: Duration },

    #[error(transparent)]
    Bus(#[from] BusError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate agent id {0} in deployment")]
    DuplicateAgent(u32),
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error(transparent)]
    Store(#[from] sled::Error),

    #[error("failed to encode decision record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Everything that can end a control cycle.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Sensing(#[from] SensingError),

    #[error(transparent)]
    Unroutable(#[from] ActionError),

    #[error(transparent)]
    Actuator(#[from] ActuatorError),

    #[error(transparent)]
    Consult(#[from] ConsultError),

    #[error(transparent)]
    Journal(#[from] JournalError),
}

pub type AgentResult<T> = Result<T, AgentError>;
