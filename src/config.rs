//! Agent and deployment configuration.
//!
//! Every field has a default matching the reference deployment, so a TOML file
//! only needs to list what differs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::facts::{AgentIdentity, DEPTH_THRESHOLD};

/// Channel the relay listens on for fact bundles.
pub const DEFAULT_OUTBOUND_CHANNEL: &str = "LINDAchannel";

/// Topic the reasoning engine publishes actions on.
pub const DEFAULT_INBOUND_TOPIC: &str = "fromMAS";

/// Robot kind; the first half of an agent label.
pub const DEFAULT_KIND_PREFIX: &str = "turtlebot";

/// Per-agent settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Numeric identity; the routing key for replies.
    pub id: u32,
    /// Robot kind, e.g. `turtlebot`.
    pub kind_prefix: String,
    /// Channel fact bundles are published on.
    pub outbound_channel: String,
    /// Topic shared by all agents for reasoner replies.
    pub inbound_topic: String,
    /// How long a consultation may wait for a correlated reply.
    pub consult_timeout_ms: u64,
    /// Depth at or below which the obstacle is near.
    pub depth_threshold: f64,
    /// Depth drift from the last consulted depth that counts as a change.
    pub depth_hysteresis: f64,
    /// Impulsive replays allowed before the reasoner must be consulted again.
    pub max_impulses: u8,
    /// Wheel speed used for in-place turns.
    pub turning_speed: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: 0,
            kind_prefix: DEFAULT_KIND_PREFIX.to_string(),
            outbound_channel: DEFAULT_OUTBOUND_CHANNEL.to_string(),
            inbound_topic: DEFAULT_INBOUND_TOPIC.to_string(),
            consult_timeout_ms: 30_000,
            depth_threshold: DEPTH_THRESHOLD,
            depth_hysteresis: 0.02,
            max_impulses: 5,
            turning_speed: 1.5,
        }
    }
}

impl AgentConfig {
    /// Default settings for agent `id`.
    pub fn with_id(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn identity(&self) -> AgentIdentity {
        AgentIdentity(self.id)
    }

    /// Name the agent is addressed by on the outbound channel.
    pub fn label(&self) -> String {
        format!("{}_{}", self.kind_prefix, self.id)
    }

    /// `consult_timeout_ms` as a [`Duration`].
    pub fn consult_timeout(&self) -> Duration {
        Duration::from_millis(self.consult_timeout_ms)
    }
}

/// A set of agents sharing one bus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// One entry per agent; ids must be unique.
    pub agents: Vec<AgentConfig>,
    /// Where to persist the decision journal; `None` disables it.
    pub journal_path: Option<PathBuf>,
}

impl DeploymentConfig {
    /// Parses and validates a TOML deployment description.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DeploymentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// `count` agents with consecutive ids starting at `first_id`.
    pub fn with_agents(first_id: u32, count: u32) -> Self {
        Self {
            agents: (first_id..first_id + count)
                .map(AgentConfig::with_id)
                .collect(),
            journal_path: None,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for agent in &self.agents {
            if !seen.insert(agent.id) {
                return Err(ConfigError::DuplicateAgent(agent.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = AgentConfig::with_id(19999);
        assert_eq!(config.label(), "turtlebot_19999");
        assert_eq!(config.outbound_channel, "LINDAchannel");
        assert_eq!(config.inbound_topic, "fromMAS");
        assert_eq!(config.depth_threshold, 0.17);
        assert_eq!(config.max_impulses, 5);
        assert_eq!(config.identity(), AgentIdentity(19999));
    }

    #[test]
    fn toml_overrides_only_listed_fields() {
        let config = DeploymentConfig::from_toml_str(
            r#"
            journal_path = "/tmp/decisions"

            [[agents]]
            id = 19999

            [[agents]]
            id = 20000
            kind_prefix = "rover"
            consult_timeout_ms = 500
            "#,
        )
        .expect("valid config");

        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents[0].label(), "turtlebot_19999");
        assert_eq!(config.agents[1].label(), "rover_20000");
        assert_eq!(
            config.agents[1].consult_timeout(),
            Duration::from_millis(500)
        );
        assert_eq!(config.journal_path, Some(PathBuf::from("/tmp/decisions")));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = DeploymentConfig::from_toml_str("[[agents]]\nid = 3\n[[agents]]\nid = 3\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateAgent(3)));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = DeploymentConfig::from_toml_str("agents = 7").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = DeploymentConfig::load(Path::new("/nonexistent/mas.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
