//! Fact bundle encoding.
//!
//! The reasoning engine receives a fixed-shape bundle: dynamic declarations
//! followed by `vision/2`, `depth/1`, `load/1` and `agentname/1`. The bundle is
//! regenerated from scratch on every consultation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::perception::{CanonicalState, Position};

/// Depth at or below which an obstacle counts as near.
pub const DEPTH_THRESHOLD: f64 = 0.17;

/// Declarations prefixed to every bundle.
pub const DYNAMIC_DECLARATIONS: &str =
    ":- dynamic vision/2. :- dynamic depth/1. :- dynamic load/1. :- dynamic agentname/1.";

/// Numeric identity of an agent; routing key on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentIdentity(pub u32);

impl AgentIdentity {
    pub fn numeric_id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse depth category reported to the reasoner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthClass {
    Near,
    Far,
}

impl DepthClass {
    /// Near at or below `threshold`, or when the blob is near.
    pub fn classify(state: &CanonicalState, threshold: f64) -> Self {
        if state.depth <= threshold || state.position == Position::Near {
            DepthClass::Near
        } else {
            DepthClass::Far
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DepthClass::Near => "near",
            DepthClass::Far => "far",
        }
    }
}

/// Renders the fact bundle using the default depth threshold.
pub fn encode_facts(state: &CanonicalState, identity: AgentIdentity) -> String {
    encode_facts_with_threshold(state, identity, DEPTH_THRESHOLD)
}

pub fn encode_facts_with_threshold(
    state: &CanonicalState,
    identity: AgentIdentity,
    threshold: f64,
) -> String {
    let depth = DepthClass::classify(state, threshold);
    format!(
        "{DYNAMIC_DECLARATIONS} vision({},{}). depth({}). load({}). agentname('{}:').",
        state.color,
        state.position,
        depth.as_str(),
        state.load,
        identity,
    )
}

/// Recovers the identity from an encoded bundle's `agentname('<id>:')` fact.
pub fn agent_identity_of(bundle: &str) -> Option<AgentIdentity> {
    let start = bundle.find("agentname('")? + "agentname('".len();
    let rest = &bundle[start..];
    let end = rest.find(":')")?;
    rest[..end].parse().ok().map(AgentIdentity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::{Color, Load};

    fn state(color: Color, position: Position, depth: f64, load: Load) -> CanonicalState {
        CanonicalState {
            color,
            position,
            depth,
            load,
        }
    }

    #[test]
    fn first_cycle_bundle_is_exact() {
        let s = state(Color::Red, Position::Center, 0.5, Load::Empty);
        let text = encode_facts(&s, AgentIdentity(19999));
        assert_eq!(
            text,
            ":- dynamic vision/2. :- dynamic depth/1. :- dynamic load/1. :- dynamic agentname/1. \
             vision(red,center). depth(far). load(empty). agentname('19999:')."
        );
    }

    #[test]
    fn depth_at_threshold_is_near() {
        let s = state(Color::None, Position::None, 0.17, Load::Full);
        assert!(encode_facts(&s, AgentIdentity(1)).contains("depth(near)."));
        let s = state(Color::None, Position::None, 0.17001, Load::Full);
        assert!(encode_facts(&s, AgentIdentity(1)).contains("depth(far)."));
    }

    #[test]
    fn near_position_forces_near_depth() {
        let s = state(Color::Green, Position::Near, 3.0, Load::Empty);
        let text = encode_facts(&s, AgentIdentity(2));
        assert!(text.contains("vision(green,near). depth(near)."));
    }

    #[test]
    fn encoding_is_deterministic() {
        let s = state(Color::Green, Position::Left, 0.9, Load::Full);
        assert_eq!(
            encode_facts(&s, AgentIdentity(4)),
            encode_facts(&s, AgentIdentity(4))
        );
    }

    #[test]
    fn identity_recovered_from_bundle() {
        let s = state(Color::Red, Position::Right, 0.4, Load::Empty);
        let text = encode_facts(&s, AgentIdentity(42));
        assert_eq!(agent_identity_of(&text), Some(AgentIdentity(42)));
        assert_eq!(agent_identity_of("vision(red,left)."), None);
    }
}
