//! Decision state machine.
//!
//! Each cycle either consults the reasoning engine or replays the previous
//! action ("impulsive" action). Consultation happens on the first cycle, when
//! the world changed, when the impulse budget is spent, and whenever an
//! obstacle is near. The depth the reasoner last saw is the hysteresis
//! reference, so slow drift accumulates until it crosses the threshold.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::Robot;
use crate::command::Command;
use crate::config::AgentConfig;
use crate::error::AgentResult;
use crate::facts::{encode_facts_with_threshold, AgentIdentity};
use crate::perception::{CanonicalState, Position};
use crate::reasoning::Reasoner;

/// Slack for depths that are equal up to floating-point rounding.
const DEPTH_EPSILON: f64 = 1e-9;

/// Why a cycle produced its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// First cycle; the reasoner has not been consulted yet.
    Initial,
    /// Categories changed, or depth drifted past the hysteresis band.
    WorldChanged,
    /// Too many impulsive replays in a row.
    ImpulseOverflow,
    /// Safety override; see [`Brain::is_near`].
    NearObstacle,
    /// Previous action replayed without consultation.
    Impulse,
}

impl Trigger {
    /// False only for replays.
    pub fn consulted(self) -> bool {
        self != Trigger::Impulse
    }
}

/// Outcome of one decision cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// The directive as the reasoner sent it.
    pub action: String,
    /// `action`, parsed.
    pub command: Command,
    pub trigger: Trigger,
    /// The fact bundle sent, when the reasoner was consulted.
    pub facts: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    /// Holding the last directive; the value is the impulse count.
    Stable(u8),
}

#[derive(Debug, Clone)]
struct Memory {
    state: CanonicalState,
    impulses: u8,
    last_action: String,
    last_command: Command,
    reference_depth: f64,
}

/// Per-agent decision state. Owned by exactly one control loop.
pub struct Brain<R> {
    identity: AgentIdentity,
    label: String,
    depth_threshold: f64,
    depth_hysteresis: f64,
    max_impulses: u8,
    reasoner: R,
    memory: Option<Memory>,
}

impl<R: Reasoner> Brain<R> {
    pub fn new(config: &AgentConfig, reasoner: R) -> Self {
        Self {
            identity: config.identity(),
            label: config.label(),
            depth_threshold: config.depth_threshold,
            depth_hysteresis: config.depth_hysteresis,
            max_impulses: config.max_impulses,
            reasoner,
            memory: None,
        }
    }

    /// Identity the brain consults as.
    pub fn identity(&self) -> AgentIdentity {
        self.identity
    }

    /// `Uninitialized` until the first successful consultation.
    pub fn phase(&self) -> Phase {
        match &self.memory {
            None => Phase::Uninitialized,
            Some(memory) => Phase::Stable(memory.impulses),
        }
    }

    /// The directive being replayed.
    pub fn last_action(&self) -> Option<&str> {
        self.memory.as_ref().map(|m| m.last_action.as_str())
    }

    /// Depth the reasoner was last consulted with.
    pub fn reference_depth(&self) -> Option<f64> {
        self.memory.as_ref().map(|m| m.reference_depth)
    }

    /// State seen on the last completed cycle.
    pub fn state(&self) -> Option<&CanonicalState> {
        self.memory.as_ref().map(|m| &m.state)
    }

    /// True if `new` differs from `old` enough to warrant a fresh directive.
    pub fn changed(
        &self,
        old: &CanonicalState,
        new: &CanonicalState,
        reference_depth: f64,
    ) -> bool {
        old.categories_differ(new)
            || (new.depth - reference_depth).abs() + DEPTH_EPSILON >= self.depth_hysteresis
    }

    /// Safety override: near depth or a blob filling the view.
    pub fn is_near(&self, state: &CanonicalState) -> bool {
        state.depth <= self.depth_threshold || state.position == Position::Near
    }

    fn trigger_for(&self, new: &CanonicalState) -> Trigger {
        let Some(memory) = &self.memory else {
            return Trigger::Initial;
        };
        if self.changed(&memory.state, new, memory.reference_depth) {
            Trigger::WorldChanged
        } else if self.is_near(new) {
            Trigger::NearObstacle
        } else if memory.impulses >= self.max_impulses {
            // `>=`: the sixth unchanged cycle consults, keeping the count in 0..=5.
            Trigger::ImpulseOverflow
        } else {
            Trigger::Impulse
        }
    }

    /// Runs one decision cycle for `state`.
    ///
    /// On a consultation the robot is halted first. If the consultation fails,
    /// or the reply is not a known action, the brain keeps its previous state
    /// untouched.
    pub async fn think(
        &mut self,
        state: CanonicalState,
        robot: &mut dyn Robot,
    ) -> AgentResult<Decision> {
        let trigger = self.trigger_for(&state);

        if let (Trigger::Impulse, Some(memory)) = (trigger, self.memory.as_mut()) {
            memory.state = state;
            memory.impulses += 1;
            debug!(agent = %self.identity, impulses = memory.impulses, "replaying previous action");
            return Ok(Decision {
                action: memory.last_action.clone(),
                command: memory.last_command,
                trigger,
                facts: None,
            });
        }

        debug!(agent = %self.identity, ?trigger, %state, "consulting reasoner");
        robot.stop()?;
        let facts = encode_facts_with_threshold(&state, self.identity, self.depth_threshold);
        let action = self
            .reasoner
            .consult(&facts, self.identity, &self.label)
            .await?;
        let command = Command::parse(&action)?;

        self.memory = Some(Memory {
            state,
            impulses: 0,
            last_action: action.clone(),
            last_command: command,
            reference_depth: state.depth,
        });
        Ok(Decision {
            action,
            command,
            trigger,
            facts: Some(facts),
        })
    }
}
