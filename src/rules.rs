//! A rule-based stand-in for the reasoning engine.
//!
//! Sits behind the relay: it receives `redis(<atomized bundle>)` terms
//! addressed to an agent label, picks an action from an ordered rule list and
//! publishes `"<id>:<action>"` on the reply topic. It is a deterministic
//! substitute for demos and tests, not a model of the real engine.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bus::Bus;
use crate::error::BusError;
use crate::frame::{atomize, format_outbound};
use crate::relay::ReasonerTransport;

/// IF every fact in `when` is present THEN `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactiveRule {
    pub id: String,
    pub when: Vec<String>,
    pub action: String,
}

impl ReactiveRule {
    pub fn new(id: &str, when: &[&str], action: &str) -> Self {
        Self {
            id: id.to_string(),
            when: when.iter().map(|f| f.to_string()).collect(),
            action: action.to_string(),
        }
    }

    /// Matches against plain or atomized bundle text alike.
    pub fn matches(&self, bundle: &str) -> bool {
        let bundle = atomize(bundle);
        self.when.iter().all(|fact| bundle.contains(&atomize(fact)))
    }
}

/// Action when no rule fires.
pub const DEFAULT_ACTION: &str = "right:30";

/// Delivery behaviour: fetch a green package, drop it at the red zone.
pub fn default_rules() -> Vec<ReactiveRule> {
    vec![
        ReactiveRule::new("pick_up_package", &["vision(green,near).", "load(empty)."], "loadup"),
        ReactiveRule::new("deliver_package", &["vision(red,near).", "load(full)."], "unload"),
        ReactiveRule::new("avoid_obstacle", &["depth(near)."], "right:90"),
        ReactiveRule::new("approach_package", &["vision(green,center).", "load(empty)."], "go:2"),
        ReactiveRule::new(
            "steer_to_package_left",
            &["vision(green,left).", "load(empty)."],
            "left:15",
        ),
        ReactiveRule::new(
            "steer_to_package_right",
            &["vision(green,right).", "load(empty)."],
            "right:15",
        ),
        ReactiveRule::new("approach_drop_zone", &["vision(red,center).", "load(full)."], "go:2"),
        ReactiveRule::new(
            "steer_to_drop_zone_left",
            &["vision(red,left).", "load(full)."],
            "left:15",
        ),
        ReactiveRule::new(
            "steer_to_drop_zone_right",
            &["vision(red,right).", "load(full)."],
            "right:15",
        ),
    ]
}

/// Answers forwarded bundles from a rule list.
pub struct RuleReasoner {
    rules: Vec<ReactiveRule>,
    default_action: String,
    bus: Arc<dyn Bus>,
    reply_topic: String,
}

impl RuleReasoner {
    pub fn new(bus: Arc<dyn Bus>, reply_topic: &str) -> Self {
        Self::with_rules(bus, reply_topic, default_rules())
    }

    pub fn with_rules(bus: Arc<dyn Bus>, reply_topic: &str, rules: Vec<ReactiveRule>) -> Self {
        Self {
            rules,
            default_action: DEFAULT_ACTION.to_string(),
            bus,
            reply_topic: reply_topic.to_string(),
        }
    }

    /// The first firing rule's action, or the default.
    pub fn decide(&self, bundle: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.matches(bundle))
            .map(|rule| {
                debug!(rule = %rule.id, "rule fired");
                rule.action.as_str()
            })
            .unwrap_or(self.default_action.as_str())
    }
}

/// `"turtlebot_7"` → `7`.
pub fn numeric_id_of_label(label: &str) -> Option<u32> {
    label.rsplit_once('_')?.1.parse().ok()
}

#[async_trait]
impl ReasonerTransport for RuleReasoner {
    async fn send_message(&self, addressee: &str, term: &str) -> Result<(), BusError> {
        let Some(id) = numeric_id_of_label(addressee) else {
            warn!(addressee, "no numeric id in agent label, dropping request");
            return Ok(());
        };
        let action = self.decide(term);
        self.bus
            .publish(&self.reply_topic, &format_outbound(&id.to_string(), action))
            .await?;
        Ok(())
    }
}
