//! Persistent journal of reasoner consultations (Sled).
//!
//! Records are keyed `<timestamp:020>_<id>` so a prefix scan returns them in
//! chronological order. Only consultations are recorded; impulsive replays
//! carry no new information.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::brain::{Decision, Trigger};
use crate::error::JournalError;
use crate::facts::AgentIdentity;

const DECISIONS_TREE: &str = "decisions";

/// One consultation: the bundle sent and the directive received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub agent_id: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub trigger: Trigger,
    pub facts: String,
    pub action: String,
}

impl DecisionRecord {
    /// Builds a record for a consultation; `None` for impulsive decisions.
    pub fn from_decision(identity: AgentIdentity, decision: &Decision) -> Option<Self> {
        if !decision.trigger.consulted() {
            return None;
        }
        let facts = decision.facts.clone()?;
        Some(Self {
            agent_id: identity.numeric_id(),
            timestamp_ms: now_ms(),
            trigger: decision.trigger,
            facts,
            action: decision.action.clone(),
        })
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Shared handle; clones write to the same database.
#[derive(Debug, Clone)]
pub struct DecisionJournal {
    db: sled::Db,
}

impl DecisionJournal {
    /// Opens or creates the journal at `path`.
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        Ok(Self {
            db: sled::open(path)?,
        })
    }

    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    pub fn record(&self, record: &DecisionRecord) -> Result<(), JournalError> {
        let tree = self.db.open_tree(DECISIONS_TREE)?;
        let id = self.db.generate_id()?;
        let key = format!("{:020}_{id:020}", record.timestamp_ms);
        let value = serde_json::to_vec(record)?;

        tree.insert(key.as_bytes(), value)?;
        tree.flush()?;
        debug!(agent = record.agent_id, key = %key, "journalled decision");
        Ok(())
    }

    /// All records with `timestamp_ms >= start_ms`, oldest first.
    pub fn records_since(&self, start_ms: u64) -> Result<Vec<DecisionRecord>, JournalError> {
        let tree = self.db.open_tree(DECISIONS_TREE)?;
        let start = format!("{start_ms:020}");

        let mut records = Vec::new();
        for entry in tree.range(start.as_bytes()..) {
            let (_, value) = entry?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }

    pub fn records_for(
        &self,
        identity: AgentIdentity,
    ) -> Result<Vec<DecisionRecord>, JournalError> {
        Ok(self
            .records_since(0)?
            .into_iter()
            .filter(|r| r.agent_id == identity.numeric_id())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    fn journal() -> DecisionJournal {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .expect("failed to open temporary sled db");
        DecisionJournal::from_db(db)
    }

    fn record(agent_id: u32, timestamp_ms: u64, action: &str) -> DecisionRecord {
        DecisionRecord {
            agent_id,
            timestamp_ms,
            trigger: Trigger::WorldChanged,
            facts: "vision(red,left).".to_string(),
            action: action.to_string(),
        }
    }

    #[test]
    fn records_come_back_in_time_order() {
        let journal = journal();
        journal.record(&record(1, 300, "stop")).unwrap();
        journal.record(&record(2, 100, "go:2")).unwrap();
        journal.record(&record(1, 200, "left:15")).unwrap();

        let actions: Vec<_> = journal
            .records_since(0)
            .unwrap()
            .into_iter()
            .map(|r| r.action)
            .collect();
        assert_eq!(actions, ["go:2", "left:15", "stop"]);

        let recent = journal.records_since(200).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(journal.records_for(AgentIdentity(1)).unwrap().len(), 2);
    }

    #[test]
    fn impulsive_decisions_produce_no_record() {
        let decision = Decision {
            action: "go:2".to_string(),
            command: Command::Go(2),
            trigger: Trigger::Impulse,
            facts: None,
        };
        assert!(DecisionRecord::from_decision(AgentIdentity(1), &decision).is_none());

        let decision = Decision {
            facts: Some("depth(far).".to_string()),
            trigger: Trigger::Initial,
            ..decision
        };
        let record = DecisionRecord::from_decision(AgentIdentity(1), &decision).unwrap();
        assert_eq!(record.trigger, Trigger::Initial);
        assert_eq!(record.facts, "depth(far).");
    }
}
