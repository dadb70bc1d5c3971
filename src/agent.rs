//! The sense → think → act loop of one agent.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use crate::brain::{Brain, Decision, Phase};
use crate::bus::Bus;
use crate::command::Command;
use crate::config::AgentConfig;
use crate::error::{ActuatorError, AgentResult, BusError, SensingError};
use crate::facts::AgentIdentity;
use crate::journal::{DecisionJournal, DecisionRecord};
use crate::perception::{normalize, RawReading};
use crate::reasoning::{Reasoner, ReasoningClient};

/// The sensing/actuation backend of one robot.
pub trait Robot: Send {
    /// Reads the current sensors.
    fn sense(&mut self) -> Result<RawReading, SensingError>;

    /// Executes one command.
    fn act(&mut self, command: &Command) -> Result<(), ActuatorError>;

    /// Halts the robot. Safe to call at any time.
    fn stop(&mut self) -> Result<(), ActuatorError>;
}

/// One agent: a brain, the robot it drives and an optional journal.
pub struct Agent<R, B> {
    brain: Brain<R>,
    robot: B,
    journal: Option<DecisionJournal>,
    cycles: u64,
}

impl<B: Robot> Agent<ReasoningClient, B> {
    /// Subscribes to the reply topic and builds an agent around `robot`.
    pub async fn connect(
        bus: Arc<dyn Bus>,
        config: &AgentConfig,
        robot: B,
    ) -> Result<Self, BusError> {
        let client = ReasoningClient::connect(bus, config).await?;
        Ok(Self::new(config, client, robot))
    }
}

impl<R: Reasoner, B: Robot> Agent<R, B> {
    pub fn new(config: &AgentConfig, reasoner: R, robot: B) -> Self {
        Self {
            brain: Brain::new(config, reasoner),
            robot,
            journal: None,
            cycles: 0,
        }
    }

    /// Records every consultation in `journal`.
    pub fn with_journal(mut self, journal: DecisionJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn identity(&self) -> AgentIdentity {
        self.brain.identity()
    }

    pub fn phase(&self) -> Phase {
        self.brain.phase()
    }

    /// Completed control cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn robot(&self) -> &B {
        &self.robot
    }

    /// One full control cycle. Any error aborts the cycle before acting.
    pub async fn step(&mut self) -> AgentResult<Decision> {
        let reading = self.robot.sense()?;
        let state = normalize(&reading);
        let decision = self.brain.think(state, &mut self.robot).await?;

        if let Some(journal) = &self.journal {
            if let Some(record) = DecisionRecord::from_decision(self.identity(), &decision) {
                journal.record(&record)?;
            }
        }

        self.robot.act(&decision.command)?;
        self.cycles += 1;
        info!(
            agent = %self.identity(),
            cycle = self.cycles,
            trigger = ?decision.trigger,
            action = %decision.command,
            "cycle complete"
        );
        Ok(decision)
    }

    /// Runs cycles until `shutdown` becomes true or its sender goes away.
    ///
    /// Returns the number of completed cycles, or the first error so a
    /// supervisor can decide whether to restart the agent.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> AgentResult<u64> {
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                result = self.step() => {
                    if let Err(err) = result {
                        error!(agent = %self.identity(), error = %err, "control cycle failed");
                        return Err(err);
                    }
                }
            }
        }
        info!(agent = %self.identity(), cycles = self.cycles, "agent stopped");
        Ok(self.cycles)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::brain::Trigger;
    use crate::error::{ActionError, AgentError, ConsultError};
    use crate::perception::{Color, Load, Position};
    use crate::sim::ScriptedRobot;

    struct Fixed(&'static str);

    #[async_trait]
    impl Reasoner for Fixed {
        async fn consult(
            &mut self,
            _fact_text: &str,
            _identity: AgentIdentity,
            _agent_label: &str,
        ) -> Result<String, ConsultError> {
            Ok(self.0.to_string())
        }
    }

    fn readings(n: usize) -> Vec<RawReading> {
        vec![RawReading::new(Color::Green, Position::Left, 0.8, Load::Empty); n]
    }

    #[tokio::test]
    async fn step_executes_decided_command() {
        let mut agent = Agent::new(
            &AgentConfig::with_id(1),
            Fixed("left:15"),
            ScriptedRobot::new(readings(2)),
        );

        let first = agent.step().await.unwrap();
        assert_eq!(first.trigger, Trigger::Initial);
        let second = agent.step().await.unwrap();
        assert_eq!(second.trigger, Trigger::Impulse);

        assert_eq!(
            agent.robot().executed(),
            &[Command::Left(15), Command::Left(15)]
        );
        assert_eq!(agent.robot().halts(), 1);
        assert_eq!(agent.cycles(), 2);
        assert_eq!(agent.phase(), Phase::Stable(1));
    }

    #[tokio::test]
    async fn unroutable_action_fails_the_cycle() {
        let mut agent = Agent::new(
            &AgentConfig::with_id(1),
            Fixed("dance"),
            ScriptedRobot::new(readings(1)),
        );
        let err = agent.step().await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::Unroutable(ActionError::UnknownVerb { .. })
        ));
        assert!(agent.robot().executed().is_empty());
        assert_eq!(agent.cycles(), 0);
        assert_eq!(agent.phase(), Phase::Uninitialized);
    }

    #[tokio::test]
    async fn sensing_failure_surfaces_from_run() {
        let mut agent = Agent::new(
            &AgentConfig::with_id(1),
            Fixed("go:1"),
            ScriptedRobot::new(readings(3)),
        );
        let (_tx, rx) = watch::channel(false);
        let err = agent.run(rx).await.unwrap_err();
        assert!(matches!(err, AgentError::Sensing(SensingError::Exhausted)));
        assert_eq!(agent.cycles(), 3);
    }

    #[tokio::test]
    async fn run_returns_immediately_when_already_shut_down() {
        let mut agent = Agent::new(
            &AgentConfig::with_id(1),
            Fixed("go:1"),
            ScriptedRobot::new(readings(3)),
        );
        let (_tx, rx) = watch::channel(true);
        assert_eq!(agent.run(rx).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_a_pending_consultation() {
        let bus = crate::bus::MemoryBus::new();
        let config = AgentConfig::with_id(4);
        let mut agent = Agent::connect(Arc::new(bus), &config, ScriptedRobot::new(readings(1)))
            .await
            .unwrap();

        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = tx.send(true);
        });
        assert_eq!(agent.run(rx).await.unwrap(), 0);
        assert_eq!(agent.phase(), Phase::Uninitialized);
    }

    #[tokio::test]
    async fn consultations_are_journalled() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let journal = DecisionJournal::from_db(db);
        let mut agent = Agent::new(
            &AgentConfig::with_id(6),
            Fixed("go:2"),
            ScriptedRobot::new(readings(3)),
        )
        .with_journal(journal.clone());

        for _ in 0..3 {
            agent.step().await.unwrap();
        }
        let records = journal.records_for(AgentIdentity(6)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].trigger, Trigger::Initial);
        assert!(records[0].facts.contains("vision(green,left)."));
    }
}
