//! Runs a complete in-process deployment: scripted robots, their agents, the
//! relay and the rule-based reasoner, all sharing one memory bus.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::task::JoinSet;
use tracing::{error, info};

use mas_agent_core::bus::{Bus, MemoryBus};
use mas_agent_core::config::DeploymentConfig;
use mas_agent_core::journal::DecisionJournal;
use mas_agent_core::relay::RelayForwarder;
use mas_agent_core::rules::RuleReasoner;
use mas_agent_core::sim::{delivery_script, ScriptedRobot};
use mas_agent_core::{Agent, AgentConfig, ReasoningClient};

#[derive(Parser, Debug)]
#[command(
    name = "mas-agent",
    version,
    about = "Simulated robot agents driven by a reasoning engine"
)]
struct Cli {
    /// Deployment description (TOML). Overrides --agents.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of agents when no config file is given.
    #[arg(long, default_value_t = 2)]
    agents: u32,

    /// First agent id when no config file is given.
    #[arg(long, default_value_t = 19999)]
    first_id: u32,

    /// Control cycles per agent.
    #[arg(long, default_value_t = 12)]
    cycles: usize,

    /// Persist consultations to this sled directory.
    #[arg(long)]
    journal: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut deployment = match &cli.config {
        Some(path) => DeploymentConfig::load(path)?,
        None => DeploymentConfig::with_agents(cli.first_id, cli.agents),
    };
    if cli.journal.is_some() {
        deployment.journal_path = cli.journal.clone();
    }
    let journal = deployment
        .journal_path
        .as_deref()
        .map(DecisionJournal::open)
        .transpose()?;

    let bus: Arc<dyn Bus> = Arc::new(MemoryBus::new());

    // One relay/reasoner pair per distinct channel layout.
    let mut layouts: Vec<(String, String)> = deployment
        .agents
        .iter()
        .map(|a| (a.outbound_channel.clone(), a.inbound_topic.clone()))
        .collect();
    layouts.sort();
    layouts.dedup();
    let mut relays = JoinSet::new();
    for (outbound, inbound) in layouts {
        let reasoner = RuleReasoner::new(bus.clone(), &inbound);
        let relay = RelayForwarder::connect(bus.clone(), &outbound, reasoner).await?;
        relays.spawn(relay.run());
    }

    let mut agents = JoinSet::new();
    for config in deployment.agents {
        let robot = ScriptedRobot::new(delivery_script(cli.cycles))
            .with_turning_speed(config.turning_speed);
        let mut agent = Agent::connect(bus.clone(), &config, robot).await?;
        if let Some(journal) = &journal {
            agent = agent.with_journal(journal.clone());
        }
        agents.spawn(drive(agent, config, cli.cycles));
    }

    let mut failures = 0;
    while let Some(joined) = agents.join_next().await {
        match joined {
            Ok(true) => {}
            Ok(false) => failures += 1,
            Err(err) => {
                error!(error = %err, "agent task panicked");
                failures += 1;
            }
        }
    }
    relays.abort_all();

    if let Some(journal) = &journal {
        info!(records = journal.records_since(0)?.len(), "journal written");
    }
    if failures > 0 {
        return Err(format!("{failures} agent(s) failed").into());
    }
    Ok(())
}

/// Runs `cycles` control cycles; returns false on the first failure.
async fn drive(
    mut agent: Agent<ReasoningClient, ScriptedRobot>,
    config: AgentConfig,
    cycles: usize,
) -> bool {
    for _ in 0..cycles {
        if let Err(err) = agent.step().await {
            error!(agent = %config.label(), error = %err, "agent stopped on error");
            return false;
        }
    }
    info!(
        agent = %config.label(),
        load = %agent.robot().load(),
        halts = agent.robot().halts(),
        "agent finished"
    );
    true
}
