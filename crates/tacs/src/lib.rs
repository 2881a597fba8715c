//! TACS - Trading Agent Coordination System
//!
//! A multi-agent trading decision engine: specialist Claude CLI agents
//! analyze market snapshots under a coordinator that merges their responses
//! into one decision, with a synchronous fast path for latency-sensitive
//! calls.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use tacs::models::TacsConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = TacsConfig::default();
//! let handle = tacs::build_coordinator(&config).await?;
//! let _ = handle.status().await?;
//! # Ok(())
//! # }
//! ```

pub use tacs_agents as agents;
pub use tacs_coordinator as coordinator;
pub use tacs_models as models;
pub use tacs_store as store;

use std::sync::Arc;
use std::time::Duration;

use tacs_agents::{
    Agent, ClaudeCliClient, ExecutionAgent, InferenceAgent, InferenceConfig, PaperExecutionClient,
};
use tacs_coordinator::{
    spawn_coordinator, AgentFactory, CoordinatorError, CoordinatorHandle, NullBroadcast,
};
use tacs_models::{AgentCapability, MarketSnapshot, TacsConfig, TradingDecision};
use tacs_store::SqliteStore;

/// Build and spawn a coordinator from configuration: SQLite-backed state,
/// one inference agent per enabled capability, and paper execution.
pub async fn build_coordinator(config: &TacsConfig) -> Result<CoordinatorHandle, anyhow::Error> {
    if !tacs_agents::check_cli_available().await {
        tracing::warn!("claude CLI not found; inference agents will fail until it is installed");
    }

    let store = SqliteStore::open(&config.store.sqlite_path)?;

    let agents_config = config.agents.clone();
    let factory: AgentFactory = Box::new(move || {
        agents_config
            .enabled
            .iter()
            .map(|&capability| match capability {
                AgentCapability::Execution => Arc::new(ExecutionAgent::new(Arc::new(
                    PaperExecutionClient::new(),
                ))) as Arc<dyn Agent>,
                _ => {
                    let client = Arc::new(ClaudeCliClient::new(InferenceConfig {
                        model: agents_config.model.clone(),
                        timeout: Duration::from_secs(agents_config.agent_timeout_seconds),
                    }));
                    Arc::new(InferenceAgent::new(capability, client)) as Arc<dyn Agent>
                }
            })
            .collect()
    });

    let handle = spawn_coordinator(
        config.clone(),
        factory,
        Arc::new(store),
        Arc::new(NullBroadcast::new()),
    )
    .await?;
    Ok(handle)
}

/// Produce one decision for a snapshot using the given coordinator.
pub async fn decide(
    handle: &CoordinatorHandle,
    snapshot: MarketSnapshot,
    use_fast_path: bool,
) -> Result<TradingDecision, CoordinatorError> {
    handle.decide(snapshot, use_fast_path).await
}
