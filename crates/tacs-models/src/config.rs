use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::message::AgentCapability;

/// Top-level configuration for TACS.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TacsConfig {
    pub store: StoreConfig,
    pub coordinator: CoordinatorConfig,
    pub fast_path: FastPathConfig,
    pub agents: AgentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path to the coordinator's SQLite state database.
    pub sqlite_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: "data/tacs_state.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoordinatorConfig {
    /// Full wall-clock budget for the consensus wait.
    pub consensus_timeout_ms: u64,
    /// Cadence of the queue-drain tick (one message per tick).
    pub queue_drain_interval_ms: u64,
    /// Active decisions older than this are garbage collected.
    pub decision_max_age_secs: u64,
    /// Only this many most-recent queue entries are persisted.
    pub queue_persist_limit: usize,
    /// When true, a fast-path internal fault falls through to the consensus
    /// path instead of degrading to WAIT.
    pub fall_through_on_fast_path_fault: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            consensus_timeout_ms: 5_000,
            queue_drain_interval_ms: 1_000,
            decision_max_age_secs: 3_600,
            queue_persist_limit: 100,
            fall_through_on_fast_path_fault: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FastPathConfig {
    /// Internal latency budget; overruns are logged, never raised.
    pub latency_budget_ms: u64,
    /// Hard stop: no new entries once daily P&L breaches -limit.
    pub daily_loss_limit: Decimal,
    /// Soft target: shrink entry sizing once exceeded.
    pub daily_profit_target: Decimal,
    /// Entries are blocked after this many consecutive losing trades.
    pub max_consecutive_losses: u32,
    /// How long the consecutive-loss block lasts.
    pub loss_cooldown_minutes: i64,
    /// Position size in units before volatility scaling.
    pub base_position_size: Decimal,
    /// Minimum percent change to consider a momentum entry.
    pub entry_change_threshold: Decimal,
    /// Minimum volume to consider a momentum entry.
    pub min_volume: u64,
    /// Realized volatility above this shrinks sizing.
    pub high_volatility_threshold: Decimal,
    /// Realized volatility below this grows sizing modestly.
    pub low_volatility_threshold: Decimal,
}

impl Default for FastPathConfig {
    fn default() -> Self {
        Self {
            latency_budget_ms: 50,
            daily_loss_limit: Decimal::from(500),
            daily_profit_target: Decimal::from(500),
            max_consecutive_losses: 3,
            loss_cooldown_minutes: 30,
            base_position_size: Decimal::ONE,
            entry_change_threshold: Decimal::new(30, 2), // 0.30%
            min_volume: 1_000_000,
            high_volatility_threshold: Decimal::new(30, 2),
            low_volatility_threshold: Decimal::new(10, 2),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentsConfig {
    /// Model used by inference-backed agents.
    pub model: String,
    /// Per-agent inference timeout.
    pub agent_timeout_seconds: u64,
    /// Capabilities to register. Defaults to all seven.
    pub enabled: Vec<AgentCapability>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-latest".to_string(),
            agent_timeout_seconds: 45,
            enabled: AgentCapability::ALL.to_vec(),
        }
    }
}
