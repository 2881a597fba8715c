pub mod config;
pub mod decision;
pub mod message;
pub mod performance;
pub mod persisted;
pub mod snapshot;

pub use config::{AgentsConfig, CoordinatorConfig, FastPathConfig, StoreConfig, TacsConfig};
pub use decision::{
    clamp_confidence, ExpectedOutcome, RiskAssessment, Signal, SignalDirection, TradeAction,
    TradingDecision,
};
pub use message::{AgentCapability, Message, MessageKind, MessagePriority, MessageTarget};
pub use performance::{PerformanceState, PerformanceUpdate};
pub use persisted::{PersistedState, STATE_KEY};
pub use snapshot::{MarketData, MarketSnapshot, Position};
