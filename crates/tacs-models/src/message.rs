use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The fixed set of agent capabilities the coordinator can host.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentCapability {
    MarketAnalysis,
    StrategyOptimization,
    RiskManagement,
    PerformanceTracking,
    Execution,
    FlowAnalysis,
    OpportunityScanning,
}

impl AgentCapability {
    /// All capabilities, in registry order.
    pub const ALL: [AgentCapability; 7] = [
        AgentCapability::MarketAnalysis,
        AgentCapability::StrategyOptimization,
        AgentCapability::RiskManagement,
        AgentCapability::PerformanceTracking,
        AgentCapability::Execution,
        AgentCapability::FlowAnalysis,
        AgentCapability::OpportunityScanning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentCapability::MarketAnalysis => "market_analysis",
            AgentCapability::StrategyOptimization => "strategy_optimization",
            AgentCapability::RiskManagement => "risk_management",
            AgentCapability::PerformanceTracking => "performance_tracking",
            AgentCapability::Execution => "execution",
            AgentCapability::FlowAnalysis => "flow_analysis",
            AgentCapability::OpportunityScanning => "opportunity_scanning",
        }
    }
}

impl std::fmt::Display for AgentCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a message is addressed. `Broadcast` fans out to every registered
/// agent; `Coordinator` messages are handled by the coordinator itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageTarget {
    Coordinator,
    Agent(AgentCapability),
    Broadcast,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    MarketUpdate,
    AnalysisResult,
    SignalGenerated,
    RiskAlert,
    ExecutionRequest,
    ExecutionResult,
    PerformanceUpdate,
    StrategyAdjustment,
    StopTrading,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MessagePriority {
    Low,
    Normal,
    High,
    Critical,
}

/// A protocol envelope exchanged between the coordinator and agents.
/// Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub from: MessageTarget,
    pub to: MessageTarget,
    pub kind: MessageKind,
    /// Opaque payload; its shape is a contract between sender and receiver.
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub priority: MessagePriority,
    pub requires_response: bool,
}

impl Message {
    pub fn new(
        from: MessageTarget,
        to: MessageTarget,
        kind: MessageKind,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
            kind,
            payload,
            timestamp: Utc::now(),
            priority: MessagePriority::Normal,
            requires_response: false,
        }
    }

    pub fn with_priority(mut self, priority: MessagePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn requiring_response(mut self) -> Self {
        self.requires_response = true;
        self
    }

    pub fn is_critical(&self) -> bool {
        self.priority == MessagePriority::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_broadcast_message() {
        let message = Message::new(
            MessageTarget::Coordinator,
            MessageTarget::Broadcast,
            MessageKind::MarketUpdate,
            serde_json::json!({"symbol": "SPY", "price": "445.50"}),
        )
        .with_priority(MessagePriority::High)
        .requiring_response();

        let json = serde_json::to_string(&message).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(message, deserialized);
        assert!(deserialized.requires_response);
    }

    #[test]
    fn roundtrip_targeted_message() {
        let message = Message::new(
            MessageTarget::Agent(AgentCapability::MarketAnalysis),
            MessageTarget::Coordinator,
            MessageKind::AnalysisResult,
            serde_json::json!({"recommendation": "buy", "confidence": "0.8"}),
        );

        let json = serde_json::to_string(&message).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(
            deserialized.from,
            MessageTarget::Agent(AgentCapability::MarketAnalysis)
        );
    }

    #[test]
    fn critical_priority() {
        let message = Message::new(
            MessageTarget::Coordinator,
            MessageTarget::Broadcast,
            MessageKind::StopTrading,
            serde_json::json!({"reason": "daily loss limit"}),
        )
        .with_priority(MessagePriority::Critical);

        assert!(message.is_critical());
        assert!(MessagePriority::Critical > MessagePriority::High);
    }

    #[test]
    fn capability_serialization() {
        assert_eq!(
            serde_json::to_string(&AgentCapability::MarketAnalysis).unwrap(),
            "\"market_analysis\""
        );
        assert_eq!(AgentCapability::ALL.len(), 7);
    }
}
