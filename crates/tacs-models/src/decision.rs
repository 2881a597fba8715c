use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::AgentCapability;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    EnterPosition,
    ExitPosition,
    AdjustPosition,
    Hold,
    Wait,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalDirection {
    Long,
    Short,
    Flat,
}

/// A single directional signal contributing to a decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub symbol: String,
    pub direction: SignalDirection,
    /// 0.0 to 1.0.
    pub strength: Decimal,
    pub source: AgentCapability,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    /// Worst-case loss for the sized position.
    pub max_loss: Decimal,
    /// Volatility-scaled position size (units of base size).
    pub position_size: Decimal,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpectedOutcome {
    pub expected_return: Decimal,
    /// 0.0 to 1.0.
    pub win_probability: Decimal,
    /// Holding-period hint (e.g., "4h", "1d").
    pub holding_period: String,
}

/// The decision produced by either the fast path or the consensus builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradingDecision {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: TradeAction,
    pub signals: Vec<Signal>,
    /// 0.0 to 1.0, clamped at every construction site.
    pub confidence: Decimal,
    pub reasoning: String,
    pub risk_assessment: Option<RiskAssessment>,
    pub expected_outcome: Option<ExpectedOutcome>,
}

impl TradingDecision {
    pub fn new(action: TradeAction, confidence: Decimal, reasoning: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            signals: Vec::new(),
            confidence: clamp_confidence(confidence),
            reasoning: reasoning.into(),
            risk_assessment: None,
            expected_outcome: None,
        }
    }

    /// A conservative WAIT, used whenever the system degrades.
    pub fn wait(confidence: Decimal, reasoning: impl Into<String>) -> Self {
        Self::new(TradeAction::Wait, confidence, reasoning)
    }
}

/// Clamp a confidence figure into [0, 1].
pub fn clamp_confidence(confidence: Decimal) -> Decimal {
    confidence.clamp(Decimal::ZERO, Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn roundtrip_decision() {
        let mut decision = TradingDecision::new(
            TradeAction::EnterPosition,
            dec!(0.8),
            "momentum above entry threshold",
        );
        decision.signals.push(Signal {
            symbol: "SPY".to_string(),
            direction: SignalDirection::Long,
            strength: dec!(0.7),
            source: AgentCapability::MarketAnalysis,
            rationale: "positive change on elevated volume".to_string(),
        });
        decision.risk_assessment = Some(RiskAssessment {
            max_loss: dec!(250.00),
            position_size: dec!(0.75),
            notes: vec!["size reduced under elevated volatility".to_string()],
        });
        decision.expected_outcome = Some(ExpectedOutcome {
            expected_return: dec!(0.016),
            win_probability: dec!(0.8),
            holding_period: "1d".to_string(),
        });

        let json = serde_json::to_string(&decision).unwrap();
        let deserialized: TradingDecision = serde_json::from_str(&json).unwrap();
        assert_eq!(decision, deserialized);
    }

    #[test]
    fn confidence_clamped_on_construction() {
        let high = TradingDecision::new(TradeAction::Hold, dec!(1.7), "test");
        assert_eq!(high.confidence, Decimal::ONE);

        let low = TradingDecision::wait(dec!(-0.2), "test");
        assert_eq!(low.confidence, Decimal::ZERO);
    }

    #[test]
    fn action_serialization() {
        assert_eq!(
            serde_json::to_string(&TradeAction::EnterPosition).unwrap(),
            "\"enter_position\""
        );
        assert_eq!(serde_json::to_string(&TradeAction::Wait).unwrap(), "\"wait\"");
    }
}
