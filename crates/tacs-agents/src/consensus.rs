use rust_decimal::Decimal;
use tacs_models::{
    clamp_confidence, AgentCapability, Message, MessageTarget, Signal, SignalDirection,
    TradeAction, TradingDecision,
};

use crate::parser::{payload_confidence, payload_recommendation};

/// Build one decision from a round of collected agent responses.
///
/// The rule is deliberately simple: it looks for one response attributed to
/// market-analysis and one to strategy-optimization. A buy-class market
/// recommendation with strategy concurrence present yields ENTER_POSITION,
/// a sell-class one yields EXIT_POSITION, anything else WAIT. Responses
/// from other capabilities are surfaced as signals but never change the
/// action.
pub fn build_consensus_decision(responses: &[Message]) -> TradingDecision {
    let market = response_from(responses, AgentCapability::MarketAnalysis);
    let strategy = response_from(responses, AgentCapability::StrategyOptimization);

    let confidence = market
        .and_then(|m| payload_confidence(&m.payload))
        .map(clamp_confidence)
        .unwrap_or_else(|| Decimal::new(5, 1));

    let (action, reasoning) = match (market, strategy) {
        (Some(market), Some(_)) => {
            let recommendation = payload_recommendation(&market.payload);
            let action = match recommendation.as_deref() {
                Some("buy") | Some("strong_buy") => TradeAction::EnterPosition,
                Some("sell") | Some("strong_sell") => TradeAction::ExitPosition,
                _ => TradeAction::Wait,
            };
            let reasoning = format!(
                "Consensus of market analysis and strategy optimization ({} responses): market recommendation {}",
                responses.len(),
                recommendation.as_deref().unwrap_or("none"),
            );
            (action, reasoning)
        }
        _ => {
            let reasoning = format!(
                "Consensus incomplete: market analysis {}, strategy optimization {} ({} responses)",
                presence(market),
                presence(strategy),
                responses.len(),
            );
            (TradeAction::Wait, reasoning)
        }
    };

    let mut decision = TradingDecision::new(action, confidence, reasoning);
    decision.signals = responses.iter().filter_map(signal_from).collect();
    decision
}

fn response_from(responses: &[Message], capability: AgentCapability) -> Option<&Message> {
    responses
        .iter()
        .find(|m| m.from == MessageTarget::Agent(capability))
}

fn presence(message: Option<&Message>) -> &'static str {
    if message.is_some() {
        "present"
    } else {
        "missing"
    }
}

fn signal_from(message: &Message) -> Option<Signal> {
    let MessageTarget::Agent(capability) = message.from else {
        return None;
    };
    let direction = match payload_recommendation(&message.payload).as_deref() {
        Some("buy") | Some("strong_buy") => SignalDirection::Long,
        Some("sell") | Some("strong_sell") => SignalDirection::Short,
        _ => SignalDirection::Flat,
    };
    Some(Signal {
        symbol: message
            .payload
            .get("symbol")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        direction,
        strength: payload_confidence(&message.payload)
            .map(clamp_confidence)
            .unwrap_or_else(|| Decimal::new(5, 1)),
        source: capability,
        rationale: message
            .payload
            .get("reasoning")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tacs_models::MessageKind;

    fn response(capability: AgentCapability, kind: MessageKind, payload: serde_json::Value) -> Message {
        Message::new(
            MessageTarget::Agent(capability),
            MessageTarget::Coordinator,
            kind,
            payload,
        )
    }

    fn market_buy() -> Message {
        response(
            AgentCapability::MarketAnalysis,
            MessageKind::AnalysisResult,
            serde_json::json!({
                "recommendation": "buy",
                "confidence": "0.8",
                "reasoning": "momentum with volume",
                "symbol": "SPY"
            }),
        )
    }

    fn strategy_concur() -> Message {
        response(
            AgentCapability::StrategyOptimization,
            MessageKind::StrategyAdjustment,
            serde_json::json!({"recommendation": "hold", "confidence": "0.6"}),
        )
    }

    #[test]
    fn buy_consensus_enters_position() {
        let decision = build_consensus_decision(&[market_buy(), strategy_concur()]);
        assert_eq!(decision.action, TradeAction::EnterPosition);
        assert_eq!(decision.confidence, dec!(0.8));
        assert_eq!(decision.signals.len(), 2);
    }

    #[test]
    fn sell_consensus_exits_position() {
        let market = response(
            AgentCapability::MarketAnalysis,
            MessageKind::AnalysisResult,
            serde_json::json!({"recommendation": "strong_sell", "confidence": "0.7"}),
        );
        let decision = build_consensus_decision(&[market, strategy_concur()]);
        assert_eq!(decision.action, TradeAction::ExitPosition);
        assert_eq!(decision.confidence, dec!(0.7));
    }

    #[test]
    fn neutral_recommendation_waits() {
        let market = response(
            AgentCapability::MarketAnalysis,
            MessageKind::AnalysisResult,
            serde_json::json!({"recommendation": "hold", "confidence": "0.9"}),
        );
        let decision = build_consensus_decision(&[market, strategy_concur()]);
        assert_eq!(decision.action, TradeAction::Wait);
    }

    #[test]
    fn missing_strategy_response_waits() {
        let decision = build_consensus_decision(&[market_buy()]);
        assert_eq!(decision.action, TradeAction::Wait);
        // Confidence still copied from the market-analysis payload.
        assert_eq!(decision.confidence, dec!(0.8));
    }

    #[test]
    fn missing_market_confidence_defaults() {
        let market = response(
            AgentCapability::MarketAnalysis,
            MessageKind::AnalysisResult,
            serde_json::json!({"recommendation": "buy"}),
        );
        let decision = build_consensus_decision(&[market, strategy_concur()]);
        assert_eq!(decision.confidence, dec!(0.5));
        assert_eq!(decision.action, TradeAction::EnterPosition);
    }

    #[test]
    fn other_capabilities_never_change_the_action() {
        let risk_veto = response(
            AgentCapability::RiskManagement,
            MessageKind::RiskAlert,
            serde_json::json!({"recommendation": "sell", "confidence": "0.95"}),
        );
        let decision = build_consensus_decision(&[market_buy(), strategy_concur(), risk_veto]);
        assert_eq!(decision.action, TradeAction::EnterPosition);
        assert_eq!(decision.signals.len(), 3);
        assert!(decision
            .signals
            .iter()
            .any(|s| s.source == AgentCapability::RiskManagement
                && s.direction == SignalDirection::Short));
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let market = response(
            AgentCapability::MarketAnalysis,
            MessageKind::AnalysisResult,
            serde_json::json!({"recommendation": "buy", "confidence": "1.8"}),
        );
        let decision = build_consensus_decision(&[market, strategy_concur()]);
        assert_eq!(decision.confidence, Decimal::ONE);
    }

    #[test]
    fn empty_round_waits() {
        let decision = build_consensus_decision(&[]);
        assert_eq!(decision.action, TradeAction::Wait);
        assert_eq!(decision.confidence, dec!(0.5));
        assert!(decision.signals.is_empty());
    }
}
