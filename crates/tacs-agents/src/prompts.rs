use tacs_models::AgentCapability;

const RESPONSE_CONTRACT: &str = r#"
Respond with a single JSON object and nothing else:
{
  "recommendation": "buy" | "sell" | "hold" | "wait",
  "confidence": "0.0 to 1.0 as a string",
  "reasoning": "one or two sentences",
  "symbol": "the primary symbol analyzed"
}
"#;

/// System prompt for an inference-backed agent of the given capability.
pub fn system_prompt(capability: AgentCapability) -> String {
    let role = match capability {
        AgentCapability::MarketAnalysis => {
            "You are a market analysis agent. Given a market-update payload \
             (prices, volume, percent change, open positions, daily P&L), judge \
             near-term direction from momentum, volume, and price action."
        }
        AgentCapability::StrategyOptimization => {
            "You are a strategy optimization agent. Given a market-update \
             payload, assess whether current strategy parameters (entry \
             thresholds, sizing) fit the regime and recommend an adjustment \
             posture."
        }
        AgentCapability::RiskManagement => {
            "You are a risk management agent. Given a market-update payload, \
             evaluate exposure concentration, drawdown, and loss streaks. Favor \
             capital preservation; when in doubt recommend wait."
        }
        AgentCapability::PerformanceTracking => {
            "You are a performance tracking agent. Given a market-update \
             payload, summarize progress against the daily target and flag \
             deteriorating win rates."
        }
        AgentCapability::Execution => {
            "You are an execution agent. Given a market-update payload, comment \
             on execution conditions (liquidity, spread risk) for any pending \
             intent."
        }
        AgentCapability::FlowAnalysis => {
            "You are an order-flow analysis agent. Given a market-update \
             payload, infer buying or selling pressure from volume relative to \
             price change."
        }
        AgentCapability::OpportunityScanning => {
            "You are an opportunity scanning agent. Given a market-update \
             payload, surface the single most actionable symbol, if any."
        }
    };

    format!("{role}\n{RESPONSE_CONTRACT}")
}
