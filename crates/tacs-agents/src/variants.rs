use std::sync::Arc;

use async_trait::async_trait;
use tacs_models::{AgentCapability, Message, MessageKind, MessageTarget};
use tracing::debug;

use crate::agent::{Agent, AgentState, AgentStatus, AgentStatusSnapshot};
use crate::error::AgentError;
use crate::execution::{ExecutionClient, OrderRequest};
use crate::inference::InferenceClient;
use crate::parser::parse_payload;
use crate::prompts::system_prompt;

/// Which message kind a capability answers market updates with.
pub fn response_kind(capability: AgentCapability) -> MessageKind {
    match capability {
        AgentCapability::MarketAnalysis => MessageKind::AnalysisResult,
        AgentCapability::StrategyOptimization => MessageKind::StrategyAdjustment,
        AgentCapability::RiskManagement => MessageKind::RiskAlert,
        AgentCapability::PerformanceTracking => MessageKind::PerformanceUpdate,
        AgentCapability::Execution => MessageKind::ExecutionResult,
        AgentCapability::FlowAnalysis => MessageKind::AnalysisResult,
        AgentCapability::OpportunityScanning => MessageKind::SignalGenerated,
    }
}

/// An analysis agent parameterized by capability, backed by the hosted
/// inference collaborator. One struct covers every analysis variant; the
/// capability picks the prompt and the response message kind.
pub struct InferenceAgent {
    capability: AgentCapability,
    client: Arc<dyn InferenceClient>,
    system_prompt: String,
    state: AgentState,
}

impl InferenceAgent {
    pub fn new(capability: AgentCapability, client: Arc<dyn InferenceClient>) -> Self {
        Self {
            capability,
            client,
            system_prompt: system_prompt(capability),
            state: AgentState::new(),
        }
    }
}

#[async_trait]
impl Agent for InferenceAgent {
    fn capability(&self) -> AgentCapability {
        self.capability
    }

    async fn initialize(&self) -> Result<(), AgentError> {
        self.state.set_status(AgentStatus::Idle);
        Ok(())
    }

    async fn process(&self, message: &Message) -> Result<Option<Message>, AgentError> {
        match message.kind {
            MessageKind::MarketUpdate => {
                self.state.set_status(AgentStatus::Analyzing);
                let user_prompt = serde_json::to_string(&message.payload)?;

                let raw = match self.client.complete(&self.system_prompt, &user_prompt).await {
                    Ok(raw) => raw,
                    Err(e) => {
                        self.state.record_failure();
                        return Err(e);
                    }
                };
                let payload = match parse_payload(&raw) {
                    Ok(payload) => payload,
                    Err(e) => {
                        self.state.record_failure();
                        return Err(e);
                    }
                };

                self.state.record_success();
                debug!(capability = %self.capability, "Analysis produced");
                Ok(Some(Message::new(
                    MessageTarget::Agent(self.capability),
                    MessageTarget::Coordinator,
                    response_kind(self.capability),
                    payload,
                )))
            }
            // Everything else is informational for analysis agents.
            _ => Ok(None),
        }
    }

    fn status(&self) -> AgentStatusSnapshot {
        self.state.snapshot(self.capability)
    }

    async fn shutdown(&self) {
        self.state.set_status(AgentStatus::Idle);
    }

    async fn daily_reset(&self) {
        self.state.reset();
    }
}

/// The execution-capability agent. The only component that ever talks to
/// the order-execution collaborator.
pub struct ExecutionAgent {
    client: Arc<dyn ExecutionClient>,
    state: AgentState,
}

impl ExecutionAgent {
    pub fn new(client: Arc<dyn ExecutionClient>) -> Self {
        Self {
            client,
            state: AgentState::new(),
        }
    }
}

#[async_trait]
impl Agent for ExecutionAgent {
    fn capability(&self) -> AgentCapability {
        AgentCapability::Execution
    }

    async fn initialize(&self) -> Result<(), AgentError> {
        self.state.set_status(AgentStatus::Idle);
        Ok(())
    }

    async fn process(&self, message: &Message) -> Result<Option<Message>, AgentError> {
        match message.kind {
            MessageKind::ExecutionRequest => {
                self.state.set_status(AgentStatus::Executing);
                let order: OrderRequest = match serde_json::from_value(message.payload.clone()) {
                    Ok(order) => order,
                    Err(e) => {
                        self.state.record_failure();
                        return Err(AgentError::Parse(format!("invalid order payload: {e}")));
                    }
                };

                let status = match self.client.execute(&order).await {
                    Ok(status) => status,
                    Err(e) => {
                        self.state.record_failure();
                        return Err(e);
                    }
                };

                self.state.record_success();
                Ok(Some(Message::new(
                    MessageTarget::Agent(AgentCapability::Execution),
                    MessageTarget::Coordinator,
                    MessageKind::ExecutionResult,
                    serde_json::to_value(&status)?,
                )))
            }
            _ => Ok(None),
        }
    }

    fn status(&self) -> AgentStatusSnapshot {
        self.state.snapshot(AgentCapability::Execution)
    }

    async fn shutdown(&self) {
        self.state.set_status(AgentStatus::Idle);
    }

    async fn daily_reset(&self) {
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockExecutionClient, MockInferenceClient};

    fn market_update() -> Message {
        Message::new(
            MessageTarget::Coordinator,
            MessageTarget::Broadcast,
            MessageKind::MarketUpdate,
            serde_json::json!({"symbol": "SPY", "price": "445.50"}),
        )
    }

    #[tokio::test]
    async fn inference_agent_answers_market_update() {
        let client = Arc::new(MockInferenceClient::returning(
            r#"{"recommendation": "buy", "confidence": "0.8", "reasoning": "momentum"}"#,
        ));
        let agent = InferenceAgent::new(AgentCapability::MarketAnalysis, client);
        agent.initialize().await.unwrap();

        let response = agent.process(&market_update()).await.unwrap().unwrap();
        assert_eq!(response.kind, MessageKind::AnalysisResult);
        assert_eq!(
            response.from,
            MessageTarget::Agent(AgentCapability::MarketAnalysis)
        );
        assert_eq!(response.to, MessageTarget::Coordinator);
        assert_eq!(response.payload["recommendation"], "buy");
        assert_eq!(agent.status().metrics.messages_processed, 1);
    }

    #[tokio::test]
    async fn strategy_agent_uses_adjustment_kind() {
        let client = Arc::new(MockInferenceClient::returning(
            r#"{"recommendation": "hold", "confidence": "0.6"}"#,
        ));
        let agent = InferenceAgent::new(AgentCapability::StrategyOptimization, client);

        let response = agent.process(&market_update()).await.unwrap().unwrap();
        assert_eq!(response.kind, MessageKind::StrategyAdjustment);
    }

    #[tokio::test]
    async fn inference_failure_marks_error_status() {
        let client = Arc::new(MockInferenceClient::failing());
        let agent = InferenceAgent::new(AgentCapability::MarketAnalysis, client);

        let result = agent.process(&market_update()).await;
        assert!(result.is_err());
        assert_eq!(agent.status().status, AgentStatus::Error);
        assert_eq!(agent.status().metrics.failures, 1);
    }

    #[tokio::test]
    async fn non_market_update_is_ignored() {
        let client = Arc::new(MockInferenceClient::returning("{}"));
        let agent = InferenceAgent::new(AgentCapability::FlowAnalysis, client);

        let message = Message::new(
            MessageTarget::Coordinator,
            MessageTarget::Agent(AgentCapability::FlowAnalysis),
            MessageKind::StopTrading,
            serde_json::json!({}),
        );
        assert!(agent.process(&message).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn execution_agent_round_trips_order() {
        let agent = ExecutionAgent::new(Arc::new(MockExecutionClient::new()));
        agent.initialize().await.unwrap();

        let message = Message::new(
            MessageTarget::Coordinator,
            MessageTarget::Agent(AgentCapability::Execution),
            MessageKind::ExecutionRequest,
            serde_json::json!({
                "symbol": "SPY",
                "side": "buy",
                "quantity": "10",
                "limit_price": null
            }),
        );

        let response = agent.process(&message).await.unwrap().unwrap();
        assert_eq!(response.kind, MessageKind::ExecutionResult);
        assert_eq!(response.payload["status"], "submitted");
    }

    #[tokio::test]
    async fn execution_agent_rejects_bad_payload() {
        let agent = ExecutionAgent::new(Arc::new(MockExecutionClient::new()));
        let message = Message::new(
            MessageTarget::Coordinator,
            MessageTarget::Agent(AgentCapability::Execution),
            MessageKind::ExecutionRequest,
            serde_json::json!({"not_an_order": true}),
        );
        assert!(agent.process(&message).await.is_err());
    }

    #[tokio::test]
    async fn daily_reset_clears_metrics() {
        let client = Arc::new(MockInferenceClient::returning(
            r#"{"recommendation": "hold", "confidence": "0.6"}"#,
        ));
        let agent = InferenceAgent::new(AgentCapability::MarketAnalysis, client);
        agent.process(&market_update()).await.unwrap();
        assert_eq!(agent.status().metrics.messages_processed, 1);

        agent.daily_reset().await;
        assert_eq!(agent.status().metrics.messages_processed, 0);
    }

    #[test]
    fn response_kind_mapping_is_total() {
        for capability in AgentCapability::ALL {
            // Every capability maps to some response kind without panicking.
            let _ = response_kind(capability);
        }
        assert_eq!(
            response_kind(AgentCapability::OpportunityScanning),
            MessageKind::SignalGenerated
        );
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let client = Arc::new(MockInferenceClient::returning("{}"));
        let agent = InferenceAgent::new(AgentCapability::RiskManagement, client);
        agent.initialize().await.unwrap();
        agent.initialize().await.unwrap();
        assert_eq!(agent.status().status, AgentStatus::Idle);
    }
}
