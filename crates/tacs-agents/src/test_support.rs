//! Test doubles for the agent contract and its collaborators.
//!
//! Used by this crate's unit tests and by the coordinator's integration
//! tests, which need agents with scripted responses, delays, and failures.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tacs_models::{AgentCapability, Message, MessageKind, MessageTarget};

use crate::agent::{Agent, AgentState, AgentStatus, AgentStatusSnapshot};
use crate::error::AgentError;
use crate::execution::{ExecutionClient, ExecutionStatus, OrderRequest};
use crate::inference::InferenceClient;
use crate::variants::response_kind;

/// Inference double returning canned output, or failing.
pub struct MockInferenceClient {
    output: Option<String>,
}

impl MockInferenceClient {
    pub fn returning(output: &str) -> Self {
        Self {
            output: Some(output.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { output: None }
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
    ) -> Result<String, AgentError> {
        match &self.output {
            Some(output) => Ok(output.clone()),
            None => Err(AgentError::Inference("mock inference failure".to_string())),
        }
    }
}

/// Execution double that reports every order as submitted.
#[derive(Default)]
pub struct MockExecutionClient;

impl MockExecutionClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExecutionClient for MockExecutionClient {
    async fn execute(&self, order: &OrderRequest) -> Result<ExecutionStatus, AgentError> {
        Ok(ExecutionStatus {
            order_id: format!("mock-{}", order.symbol),
            status: "submitted".to_string(),
            filled_quantity: Some(order.quantity),
        })
    }
}

/// A fully scripted agent: responds to market updates with a canned payload
/// (or nothing, or an error), optionally after a delay. Counts lifecycle
/// calls so tests can assert initialize/shutdown/daily-reset behavior.
pub struct MockAgent {
    capability: AgentCapability,
    response: Option<serde_json::Value>,
    delay: Option<Duration>,
    fail: bool,
    fail_init: bool,
    state: AgentState,
    init_calls: AtomicU32,
    shutdown_calls: AtomicU32,
    daily_reset_calls: AtomicU32,
}

impl MockAgent {
    pub fn new(capability: AgentCapability, response: Option<serde_json::Value>) -> Self {
        Self {
            capability,
            response,
            delay: None,
            fail: false,
            fail_init: false,
            state: AgentState::new(),
            init_calls: AtomicU32::new(0),
            shutdown_calls: AtomicU32::new(0),
            daily_reset_calls: AtomicU32::new(0),
        }
    }

    /// Market-analysis double recommending a buy at the given confidence.
    pub fn market_buy(confidence: Decimal) -> Self {
        Self::new(
            AgentCapability::MarketAnalysis,
            Some(serde_json::json!({
                "recommendation": "buy",
                "confidence": confidence.to_string(),
                "reasoning": "scripted buy",
                "symbol": "SPY"
            })),
        )
    }

    /// Market-analysis double recommending a sell.
    pub fn market_sell(confidence: Decimal) -> Self {
        Self::new(
            AgentCapability::MarketAnalysis,
            Some(serde_json::json!({
                "recommendation": "sell",
                "confidence": confidence.to_string(),
                "reasoning": "scripted sell",
                "symbol": "SPY"
            })),
        )
    }

    /// Strategy-optimization double concurring with a hold posture.
    pub fn strategy_concur() -> Self {
        Self::new(
            AgentCapability::StrategyOptimization,
            Some(serde_json::json!({
                "recommendation": "hold",
                "confidence": "0.6",
                "reasoning": "parameters fit regime"
            })),
        )
    }

    /// An agent that never responds.
    pub fn silent(capability: AgentCapability) -> Self {
        Self::new(capability, None)
    }

    /// An agent whose `process` always errors.
    pub fn failing(capability: AgentCapability) -> Self {
        let mut agent = Self::new(capability, None);
        agent.fail = true;
        agent
    }

    /// An agent whose `initialize` always errors.
    pub fn failing_initialize(capability: AgentCapability) -> Self {
        let mut agent = Self::new(capability, None);
        agent.fail_init = true;
        agent
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn init_calls(&self) -> u32 {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn shutdown_calls(&self) -> u32 {
        self.shutdown_calls.load(Ordering::SeqCst)
    }

    pub fn daily_reset_calls(&self) -> u32 {
        self.daily_reset_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn capability(&self) -> AgentCapability {
        self.capability
    }

    async fn initialize(&self) -> Result<(), AgentError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            self.state.record_failure();
            return Err(AgentError::Inference("scripted init failure".to_string()));
        }
        self.state.set_status(AgentStatus::Idle);
        Ok(())
    }

    async fn process(&self, message: &Message) -> Result<Option<Message>, AgentError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            self.state.record_failure();
            return Err(AgentError::Inference("scripted failure".to_string()));
        }
        if message.kind != MessageKind::MarketUpdate {
            return Ok(None);
        }
        self.state.record_success();
        Ok(self.response.clone().map(|payload| {
            Message::new(
                MessageTarget::Agent(self.capability),
                MessageTarget::Coordinator,
                response_kind(self.capability),
                payload,
            )
        }))
    }

    fn status(&self) -> AgentStatusSnapshot {
        self.state.snapshot(self.capability)
    }

    async fn shutdown(&self) {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        self.state.set_status(AgentStatus::Idle);
    }

    async fn daily_reset(&self) {
        self.daily_reset_calls.fetch_add(1, Ordering::SeqCst);
        self.state.reset();
    }
}

/// A broadcast-style market update as the coordinator would send it.
pub fn market_update_message(payload: serde_json::Value) -> Message {
    Message::new(
        MessageTarget::Coordinator,
        MessageTarget::Broadcast,
        MessageKind::MarketUpdate,
        payload,
    )
    .requiring_response()
}
