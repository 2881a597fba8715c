use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tacs_models::{AgentCapability, Message};

use crate::error::AgentError;

/// Lifecycle status of an agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Analyzing,
    Executing,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AgentMetrics {
    pub messages_processed: u64,
    pub failures: u64,
    pub last_active: Option<DateTime<Utc>>,
}

/// Synchronous snapshot returned by `Agent::status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentStatusSnapshot {
    pub capability: AgentCapability,
    pub status: AgentStatus,
    pub metrics: AgentMetrics,
}

/// The uniform lifecycle contract every agent variant implements.
///
/// The coordinator dispatches polymorphically over this trait; it never
/// inspects concrete types. `initialize` is idempotent and must resolve
/// before `process` is ever invoked. A single agent's `process` error is
/// isolated by the caller and never aborts a broadcast.
#[async_trait]
pub trait Agent: Send + Sync {
    fn capability(&self) -> AgentCapability;

    async fn initialize(&self) -> Result<(), AgentError>;

    async fn process(&self, message: &Message) -> Result<Option<Message>, AgentError>;

    fn status(&self) -> AgentStatusSnapshot;

    /// Safe to call multiple times.
    async fn shutdown(&self);

    /// Optional daily-reset hook. Default is a no-op.
    async fn daily_reset(&self) {}
}

/// Shared mutable state for agent implementations: status plus metrics
/// behind one lock so `status()` stays a cheap synchronous snapshot.
pub(crate) struct AgentState {
    inner: Mutex<(AgentStatus, AgentMetrics)>,
}

impl AgentState {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new((AgentStatus::Idle, AgentMetrics::default())),
        }
    }

    pub(crate) fn set_status(&self, status: AgentStatus) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.0 = status;
        }
    }

    pub(crate) fn record_success(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.0 = AgentStatus::Idle;
            guard.1.messages_processed += 1;
            guard.1.last_active = Some(Utc::now());
        }
    }

    pub(crate) fn record_failure(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.0 = AgentStatus::Error;
            guard.1.failures += 1;
            guard.1.last_active = Some(Utc::now());
        }
    }

    pub(crate) fn reset(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.0 = AgentStatus::Idle;
            guard.1 = AgentMetrics::default();
        }
    }

    pub(crate) fn snapshot(&self, capability: AgentCapability) -> AgentStatusSnapshot {
        let (status, metrics) = self
            .inner
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or((AgentStatus::Error, AgentMetrics::default()));
        AgentStatusSnapshot {
            capability,
            status,
            metrics,
        }
    }
}
