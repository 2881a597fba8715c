use std::sync::Mutex;

use async_trait::async_trait;
use tacs_models::TradingDecision;

/// Real-time publication collaborator. Decisions are published after they
/// are stored, fire-and-forget, never on the decision's return path.
#[async_trait]
pub trait BroadcastSink: Send + Sync {
    async fn publish(&self, decision: TradingDecision);
}

/// Default sink that publishes nowhere.
#[derive(Default)]
pub struct NullBroadcast;

impl NullBroadcast {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BroadcastSink for NullBroadcast {
    async fn publish(&self, _decision: TradingDecision) {}
}

/// Sink that records published decisions; used in tests.
#[derive(Default)]
pub struct RecordingBroadcast {
    published: Mutex<Vec<TradingDecision>>,
}

impl RecordingBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<TradingDecision> {
        self.published
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BroadcastSink for RecordingBroadcast {
    async fn publish(&self, decision: TradingDecision) {
        if let Ok(mut guard) = self.published.lock() {
            guard.push(decision);
        }
    }
}
