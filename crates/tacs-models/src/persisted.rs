use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::performance::PerformanceState;

/// Store key the coordinator writes its state under.
pub const STATE_KEY: &str = "tacs:coordinator_state";

/// Everything the coordinator persists: the trimmed recent-message tail and
/// the performance singleton. Written wholesale, last-writer-wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    pub recent_messages: Vec<Message>,
    pub performance: PerformanceState,
    pub saved_at: DateTime<Utc>,
}

impl PersistedState {
    pub fn new(recent_messages: Vec<Message>, performance: PerformanceState) -> Self {
        Self {
            recent_messages,
            performance,
            saved_at: Utc::now(),
        }
    }
}
