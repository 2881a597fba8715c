pub mod agent;
pub mod consensus;
pub mod error;
pub mod execution;
pub mod inference;
pub mod parser;
pub mod prompts;
pub mod variants;

pub mod test_support;

pub use agent::{Agent, AgentMetrics, AgentStatus, AgentStatusSnapshot};
pub use consensus::build_consensus_decision;
pub use error::AgentError;
pub use execution::{
    ExecutionClient, ExecutionStatus, OrderRequest, OrderSide, PaperExecutionClient,
};
pub use inference::{check_cli_available, ClaudeCliClient, InferenceClient, InferenceConfig};
pub use variants::{response_kind, ExecutionAgent, InferenceAgent};
