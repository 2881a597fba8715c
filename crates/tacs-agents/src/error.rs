use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Agent timed out after {0} seconds")]
    Timeout(u64),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Unsupported message kind for this agent")]
    Unsupported,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
