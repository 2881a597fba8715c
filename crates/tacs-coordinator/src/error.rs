use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// The coordinator task is gone; its mailbox is closed.
    #[error("Coordinator terminated")]
    Terminated,

    #[error("Agent initialization failed: {0}")]
    Init(#[from] tacs_agents::AgentError),
}
