use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::AgentError;

/// Hosted-inference collaborator. Each inference-backed agent wraps this
/// with its own prompt; the coordinator never calls it directly.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, AgentError>;
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub model: String,
    pub timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-latest".to_string(),
            timeout: Duration::from_secs(45),
        }
    }
}

/// Inference client backed by the `claude` CLI.
pub struct ClaudeCliClient {
    config: InferenceConfig,
}

impl ClaudeCliClient {
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl InferenceClient for ClaudeCliClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AgentError> {
        debug!(model = %self.config.model, "Invoking claude CLI");

        let result = tokio::time::timeout(self.config.timeout, async {
            Command::new("claude")
                .args([
                    "-p",
                    user_prompt,
                    "--system-prompt",
                    system_prompt,
                    "--model",
                    &self.config.model,
                    "--output-format",
                    "text",
                ])
                .output()
                .await
        })
        .await
        .map_err(|_| AgentError::Timeout(self.config.timeout.as_secs()))?
        .map_err(|e| AgentError::Inference(format!("Failed to spawn claude: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            warn!(status = %result.status, stderr = %stderr, "Claude CLI failed");
            return Err(AgentError::Inference(format!(
                "claude exited {}: {}",
                result.status, stderr
            )));
        }

        let stdout = String::from_utf8_lossy(&result.stdout).to_string();
        if stdout.trim().is_empty() {
            return Err(AgentError::Inference(
                "claude returned empty response".to_string(),
            ));
        }

        Ok(stdout)
    }
}

/// Check if the `claude` CLI is available on the system.
pub async fn check_cli_available() -> bool {
    match Command::new("claude").arg("--version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = InferenceConfig::default();
        assert_eq!(config.model, "claude-3-5-haiku-latest");
        assert_eq!(config.timeout, Duration::from_secs(45));
    }
}
