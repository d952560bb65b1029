//! LLM provider utilities under `/api/llm`

use crate::models::{ConnectionTestResult, LlmConfig, OllamaModel};
use crate::{Client, Result};

/// Client for LLM provider operations
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
}

impl LlmClient {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Models installed on the backend's Ollama daemon
    pub async fn list_ollama_models(&self) -> Result<Vec<OllamaModel>> {
        self.client.get_json("/api/llm/ollama/models").await
    }

    /// Ask the backend to probe a provider; `true` exactly when it reports success
    pub async fn test_connection(&self, config: &LlmConfig) -> Result<bool> {
        Ok(self.test_connection_detailed(config).await?.success)
    }

    /// Same probe, keeping the backend's explanation
    pub async fn test_connection_detailed(&self, config: &LlmConfig) -> Result<ConnectionTestResult> {
        tracing::debug!(?config, "testing llm connection");
        self.client.post_json("/api/llm/test", config).await
    }
}
