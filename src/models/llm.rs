//! LLM provider connection parameters and probe results

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

use super::agent::LlmProvider;

/// Connection parameters sent to `POST /api/llm/test`
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    pub provider: LlmProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl LlmConfig {
    pub fn new<M: Into<String>>(provider: LlmProvider, model_name: M) -> Self {
        Self {
            provider,
            api_key: None,
            base_url: None,
            model_name: model_name.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

// Keys never go to the logs
impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// A locally installed Ollama model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaModel {
    pub name: String,
    /// Size in bytes; Ollama reports a number, some proxies a string
    #[serde(default, deserialize_with = "lenient_size")]
    pub size: u64,
    #[serde(default)]
    pub modified_at: String,
    #[serde(default)]
    pub digest: String,
}

fn lenient_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(u64),
        Text(String),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

/// Body of the backend's connection probe answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let config = LlmConfig::new(LlmProvider::OpenAI, "gpt-4").api_key("sk-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_config_payload() {
        let config = LlmConfig::new(LlmProvider::Ollama, "llama2").base_url("http://gpu:11434");
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "provider": "ollama",
                "baseUrl": "http://gpu:11434",
                "modelName": "llama2"
            })
        );
    }

    #[test]
    fn test_ollama_model_size_forms() {
        let numeric: OllamaModel = serde_json::from_value(serde_json::json!({
            "name": "llama2:latest",
            "size": 3825819519u64,
            "modified_at": "2024-01-01T00:00:00Z",
            "digest": "abc"
        }))
        .unwrap();
        assert_eq!(numeric.size, 3_825_819_519);

        let textual: OllamaModel =
            serde_json::from_value(serde_json::json!({"name": "mistral", "size": "42"})).unwrap();
        assert_eq!(textual.size, 42);
    }
}
