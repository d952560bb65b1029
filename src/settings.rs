//! Locally persisted settings
//!
//! A single JSON blob holding provider endpoints, API keys and runtime
//! preferences. It is read and written wholesale at a fixed location
//! (`<config dir>/agent-orchestrator/agent-orchestrator-settings.json`) with
//! no schema versioning: unknown keys are ignored and missing keys fall back
//! to their defaults.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::LogLevel;
use crate::{OrchestratorError, Result};

/// Key the settings blob is stored under
pub const SETTINGS_KEY: &str = "agent-orchestrator-settings";

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MAX_CONCURRENT_AGENTS: u32 = 5;
pub const MIN_CONCURRENT_AGENTS: u32 = 1;
pub const MAX_CONCURRENT_AGENTS: u32 = 20;

/// Where the backend should run agent code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SandboxType {
    #[default]
    Docker,
    Process,
    None,
}

impl fmt::Display for SandboxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SandboxType::Docker => "docker",
            SandboxType::Process => "process",
            SandboxType::None => "none",
        };
        f.write_str(label)
    }
}

impl FromStr for SandboxType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "docker" => Ok(SandboxType::Docker),
            "process" => Ok(SandboxType::Process),
            "none" => Ok(SandboxType::None),
            other => Err(format!(
                "unknown sandbox type '{}' (expected docker, process or none)",
                other
            )),
        }
    }
}

/// The persisted settings blob
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub ollama_url: String,
    pub openai_key: String,
    pub anthropic_key: String,
    pub sandbox_type: SandboxType,
    pub max_concurrent_agents: u32,
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            openai_key: String::new(),
            anthropic_key: String::new(),
            sandbox_type: SandboxType::Docker,
            max_concurrent_agents: DEFAULT_MAX_CONCURRENT_AGENTS,
            log_level: LogLevel::Info,
        }
    }
}

impl Settings {
    /// Names accepted by [`Settings::set`]
    pub const KEYS: &'static [&'static str] = &[
        "ollamaUrl",
        "openaiKey",
        "anthropicKey",
        "sandboxType",
        "maxConcurrentAgents",
        "logLevel",
    ];

    /// Return the settings with numeric preferences clamped into range
    pub fn clamped(mut self) -> Self {
        self.max_concurrent_agents = self
            .max_concurrent_agents
            .clamp(MIN_CONCURRENT_AGENTS, MAX_CONCURRENT_AGENTS);
        self
    }

    /// Set one field from its wire name and a textual value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |reason: String| OrchestratorError::Settings(format!("{}: {}", key, reason));
        match key {
            "ollamaUrl" => {
                url::Url::parse(value).map_err(|e| invalid(e.to_string()))?;
                self.ollama_url = value.to_string();
            }
            "openaiKey" => self.openai_key = value.to_string(),
            "anthropicKey" => self.anthropic_key = value.to_string(),
            "sandboxType" => self.sandbox_type = value.parse().map_err(invalid)?,
            "maxConcurrentAgents" => {
                let n: u32 = value
                    .parse()
                    .map_err(|_| invalid(format!("'{}' is not a whole number", value)))?;
                self.max_concurrent_agents = n.clamp(MIN_CONCURRENT_AGENTS, MAX_CONCURRENT_AGENTS);
            }
            "logLevel" => self.log_level = value.parse().map_err(invalid)?,
            other => {
                return Err(OrchestratorError::Settings(format!(
                    "unknown setting '{}' (expected one of {})",
                    other,
                    Self::KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

fn redact(key: &str) -> &'static str {
    if key.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("ollama_url", &self.ollama_url)
            .field("openai_key", &redact(&self.openai_key))
            .field("anthropic_key", &redact(&self.anthropic_key))
            .field("sandbox_type", &self.sandbox_type)
            .field("max_concurrent_agents", &self.max_concurrent_agents)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Reads and writes the settings blob at one path
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at the platform config location
    pub fn default_location() -> Result<Self> {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .ok_or_else(|| {
                OrchestratorError::Settings("no configuration directory available".to_string())
            })?;
        Ok(Self::at(
            base.join("agent-orchestrator")
                .join(format!("{}.json", SETTINGS_KEY)),
        ))
    }

    /// Store at an explicit file path
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the blob; a missing file yields the defaults
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no settings file; using defaults");
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&self.path)?;
        let settings: Settings = serde_json::from_str(&content).map_err(|e| {
            OrchestratorError::Settings(format!(
                "failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(settings.clamped())
    }

    /// Write the whole blob, creating parent directories as needed
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&settings.clone().clamped())?;
        fs::write(&self.path, content)?;
        tracing::info!(path = %self.path.display(), "saved settings");
        Ok(())
    }

    /// Change one key in the stored blob and write it back
    ///
    /// A file that cannot be read is left untouched and the error returned,
    /// so the other keys are never replaced by defaults.
    pub fn update(&self, key: &str, value: &str) -> Result<Settings> {
        let mut settings = self.load()?;
        settings.set(key, value)?;
        self.save(&settings)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::at(dir.path().join("settings.json"));

        let settings = store.load().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.ollama_url, "http://localhost:11434");
        assert_eq!(settings.sandbox_type, SandboxType::Docker);
        assert_eq!(settings.max_concurrent_agents, 5);
        assert_eq!(settings.log_level, LogLevel::Info);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::at(dir.path().join("nested").join("settings.json"));
        let mut settings = Settings::default();
        settings.set("sandboxType", "process").unwrap();
        settings.set("openaiKey", "sk-test").unwrap();

        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_wire_format_uses_camel_case() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(value["ollamaUrl"], "http://localhost:11434");
        assert_eq!(value["maxConcurrentAgents"], 5);
        assert_eq!(value["sandboxType"], "docker");
    }

    #[test]
    fn test_partial_blob_and_out_of_range_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"maxConcurrentAgents": 500, "extra": true}"#).unwrap();

        let settings = SettingsStore::at(&path).load().unwrap();
        assert_eq!(settings.max_concurrent_agents, 20);
        assert_eq!(settings.ollama_url, DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_update_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::at(dir.path().join("settings.json"));
        let mut settings = Settings::default();
        settings.set("openaiKey", "sk-keep").unwrap();
        store.save(&settings).unwrap();

        let updated = store.update("sandboxType", "none").unwrap();
        assert_eq!(updated.sandbox_type, SandboxType::None);
        assert_eq!(store.load().unwrap().openai_key, "sk-keep");
    }

    #[test]
    fn test_update_refuses_unreadable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let corrupt = r#"{"openaiKey": "sk-keep", "#;
        std::fs::write(&path, corrupt).unwrap();

        let result = SettingsStore::at(&path).update("logLevel", "debug");
        assert!(matches!(result, Err(OrchestratorError::Settings(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), corrupt);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut settings = Settings::default();
        assert!(settings.set("sandboxType", "vm").is_err());
        assert!(settings.set("maxConcurrentAgents", "many").is_err());
        assert!(settings.set("theme", "dark").is_err());
        settings.set("maxConcurrentAgents", "0").unwrap();
        assert_eq!(settings.max_concurrent_agents, 1);
        settings.set("maxConcurrentAgents", "21").unwrap();
        assert_eq!(settings.max_concurrent_agents, 20);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let mut settings = Settings::default();
        settings.anthropic_key = "sk-ant-secret".into();
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("sk-ant-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
