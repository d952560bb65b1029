//! Execution logs and metrics reported by the backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::workflow::WorkflowStatus;

/// Log severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        };
        f.write_str(label)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// One log record produced while a workflow executes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLog {
    pub id: String,
    pub workflow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(with = "crate::models::timestamp")]
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl ExecutionLog {
    pub fn is_at_least(&self, level: LogLevel) -> bool {
        self.level >= level
    }
}

impl fmt::Display for ExecutionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}{}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level.to_string().to_uppercase(),
            self.agent_id
                .as_deref()
                .map(|id| format!("{}: ", id))
                .unwrap_or_default(),
            self.message
        )
    }
}

/// Aggregate figures for one workflow run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetrics {
    pub workflow_id: String,
    #[serde(with = "crate::models::timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(default, with = "crate::models::timestamp::option", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub status: WorkflowStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_from_backend_json() {
        let json = r#"{
            "id": "l1",
            "workflowId": "w1",
            "agentId": null,
            "timestamp": "2024-02-02T08:30:00.000001",
            "level": "warning",
            "message": "slow response",
            "metadata": {"latencyMs": 900}
        }"#;
        let log: ExecutionLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.level, LogLevel::Warning);
        assert!(log.is_at_least(LogLevel::Info));
        assert!(!log.is_at_least(LogLevel::Error));
        assert_eq!(log.metadata.unwrap()["latencyMs"], 900);
    }

    #[test]
    fn test_metrics_optional_end_time() {
        let json = serde_json::json!({
            "workflowId": "w1",
            "startTime": "2024-02-02T08:30:00",
            "tokensUsed": 1200,
            "status": "active"
        });
        let metrics: ExecutionMetrics = serde_json::from_value(json).unwrap();
        assert!(metrics.end_time.is_none());
        assert_eq!(metrics.tokens_used, 1200);
    }
}
