use crate::histogram::LatencyBucket;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for generating a latency report
///
/// Every field has a default so that a config file only needs to list what it changes, e.g.
///
/// ```toml
/// failure_marker = "TIMEOUT"
///
/// [diagnosis]
/// position_midpoint = 11
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Substring of the status column that marks a failed read
    pub failure_marker: String,
    /// Successful reads slower than this are counted as slow when comparing runs
    pub slow_threshold_ms: u64,
    /// Minimum width of the bars drawn in the text report
    pub bar_width: usize,
    pub columns: ColumnNames,
    pub diagnosis: DiagnosisThresholds,
    /// Latency buckets for successful reads, half-open `[lo, hi)` and in ascending order
    pub buckets: Vec<LatencyBucket>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            failure_marker: "FAIL".to_string(),
            slow_threshold_ms: 500,
            bar_width: 22,
            columns: ColumnNames::default(),
            diagnosis: DiagnosisThresholds::default(),
            buckets: vec![
                LatencyBucket::new(0, 50, "Cache hit (<50ms)"),
                LatencyBucket::new(50, 500, "Fast (50-500ms)"),
                LatencyBucket::new(500, 2000, "Medium (0.5-2s)"),
                LatencyBucket::new(2000, 3500, "Real CoAP (2-3.5s)"),
                LatencyBucket::new(3500, 5100, "Near-timeout (3.5-5.1s)"),
            ],
        }
    }
}

impl ReportConfig {
    /// Load the configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Names of the input columns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnNames {
    pub round: String,
    pub sequence_position: String,
    pub object_id: String,
    pub object_name: String,
    pub resource_id: String,
    pub resource_label: String,
    pub delay_ms: String,
    pub latency_ms: String,
    pub status: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            round: "Round".to_string(),
            sequence_position: "SeqNum".to_string(),
            object_id: "Object".to_string(),
            object_name: "ObjectName".to_string(),
            resource_id: "Resource".to_string(),
            resource_label: "ResourceLabel".to_string(),
            delay_ms: "DelayMs".to_string(),
            latency_ms: "LatencyMs".to_string(),
            status: "Status".to_string(),
        }
    }
}

/// Thresholds for the failure distribution diagnosis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiagnosisThresholds {
    /// Last sequence position that counts as early in a round
    pub position_midpoint: u32,
    /// How many times more failures one side of the midpoint needs before it is called a pattern
    pub position_ratio: f64,
    /// How many times more failures the late rounds need before the run is called degrading
    pub round_ratio: f64,
}

impl Default for DiagnosisThresholds {
    fn default() -> Self {
        Self {
            position_midpoint: 7,
            position_ratio: 1.5,
            round_ratio: 1.3,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
