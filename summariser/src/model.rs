use crate::aggregate::{FailureRate, FailureStreak, PositionLatency, ResourceFailures, RunOverview};
use crate::diagnose::Diagnosis;
use crate::histogram::BucketCount;
use chrono::{DateTime, Utc};
use latency_record_model::RunDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything derived from one result log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatencyReport {
    pub run: RunDescriptor,
    /// Fingerprint of the loaded records
    pub fingerprint: String,
    pub overview: RunOverview,
    pub failures_per_round: BTreeMap<u32, FailureRate>,
    pub failed_resources_per_round: BTreeMap<u32, Vec<String>>,
    pub failures_per_resource: Vec<ResourceFailures>,
    pub failure_rate_by_position: BTreeMap<u32, FailureRate>,
    pub latency_by_position: BTreeMap<u32, PositionLatency>,
    pub failure_streaks: BTreeMap<u32, FailureStreak>,
    pub latency_histogram: Vec<BucketCount>,
    pub success_latency: Option<LatencySummary>,
    pub success_spread: Option<StandardTimingsStats>,
    pub failure_timeouts: Option<TimeoutRange>,
    pub timing_by_object: Vec<ObjectTimingStats>,
    pub diagnosis: Diagnosis,
}

/// A report as written to disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportOutput {
    pub generated_at: DateTime<Utc>,
    pub report: LatencyReport,
}

impl ReportOutput {
    pub fn new(report: LatencyReport) -> Self {
        Self {
            generated_at: Utc::now(),
            report,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardTimingsStats {
    pub mean: f64,
    pub std: f64,
    pub within_std: f64,
    pub within_2std: f64,
    pub within_3std: f64,
}

/// Distribution of successful read latencies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatencySummary {
    pub count: usize,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub median: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

/// How long failed reads waited before the timeout was declared
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeoutRange {
    pub count: usize,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
}

/// One row of the per-object statistics table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectTimingStats {
    pub object_name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, `None` for a single read
    pub std: Option<f64>,
    pub min: f64,
    pub median: f64,
    pub p90: f64,
    pub p99: f64,
    pub max: f64,
}
