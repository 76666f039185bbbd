use latency_record_model::{ReadAttempt, RunDescriptor};
use serde::{Deserialize, Serialize};

/// Headline numbers of one run, alongside its change against the baseline run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunComparison {
    pub run: RunDescriptor,
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    /// Share of reads that succeeded, `None` for an empty run
    pub success_rate: Option<f64>,
    pub mean_latency_ms: Option<f64>,
    pub median_latency_ms: Option<u64>,
    pub p95_latency_ms: Option<u64>,
    pub p99_latency_ms: Option<u64>,
    pub max_latency_ms: Option<u64>,
    /// Successful reads slower than the slow threshold
    pub slow_reads: usize,
    pub mean_failure_timeout_ms: Option<f64>,
    /// Change against the first run, `None` for the first run itself
    pub delta: Option<ComparisonDelta>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonDelta {
    pub failures: i64,
    pub success_rate: Option<f64>,
    pub mean_latency_ms: Option<f64>,
    pub slow_reads: i64,
}

/// Compare runs against the first one.
///
/// Percentiles here use the nearest rank over the sorted successful latencies, so they are always
/// a latency that was actually observed.
pub fn compare_runs(
    runs: &[(RunDescriptor, Vec<ReadAttempt>)],
    slow_threshold_ms: u64,
) -> Vec<RunComparison> {
    let mut comparisons = runs
        .iter()
        .map(|(run, records)| summarise_run(run, records, slow_threshold_ms))
        .collect::<Vec<_>>();

    if let Some((baseline, rest)) = comparisons.split_first_mut() {
        for comparison in rest {
            comparison.delta = Some(delta(baseline, comparison));
        }
    }

    comparisons
}

fn summarise_run(run: &RunDescriptor, records: &[ReadAttempt], slow_threshold_ms: u64) -> RunComparison {
    let mut latencies = records
        .iter()
        .filter(|r| !r.is_failure())
        .map(|r| r.latency_ms)
        .collect::<Vec<_>>();
    latencies.sort_unstable();

    let timeouts = records
        .iter()
        .filter(|r| r.is_failure())
        .map(|r| r.latency_ms)
        .collect::<Vec<_>>();

    let total = records.len();
    let successes = latencies.len();

    RunComparison {
        run: run.clone(),
        total,
        successes,
        failures: timeouts.len(),
        success_rate: (total > 0).then(|| successes as f64 / total as f64),
        mean_latency_ms: mean(&latencies),
        median_latency_ms: nearest_rank(&latencies, 50.0),
        p95_latency_ms: nearest_rank(&latencies, 95.0),
        p99_latency_ms: nearest_rank(&latencies, 99.0),
        max_latency_ms: latencies.last().copied(),
        slow_reads: latencies.iter().filter(|l| **l > slow_threshold_ms).count(),
        mean_failure_timeout_ms: mean(&timeouts),
        delta: None,
    }
}

fn delta(baseline: &RunComparison, run: &RunComparison) -> ComparisonDelta {
    ComparisonDelta {
        failures: run.failures as i64 - baseline.failures as i64,
        success_rate: baseline
            .success_rate
            .zip(run.success_rate)
            .map(|(a, b)| b - a),
        mean_latency_ms: baseline
            .mean_latency_ms
            .zip(run.mean_latency_ms)
            .map(|(a, b)| b - a),
        slow_reads: run.slow_reads as i64 - baseline.slow_reads as i64,
    }
}

fn mean(values: &[u64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<u64>() as f64 / values.len() as f64)
}

/// The value at index `floor(len * p / 100)`, clamped to the last value
fn nearest_rank(sorted: &[u64], p: f64) -> Option<u64> {
    let index = ((sorted.len() as f64 * p / 100.0) as usize).min(sorted.len().checked_sub(1)?);
    sorted.get(index).copied()
}
