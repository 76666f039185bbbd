use latency_record_model::ReadAttempt;
use serde::{Deserialize, Serialize};

/// A half-open latency interval `[lo, hi)` with a label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LatencyBucket {
    pub lo: u64,
    pub hi: u64,
    pub label: String,
}

impl LatencyBucket {
    pub fn new(lo: u64, hi: u64, label: impl Into<String>) -> Self {
        Self {
            lo,
            hi,
            label: label.into(),
        }
    }

    #[inline]
    pub fn contains(&self, latency_ms: u64) -> bool {
        self.lo <= latency_ms && latency_ms < self.hi
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BucketCount {
    pub label: String,
    pub lo: u64,
    pub hi: u64,
    pub count: usize,
    /// Share of all successful reads, including reads that fell outside every bucket
    pub fraction: f64,
}

/// Count successful reads per latency bucket.
///
/// Failed reads are left out because their latency is the timeout, not a service time. Buckets
/// are expected in ascending, non-overlapping order; this is not checked. A read whose latency
/// falls outside every bucket is not counted anywhere.
pub fn latency_histogram(records: &[ReadAttempt], buckets: &[LatencyBucket]) -> Vec<BucketCount> {
    let successes = records
        .iter()
        .filter(|r| !r.is_failure())
        .map(|r| r.latency_ms)
        .collect::<Vec<_>>();

    buckets
        .iter()
        .map(|bucket| {
            let count = successes.iter().filter(|l| bucket.contains(**l)).count();
            let fraction = if successes.is_empty() {
                0.0
            } else {
                count as f64 / successes.len() as f64
            };

            BucketCount {
                label: bucket.label.clone(),
                lo: bucket.lo,
                hi: bucket.hi,
                count,
                fraction,
            }
        })
        .collect()
}
