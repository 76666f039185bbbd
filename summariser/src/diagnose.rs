use crate::config::DiagnosisThresholds;
use latency_record_model::ReadAttempt;
use serde::{Deserialize, Serialize};

/// Where failures cluster within a round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, derive_more::Display)]
pub enum PositionPattern {
    /// Later requests fail more, the inter-request delay is too short
    #[display("CONGESTION PATTERN: later requests fail more, inter-request delay too short")]
    CongestionPattern,
    /// The first requests fail more, the device is not ready
    #[display("EARLY FAILURE PATTERN: first requests fail more, device not ready")]
    EarlyFailurePattern,
    #[display("MIXED PATTERN: failures distributed across positions")]
    MixedPattern,
}

/// How the failure count develops over the rounds of a run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, derive_more::Display)]
pub enum RoundTrend {
    #[display("DEGRADATION: device performance degrades over time")]
    Degrading,
    #[display("STABLE: failure rate is consistent across rounds")]
    Stable,
}

/// Heuristic classification of a run's failures, with the counts it was derived from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnosis {
    pub position_pattern: PositionPattern,
    /// Last position counted as early
    pub position_midpoint: u32,
    pub early_failures: usize,
    pub late_failures: usize,
    pub round_trend: RoundTrend,
    /// Last round counted as early
    pub round_split: u32,
    pub early_round_failures: usize,
    pub late_round_failures: usize,
}

/// Classify the failures of a run by position within a round and by round.
///
/// Failures at positions up to and including the midpoint are early, the rest are late. One side
/// has to exceed the other by more than `position_ratio` to count as a pattern. Rounds are split
/// in half with the early half holding `rounds / 2` rounds, and the run is degrading when the late
/// half has more than `round_ratio` times the failures of the early half. A run with fewer than
/// two rounds has no trend and is stable.
pub fn diagnose(records: &[ReadAttempt], thresholds: &DiagnosisThresholds) -> Diagnosis {
    let failures = records.iter().filter(|r| r.is_failure()).collect::<Vec<_>>();

    let (early_failures, late_failures) = split_count(&failures, |r| {
        r.sequence_position <= thresholds.position_midpoint
    });
    let position_pattern = if exceeds(late_failures, early_failures, thresholds.position_ratio) {
        PositionPattern::CongestionPattern
    } else if exceeds(early_failures, late_failures, thresholds.position_ratio) {
        PositionPattern::EarlyFailurePattern
    } else {
        PositionPattern::MixedPattern
    };

    let last_round = records.iter().map(|r| r.round).max().unwrap_or(0);
    let round_split = last_round / 2;
    let (early_round_failures, late_round_failures) =
        split_count(&failures, |r| r.round <= round_split);
    let round_trend = if last_round >= 2
        && exceeds(late_round_failures, early_round_failures, thresholds.round_ratio)
    {
        RoundTrend::Degrading
    } else {
        RoundTrend::Stable
    };

    Diagnosis {
        position_pattern,
        position_midpoint: thresholds.position_midpoint,
        early_failures,
        late_failures,
        round_trend,
        round_split,
        early_round_failures,
        late_round_failures,
    }
}

fn split_count(failures: &[&ReadAttempt], is_early: impl Fn(&ReadAttempt) -> bool) -> (usize, usize) {
    let early = failures.iter().filter(|r| is_early(r)).count();
    (early, failures.len() - early)
}

#[inline]
fn exceeds(count: usize, other: usize, ratio: f64) -> bool {
    count as f64 > other as f64 * ratio
}
