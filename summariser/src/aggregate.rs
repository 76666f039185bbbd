use itertools::Itertools;
use latency_record_model::{ReadAttempt, ResourceKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Failure count out of a total.
///
/// `rate` is `None` for an empty group rather than dividing by zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct FailureRate {
    pub failures: usize,
    pub total: usize,
    pub rate: Option<f64>,
}

impl FailureRate {
    pub fn new(failures: usize, total: usize) -> Self {
        Self {
            failures,
            total,
            rate: (total > 0).then(|| failures as f64 / total as f64),
        }
    }

    fn tally<'a>(records: impl IntoIterator<Item = &'a ReadAttempt>) -> Self {
        let (failures, total) = records
            .into_iter()
            .fold((0, 0), |(failures, total), record| {
                (failures + usize::from(record.is_failure()), total + 1)
            });

        Self::new(failures, total)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceFailures {
    pub resource_key: ResourceKey,
    #[serde(flatten)]
    pub failures: FailureRate,
}

/// The longest run of consecutive failures within a round
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureStreak {
    pub length: usize,
    /// Sequence position of the first failure in the streak, `None` when nothing failed
    pub start_position: Option<u32>,
}

/// Overall counts for a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOverview {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    pub failure_rate: Option<f64>,
    pub rounds: usize,
    pub resources: usize,
}

/// Mean latency of every attempt at one sequence position, failures included
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionLatency {
    pub resource_key: Option<ResourceKey>,
    pub mean_latency_ms: Option<f64>,
    #[serde(flatten)]
    pub failures: FailureRate,
}

pub fn run_overview(records: &[ReadAttempt]) -> RunOverview {
    let tally = FailureRate::tally(records);

    RunOverview {
        total: tally.total,
        successes: tally.total - tally.failures,
        failures: tally.failures,
        failure_rate: tally.rate,
        rounds: records.iter().map(|r| r.round).collect::<HashSet<_>>().len(),
        resources: records
            .iter()
            .map(|r| r.resource_key())
            .collect::<HashSet<_>>()
            .len(),
    }
}

/// Most missing keys [dense_groups] fills in before it falls back to the keys actually seen
pub const MAX_FILLED_GAPS: usize = 1024;

/// Fill a group map so that every key from 1 to the highest key is present.
///
/// Numbering too sparse to fill within [MAX_FILLED_GAPS] keeps only the keys seen in the records.
fn dense_groups<'a>(
    records: &'a [ReadAttempt],
    key: impl Fn(&ReadAttempt) -> u32,
) -> BTreeMap<u32, Vec<&'a ReadAttempt>> {
    let mut groups = records
        .iter()
        .into_group_map_by(|r| key(r))
        .into_iter()
        .collect::<BTreeMap<_, _>>();

    let last = groups.keys().next_back().copied().unwrap_or(0);
    let missing = (last as usize).saturating_sub(groups.len());
    if missing > MAX_FILLED_GAPS {
        log::warn!(
            "{} numbers missing below {}, reporting only the {} seen",
            missing,
            last,
            groups.len()
        );
        return groups;
    }

    for k in 1..=last {
        groups.entry(k).or_default();
    }

    groups
}

/// Failures per round.
///
/// Every round from 1 up to the last round seen is reported, a round without records is `0/0`.
/// Round numbers with more than [MAX_FILLED_GAPS] gaps are reported only where records exist.
pub fn failures_per_round(records: &[ReadAttempt]) -> BTreeMap<u32, FailureRate> {
    dense_groups(records, |r| r.round)
        .into_iter()
        .map(|(round, group)| (round, FailureRate::tally(group)))
        .collect()
}

/// Failures per resource, most failures first and ties ordered by resource key.
pub fn failures_per_resource(records: &[ReadAttempt]) -> Vec<ResourceFailures> {
    records
        .iter()
        .into_group_map_by(|r| r.resource_key())
        .into_iter()
        .map(|(resource_key, group)| ResourceFailures {
            resource_key,
            failures: FailureRate::tally(group),
        })
        .sorted_by(|a, b| {
            b.failures
                .failures
                .cmp(&a.failures.failures)
                .then_with(|| a.resource_key.cmp(&b.resource_key))
        })
        .collect()
}

/// Failures per sequence position, across all rounds.
pub fn failure_rate_by_position(records: &[ReadAttempt]) -> BTreeMap<u32, FailureRate> {
    dense_groups(records, |r| r.sequence_position)
        .into_iter()
        .map(|(position, group)| (position, FailureRate::tally(group)))
        .collect()
}

/// Find the longest run of consecutive failures in `round`, ordered by sequence position.
///
/// When two streaks have the same length the earlier one is kept.
pub fn longest_failure_streak(records: &[ReadAttempt], round: u32) -> FailureStreak {
    streak_of(records.iter().filter(|r| r.round == round))
}

fn streak_of<'a>(attempts: impl IntoIterator<Item = &'a ReadAttempt>) -> FailureStreak {
    let mut longest = FailureStreak::default();
    let mut current = 0;
    let mut current_start = 0;
    for attempt in attempts
        .into_iter()
        .sorted_by_key(|r| r.sequence_position)
    {
        if attempt.is_failure() {
            if current == 0 {
                current_start = attempt.sequence_position;
            }
            current += 1;
            if current > longest.length {
                longest = FailureStreak {
                    length: current,
                    start_position: Some(current_start),
                };
            }
        } else {
            current = 0;
        }
    }

    longest
}

/// [longest_failure_streak] for the same rounds [failures_per_round] reports
pub fn failure_streaks(records: &[ReadAttempt]) -> BTreeMap<u32, FailureStreak> {
    dense_groups(records, |r| r.round)
        .into_iter()
        .map(|(round, group)| (round, streak_of(group)))
        .collect()
}

/// Labels of the resources that failed in each round, in sequence order
pub fn failed_resources_per_round(records: &[ReadAttempt]) -> BTreeMap<u32, Vec<String>> {
    dense_groups(records, |r| r.round)
        .into_iter()
        .map(|(round, group)| {
            let labels = group
                .into_iter()
                .filter(|r| r.is_failure())
                .sorted_by_key(|r| r.sequence_position)
                .map(|r| r.resource_label.clone())
                .collect();
            (round, labels)
        })
        .collect()
}

/// Mean latency and failures by sequence position, to show congestion building up in a round
pub fn latency_by_position(records: &[ReadAttempt]) -> BTreeMap<u32, PositionLatency> {
    dense_groups(records, |r| r.sequence_position)
        .into_iter()
        .map(|(position, group)| {
            let mean_latency_ms = (!group.is_empty()).then(|| {
                group.iter().map(|r| r.latency_ms as f64).sum::<f64>() / group.len() as f64
            });

            (
                position,
                PositionLatency {
                    resource_key: group.first().map(|r| r.resource_key()),
                    mean_latency_ms,
                    failures: FailureRate::tally(group),
                },
            )
        })
        .collect()
}
