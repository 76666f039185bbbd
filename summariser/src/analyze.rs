use crate::frame::{columns, frame_from_records};
use crate::model::{LatencySummary, ObjectTimingStats, StandardTimingsStats, TimeoutRange};
use crate::partition::partition_by_tag;
use anyhow::Context;
use latency_record_model::ReadAttempt;
use polars::frame::DataFrame;
use polars::prelude::*;

/// Object name used for the row that covers every object
pub const ALL_OBJECTS: &str = "ALL";

pub(crate) fn standard_timing_stats(
    frame: DataFrame,
    column: &str,
) -> anyhow::Result<StandardTimingsStats> {
    let value_series = frame.column(column)?.as_materialized_series().clone();

    let mean = value_series.mean().context("Mean")?;
    let std = value_series.std(0).context("Std")?;

    let out = frame
        .clone()
        .lazy()
        .select([
            col(column)
                .gt_eq(lit(mean - std))
                .and(col(column).lt_eq(lit(mean + std)))
                .alias("within_std"),
            col(column)
                .gt_eq(lit(mean - 2.0 * std))
                .and(col(column).lt_eq(lit(mean + 2.0 * std)))
                .alias("within_2std"),
            col(column)
                .gt_eq(lit(mean - 3.0 * std))
                .and(col(column).lt_eq(lit(mean + 3.0 * std)))
                .alias("within_3std"),
        ])
        .collect()?;

    let total = value_series.len() as f64;
    let share = |name: &str| -> anyhow::Result<f64> {
        let count = out
            .column(name)?
            .as_materialized_series()
            .sum::<usize>()
            .with_context(|| format!("{name} sum"))?;
        Ok(count as f64 / total)
    };

    Ok(StandardTimingsStats {
        mean,
        std,
        within_std: share("within_std")?,
        within_2std: share("within_2std")?,
        within_3std: share("within_3std")?,
    })
}

/// Mean, std and spread of successful read latencies, `None` when nothing succeeded
pub fn success_spread(records: &[ReadAttempt]) -> anyhow::Result<Option<StandardTimingsStats>> {
    let successes = successes(records);
    if successes.is_empty() {
        return Ok(None);
    }

    let frame = frame_from_records(&successes)?;
    standard_timing_stats(frame, columns::LATENCY_MS)
        .context("Standard timing stats")
        .map(Some)
}

/// Per-object statistics of successful read latencies.
///
/// Rows are sorted by mean latency, fastest first, followed by an [ALL_OBJECTS] row. No rows are
/// produced when nothing succeeded.
pub fn timing_stats_by_object(records: &[ReadAttempt]) -> anyhow::Result<Vec<ObjectTimingStats>> {
    let successes = successes(records);
    if successes.is_empty() {
        return Ok(Vec::new());
    }

    let frame = frame_from_records(&successes)?;
    let mut rows = partition_by_tag(frame.clone(), columns::OBJECT_NAME)?
        .into_iter()
        .map(|(object_name, partition)| timing_row(object_name, &partition))
        .collect::<anyhow::Result<Vec<_>>>()?;
    rows.sort_by(|a, b| a.mean.total_cmp(&b.mean));

    rows.push(timing_row(ALL_OBJECTS.to_string(), &frame)?);

    Ok(rows)
}

fn timing_row(object_name: String, frame: &DataFrame) -> anyhow::Result<ObjectTimingStats> {
    let latencies = frame.column(columns::LATENCY_MS)?.as_materialized_series();

    let mean = latencies.mean().context("Mean")?;
    let std = latencies.std(1).filter(|s| s.is_finite());
    let min = latencies
        .min::<f64>()
        .context("Min")?
        .context("Missing min")?;
    let max = latencies
        .max::<f64>()
        .context("Max")?
        .context("Missing max")?;

    let mut sorted = latencies.f64()?.into_no_null_iter().collect::<Vec<_>>();
    sorted.sort_by(f64::total_cmp);

    Ok(ObjectTimingStats {
        object_name,
        count: sorted.len(),
        mean,
        std,
        min,
        median: percentile(&sorted, 50.0),
        p90: percentile(&sorted, 90.0),
        p99: percentile(&sorted, 99.0),
        max,
    })
}

/// Summarise successful read latencies, `None` when nothing succeeded
pub fn success_latency_summary(records: &[ReadAttempt]) -> Option<LatencySummary> {
    let mut latencies = records
        .iter()
        .filter(|r| !r.is_failure())
        .map(|r| r.latency_ms)
        .collect::<Vec<_>>();
    latencies.sort_unstable();

    let min = *latencies.first()?;
    let max = *latencies.last()?;
    let sorted = latencies.iter().map(|l| *l as f64).collect::<Vec<_>>();

    Some(LatencySummary {
        count: latencies.len(),
        min,
        max,
        mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        median: percentile(&sorted, 50.0),
        p90: percentile(&sorted, 90.0),
        p95: percentile(&sorted, 95.0),
        p99: percentile(&sorted, 99.0),
    })
}

/// Range of the time failed reads waited for, `None` when nothing failed
pub fn failure_timeouts(records: &[ReadAttempt]) -> Option<TimeoutRange> {
    let latencies = records
        .iter()
        .filter(|r| r.is_failure())
        .map(|r| r.latency_ms)
        .collect::<Vec<_>>();

    Some(TimeoutRange {
        count: latencies.len(),
        min: latencies.iter().min().copied()?,
        max: latencies.iter().max().copied()?,
        mean: latencies.iter().sum::<u64>() as f64 / latencies.len() as f64,
    })
}

/// Percentile of sorted values, interpolating linearly between the closest ranks.
///
/// `sorted` must not be empty.
pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}

fn successes(records: &[ReadAttempt]) -> Vec<ReadAttempt> {
    records
        .iter()
        .filter(|r| !r.is_failure())
        .cloned()
        .collect()
}
