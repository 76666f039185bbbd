use crate::aggregate::FailureRate;
use crate::compare::RunComparison;
use crate::config::ReportConfig;
use crate::model::{LatencyReport, ObjectTimingStats};
use std::fmt::Write;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct TimingRow {
    #[tabled(rename = "Object")]
    object_name: String,
    #[tabled(rename = "N")]
    count: usize,
    #[tabled(rename = "Mean ms", display = "float2")]
    mean: f64,
    #[tabled(rename = "Std ms", display = "opt_float2")]
    std: Option<f64>,
    #[tabled(rename = "Min ms", display = "float2")]
    min: f64,
    #[tabled(rename = "Median ms", display = "float2")]
    median: f64,
    #[tabled(rename = "P90 ms", display = "float2")]
    p90: f64,
    #[tabled(rename = "P99 ms", display = "float2")]
    p99: f64,
    #[tabled(rename = "Max ms", display = "float2")]
    max: f64,
}

impl From<&ObjectTimingStats> for TimingRow {
    fn from(stats: &ObjectTimingStats) -> Self {
        Self {
            object_name: stats.object_name.clone(),
            count: stats.count,
            mean: stats.mean,
            std: stats.std,
            min: stats.min,
            median: stats.median,
            p90: stats.p90,
            p99: stats.p99,
            max: stats.max,
        }
    }
}

#[derive(Tabled)]
struct ComparisonRow {
    #[tabled(rename = "Run")]
    name: String,
    #[tabled(rename = "Failures")]
    failures: String,
    #[tabled(rename = "Success")]
    success_rate: String,
    #[tabled(rename = "Mean ms", display = "opt_float2")]
    mean: Option<f64>,
    #[tabled(rename = "Median ms", display = "opt_int")]
    median: Option<u64>,
    #[tabled(rename = "P95 ms", display = "opt_int")]
    p95: Option<u64>,
    #[tabled(rename = "P99 ms", display = "opt_int")]
    p99: Option<u64>,
    #[tabled(rename = "Max ms", display = "opt_int")]
    max: Option<u64>,
    #[tabled(rename = "Slow")]
    slow_reads: usize,
    #[tabled(rename = "Fail timeout ms", display = "opt_float2")]
    timeout: Option<f64>,
    #[tabled(rename = "Delta")]
    delta: String,
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}

fn opt_float2(n: &Option<f64>) -> String {
    n.map(|n| float2(&n)).unwrap_or_else(|| "-".to_string())
}

fn opt_int(n: &Option<u64>) -> String {
    n.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
}

fn percent(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:5.1}%", r * 100.0))
        .unwrap_or_else(|| "    -".to_string())
}

/// Failures as `#` followed by the remaining attempts as `.`, padded with `.` to at least `floor`
fn bar(failures: usize, total: usize, floor: usize) -> String {
    let width = total.max(floor).max(failures);
    format!("{}{}", "#".repeat(failures), ".".repeat(width - failures))
}

fn rate_line(rate: &FailureRate) -> String {
    format!(
        "{:>3}/{:<3} fail ({})",
        rate.failures,
        rate.total,
        percent(rate.rate)
    )
}

/// Render a report as the plain text shown on the terminal
pub fn render_report(report: &LatencyReport, config: &ReportConfig) -> anyhow::Result<String> {
    let mut out = String::new();

    writeln!(out, "Latency report for {}", report.run.name)?;
    if let Some(started_at) = report.run.started_at {
        writeln!(out, "  Started at: {started_at}")?;
    }
    if let Some(delay_ms) = report.run.delay_ms {
        writeln!(out, "  Delay: {delay_ms} ms")?;
    }
    let overview = &report.overview;
    writeln!(
        out,
        "  Total requests: {}, Failed: {} ({}), Rounds: {}, Resources: {}",
        overview.total,
        overview.failures,
        percent(overview.failure_rate).trim(),
        overview.rounds,
        overview.resources
    )?;

    writeln!(out, "\n=== FAILURES PER ROUND ===")?;
    for (round, rate) in &report.failures_per_round {
        let failed = report
            .failed_resources_per_round
            .get(round)
            .filter(|labels| !labels.is_empty())
            .map(|labels| labels.join(", "))
            .unwrap_or_else(|| "OK".to_string());
        writeln!(
            out,
            "  Round {round:2}: {}  [{}]  {failed}",
            rate_line(rate),
            bar(rate.failures, rate.total, config.bar_width)
        )?;
    }

    writeln!(out, "\n=== FAILURES PER RESOURCE ===")?;
    for resource in &report.failures_per_resource {
        writeln!(
            out,
            "  {:40} {}  [{}]",
            resource.resource_key.as_str(),
            rate_line(&resource.failures),
            bar(resource.failures.failures, resource.failures.total, 0)
        )?;
    }

    writeln!(out, "\n=== FAILURE RATE BY SEQUENCE POSITION ===")?;
    for (position, rate) in &report.failure_rate_by_position {
        let key = report
            .latency_by_position
            .get(position)
            .and_then(|p| p.resource_key.as_ref())
            .map(|k| k.as_str())
            .unwrap_or("");
        writeln!(
            out,
            "  Seq {position:2} {key:35}: {}  [{}]",
            rate_line(rate),
            bar(rate.failures, rate.total, 0)
        )?;
    }

    writeln!(out, "\n=== LONGEST CONSECUTIVE FAILURE STREAKS PER ROUND ===")?;
    for (round, streak) in &report.failure_streaks {
        match streak.start_position {
            Some(start) => writeln!(
                out,
                "  Round {round:2}: max streak = {} (starting at seq {start})",
                streak.length
            )?,
            None => writeln!(out, "  Round {round:2}: no failures")?,
        }
    }

    writeln!(out, "\n=== LATENCY BUCKETS (successful reads) ===")?;
    for bucket in &report.latency_histogram {
        writeln!(
            out,
            "  {:30}: {:3} ({:5.1}%)",
            bucket.label,
            bucket.count,
            bucket.fraction * 100.0
        )?;
    }
    if let Some(summary) = &report.success_latency {
        writeln!(
            out,
            "  Min {} ms, Max {} ms, Mean {:.1} ms, Median {:.1} ms, P95 {:.1} ms, P99 {:.1} ms",
            summary.min, summary.max, summary.mean, summary.median, summary.p95, summary.p99
        )?;
    }
    if let Some(timeouts) = &report.failure_timeouts {
        writeln!(
            out,
            "  Failure timeout range: {}-{} ms",
            timeouts.min, timeouts.max
        )?;
    }

    writeln!(out, "\n=== CONGESTION BUILD-UP ===")?;
    for (position, latency) in &report.latency_by_position {
        let mean = latency
            .mean_latency_ms
            .map(|m| format!("{m:7.0}"))
            .unwrap_or_else(|| "      -".to_string());
        writeln!(
            out,
            "  Seq {position:2}: avg={mean}ms  fails={}/{}",
            latency.failures.failures, latency.failures.total
        )?;
    }

    if !report.timing_by_object.is_empty() {
        writeln!(out, "\n=== TIMING BY OBJECT (successful reads) ===")?;
        let rows = report
            .timing_by_object
            .iter()
            .map(TimingRow::from)
            .collect::<Vec<_>>();
        let mut table = Table::new(&rows);
        table.with(Style::modern());
        writeln!(out, "{table}")?;
    }
    if let Some(spread) = &report.success_spread {
        writeln!(
            out,
            "  Within 1/2/3 std of the mean: {:.1}% / {:.1}% / {:.1}%",
            spread.within_std * 100.0,
            spread.within_2std * 100.0,
            spread.within_3std * 100.0
        )?;
    }

    let diagnosis = &report.diagnosis;
    writeln!(out, "\n=== DIAGNOSIS ===")?;
    writeln!(
        out,
        "  Failures in seq 1-{} (early): {}",
        diagnosis.position_midpoint, diagnosis.early_failures
    )?;
    let late_positions = diagnosis
        .position_midpoint
        .checked_add(1)
        .map_or_else(|| "none".to_string(), |first| format!("{first}+"));
    writeln!(
        out,
        "  Failures in seq {} (late):   {}",
        late_positions, diagnosis.late_failures
    )?;
    writeln!(out, "  -> {}", diagnosis.position_pattern)?;
    if diagnosis.round_split == 0 {
        writeln!(out, "\n  Failures by round: n/a (single round)")?;
    } else {
        writeln!(
            out,
            "\n  Failures in rounds 1-{}: {}",
            diagnosis.round_split, diagnosis.early_round_failures
        )?;
        writeln!(
            out,
            "  Failures in rounds {}+:  {}",
            diagnosis.round_split + 1,
            diagnosis.late_round_failures
        )?;
    }
    writeln!(out, "  -> {}", diagnosis.round_trend)?;

    Ok(out)
}

/// Render a run comparison as a table, the first run is the baseline
pub fn render_comparison(comparisons: &[RunComparison]) -> String {
    let rows = comparisons
        .iter()
        .map(|c| ComparisonRow {
            name: c.run.name.clone(),
            failures: format!("{}/{}", c.failures, c.total),
            success_rate: percent(c.success_rate).trim().to_string(),
            mean: c.mean_latency_ms,
            median: c.median_latency_ms,
            p95: c.p95_latency_ms,
            p99: c.p99_latency_ms,
            max: c.max_latency_ms,
            slow_reads: c.slow_reads,
            timeout: c.mean_failure_timeout_ms,
            delta: c
                .delta
                .as_ref()
                .map(|d| format!("{:+} fails, {:+} slow", d.failures, d.slow_reads))
                .unwrap_or_else(|| "baseline".to_string()),
        })
        .collect::<Vec<_>>();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.to_string()
}
