use crate::config::ReportConfig;
use crate::model::{LatencyReport, ReportOutput};
use anyhow::Context;
use latency_record_model::{fingerprint_records, ReadAttempt, RunDescriptor};
use std::path::{Path, PathBuf};

pub mod aggregate;
mod analyze;
pub mod compare;
pub mod config;
pub mod diagnose;
pub mod export;
pub mod filter;
mod frame;
pub mod histogram;
pub mod model;
mod partition;
pub mod render;

#[cfg(test)]
mod test_support;

pub use analyze::{
    failure_timeouts, success_latency_summary, success_spread, timing_stats_by_object,
    ALL_OBJECTS,
};
pub use frame::{load_records, load_records_from_path, MalformedInputError};

/// Number of fingerprint characters used in report file names
const FINGERPRINT_PREFIX_LEN: usize = 12;

/// Compute every statistic for one run
pub fn generate_report(
    run: RunDescriptor,
    records: &[ReadAttempt],
    config: &ReportConfig,
) -> anyhow::Result<LatencyReport> {
    log::debug!("Generating report for {} from {} records", run.name, records.len());

    Ok(LatencyReport {
        fingerprint: fingerprint_records(records),
        overview: aggregate::run_overview(records),
        failures_per_round: aggregate::failures_per_round(records),
        failed_resources_per_round: aggregate::failed_resources_per_round(records),
        failures_per_resource: aggregate::failures_per_resource(records),
        failure_rate_by_position: aggregate::failure_rate_by_position(records),
        latency_by_position: aggregate::latency_by_position(records),
        failure_streaks: aggregate::failure_streaks(records),
        latency_histogram: histogram::latency_histogram(records, &config.buckets),
        success_latency: success_latency_summary(records),
        success_spread: success_spread(records).context("Success latency spread")?,
        failure_timeouts: failure_timeouts(records),
        timing_by_object: timing_stats_by_object(records).context("Timing by object")?,
        diagnosis: diagnose::diagnose(records, &config.diagnosis),
        run,
    })
}

/// Load a result log and compute its report
pub fn execute_report_for_file(path: &Path, config: &ReportConfig) -> anyhow::Result<LatencyReport> {
    let run = RunDescriptor::from_path(path)?;
    let records = load_records_from_path(path, &config.columns, &config.failure_marker)
        .with_context(|| format!("Failed to load records from {}", path.display()))?;
    log::debug!("Loaded {} records from {}", records.len(), path.display());

    generate_report(run, &records, config)
}

/// Path of the JSON file a report is written to
pub fn report_output_path(out_dir: &Path, report: &LatencyReport) -> PathBuf {
    let prefix = report
        .fingerprint
        .get(..FINGERPRINT_PREFIX_LEN)
        .unwrap_or(&report.fingerprint);

    out_dir.join(format!("latency-report-{}-{prefix}.json", report.run.name))
}

/// Write a report as pretty JSON.
///
/// An existing file is only replaced when `overwrite` is set.
pub fn write_report(out_dir: &Path, report: LatencyReport, overwrite: bool) -> anyhow::Result<PathBuf> {
    let path = report_output_path(out_dir, &report);
    let file = if overwrite {
        std::fs::File::create(&path)
    } else {
        std::fs::File::create_new(&path)
    }
    .with_context(|| format!("Failed to create report file {}", path.display()))?;

    serde_json::to_writer_pretty(file, &ReportOutput::new(report))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::run_from_pattern;
    use pretty_assertions::assert_eq;

    #[test]
    fn report_on_empty_run() -> anyhow::Result<()> {
        let report = generate_report(
            RunDescriptor::unnamed("empty"),
            &[],
            &ReportConfig::default(),
        )?;

        assert_eq!(report.overview.total, 0);
        assert!(report.failures_per_round.is_empty());
        assert_eq!(report.success_latency, None);
        assert!(report.timing_by_object.is_empty());
        assert!(report.latency_histogram.iter().all(|b| b.count == 0));
        Ok(())
    }

    #[test]
    fn report_file_is_not_overwritten() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let report = generate_report(
            RunDescriptor::unnamed("run"),
            &run_from_pattern(&["x.."]),
            &ReportConfig::default(),
        )?;

        let path = write_report(dir.path(), report.clone(), false)?;
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("latency-report-run-")));

        assert!(write_report(dir.path(), report.clone(), false).is_err());
        assert_eq!(write_report(dir.path(), report.clone(), true)?, path);

        let written: ReportOutput = serde_json::from_reader(std::fs::File::open(&path)?)?;
        assert_eq!(written.report, report);
        Ok(())
    }
}
