use latency_record_model::{fingerprint_records, ResourceKey, RunDescriptor};
use latency_summariser::aggregate::{longest_failure_streak, FailureRate, FailureStreak};
use latency_summariser::config::ReportConfig;
use latency_summariser::diagnose::{PositionPattern, RoundTrend};
use latency_summariser::histogram::{latency_histogram, LatencyBucket};
use latency_summariser::model::ReportOutput;
use latency_summariser::{
    compare, execute_report_for_file, filter, load_records_from_path, write_report,
    MalformedInputError, ALL_OBJECTS,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

const SMALL_RUN: &str = "latency_20260223_154752_delay3000ms_2rounds.csv";
const LATER_RUN: &str = "latency_20260224_090000_delay3000ms_2rounds.csv";

fn test_data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(name)
}

#[test]
fn report_for_small_run() -> anyhow::Result<()> {
    env_logger::try_init().ok();

    let report = execute_report_for_file(&test_data(SMALL_RUN), &ReportConfig::default())?;

    assert_eq!(report.run.delay_ms, Some(3000));
    assert_eq!(report.run.rounds, Some(2));
    assert_eq!(report.overview.total, 6);
    assert_eq!(report.overview.failures, 3);

    assert_eq!(report.failures_per_round[&1], FailureRate::new(2, 3));
    assert_eq!(report.failures_per_round[&2], FailureRate::new(1, 3));
    assert!((report.failures_per_round[&1].rate.unwrap() - 0.667).abs() < 0.001);
    assert!((report.failures_per_round[&2].rate.unwrap() - 0.333).abs() < 0.001);
    let per_round_total = report
        .failures_per_round
        .values()
        .map(|r| r.failures)
        .sum::<usize>();
    assert_eq!(per_round_total, report.overview.failures);

    assert_eq!(
        report.failure_streaks[&1],
        FailureStreak {
            length: 2,
            start_position: Some(2),
        }
    );

    assert_eq!(
        report.failures_per_resource[0].resource_key,
        ResourceKey::new("Conn Monitor", "Radio Signal Strength")
    );
    assert_eq!(report.failures_per_resource[0].failures, FailureRate::new(2, 2));

    assert_eq!(
        report.failed_resources_per_round[&1],
        vec!["Model Number".to_string(), "Radio Signal Strength".to_string()]
    );

    let success = report.success_latency.clone().unwrap();
    assert_eq!((success.min, success.max), (30, 50));
    assert_eq!(report.failure_timeouts.clone().unwrap().min, 5000);

    assert_eq!(
        report.timing_by_object.last().map(|r| r.object_name.as_str()),
        Some(ALL_OBJECTS)
    );

    // Every failure is past position 1, with the midpoint at 1
    let config = ReportConfig {
        diagnosis: latency_summariser::config::DiagnosisThresholds {
            position_midpoint: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let report = execute_report_for_file(&test_data(SMALL_RUN), &config)?;
    assert_eq!(
        report.diagnosis.position_pattern,
        PositionPattern::CongestionPattern
    );
    assert_eq!(report.diagnosis.round_trend, RoundTrend::Stable);

    Ok(())
}

#[test]
fn histogram_for_small_run() -> anyhow::Result<()> {
    let records = load_records_from_path(
        &test_data(SMALL_RUN),
        &ReportConfig::default().columns,
        "FAIL",
    )?;
    let histogram = latency_histogram(
        &records,
        &[
            LatencyBucket::new(0, 50, "fast"),
            LatencyBucket::new(50, 6000, "slow"),
        ],
    );

    assert_eq!(histogram[0].count, 2);
    // The 50ms read belongs to the upper bucket
    assert_eq!(histogram[1].count, 1);

    assert_eq!(
        longest_failure_streak(&records, 2),
        FailureStreak {
            length: 1,
            start_position: Some(3),
        }
    );
    Ok(())
}

#[test]
fn malformed_file_is_rejected() {
    let result = load_records_from_path(
        &test_data("malformed.csv"),
        &ReportConfig::default().columns,
        "FAIL",
    );

    assert!(matches!(
        result,
        Err(MalformedInputError::NonNumeric { row: 1, .. })
    ));
}

#[test]
fn report_written_as_json() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let report = execute_report_for_file(&test_data(SMALL_RUN), &ReportConfig::default())?;

    let path = write_report(dir.path(), report.clone(), false)?;
    let written: ReportOutput = serde_json::from_reader(std::fs::File::open(path)?)?;

    assert_eq!(written.report, report);
    Ok(())
}

#[test]
fn later_run_replaces_earlier_run_with_same_config() -> anyhow::Result<()> {
    let files = filter::discover_result_files(&test_data(""))?;
    let runs = files
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("latency_"))
        })
        .map(|path| Ok((RunDescriptor::from_path(&path)?, path)))
        .collect::<anyhow::Result<Vec<_>>>()?;
    assert_eq!(runs.len(), 2);

    let selected = filter::latest_runs_by_config(runs);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].2, test_data(LATER_RUN));
    Ok(())
}

#[test]
fn compare_two_runs() -> anyhow::Result<()> {
    let config = ReportConfig::default();
    let runs = [SMALL_RUN, LATER_RUN]
        .iter()
        .map(|name| {
            let path = test_data(name);
            let records =
                load_records_from_path(&path, &config.columns, &config.failure_marker)?;
            Ok((RunDescriptor::from_path(&path)?, records))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    assert_ne!(fingerprint_records(&runs[0].1), fingerprint_records(&runs[1].1));

    let comparisons = compare::compare_runs(&runs, config.slow_threshold_ms);
    let delta = comparisons[1].delta.clone().unwrap();

    assert_eq!(comparisons[0].failures, 3);
    assert_eq!(comparisons[1].failures, 1);
    assert_eq!(delta.failures, -2);
    assert_eq!(delta.slow_reads, 1);
    Ok(())
}
