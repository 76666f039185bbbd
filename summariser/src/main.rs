use anyhow::{anyhow, Context};
use clap::Parser as _;
use latency_record_model::RunDescriptor;
use latency_summariser::config::ReportConfig;
use latency_summariser::{compare, export, filter, render};
use std::path::{Path, PathBuf};

mod cli;

use cli::{CliArgs, Command, CompareArgs, ReportArgs};

/// Environment variable that turns failed reports into warnings
const IGNORE_REPORT_ERRORS_ENV: &str = "IGNORE_REPORT_ERRORS";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    let config = match &args.config {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ReportConfig::default(),
    };

    match args.command {
        Command::Report(report_args) => run_reports(report_args, &config),
        Command::Compare(compare_args) => run_compare(compare_args, &config),
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn select_inputs(args: &ReportArgs) -> anyhow::Result<Vec<PathBuf>> {
    let mut inputs = args.inputs.clone();
    if let Some(dir) = &args.dir {
        inputs.extend(filter::discover_result_files(dir)?);
    }
    if inputs.is_empty() {
        return Err(anyhow!("No result logs given, pass files or --dir"));
    }

    if !args.latest_only {
        return Ok(inputs);
    }

    let runs = inputs
        .into_iter()
        .map(|path| Ok((RunDescriptor::from_path(&path)?, path)))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let selected = filter::latest_runs_by_config(runs);
    for (fingerprint, descriptor, path) in &selected {
        log::debug!(
            "Selected {} ({fingerprint}) from {}",
            descriptor.name,
            path.display()
        );
    }

    Ok(selected.into_iter().map(|(_, _, path)| path).collect())
}

fn run_reports(args: ReportArgs, config: &ReportConfig) -> anyhow::Result<()> {
    let ignore_errors = std::env::var(IGNORE_REPORT_ERRORS_ENV).is_ok();

    let inputs = select_inputs(&args)?;
    let total_reports = inputs.len();
    let mut errors = vec![];

    for path in inputs {
        if let Err(e) = report_for_file(&path, &args, config) {
            log::error!("Report for {} failed: {e:?}", path.display());
            errors.push(e);
        }
    }

    // If any of the reports failed and errors should not explicitly be ignored, return an error
    if !errors.is_empty() {
        let error_message = format!(
            "{} out of {} reports failed:\n{:#?}",
            errors.len(),
            total_reports,
            errors
        );

        if ignore_errors {
            log::warn!("{}", error_message);
        } else {
            return Err(anyhow!(error_message));
        }
    }

    Ok(())
}

fn report_for_file(path: &Path, args: &ReportArgs, config: &ReportConfig) -> anyhow::Result<()> {
    let report = latency_summariser::execute_report_for_file(path, config)?;

    println!("{}", render::render_report(&report, config)?);

    if let Some(dir) = &args.stats_csv {
        std::fs::create_dir_all(dir)?;
        let csv_path = dir.join(format!("timing-{}.csv", report.run.name));
        export::write_timing_csv(&report.timing_by_object, &csv_path)
            .with_context(|| format!("Failed to write {}", csv_path.display()))?;
    }

    if let Some(out_dir) = &args.out_dir {
        std::fs::create_dir_all(out_dir)?;
        let name = report.run.name.clone();
        let written = latency_summariser::write_report(out_dir, report, args.overwrite)?;
        log::info!("Wrote report for {name} to {}", written.display());
    }

    Ok(())
}

fn run_compare(args: CompareArgs, config: &ReportConfig) -> anyhow::Result<()> {
    let runs = args
        .inputs
        .iter()
        .map(|path| {
            let records = latency_summariser::load_records_from_path(
                path,
                &config.columns,
                &config.failure_marker,
            )
            .with_context(|| format!("Failed to load records from {}", path.display()))?;
            Ok((RunDescriptor::from_path(path)?, records))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let comparisons = compare::compare_runs(&runs, config.slow_threshold_ms);
    println!("{}", render::render_comparison(&comparisons));

    if let Some(json_path) = &args.json {
        let file = std::fs::File::create(json_path)
            .with_context(|| format!("Failed to create {}", json_path.display()))?;
        serde_json::to_writer_pretty(file, &comparisons)?;
        log::info!("Wrote comparison to {}", json_path.display());
    }

    Ok(())
}
