use anyhow::{anyhow, Context};
use clap::Parser as _;
use serial_probe::port::{available_ports, open_console, PortSettings};
use serial_probe::{run_session, ProbeError, ProbeScript, SessionOptions};
use std::time::Duration;

mod cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = cli::CliArgs::parse();

    if args.list_ports {
        for port in available_ports() {
            println!("{port}");
        }
        return Ok(());
    }

    let script = match &args.script_file {
        Some(path) => ProbeScript::load(path)
            .with_context(|| format!("Failed to load script {}", path.display()))?,
        None => ProbeScript::builtin(&args.script)
            .ok_or_else(|| anyhow!("Unknown script `{}`", args.script))?,
    };

    let port = args.port.clone().context("No serial port given")?;
    let settings = PortSettings {
        baud_rate: args.baud,
        hold_reset_lines_low: script.hold_reset_lines_low,
        ..PortSettings::new(port)
    };
    println!("Opening {} at {} baud...", settings.path, settings.baud_rate);

    let console = match open_console(&settings) {
        Ok(console) => console,
        Err(ProbeError::Open {
            path,
            source,
            available,
        }) => {
            eprintln!("ERROR: Cannot open {path}: {source}");
            eprintln!("\nAvailable ports:");
            for port in &available {
                eprintln!("  {port}");
            }
            return Err(anyhow!("Cannot open serial port {path}"));
        }
        Err(e) => return Err(e.into()),
    };

    let options = SessionOptions {
        poll_interval: Duration::from_millis(args.poll_ms),
        ..Default::default()
    };
    let report = run_session(console, settings.path.clone(), &script, options);

    println!("{}", report.transcript()?);
    println!("\n--- Done ---");

    if let Some(path) = &args.json {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write transcript to {}", path.display()))?;
        log::info!("Wrote transcript to {}", path.display());
    }

    Ok(())
}
