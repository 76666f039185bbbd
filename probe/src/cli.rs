use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(about, long_about = None)]
pub struct CliArgs {
    /// Serial port the device console is attached to, e.g. `/dev/ttyACM0` or `COM13`.
    #[arg(long, env = "PROBE_PORT", required_unless_present = "list_ports")]
    pub port: Option<String>,

    /// Baud rate of the device console.
    #[arg(long, default_value = "115200")]
    pub baud: u32,

    /// Built in script to run: `quick`, `full` or `passive`.
    #[arg(long, default_value = "full", conflicts_with = "script_file")]
    pub script: String,

    /// Run a custom script loaded from a TOML file instead.
    #[arg(long)]
    pub script_file: Option<PathBuf>,

    /// Poll interval while waiting for a response, in milliseconds.
    #[arg(long, default_value = "100")]
    pub poll_ms: u64,

    /// Write the session transcript as JSON to this file.
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Only list the available serial ports.
    #[arg(long, default_value = "false")]
    pub list_ports: bool,
}
