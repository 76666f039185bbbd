use crate::session::{Exchange, ExchangeKind, Finding};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// The transcript of a finished session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionReport {
    pub script: String,
    pub port: String,
    pub started_at: DateTime<Utc>,
    pub exchanges: Vec<Exchange>,
    pub findings: Vec<Finding>,
}

impl SessionReport {
    /// Human readable transcript, one indented line per non-empty response line
    pub fn transcript(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();

        for exchange in &self.exchanges {
            let heading = match (exchange.kind, &exchange.command) {
                (ExchangeKind::Command, Some(command)) => format!(">>> {command}"),
                (ExchangeKind::Wake, _) => "--- wake".to_string(),
                _ => "--- listening".to_string(),
            };
            writeln!(out, "\n{heading}")?;

            if !exchange.answered() {
                writeln!(out, "  (no response)")?;
                continue;
            }
            for line in exchange.response.lines().map(str::trim) {
                if !line.is_empty() {
                    writeln!(out, "  {line}")?;
                }
            }
        }

        for finding in &self.findings {
            writeln!(out, "\n*** {finding} ***")?;
        }

        Ok(out)
    }

    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
