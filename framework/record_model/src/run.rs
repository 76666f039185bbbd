use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::path::Path;

const FILE_PREFIX: &str = "latency_";
const STARTED_AT_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Description of a single test run
///
/// The test harness names its result logs `latency_<YYYYMMDD>_<HHMMSS>_delay<N>ms_<R>rounds.csv`.
/// All of the run metadata is taken from that name. Logs that were renamed still load, they just
/// carry no metadata beyond their name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunDescriptor {
    /// The file stem of the result log
    pub name: String,
    /// Local time at which the harness started the run
    pub started_at: Option<NaiveDateTime>,
    /// The configured inter-request delay
    pub delay_ms: Option<u64>,
    /// The configured number of rounds
    pub rounds: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum RunDescriptorError {
    #[error("Path has no usable file name: {0}")]
    NoFileName(String),
}

impl RunDescriptor {
    /// Describe a run that has no metadata beyond its name
    pub fn unnamed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started_at: None,
            delay_ms: None,
            rounds: None,
        }
    }

    /// Parse the run metadata from the path of a result log
    pub fn from_path(path: &Path) -> Result<Self, RunDescriptorError> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| RunDescriptorError::NoFileName(path.display().to_string()))?;

        Ok(Self::from_name(name))
    }

    /// Parse the run metadata from a result log file stem
    pub fn from_name(name: &str) -> Self {
        let mut descriptor = Self::unnamed(name);

        let Some(rest) = name.strip_prefix(FILE_PREFIX) else {
            return descriptor;
        };

        let parts = rest.split('_').collect::<Vec<_>>();
        if parts.len() >= 2 {
            descriptor.started_at = NaiveDateTime::parse_from_str(
                &format!("{}_{}", parts[0], parts[1]),
                STARTED_AT_FORMAT,
            )
            .ok();
        }

        for part in &parts {
            if let Some(delay) = part
                .strip_prefix("delay")
                .and_then(|d| d.strip_suffix("ms"))
            {
                descriptor.delay_ms = delay.parse().ok();
            } else if let Some(rounds) = part.strip_suffix("rounds") {
                descriptor.rounds = rounds.parse().ok();
            }
        }

        descriptor
    }

    /// Compute a fingerprint for the configuration of this run
    ///
    /// The fingerprint identifies runs that used the same harness configuration. It uses the
    ///     - Inter-request delay
    ///     - Number of rounds
    ///
    /// Runs without any configuration fall back to their name so that they are never grouped
    /// together. The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        if self.delay_ms.is_none() && self.rounds.is_none() {
            Digest::update(&mut hasher, self.name.as_bytes());
        }
        if let Some(delay_ms) = self.delay_ms {
            Digest::update(&mut hasher, b"delay");
            Digest::update(&mut hasher, delay_ms.to_le_bytes());
        }
        if let Some(rounds) = self.rounds {
            Digest::update(&mut hasher, b"rounds");
            Digest::update(&mut hasher, rounds.to_le_bytes());
        }

        format!("{:x}", hasher.finalize())
    }
}
