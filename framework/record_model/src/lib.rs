use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::fmt;

mod run;

pub use run::{RunDescriptor, RunDescriptorError};

/// Outcome of a single read attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Classify a recorded status text.
    ///
    /// An attempt failed when the status contains `failure_marker`, for example `FAIL (504)`.
    pub fn from_status(status: &str, failure_marker: &str) -> Self {
        if status.contains(failure_marker) {
            Outcome::Failure
        } else {
            Outcome::Success
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure)
    }
}

/// Identity of a logical read target, `<object name>/<resource label>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn new(object_name: &str, resource_label: &str) -> Self {
        Self(format!("{object_name}/{resource_label}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of a latency result log
///
/// Records are loaded once and never modified. Within a run every round covers the same
/// sequence positions and the same resources, so attempts can be compared across rounds either
/// by position or by [ResourceKey].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadAttempt {
    /// The trial iteration, starting at 1
    pub round: u32,
    /// 1-based position of this attempt within its round
    pub sequence_position: u32,
    /// LwM2M object id, e.g. `3` for the Device object
    pub object_id: i64,
    pub object_name: String,
    /// LwM2M resource id within the object
    pub resource_id: i64,
    pub resource_label: String,
    /// The inter-request delay the harness was configured with
    pub delay_ms: i64,
    /// Measured response time.
    ///
    /// For failures this is the time that elapsed before the timeout was declared, not a
    /// meaningful response time.
    pub latency_ms: u64,
    /// The raw status text as recorded by the harness
    pub status: String,
    pub outcome: Outcome,
}

impl ReadAttempt {
    pub fn resource_key(&self) -> ResourceKey {
        ResourceKey::new(&self.object_name, &self.resource_label)
    }

    /// Object id and name, e.g. `3 Device`
    pub fn object_label(&self) -> String {
        format!("{} {}", self.object_id, self.object_name)
    }

    pub fn is_failure(&self) -> bool {
        self.outcome.is_failure()
    }
}

/// Compute a fingerprint for a set of records
///
/// Two result logs with identical content share a fingerprint, regardless of their file names.
/// The fingerprint is computed using [sha3::Sha3_256].
pub fn fingerprint_records(records: &[ReadAttempt]) -> String {
    let mut hasher = sha3::Sha3_256::new();
    for record in records {
        Digest::update(&mut hasher, record.round.to_le_bytes());
        Digest::update(&mut hasher, record.sequence_position.to_le_bytes());
        Digest::update(&mut hasher, record.object_id.to_le_bytes());
        Digest::update(&mut hasher, record.object_name.as_bytes());
        Digest::update(&mut hasher, record.resource_id.to_le_bytes());
        Digest::update(&mut hasher, record.resource_label.as_bytes());
        Digest::update(&mut hasher, record.delay_ms.to_le_bytes());
        Digest::update(&mut hasher, record.latency_ms.to_le_bytes());
        Digest::update(&mut hasher, record.status.as_bytes());
    }

    format!("{:x}", hasher.finalize())
}
