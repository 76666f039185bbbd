use latency_record_model::{Outcome, ReadAttempt};

pub(crate) fn attempt(round: u32, position: u32, latency_ms: u64, status: &str) -> ReadAttempt {
    ReadAttempt {
        round,
        sequence_position: position,
        object_id: 3,
        object_name: "Device".to_string(),
        resource_id: position as i64,
        resource_label: format!("Res{position}"),
        delay_ms: 3000,
        latency_ms,
        status: status.to_string(),
        outcome: Outcome::from_status(status, "FAIL"),
    }
}

pub(crate) fn success(round: u32, position: u32, latency_ms: u64) -> ReadAttempt {
    attempt(round, position, latency_ms, "CONTENT")
}

pub(crate) fn failure(round: u32, position: u32, latency_ms: u64) -> ReadAttempt {
    attempt(round, position, latency_ms, "FAIL (504)")
}

/// Move a record onto a different object
pub(crate) fn on_object(mut record: ReadAttempt, object_id: i64, object_name: &str) -> ReadAttempt {
    record.object_id = object_id;
    record.object_name = object_name.to_string();
    record
}

/// Build a run from per-round outcome strings, `.` for success and `x` for failure
pub(crate) fn run_from_pattern(rounds: &[&str]) -> Vec<ReadAttempt> {
    rounds
        .iter()
        .enumerate()
        .flat_map(|(round, pattern)| {
            pattern.chars().enumerate().map(move |(position, c)| {
                let round = round as u32 + 1;
                let position = position as u32 + 1;
                if c == 'x' {
                    failure(round, position, 5000)
                } else {
                    success(round, position, 40)
                }
            })
        })
        .collect()
}
