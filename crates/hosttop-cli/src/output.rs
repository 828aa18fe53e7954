//! Formatted output helpers for CLI commands.

use hosttop_runtime::spy::SpyOutcome;
use hosttop_runtime::supervisor::AttachFailure;

/// One line describing a worker that will not be monitored.
#[must_use]
pub fn format_failure(failure: &AttachFailure) -> String {
    format!("skipping worker {}: {}", failure.pid, failure.error)
}

/// One line summarizing a finished spy.
#[must_use]
pub fn format_outcome(outcome: &SpyOutcome) -> String {
    format!(
        "worker {:<8} {:<10} {} received, {} counted",
        outcome.pid.to_string(),
        outcome.state.to_string(),
        outcome.captured,
        outcome.recorded
    )
}

#[cfg(test)]
mod tests {
    use hosttop_common::types::{ProcessId, TraceState};
    use hosttop_trace::TraceError;

    use super::*;

    #[test]
    fn failure_names_pid_and_cause() {
        let failure = AttachFailure {
            pid: ProcessId::new(42),
            error: TraceError::Unsupported("ptrace"),
        };
        let line = format_failure(&failure);
        assert!(line.starts_with("skipping worker 42: "));
    }

    #[test]
    fn outcome_lists_counters() {
        let outcome = SpyOutcome {
            pid: ProcessId::new(7),
            state: TraceState::Exited,
            captured: 12,
            recorded: 10,
        };
        let line = format_outcome(&outcome);
        assert!(line.contains("worker 7 "));
        assert!(line.contains("12 received, 10 counted"));
    }
}
